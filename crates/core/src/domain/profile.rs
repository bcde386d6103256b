use crate::domain::asset::AssetType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorProfile {
    #[serde(default)]
    pub id: String,
    /// Assigned by the repository on upsert; submissions may leave it at 0.
    #[serde(default)]
    pub version: u64,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    pub preferences: InvestorPreferences,
    pub risk_profile: RiskProfile,
    pub demographics: Demographics,
    pub behavior_metrics: BehaviorMetrics,
    #[serde(default)]
    pub investment_history: Vec<InvestmentHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorPreferences {
    pub asset_types: Vec<AssetType>,
    #[serde(default)]
    pub geographic_preferences: Vec<String>,
    pub investment_amount: InvestmentRange,
    pub time_horizon: TimeHorizon,
    pub liquidity_preference: LiquidityPreference,
    #[serde(default)]
    pub sustainability_focus: bool,
    #[serde(default)]
    pub technology_adoption: Option<RiskTolerance>,
    #[serde(default)]
    pub diversification_goals: Vec<String>,
    #[serde(default)]
    pub excluded_sectors: Vec<String>,
}

impl InvestorPreferences {
    pub fn excludes_sector(&self, sector: &str) -> bool {
        let sector = sector.trim();
        self.excluded_sectors
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(sector))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRange {
    pub min: f64,
    pub preferred: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityPreference {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Conservative => "conservative",
            RiskTolerance::Moderate => "moderate",
            RiskTolerance::Aggressive => "aggressive",
        }
    }

    /// Inclusive risk-score band a profile with this tolerance must fall in.
    /// Adjacent bands overlap at their edges.
    pub fn score_band(&self) -> (f64, f64) {
        match self {
            RiskTolerance::Conservative => (0.0, 50.0),
            RiskTolerance::Moderate => (40.0, 70.0),
            RiskTolerance::Aggressive => (70.0, 100.0),
        }
    }

    pub fn admits(&self, risk_score: f64) -> bool {
        let (lo, hi) = self.score_band();
        (lo..=hi).contains(&risk_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub risk_tolerance: RiskTolerance,
    pub risk_score: f64,
    #[serde(default)]
    pub volatility_tolerance: Option<f64>,
    #[serde(default)]
    pub max_drawdown: Option<f64>,
    pub risk_factors: RiskFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub market_risk: f64,
    pub credit_risk: f64,
    pub liquidity_risk: f64,
    pub operational_risk: f64,
    pub regulatory_risk: f64,
}

impl RiskFactors {
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("market_risk", self.market_risk),
            ("credit_risk", self.credit_risk),
            ("liquidity_risk", self.liquidity_risk),
            ("operational_risk", self.operational_risk),
            ("regulatory_risk", self.regulatory_risk),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age: Option<u32>,
    pub age_range: String,
    pub location: Location,
    #[serde(default)]
    pub income_range: Option<String>,
    pub investment_experience: ExperienceLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub region: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl Location {
    /// True when `pref` names this location's country or region.
    pub fn matches(&self, pref: &str) -> bool {
        let pref = pref.trim();
        !pref.is_empty()
            && (self.country.trim().eq_ignore_ascii_case(pref)
                || self.region.trim().eq_ignore_ascii_case(pref))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub activity_level: f64,
    pub decision_speed: DecisionSpeed,
    pub research_depth: ResearchDepth,
    #[serde(default)]
    pub social_influence: Option<f64>,
    #[serde(default)]
    pub contrarian: bool,
    #[serde(default)]
    pub portfolio_turnover: Option<f64>,
    #[serde(default)]
    pub average_holding_period_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSpeed {
    Fast,
    Moderate,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchDepth {
    Minimal,
    Moderate,
    Extensive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentHistoryEntry {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub investment_amount: f64,
    pub investment_date: DateTime<Utc>,
    #[serde(default)]
    pub roi: Option<f64>,
    /// 1..=5 when present.
    #[serde(default)]
    pub satisfaction: Option<u8>,
}
