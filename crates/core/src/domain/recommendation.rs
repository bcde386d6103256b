use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRecommendation {
    pub asset_id: String,
    pub match_score: u8,
    pub confidence: f64,
    pub risk_alignment: f64,
    pub preference_alignment: f64,
    pub financial_fit: f64,
    pub geographic_fit: f64,
    pub reasoning: Vec<ReasonCode>,
    pub warnings: Vec<WarningCode>,
    pub opportunities: Vec<OpportunityCode>,
    /// Version of the scoring configuration that produced this score.
    pub scoring_version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    RiskFit,
    PreferenceFit,
    BudgetFit,
    GeographicFit,
    SustainabilityFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    RiskAboveComfort,
    LiquidityShortfall,
    MinimumAboveBudget,
    ExcludedSector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityCode {
    HighExpectedReturn,
    LowCompetition,
    StrongEsg,
}
