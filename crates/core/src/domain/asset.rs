use crate::domain::profile::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    RealEstate,
    CarbonCredits,
    PreciousMetals,
    Commodities,
    RenewableEnergy,
    Infrastructure,
    ArtCollectibles,
    Bonds,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::RealEstate => "real_estate",
            AssetType::CarbonCredits => "carbon_credits",
            AssetType::PreciousMetals => "precious_metals",
            AssetType::Commodities => "commodities",
            AssetType::RenewableEnergy => "renewable_energy",
            AssetType::Infrastructure => "infrastructure",
            AssetType::ArtCollectibles => "art_collectibles",
            AssetType::Bonds => "bonds",
        }
    }
}

/// Catalog reference record. Read-only to the engine; refreshed wholesale by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default)]
    pub description: Option<String>,
    pub location: Location,
    pub financial_metrics: FinancialMetrics,
    pub characteristics: Characteristics,
    pub performance: Performance,
    #[serde(default)]
    pub metadata: AssetMetadata,
}

impl Asset {
    pub fn sector(&self) -> &str {
        &self.characteristics.sector
    }

    pub fn esg_score(&self) -> f64 {
        self.characteristics.sustainability.esg_score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub current_value: f64,
    pub minimum_investment: f64,
    /// Annual, in percent.
    pub expected_return: f64,
    pub volatility: f64,
    pub liquidity_score: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    pub sector: String,
    pub sustainability: Sustainability,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sustainability {
    pub esg_score: f64,
    #[serde(default)]
    pub carbon_footprint: Option<f64>,
    #[serde(default)]
    pub social_impact: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default)]
    pub historical_returns: Vec<f64>,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub investor_count: u64,
    #[serde(default)]
    pub total_invested: f64,
}
