use crate::domain::asset::AssetType;
use crate::domain::profile::RiskTolerance;
use serde::{Deserialize, Serialize};

/// Derived summary of one investor segment. Regenerated wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    pub cluster_id: String,
    pub cluster_name: String,
    pub description: String,
    pub risk_tolerance: RiskTolerance,
    pub member_count: usize,
    pub characteristics: ClusterCharacteristics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCharacteristics {
    pub avg_risk_score: f64,
    pub common_asset_types: Vec<AssetType>,
    pub avg_investment_amount: f64,
    pub common_locations: Vec<String>,
    /// `None` when no member reported an age.
    pub avg_age: Option<f64>,
}
