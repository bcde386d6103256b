use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope returned by the asset feed. Items stay raw so each record is decoded and
/// validated on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFeedResponse {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<Value>,
}
