pub mod provider;
pub mod types;

use crate::domain::asset::Asset;
use crate::domain::contract::{decode_asset, validate_asset};
use crate::error::{FieldViolation, MatchingError};
use serde_json::Value;
use std::collections::BTreeSet;

/// Result of decoding one feed delivery: the records that passed validation and one error
/// per record that did not.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub accepted: Vec<Asset>,
    pub rejected: Vec<MatchingError>,
}

/// Decodes every raw record independently; a bad record is logged and reported but never
/// aborts the rest of the batch. Later duplicates of an id are rejected.
pub fn partition_records(items: Vec<Value>) -> FeedBatch {
    partition(items.into_iter().map(decode_asset))
}

/// Same as [`partition_records`] for assets that are already decoded.
pub fn partition_assets(assets: Vec<Asset>) -> FeedBatch {
    partition(assets.into_iter().map(|mut asset| {
        asset.id = asset.id.trim().to_string();
        validate_asset(&asset).map(|()| asset)
    }))
}

fn partition(items: impl IntoIterator<Item = Result<Asset, MatchingError>>) -> FeedBatch {
    let mut out = FeedBatch::default();
    let mut seen = BTreeSet::<String>::new();

    for item in items {
        match item {
            Ok(asset) => {
                if seen.insert(asset.id.clone()) {
                    out.accepted.push(asset);
                } else {
                    let err = MatchingError::invalid_asset(
                        &asset.id,
                        vec![FieldViolation::new("id", "duplicate id in feed")],
                    );
                    tracing::warn!(asset_id = %asset.id, error = %err, "rejected catalog record");
                    out.rejected.push(err);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected catalog record");
                out.rejected.push(err);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::asset;
    use serde_json::json;

    #[test]
    fn bad_records_are_isolated() {
        let good = serde_json::to_value(asset("a1")).unwrap();
        let dup = serde_json::to_value(asset("a1")).unwrap();
        let mut negative = serde_json::to_value(asset("a2")).unwrap();
        negative["financial_metrics"]["current_value"] = json!(-10.0);
        let other = serde_json::to_value(asset("a3")).unwrap();

        let batch = partition_records(vec![good, json!("not an object"), dup, negative, other]);
        let ids: Vec<_> = batch.accepted.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(batch.rejected.len(), 3);
        assert!(batch
            .rejected
            .iter()
            .all(|e| matches!(e, MatchingError::InvalidAsset { .. })));
    }

    #[test]
    fn duplicate_ids_are_compared_after_trimming() {
        let mut padded = serde_json::to_value(asset("a1")).unwrap();
        padded["id"] = json!(" a1 ");
        let plain = serde_json::to_value(asset("a1")).unwrap();

        let batch = partition_records(vec![padded, plain]);
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].id, "a1");
        assert_eq!(batch.rejected.len(), 1);
    }

    #[test]
    fn decoded_assets_are_trimmed_validated_and_deduplicated() {
        let mut padded = asset("a1");
        padded.id = "a1  ".to_string();
        let mut broken = asset("a2");
        broken.financial_metrics.risk_score = 120.0;

        let batch = partition_assets(vec![padded, asset("a1"), broken, asset("a3")]);
        let ids: Vec<_> = batch.accepted.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(batch.rejected.len(), 2);
        assert_eq!(batch.rejected[0].violations()[0].field, "id");
    }
}
