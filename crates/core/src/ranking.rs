use crate::domain::asset::Asset;
use crate::domain::contract::validate_asset;
use crate::domain::profile::InvestorProfile;
use crate::domain::recommendation::MatchingRecommendation;
use crate::scoring::{self, ScoringConfig};
use std::cmp::Ordering;

/// Scores every asset for `profile`, drops anything at or below the acceptance floor and
/// returns the full ordered list. Invalid catalog records are skipped, never fatal.
pub fn rank_all(
    profile: &InvestorProfile,
    assets: &[Asset],
    config: &ScoringConfig,
) -> Vec<MatchingRecommendation> {
    let mut out = Vec::with_capacity(assets.len());
    let mut skipped: usize = 0;

    for asset in assets {
        if let Err(err) = validate_asset(asset) {
            skipped += 1;
            tracing::warn!(asset_id = %asset.id, error = %err, "skipping invalid asset during ranking");
            continue;
        }

        let rec = scoring::evaluate(profile, asset, config);
        if rec.match_score > config.acceptance_floor {
            out.push(rec);
        }
    }

    out.sort_by(compare);

    tracing::debug!(
        profile_id = %profile.id,
        catalog_len = assets.len(),
        accepted = out.len(),
        skipped,
        "ranked catalog"
    );
    out
}

pub fn rank(
    profile: &InvestorProfile,
    assets: &[Asset],
    config: &ScoringConfig,
    limit: usize,
) -> Vec<MatchingRecommendation> {
    let mut out = rank_all(profile, assets, config);
    out.truncate(limit);
    out
}

/// Match score descending, then confidence descending, then asset id ascending.
pub fn compare(a: &MatchingRecommendation, b: &MatchingRecommendation) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.asset_id.cmp(&b.asset_id))
}
