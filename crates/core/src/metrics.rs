use crate::domain::asset::Asset;
use crate::domain::profile::InvestorProfile;
use crate::ranking::rank_all;
use crate::scoring::ScoringConfig;
use crate::storage::FeedbackSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Dashboard roll-up of the matching population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingMetrics {
    pub total_profiles: usize,
    pub total_assets: usize,
    pub catalog_version: u64,
    pub cluster_count: usize,
    /// Mean match score over every recommendation that clears the acceptance floor.
    pub avg_match_score: Option<f64>,
    pub recommendations_evaluated: usize,
    pub feedback_count: u64,
    pub avg_feedback_rating: Option<f64>,
    pub scoring_version: u32,
}

pub struct MetricsInput<'a> {
    pub profiles: &'a [Arc<InvestorProfile>],
    pub assets: &'a [Asset],
    pub catalog_version: u64,
    pub cluster_count: usize,
    pub feedback: FeedbackSummary,
    pub config: &'a ScoringConfig,
}

pub fn compute(input: MetricsInput<'_>) -> MatchingMetrics {
    let mut sum: u64 = 0;
    let mut evaluated: usize = 0;
    for profile in input.profiles {
        for rec in rank_all(profile, input.assets, input.config) {
            sum += u64::from(rec.match_score);
            evaluated += 1;
        }
    }

    MatchingMetrics {
        total_profiles: input.profiles.len(),
        total_assets: input.assets.len(),
        catalog_version: input.catalog_version,
        cluster_count: input.cluster_count,
        avg_match_score: (evaluated > 0).then(|| sum as f64 / evaluated as f64),
        recommendations_evaluated: evaluated,
        feedback_count: input.feedback.count,
        avg_feedback_rating: input.feedback.avg_rating,
        scoring_version: input.config.version,
    }
}
