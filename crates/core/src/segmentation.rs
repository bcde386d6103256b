//! Investor segmentation by risk tolerance.
//!
//! Segments are the three fixed tolerance bands rather than learned clusters, so membership
//! is explainable and identical input always yields identical output.

use crate::domain::asset::AssetType;
use crate::domain::cluster::{ClusterAnalysis, ClusterCharacteristics};
use crate::domain::profile::{InvestorProfile, RiskTolerance};
use std::collections::BTreeMap;

const TOP_ASSET_TYPES: usize = 2;
const TOP_LOCATIONS: usize = 2;

struct SegmentLabel {
    id: &'static str,
    name: &'static str,
    description: &'static str,
}

fn label(tolerance: RiskTolerance) -> SegmentLabel {
    match tolerance {
        RiskTolerance::Conservative => SegmentLabel {
            id: "conservative_investors",
            name: "Conservative Investors",
            description: "Risk-averse investors focused on capital preservation",
        },
        RiskTolerance::Moderate => SegmentLabel {
            id: "growth_seekers",
            name: "Growth Seekers",
            description: "Moderate risk investors seeking growth opportunities",
        },
        RiskTolerance::Aggressive => SegmentLabel {
            id: "aggressive_traders",
            name: "Aggressive Traders",
            description: "High-risk investors pursuing maximum returns",
        },
    }
}

/// Groups profiles by risk tolerance. Empty groups are omitted; output order is
/// conservative, moderate, aggressive.
pub fn segment(profiles: &[InvestorProfile]) -> Vec<ClusterAnalysis> {
    let mut groups: BTreeMap<RiskTolerance, Vec<&InvestorProfile>> = BTreeMap::new();
    for p in profiles {
        groups.entry(p.risk_profile.risk_tolerance).or_default().push(p);
    }

    groups
        .into_iter()
        .map(|(tolerance, mut members)| {
            // Fixed summation order keeps float aggregates identical across input orderings.
            members.sort_by(|a, b| a.id.cmp(&b.id));
            summarize(tolerance, &members)
        })
        .collect()
}

fn summarize(tolerance: RiskTolerance, members: &[&InvestorProfile]) -> ClusterAnalysis {
    let label = label(tolerance);

    let avg_risk_score = mean(members.iter().map(|p| p.risk_profile.risk_score));
    let avg_investment_amount =
        mean(members.iter().map(|p| p.preferences.investment_amount.preferred));

    let ages: Vec<f64> = members
        .iter()
        .filter_map(|p| p.demographics.age.map(f64::from))
        .collect();
    let avg_age = (!ages.is_empty()).then(|| mean(ages.iter().copied()));

    let mut type_counts: BTreeMap<AssetType, usize> = BTreeMap::new();
    for p in members {
        for t in &p.preferences.asset_types {
            *type_counts.entry(*t).or_default() += 1;
        }
    }

    let mut region_counts: BTreeMap<String, usize> = BTreeMap::new();
    for p in members {
        let region = p.demographics.location.region.trim();
        if !region.is_empty() {
            *region_counts.entry(region.to_string()).or_default() += 1;
        }
    }

    ClusterAnalysis {
        cluster_id: label.id.to_string(),
        cluster_name: label.name.to_string(),
        description: label.description.to_string(),
        risk_tolerance: tolerance,
        member_count: members.len(),
        characteristics: ClusterCharacteristics {
            avg_risk_score,
            common_asset_types: top_by_frequency(type_counts, TOP_ASSET_TYPES),
            avg_investment_amount,
            common_locations: top_by_frequency(region_counts, TOP_LOCATIONS),
            avg_age,
        },
    }
}

/// Most frequent keys first; ties resolve by key order so results are stable.
fn top_by_frequency<K: Ord>(counts: BTreeMap<K, usize>, n: usize) -> Vec<K> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    // Stable sort keeps the BTreeMap key order within equal counts.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.into_iter().take(n).map(|(k, _)| k).collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
