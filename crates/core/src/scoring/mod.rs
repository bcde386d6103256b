//! Profile/asset compatibility scoring.
//!
//! Every function here is a pure function of its inputs and the [`ScoringConfig`]; callers can
//! fan scoring out across threads without coordination.

pub mod config;
pub mod rules;

pub use config::{ScoringConfig, ScoringWeights};

use crate::domain::asset::Asset;
use crate::domain::profile::{InvestmentRange, InvestorPreferences, InvestorProfile};
use crate::domain::recommendation::MatchingRecommendation;
use rules::{RuleInput, OPPORTUNITY_RULES, REASON_RULES, WARNING_RULES};
use serde::{Deserialize, Serialize};

const PREFERRED_TYPE_BASE: f64 = 80.0;
const OTHER_TYPE_BASE: f64 = 20.0;
const ESG_BONUS_THRESHOLD: f64 = 70.0;
const FINANCIAL_RAMP: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub risk_alignment: f64,
    pub preference_alignment: f64,
    pub financial_fit: f64,
    pub geographic_fit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub sub_scores: SubScores,
    pub match_score: u8,
    pub confidence: f64,
}

pub fn risk_alignment(profile_risk: f64, asset_risk: f64) -> f64 {
    (100.0 - (profile_risk - asset_risk).abs()).max(0.0)
}

pub fn preference_alignment(
    preferences: &InvestorPreferences,
    asset: &Asset,
    config: &ScoringConfig,
) -> f64 {
    if preferences.excludes_sector(asset.sector()) {
        return 0.0;
    }

    let mut score = if preferences.asset_types.contains(&asset.asset_type) {
        PREFERRED_TYPE_BASE
    } else {
        OTHER_TYPE_BASE
    };
    if preferences.sustainability_focus && asset.esg_score() > ESG_BONUS_THRESHOLD {
        score += config.sustainability_bonus;
    }
    score.min(config.preference_cap)
}

pub fn financial_fit(amount: &InvestmentRange, minimum_investment: f64) -> f64 {
    if minimum_investment > amount.max {
        return 0.0;
    }
    if minimum_investment <= amount.min {
        return 100.0;
    }
    (FINANCIAL_RAMP * amount.preferred / minimum_investment).min(100.0)
}

/// Share of declared geographies naming the asset's country or region. No declared
/// geography scores 0, not 100.
pub fn geographic_fit(preferences: &[String], asset: &Asset) -> f64 {
    if preferences.is_empty() {
        return 0.0;
    }
    let matches = preferences
        .iter()
        .filter(|pref| asset.location.matches(pref))
        .count();
    matches as f64 / preferences.len() as f64 * 100.0
}

pub fn combine(sub: &SubScores, config: &ScoringConfig) -> ScoreResult {
    let w = &config.weights;
    let raw = w.risk * sub.risk_alignment
        + w.preference * sub.preference_alignment
        + w.financial * sub.financial_fit
        + w.geographic * sub.geographic_fit;
    let match_score = raw.round().clamp(0.0, 100.0) as u8;
    let confidence = (f64::from(match_score) / 100.0).min(config.confidence_cap);

    ScoreResult {
        sub_scores: *sub,
        match_score,
        confidence,
    }
}

pub fn score(profile: &InvestorProfile, asset: &Asset, config: &ScoringConfig) -> ScoreResult {
    let sub = SubScores {
        risk_alignment: risk_alignment(
            profile.risk_profile.risk_score,
            asset.financial_metrics.risk_score,
        ),
        preference_alignment: preference_alignment(&profile.preferences, asset, config),
        financial_fit: financial_fit(
            &profile.preferences.investment_amount,
            asset.financial_metrics.minimum_investment,
        ),
        geographic_fit: geographic_fit(&profile.preferences.geographic_preferences, asset),
    };
    combine(&sub, config)
}

/// Scores one pair and attaches the coded findings from the rule tables.
pub fn evaluate(
    profile: &InvestorProfile,
    asset: &Asset,
    config: &ScoringConfig,
) -> MatchingRecommendation {
    let result = score(profile, asset, config);
    let input = RuleInput {
        profile,
        asset,
        scores: &result.sub_scores,
    };

    MatchingRecommendation {
        asset_id: asset.id.clone(),
        match_score: result.match_score,
        confidence: result.confidence,
        risk_alignment: result.sub_scores.risk_alignment,
        preference_alignment: result.sub_scores.preference_alignment,
        financial_fit: result.sub_scores.financial_fit,
        geographic_fit: result.sub_scores.geographic_fit,
        reasoning: rules::evaluate(REASON_RULES, &input),
        warnings: rules::evaluate(WARNING_RULES, &input),
        opportunities: rules::evaluate(OPPORTUNITY_RULES, &input),
        scoring_version: config.version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::AssetType;
    use crate::domain::fixtures::{asset, location, profile};
    use crate::domain::recommendation::{ReasonCode, WarningCode};

    fn range(min: f64, preferred: f64, max: f64) -> InvestmentRange {
        InvestmentRange { min, preferred, max }
    }

    #[test]
    fn risk_alignment_examples() {
        assert_eq!(risk_alignment(50.0, 50.0), 100.0);
        assert_eq!(risk_alignment(20.0, 90.0), 30.0);
        assert_eq!(risk_alignment(90.0, 20.0), 30.0);
        assert_eq!(risk_alignment(0.0, 100.0), 0.0);
    }

    #[test]
    fn preference_base_and_sustainability_bonus() {
        let config = ScoringConfig::v1();
        let mut p = profile("p1");
        let mut a = asset("a1");
        assert_eq!(preference_alignment(&p.preferences, &a, &config), 80.0);

        a.asset_type = AssetType::ArtCollectibles;
        assert_eq!(preference_alignment(&p.preferences, &a, &config), 20.0);

        p.preferences.sustainability_focus = true;
        a.characteristics.sustainability.esg_score = 71.0;
        assert_eq!(preference_alignment(&p.preferences, &a, &config), 40.0);

        a.asset_type = AssetType::RealEstate;
        assert_eq!(preference_alignment(&p.preferences, &a, &config), 100.0);

        // Exactly 70 does not earn the bonus.
        a.characteristics.sustainability.esg_score = 70.0;
        assert_eq!(preference_alignment(&p.preferences, &a, &config), 80.0);
    }

    #[test]
    fn excluded_sector_zeroes_preference_and_drags_match_score() {
        let config = ScoringConfig::v1();
        let mut p = profile("p1");
        p.preferences.sustainability_focus = true;
        p.preferences.excluded_sectors = vec!["real estate".to_string()];
        let mut a = asset("a1");
        a.characteristics.sustainability.esg_score = 95.0;

        let result = score(&p, &a, &config);
        assert_eq!(result.sub_scores.preference_alignment, 0.0);
        // 0.30*100 + 0.25*0 + 0.25*100 + 0.20*100
        assert_eq!(result.match_score, 75);
    }

    #[test]
    fn financial_fit_examples() {
        let r = range(10_000.0, 50_000.0, 200_000.0);
        assert_eq!(financial_fit(&r, 25_000.0), 100.0);
        assert_eq!(financial_fit(&r, 10_000.0), 100.0);
        assert_eq!(financial_fit(&r, 200_001.0), 0.0);
        // 80 * 50k / 100k
        assert_eq!(financial_fit(&r, 100_000.0), 40.0);
    }

    #[test]
    fn geographic_fit_is_fraction_of_preferences() {
        let mut a = asset("a1");
        let prefs = vec!["Europe".to_string(), "Singapore".to_string()];
        assert_eq!(geographic_fit(&prefs, &a), 50.0);

        a.location = location("Singapore", "Asia Pacific");
        assert_eq!(geographic_fit(&prefs, &a), 50.0);

        a.location = location("Canada", "North America");
        assert_eq!(geographic_fit(&prefs, &a), 0.0);
        assert_eq!(geographic_fit(&[], &a), 0.0);
    }

    #[test]
    fn weighted_match_score_and_confidence_cap() {
        let config = ScoringConfig::v1();
        let result = score(&profile("p1"), &asset("a1"), &config);
        assert_eq!(
            result.sub_scores,
            SubScores {
                risk_alignment: 100.0,
                preference_alignment: 80.0,
                financial_fit: 100.0,
                geographic_fit: 100.0,
            }
        );
        assert_eq!(result.match_score, 95);
        assert_eq!(result.confidence, 0.95);

        let perfect = combine(
            &SubScores {
                risk_alignment: 100.0,
                preference_alignment: 100.0,
                financial_fit: 100.0,
                geographic_fit: 100.0,
            },
            &config,
        );
        assert_eq!(perfect.match_score, 100);
        assert_eq!(perfect.confidence, 0.95);
    }

    #[test]
    fn match_score_stays_in_range_across_extremes() {
        let config = ScoringConfig::v1();
        for profile_risk in [0.0, 35.0, 50.0, 100.0] {
            for asset_risk in [0.0, 50.0, 100.0] {
                for min_inv in [0.0, 10_000.0, 75_000.0, 1_000_000.0] {
                    let mut p = profile("p");
                    p.risk_profile.risk_score = profile_risk;
                    let mut a = asset("a");
                    a.financial_metrics.risk_score = asset_risk;
                    a.financial_metrics.minimum_investment = min_inv;
                    let r = score(&p, &a, &config);
                    assert!(r.match_score <= 100);
                    assert!((0.0..=1.0).contains(&r.confidence));
                }
            }
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let config = ScoringConfig::v1();
        let p = profile("p1");
        let a = asset("a1");
        assert_eq!(evaluate(&p, &a, &config), evaluate(&p, &a, &config));
    }

    #[test]
    fn evaluate_attaches_codes_and_version() {
        let config = ScoringConfig::v1();
        let mut a = asset("a1");
        a.financial_metrics.minimum_investment = 500_000.0;
        let rec = evaluate(&profile("p1"), &a, &config);
        assert_eq!(rec.financial_fit, 0.0);
        assert_eq!(rec.scoring_version, 1);
        assert!(rec.reasoning.contains(&ReasonCode::RiskFit));
        assert!(!rec.reasoning.contains(&ReasonCode::BudgetFit));
        assert_eq!(rec.warnings, vec![WarningCode::MinimumAboveBudget]);
    }
}
