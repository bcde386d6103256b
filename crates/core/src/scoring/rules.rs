use crate::domain::asset::Asset;
use crate::domain::profile::{InvestorProfile, LiquidityPreference};
use crate::domain::recommendation::{OpportunityCode, ReasonCode, WarningCode};
use crate::scoring::SubScores;

/// Everything a finding rule may look at.
pub struct RuleInput<'a> {
    pub profile: &'a InvestorProfile,
    pub asset: &'a Asset,
    pub scores: &'a SubScores,
}

type Predicate = fn(&RuleInput<'_>) -> bool;

const STRONG_FIT: f64 = 80.0;

pub const REASON_RULES: &[(ReasonCode, Predicate)] = &[
    (ReasonCode::RiskFit, |i| i.scores.risk_alignment > STRONG_FIT),
    (ReasonCode::PreferenceFit, |i| {
        i.scores.preference_alignment > STRONG_FIT
    }),
    (ReasonCode::BudgetFit, |i| i.scores.financial_fit > STRONG_FIT),
    (ReasonCode::GeographicFit, |i| {
        i.scores.geographic_fit > STRONG_FIT
    }),
    (ReasonCode::SustainabilityFit, |i| {
        i.profile.preferences.sustainability_focus && i.asset.esg_score() > 70.0
    }),
];

pub const WARNING_RULES: &[(WarningCode, Predicate)] = &[
    (WarningCode::RiskAboveComfort, |i| {
        i.asset.financial_metrics.risk_score > i.profile.risk_profile.risk_score + 20.0
    }),
    (WarningCode::LiquidityShortfall, |i| {
        i.asset.financial_metrics.liquidity_score < 30.0
            && i.profile.preferences.liquidity_preference == LiquidityPreference::High
    }),
    (WarningCode::MinimumAboveBudget, |i| {
        i.asset.financial_metrics.minimum_investment
            > i.profile.preferences.investment_amount.max
    }),
    (WarningCode::ExcludedSector, |i| {
        i.profile.preferences.excludes_sector(i.asset.sector())
    }),
];

pub const OPPORTUNITY_RULES: &[(OpportunityCode, Predicate)] = &[
    (OpportunityCode::HighExpectedReturn, |i| {
        i.asset.financial_metrics.expected_return > 12.0
    }),
    (OpportunityCode::LowCompetition, |i| {
        i.asset.metadata.popularity.is_some_and(|p| p < 30.0)
    }),
    (OpportunityCode::StrongEsg, |i| i.asset.esg_score() > 80.0),
];

pub fn evaluate<C: Copy>(rules: &[(C, Predicate)], input: &RuleInput<'_>) -> Vec<C> {
    rules
        .iter()
        .filter(|(_, pred)| pred(input))
        .map(|(code, _)| *code)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{asset, profile};

    fn scores(risk: f64, pref: f64, fin: f64, geo: f64) -> SubScores {
        SubScores {
            risk_alignment: risk,
            preference_alignment: pref,
            financial_fit: fin,
            geographic_fit: geo,
        }
    }

    #[test]
    fn reasons_fire_only_above_threshold() {
        let p = profile("p1");
        let a = asset("a1");
        let s = scores(81.0, 80.0, 100.0, 50.0);
        let input = RuleInput { profile: &p, asset: &a, scores: &s };
        assert_eq!(
            evaluate(REASON_RULES, &input),
            vec![ReasonCode::RiskFit, ReasonCode::BudgetFit]
        );
    }

    #[test]
    fn riskier_asset_and_illiquidity_warn() {
        let mut p = profile("p1");
        p.risk_profile.risk_score = 40.0;
        p.preferences.liquidity_preference = LiquidityPreference::High;
        let mut a = asset("a1");
        a.financial_metrics.risk_score = 61.0;
        a.financial_metrics.liquidity_score = 10.0;

        let s = scores(79.0, 80.0, 100.0, 100.0);
        let input = RuleInput { profile: &p, asset: &a, scores: &s };
        assert_eq!(
            evaluate(WARNING_RULES, &input),
            vec![WarningCode::RiskAboveComfort, WarningCode::LiquidityShortfall]
        );
    }

    #[test]
    fn opportunities_follow_asset_traits() {
        let p = profile("p1");
        let mut a = asset("a1");
        a.financial_metrics.expected_return = 14.0;
        a.metadata.popularity = Some(12.0);
        a.characteristics.sustainability.esg_score = 90.0;

        let s = scores(0.0, 0.0, 0.0, 0.0);
        let input = RuleInput { profile: &p, asset: &a, scores: &s };
        assert_eq!(
            evaluate(OPPORTUNITY_RULES, &input),
            vec![
                OpportunityCode::HighExpectedReturn,
                OpportunityCode::LowCompetition,
                OpportunityCode::StrongEsg
            ]
        );
    }

    #[test]
    fn unknown_popularity_is_not_low_competition() {
        let p = profile("p1");
        let mut a = asset("a1");
        a.metadata.popularity = None;
        let s = scores(0.0, 0.0, 0.0, 0.0);
        let input = RuleInput { profile: &p, asset: &a, scores: &s };
        assert!(evaluate(OPPORTUNITY_RULES, &input).is_empty());
    }
}
