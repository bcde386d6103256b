//! Deterministic profiles and assets shared by unit tests.

use crate::domain::asset::{
    Asset, AssetMetadata, AssetType, Characteristics, FinancialMetrics, Performance,
    Sustainability,
};
use crate::domain::profile::{
    BehaviorMetrics, DecisionSpeed, Demographics, ExperienceLevel, InvestmentRange,
    InvestorPreferences, InvestorProfile, LiquidityPreference, Location, ResearchDepth,
    RiskFactors, RiskProfile, RiskTolerance, TimeHorizon,
};
use chrono::{TimeZone, Utc};

pub fn location(country: &str, region: &str) -> Location {
    Location {
        country: country.to_string(),
        region: region.to_string(),
        city: None,
    }
}

/// Moderate investor (risk 50) in Germany, budget 10k..200k, preferred 50k.
pub fn profile(id: &str) -> InvestorProfile {
    InvestorProfile {
        id: id.to_string(),
        version: 0,
        updated_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
        name: Some(format!("Investor {id}")),
        preferences: InvestorPreferences {
            asset_types: vec![AssetType::RealEstate, AssetType::Bonds],
            geographic_preferences: vec!["Europe".to_string(), "Germany".to_string()],
            investment_amount: InvestmentRange {
                min: 10_000.0,
                preferred: 50_000.0,
                max: 200_000.0,
            },
            time_horizon: TimeHorizon::Medium,
            liquidity_preference: LiquidityPreference::Medium,
            sustainability_focus: false,
            technology_adoption: None,
            diversification_goals: vec![],
            excluded_sectors: vec![],
        },
        risk_profile: RiskProfile {
            risk_tolerance: RiskTolerance::Moderate,
            risk_score: 50.0,
            volatility_tolerance: Some(40.0),
            max_drawdown: Some(15.0),
            risk_factors: RiskFactors {
                market_risk: 50.0,
                credit_risk: 40.0,
                liquidity_risk: 30.0,
                operational_risk: 20.0,
                regulatory_risk: 25.0,
            },
        },
        demographics: Demographics {
            age: Some(45),
            age_range: "40-49".to_string(),
            location: location("Germany", "Europe"),
            income_range: None,
            investment_experience: ExperienceLevel::Intermediate,
        },
        behavior_metrics: BehaviorMetrics {
            activity_level: 50.0,
            decision_speed: DecisionSpeed::Moderate,
            research_depth: ResearchDepth::Moderate,
            social_influence: None,
            contrarian: false,
            portfolio_turnover: None,
            average_holding_period_days: None,
        },
        investment_history: vec![],
    }
}

pub fn profile_with_risk(id: &str, tolerance: RiskTolerance, risk_score: f64) -> InvestorProfile {
    let mut p = profile(id);
    p.risk_profile.risk_tolerance = tolerance;
    p.risk_profile.risk_score = risk_score;
    p
}

/// Real-estate asset in Germany, risk 50, minimum ticket 25k, ESG 60.
pub fn asset(id: &str) -> Asset {
    Asset {
        id: id.to_string(),
        name: format!("Asset {id}"),
        asset_type: AssetType::RealEstate,
        description: None,
        location: location("Germany", "Europe"),
        financial_metrics: FinancialMetrics {
            current_value: 2_000_000.0,
            minimum_investment: 25_000.0,
            expected_return: 8.0,
            volatility: 12.0,
            liquidity_score: 60.0,
            risk_score: 50.0,
        },
        characteristics: Characteristics {
            sector: "Real Estate".to_string(),
            sustainability: Sustainability {
                esg_score: 60.0,
                carbon_footprint: None,
                social_impact: None,
            },
        },
        performance: Performance {
            historical_returns: vec![1.0, -0.5, 2.0],
            sharpe_ratio: 1.1,
            max_drawdown: 9.0,
        },
        metadata: AssetMetadata {
            popularity: Some(50.0),
            investor_count: 120,
            total_invested: 1_500_000.0,
        },
    }
}
