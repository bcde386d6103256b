use crate::domain::asset::Asset;
use crate::domain::profile::InvestorProfile;
use crate::error::{FieldViolation, MatchingError};
use serde_json::Value;

const UNKNOWN_ID: &str = "<unknown>";

/// Checks every write-time invariant of a profile and reports all violations at once.
pub fn validate_profile(profile: &InvestorProfile) -> Result<(), MatchingError> {
    let mut v = Vec::new();

    if profile.id.trim().is_empty() {
        v.push(FieldViolation::new("id", "must be non-empty"));
    }

    let amount = &profile.preferences.investment_amount;
    non_negative(&mut v, "preferences.investment_amount.min", amount.min);
    non_negative(&mut v, "preferences.investment_amount.preferred", amount.preferred);
    non_negative(&mut v, "preferences.investment_amount.max", amount.max);
    if amount.min > amount.preferred {
        v.push(FieldViolation::new(
            "preferences.investment_amount",
            format!("min ({}) must not exceed preferred ({})", amount.min, amount.preferred),
        ));
    }
    if amount.preferred > amount.max {
        v.push(FieldViolation::new(
            "preferences.investment_amount",
            format!("preferred ({}) must not exceed max ({})", amount.preferred, amount.max),
        ));
    }

    for (i, g) in profile.preferences.geographic_preferences.iter().enumerate() {
        if g.trim().is_empty() {
            v.push(FieldViolation::new(
                format!("preferences.geographic_preferences[{i}]"),
                "must be non-empty",
            ));
        }
    }

    let risk = &profile.risk_profile;
    if percent(&mut v, "risk_profile.risk_score", risk.risk_score)
        && !risk.risk_tolerance.admits(risk.risk_score)
    {
        let (lo, hi) = risk.risk_tolerance.score_band();
        v.push(FieldViolation::new(
            "risk_profile.risk_score",
            format!(
                "{} is outside the {} band [{lo}, {hi}]",
                risk.risk_score,
                risk.risk_tolerance.as_str()
            ),
        ));
    }
    for (name, value) in risk.risk_factors.named() {
        percent(&mut v, &format!("risk_profile.risk_factors.{name}"), value);
    }
    if let Some(vt) = risk.volatility_tolerance {
        percent(&mut v, "risk_profile.volatility_tolerance", vt);
    }
    if let Some(dd) = risk.max_drawdown {
        percent(&mut v, "risk_profile.max_drawdown", dd);
    }

    let location = &profile.demographics.location;
    if location.country.trim().is_empty() {
        v.push(FieldViolation::new("demographics.location.country", "must be non-empty"));
    }
    if location.region.trim().is_empty() {
        v.push(FieldViolation::new("demographics.location.region", "must be non-empty"));
    }

    percent(
        &mut v,
        "behavior_metrics.activity_level",
        profile.behavior_metrics.activity_level,
    );
    if let Some(si) = profile.behavior_metrics.social_influence {
        percent(&mut v, "behavior_metrics.social_influence", si);
    }

    for (i, h) in profile.investment_history.iter().enumerate() {
        non_negative(
            &mut v,
            &format!("investment_history[{i}].investment_amount"),
            h.investment_amount,
        );
        if let Some(s) = h.satisfaction {
            if !(1..=5).contains(&s) {
                v.push(FieldViolation::new(
                    format!("investment_history[{i}].satisfaction"),
                    format!("must be 1..=5 (got {s})"),
                ));
            }
        }
    }

    if v.is_empty() {
        Ok(())
    } else {
        Err(MatchingError::invalid_profile(&profile.id, v))
    }
}

/// Rejects catalog records with out-of-range or non-finite numeric fields.
pub fn validate_asset(asset: &Asset) -> Result<(), MatchingError> {
    let mut v = Vec::new();

    if asset.id.trim().is_empty() {
        v.push(FieldViolation::new("id", "must be non-empty"));
    }
    if asset.name.trim().is_empty() {
        v.push(FieldViolation::new("name", "must be non-empty"));
    }
    if asset.characteristics.sector.trim().is_empty() {
        v.push(FieldViolation::new("characteristics.sector", "must be non-empty"));
    }

    let fm = &asset.financial_metrics;
    non_negative(&mut v, "financial_metrics.current_value", fm.current_value);
    non_negative(&mut v, "financial_metrics.minimum_investment", fm.minimum_investment);
    non_negative(&mut v, "financial_metrics.volatility", fm.volatility);
    finite(&mut v, "financial_metrics.expected_return", fm.expected_return);
    percent(&mut v, "financial_metrics.liquidity_score", fm.liquidity_score);
    percent(&mut v, "financial_metrics.risk_score", fm.risk_score);

    percent(
        &mut v,
        "characteristics.sustainability.esg_score",
        asset.characteristics.sustainability.esg_score,
    );

    let perf = &asset.performance;
    finite(&mut v, "performance.sharpe_ratio", perf.sharpe_ratio);
    non_negative(&mut v, "performance.max_drawdown", perf.max_drawdown);
    if perf.historical_returns.iter().any(|r| !r.is_finite()) {
        v.push(FieldViolation::new(
            "performance.historical_returns",
            "must contain only finite values",
        ));
    }

    if let Some(p) = asset.metadata.popularity {
        percent(&mut v, "metadata.popularity", p);
    }

    if v.is_empty() {
        Ok(())
    } else {
        Err(MatchingError::invalid_asset(&asset.id, v))
    }
}

/// Decodes one raw feed record and validates it. Missing or mistyped fields surface as
/// `InvalidAsset` rather than aborting the batch.
pub fn decode_asset(raw: Value) -> Result<Asset, MatchingError> {
    let asset_id = raw_id(&raw);
    let mut asset: Asset = serde_json::from_value(raw).map_err(|e| {
        MatchingError::invalid_asset(&asset_id, vec![FieldViolation::new("record", e.to_string())])
    })?;
    asset.id = asset.id.trim().to_string();
    validate_asset(&asset)?;
    Ok(asset)
}

/// Decodes a submitted profile document. Shape errors come back as `InvalidProfile` so callers
/// see the same field-level error as for a failed invariant; invariants are checked on upsert.
pub fn decode_profile(raw: Value) -> Result<InvestorProfile, MatchingError> {
    let profile_id = raw_id(&raw);
    let mut profile: InvestorProfile = serde_json::from_value(raw).map_err(|e| {
        MatchingError::invalid_profile(&profile_id, vec![FieldViolation::new("record", e.to_string())])
    })?;
    profile.id = profile.id.trim().to_string();
    Ok(profile)
}

fn raw_id(raw: &Value) -> String {
    raw.get("id")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_ID.to_string())
}

fn finite(v: &mut Vec<FieldViolation>, field: &str, value: f64) -> bool {
    if value.is_finite() {
        true
    } else {
        v.push(FieldViolation::new(field, "must be a finite number"));
        false
    }
}

fn non_negative(v: &mut Vec<FieldViolation>, field: &str, value: f64) -> bool {
    if !finite(v, field, value) {
        return false;
    }
    if value < 0.0 {
        v.push(FieldViolation::new(field, format!("must be >= 0 (got {value})")));
        return false;
    }
    true
}

fn percent(v: &mut Vec<FieldViolation>, field: &str, value: f64) -> bool {
    if !finite(v, field, value) {
        return false;
    }
    if !(0.0..=100.0).contains(&value) {
        v.push(FieldViolation::new(field, format!("must be within [0, 100] (got {value})")));
        return false;
    }
    true
}
