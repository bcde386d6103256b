use serde::Serialize;
use std::fmt;

/// One violated invariant on a submitted record, addressed by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(pub Vec<FieldViolation>);

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("invalid profile {profile_id}: {violations}")]
    InvalidProfile {
        profile_id: String,
        violations: Violations,
    },

    #[error("invalid asset {asset_id}: {violations}")]
    InvalidAsset {
        asset_id: String,
        violations: Violations,
    },

    #[error("investor profile not found: {0}")]
    ProfileNotFound(String),

    #[error("rating must be between 1 and 5 (got {0})")]
    InvalidRating(i64),

    #[error("scoring task failed: {0}")]
    ScoringTask(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl MatchingError {
    pub fn invalid_profile(profile_id: &str, violations: Vec<FieldViolation>) -> Self {
        MatchingError::InvalidProfile {
            profile_id: profile_id.to_string(),
            violations: Violations(violations),
        }
    }

    pub fn invalid_asset(asset_id: &str, violations: Vec<FieldViolation>) -> Self {
        MatchingError::InvalidAsset {
            asset_id: asset_id.to_string(),
            violations: Violations(violations),
        }
    }

    /// Field-level detail for validation failures; empty for the other variants.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            MatchingError::InvalidProfile { violations, .. }
            | MatchingError::InvalidAsset { violations, .. } => &violations.0,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchingError>;
