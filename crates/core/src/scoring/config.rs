use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub risk: f64,
    pub preference: f64,
    pub financial: f64,
    pub geographic: f64,
}

impl ScoringWeights {
    fn validate(&self) -> anyhow::Result<()> {
        let all = [self.risk, self.preference, self.financial, self.geographic];
        ensure!(
            all.iter().all(|w| w.is_finite() && *w >= 0.0),
            "scoring weights must be finite and non-negative: {self:?}"
        );
        let sum: f64 = all.iter().sum();
        ensure!(
            (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE,
            "scoring weights must sum to 1 (got {sum})"
        );
        Ok(())
    }
}

/// Versioned scoring tunables. Any change to `weights` ships under a new `version` so that
/// stored scores stay interpretable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: u32,
    pub weights: ScoringWeights,
    /// Recommendations scoring at or below this are suppressed.
    pub acceptance_floor: u8,
    /// Added to preference alignment for ESG-strong assets when the investor asks for it.
    pub sustainability_bonus: f64,
    pub preference_cap: f64,
    pub confidence_cap: f64,
}

impl ScoringConfig {
    pub const LATEST_VERSION: u32 = 1;

    pub fn v1() -> Self {
        Self {
            version: 1,
            weights: ScoringWeights {
                risk: 0.30,
                preference: 0.25,
                financial: 0.25,
                geographic: 0.20,
            },
            acceptance_floor: 30,
            sustainability_bonus: 20.0,
            preference_cap: 100.0,
            confidence_cap: 0.95,
        }
    }

    pub fn for_version(version: u32) -> anyhow::Result<Self> {
        match version {
            1 => Ok(Self::v1()),
            other => bail!("unknown scoring config version: {other}"),
        }
    }

    /// Reads `SCORING_VERSION` (preset selection) and `MATCH_ACCEPTANCE_FLOOR` (override).
    pub fn from_env() -> anyhow::Result<Self> {
        let version = match std::env::var("SCORING_VERSION") {
            Ok(s) => s
                .trim()
                .parse::<u32>()
                .with_context(|| format!("SCORING_VERSION must be an integer (got {s:?})"))?,
            Err(_) => Self::LATEST_VERSION,
        };
        let mut config = Self::for_version(version)?;

        if let Ok(s) = std::env::var("MATCH_ACCEPTANCE_FLOOR") {
            config.acceptance_floor = s
                .trim()
                .parse::<u8>()
                .with_context(|| format!("MATCH_ACCEPTANCE_FLOOR must be 0..=100 (got {s:?})"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.weights.validate()?;
        ensure!(
            self.acceptance_floor <= 100,
            "acceptance_floor must be 0..=100 (got {})",
            self.acceptance_floor
        );
        ensure!(
            self.sustainability_bonus.is_finite() && self.sustainability_bonus >= 0.0,
            "sustainability_bonus must be >= 0"
        );
        ensure!(
            (0.0..=100.0).contains(&self.preference_cap),
            "preference_cap must be within [0, 100]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.confidence_cap),
            "confidence_cap must be within [0, 1]"
        );
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::v1()
    }
}
