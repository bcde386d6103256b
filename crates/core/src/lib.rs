pub mod domain;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod ranking;
pub mod scoring;
pub mod segmentation;
pub mod storage;

pub use engine::MatchingEngine;
pub use error::MatchingError;
pub use scoring::ScoringConfig;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub asset_feed_base_url: Option<String>,
        pub asset_feed_api_key: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                asset_feed_base_url: non_empty_var("ASSET_FEED_BASE_URL"),
                asset_feed_api_key: non_empty_var("ASSET_FEED_API_KEY"),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_asset_feed_base_url(&self) -> anyhow::Result<&str> {
            self.asset_feed_base_url
                .as_deref()
                .context("ASSET_FEED_BASE_URL is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
