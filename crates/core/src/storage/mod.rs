use crate::domain::asset::Asset;
use crate::domain::feedback::FeedbackRecord;
use crate::domain::profile::InvestorProfile;
use anyhow::Context;
use std::sync::Arc;

pub mod assets;
pub mod clusters;
pub mod feedback;
pub mod lock;
pub mod memory;
pub mod profiles;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Versioned investor profiles. An upsert stores a new version under the same id; earlier
/// versions are kept, never deleted.
#[async_trait::async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Stores `profile` as the newest version of its id and returns it with the assigned
    /// `version` and `updated_at`.
    async fn upsert(&self, profile: InvestorProfile) -> anyhow::Result<Arc<InvestorProfile>>;

    async fn get(&self, id: &str) -> anyhow::Result<Option<Arc<InvestorProfile>>>;

    /// All stored versions of `id`, oldest first.
    async fn history(&self, id: &str) -> anyhow::Result<Vec<Arc<InvestorProfile>>>;

    /// Latest version of every profile, ordered by id.
    async fn list_latest(&self) -> anyhow::Result<Vec<Arc<InvestorProfile>>>;
}

/// A whole catalog as loaded at one point in time.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CatalogSnapshot {
    /// 0 until the first load.
    pub version: u64,
    pub assets: Vec<Asset>,
}

#[async_trait::async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<Arc<CatalogSnapshot>>;

    /// Atomically replaces the catalog and returns the new version.
    async fn replace(&self, assets: Vec<Asset>) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackSummary {
    pub count: u64,
    pub avg_rating: Option<f64>,
}

/// Append-only store of investor ratings.
#[async_trait::async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn append(&self, record: FeedbackRecord) -> anyhow::Result<()>;

    async fn list_for_profile(&self, profile_id: &str) -> anyhow::Result<Vec<FeedbackRecord>>;

    async fn summary(&self) -> anyhow::Result<FeedbackSummary>;
}
