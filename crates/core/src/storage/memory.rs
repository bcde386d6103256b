use crate::domain::asset::Asset;
use crate::domain::feedback::FeedbackRecord;
use crate::domain::profile::InvestorProfile;
use crate::storage::{
    AssetCatalog, CatalogSnapshot, FeedbackSink, FeedbackSummary, ProfileRepository,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    // Versions per id, oldest first. Whole profiles are swapped in under the write lock so
    // readers see either the previous or the new version.
    profiles: RwLock<BTreeMap<String, Vec<Arc<InvestorProfile>>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn upsert(&self, mut profile: InvestorProfile) -> anyhow::Result<Arc<InvestorProfile>> {
        let mut guard = self.profiles.write().await;
        let versions = guard.entry(profile.id.clone()).or_default();
        profile.version = versions.last().map(|p| p.version + 1).unwrap_or(1);
        profile.updated_at = Utc::now();
        let stored = Arc::new(profile);
        versions.push(Arc::clone(&stored));
        Ok(stored)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Arc<InvestorProfile>>> {
        let guard = self.profiles.read().await;
        Ok(guard.get(id).and_then(|v| v.last()).cloned())
    }

    async fn history(&self, id: &str) -> anyhow::Result<Vec<Arc<InvestorProfile>>> {
        let guard = self.profiles.read().await;
        Ok(guard.get(id).cloned().unwrap_or_default())
    }

    async fn list_latest(&self) -> anyhow::Result<Vec<Arc<InvestorProfile>>> {
        let guard = self.profiles.read().await;
        Ok(guard.values().filter_map(|v| v.last()).cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAssetCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl InMemoryAssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AssetCatalog for InMemoryAssetCatalog {
    async fn snapshot(&self) -> anyhow::Result<Arc<CatalogSnapshot>> {
        Ok(Arc::clone(&*self.current.read().await))
    }

    async fn replace(&self, mut assets: Vec<Asset>) -> anyhow::Result<u64> {
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        let mut guard = self.current.write().await;
        let version = guard.version + 1;
        *guard = Arc::new(CatalogSnapshot { version, assets });
        Ok(version)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFeedbackSink {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl FeedbackSink for InMemoryFeedbackSink {
    async fn append(&self, record: FeedbackRecord) -> anyhow::Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_for_profile(&self, profile_id: &str) -> anyhow::Result<Vec<FeedbackRecord>> {
        let guard = self.records.read().await;
        Ok(guard
            .iter()
            .filter(|r| r.profile_id == profile_id)
            .cloned()
            .collect())
    }

    async fn summary(&self) -> anyhow::Result<FeedbackSummary> {
        let guard = self.records.read().await;
        let count = guard.len() as u64;
        let avg_rating = (count > 0).then(|| {
            guard.iter().map(|r| f64::from(r.rating.get())).sum::<f64>() / count as f64
        });
        Ok(FeedbackSummary { count, avg_rating })
    }
}
