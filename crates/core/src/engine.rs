use crate::domain::asset::Asset;
use crate::domain::cluster::ClusterAnalysis;
use crate::domain::contract::validate_profile;
use crate::domain::feedback::FeedbackRecord;
use crate::domain::profile::InvestorProfile;
use crate::domain::recommendation::MatchingRecommendation;
use crate::error::{MatchingError, Result};
use crate::ingest::{partition_assets, partition_records, FeedBatch};
use crate::metrics::{self, MatchingMetrics, MetricsInput};
use crate::ranking;
use crate::scoring::ScoringConfig;
use crate::segmentation;
use crate::storage::memory::{InMemoryAssetCatalog, InMemoryFeedbackSink, InMemoryProfileRepository};
use crate::storage::{AssetCatalog, CatalogSnapshot, FeedbackSink, ProfileRepository};
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Segmentation result published as one unit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SegmentSnapshot {
    pub generated_at: Option<DateTime<Utc>>,
    pub profile_count: usize,
    pub clusters: Vec<ClusterAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct CatalogLoad {
    pub version: u64,
    pub accepted: usize,
    #[serde(serialize_with = "serialize_errors")]
    pub rejected: Vec<MatchingError>,
}

fn serialize_errors<S: serde::Serializer>(
    errs: &[MatchingError],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_seq(errs.iter().map(|e| e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    profile_id: String,
    profile_version: u64,
    catalog_version: u64,
}

/// Request-facing facade over the repositories, the scorer and segmentation.
pub struct MatchingEngine {
    profiles: Arc<dyn ProfileRepository>,
    catalog: Arc<dyn AssetCatalog>,
    feedback: Arc<dyn FeedbackSink>,
    config: Arc<ScoringConfig>,
    segments: RwLock<Arc<SegmentSnapshot>>,
    cache: Mutex<LruCache<CacheKey, Arc<Vec<MatchingRecommendation>>>>,
}

impl MatchingEngine {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        catalog: Arc<dyn AssetCatalog>,
        feedback: Arc<dyn FeedbackSink>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            profiles,
            catalog,
            feedback,
            config: Arc::new(config),
            segments: RwLock::new(Arc::new(SegmentSnapshot::default())),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn in_memory(config: ScoringConfig) -> Self {
        Self::new(
            Arc::new(InMemoryProfileRepository::new()),
            Arc::new(InMemoryAssetCatalog::new()),
            Arc::new(InMemoryFeedbackSink::new()),
            config,
        )
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        self.cache = Mutex::new(LruCache::new(capacity));
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Validates and stores a complete profile as the newest version of its id. Rejected
    /// profiles are never partially stored.
    pub async fn upsert_profile(&self, mut profile: InvestorProfile) -> Result<Arc<InvestorProfile>> {
        profile.id = profile.id.trim().to_string();
        validate_profile(&profile)?;

        let stored = self.profiles.upsert(profile).await?;
        tracing::info!(profile_id = %stored.id, version = stored.version, "profile upserted");
        Ok(stored)
    }

    pub async fn profile(&self, profile_id: &str) -> Result<Arc<InvestorProfile>> {
        self.profiles
            .get(profile_id)
            .await?
            .ok_or_else(|| MatchingError::ProfileNotFound(profile_id.to_string()))
    }

    pub async fn profile_history(&self, profile_id: &str) -> Result<Vec<Arc<InvestorProfile>>> {
        let history = self.profiles.history(profile_id).await?;
        if history.is_empty() {
            return Err(MatchingError::ProfileNotFound(profile_id.to_string()));
        }
        Ok(history)
    }

    /// Top `limit` recommendations for the profile against the current catalog. Results are
    /// cached per (profile version, catalog version).
    pub async fn recommend(
        &self,
        profile_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchingRecommendation>> {
        let profile = self.profile(profile_id).await?;
        let catalog = self.catalog.snapshot().await?;
        let key = CacheKey {
            profile_id: profile.id.clone(),
            profile_version: profile.version,
            catalog_version: catalog.version,
        };

        if let Some(hit) = self.cache.lock().await.get(&key).cloned() {
            tracing::debug!(profile_id, catalog_version = key.catalog_version, "recommendation cache hit");
            return Ok(truncated(&hit, limit));
        }

        let ranked = Arc::new(self.rank(profile, catalog).await?);
        let out = truncated(&ranked, limit);
        self.cache.lock().await.put(key, ranked);
        Ok(out)
    }

    /// Same as [`recommend`](Self::recommend) against a caller-supplied catalog. Never cached:
    /// the snapshot's version says nothing about which assets it holds.
    pub async fn recommend_with_catalog(
        &self,
        profile_id: &str,
        catalog: Arc<CatalogSnapshot>,
        limit: usize,
    ) -> Result<Vec<MatchingRecommendation>> {
        let profile = self.profile(profile_id).await?;
        let ranked = self.rank(profile, catalog).await?;
        Ok(truncated(&ranked, limit))
    }

    async fn rank(
        &self,
        profile: Arc<InvestorProfile>,
        catalog: Arc<CatalogSnapshot>,
    ) -> Result<Vec<MatchingRecommendation>> {
        let config = Arc::clone(&self.config);
        let profile_id = profile.id.clone();
        let catalog_version = catalog.version;
        let t0 = std::time::Instant::now();
        let ranked = tokio::task::spawn_blocking(move || {
            ranking::rank_all(&profile, &catalog.assets, &config)
        })
        .await?;

        tracing::info!(
            profile_id = %profile_id,
            catalog_version,
            accepted = ranked.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "recommendations computed"
        );
        Ok(ranked)
    }

    /// Latest version of every stored profile, ordered by id.
    pub async fn profiles(&self) -> Result<Vec<Arc<InvestorProfile>>> {
        Ok(self.profiles.list_latest().await?)
    }

    /// The current catalog snapshot.
    pub async fn assets(&self) -> Result<Arc<CatalogSnapshot>> {
        Ok(self.catalog.snapshot().await?)
    }

    /// Decodes raw feed records, drops the invalid ones and replaces the catalog with the rest.
    pub async fn load_catalog(&self, records: Vec<Value>) -> Result<CatalogLoad> {
        self.publish_catalog(partition_records(records)).await
    }

    /// Replaces the catalog with already-decoded assets, skipping any that fail validation or
    /// repeat an earlier id.
    pub async fn replace_catalog(&self, assets: Vec<Asset>) -> Result<CatalogLoad> {
        self.publish_catalog(partition_assets(assets)).await
    }

    async fn publish_catalog(&self, batch: FeedBatch) -> Result<CatalogLoad> {
        let FeedBatch { accepted, rejected } = batch;
        let accepted_len = accepted.len();
        let version = self.catalog.replace(accepted).await?;

        tracing::info!(
            version,
            accepted = accepted_len,
            rejected = rejected.len(),
            "asset catalog replaced"
        );
        Ok(CatalogLoad {
            version,
            accepted: accepted_len,
            rejected,
        })
    }

    /// Recomputes segments from a snapshot of all latest profiles and publishes them at once.
    pub async fn refresh_segments(&self) -> Result<Arc<SegmentSnapshot>> {
        let profiles = self.profiles.list_latest().await?;
        let owned: Vec<InvestorProfile> = profiles.iter().map(|p| (**p).clone()).collect();
        let clusters = segmentation::segment(&owned);

        let snapshot = Arc::new(SegmentSnapshot {
            generated_at: Some(Utc::now()),
            profile_count: owned.len(),
            clusters,
        });
        self.publish_segments(Arc::clone(&snapshot)).await;

        tracing::info!(
            profile_count = snapshot.profile_count,
            cluster_count = snapshot.clusters.len(),
            "segments refreshed"
        );
        Ok(snapshot)
    }

    pub async fn publish_segments(&self, snapshot: Arc<SegmentSnapshot>) {
        *self.segments.write().await = snapshot;
    }

    pub async fn segments(&self) -> Arc<SegmentSnapshot> {
        Arc::clone(&*self.segments.read().await)
    }

    /// Appends a rating. Does not influence scoring.
    pub async fn record_feedback(
        &self,
        profile_id: &str,
        asset_id: &str,
        rating: i64,
        comment: Option<String>,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::new(profile_id, asset_id, rating, comment)?;
        self.feedback.append(record.clone()).await?;
        tracing::info!(
            profile_id = %record.profile_id,
            asset_id = %record.asset_id,
            rating = record.rating.get(),
            "feedback recorded"
        );
        Ok(record)
    }

    pub async fn feedback_for(&self, profile_id: &str) -> Result<Vec<FeedbackRecord>> {
        Ok(self.feedback.list_for_profile(profile_id).await?)
    }

    pub async fn metrics(&self) -> Result<MatchingMetrics> {
        let profiles = self.profiles.list_latest().await?;
        let catalog = self.catalog.snapshot().await?;
        let feedback = self.feedback.summary().await?;
        let cluster_count = self.segments().await.clusters.len();
        let config = Arc::clone(&self.config);

        let metrics = tokio::task::spawn_blocking(move || {
            metrics::compute(MetricsInput {
                profiles: &profiles,
                assets: &catalog.assets,
                catalog_version: catalog.version,
                cluster_count,
                feedback,
                config: &config,
            })
        })
        .await?;
        Ok(metrics)
    }
}

fn truncated(ranked: &[MatchingRecommendation], limit: usize) -> Vec<MatchingRecommendation> {
    ranked.iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{asset, profile, profile_with_risk};
    use crate::domain::profile::RiskTolerance;

    async fn engine_with_catalog(assets: Vec<Asset>) -> MatchingEngine {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        engine.replace_catalog(assets).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn recommend_unknown_profile_is_not_found() {
        let engine = engine_with_catalog(vec![asset("a1")]).await;
        let err = engine.recommend("nobody", 10).await.unwrap_err();
        assert!(matches!(err, MatchingError::ProfileNotFound(id) if id == "nobody"));
    }

    #[tokio::test]
    async fn recommend_with_empty_catalog_is_empty() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        engine.upsert_profile(profile("p1")).await.unwrap();
        assert!(engine.recommend("p1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_profile_is_not_stored() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        let mut p = profile("p1");
        p.preferences.investment_amount.preferred = 1_000_000.0;
        let err = engine.upsert_profile(p).await.unwrap_err();
        assert_eq!(err.violations()[0].field, "preferences.investment_amount");
        assert!(matches!(
            engine.profile("p1").await,
            Err(MatchingError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_invalidates_cached_recommendations() {
        let mut far = asset("far");
        far.financial_metrics.risk_score = 90.0;
        let engine = engine_with_catalog(vec![asset("near"), far]).await;
        engine.upsert_profile(profile("p1")).await.unwrap();

        let first = engine.recommend("p1", 10).await.unwrap();
        assert_eq!(first[0].asset_id, "near");
        assert_eq!(engine.recommend("p1", 10).await.unwrap(), first);

        let updated = profile_with_risk("p1", RiskTolerance::Aggressive, 90.0);
        let stored = engine.upsert_profile(updated).await.unwrap();
        assert_eq!(stored.version, 2);

        let second = engine.recommend("p1", 10).await.unwrap();
        assert_eq!(second[0].asset_id, "far");
    }

    #[tokio::test]
    async fn catalog_reload_reports_rejects_and_keeps_the_rest() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        engine.upsert_profile(profile("p1")).await.unwrap();

        let mut bad = serde_json::to_value(asset("bad")).unwrap();
        bad["financial_metrics"]["risk_score"] = serde_json::json!(-3);
        let good = serde_json::to_value(asset("good")).unwrap();

        let load = engine.load_catalog(vec![bad, good]).await.unwrap();
        assert_eq!((load.version, load.accepted, load.rejected.len()), (1, 1, 1));

        let recs = engine.recommend("p1", 5).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].asset_id, "good");
    }

    #[tokio::test]
    async fn explicit_catalog_is_scored_even_when_its_version_matches_the_stored_one() {
        let engine = engine_with_catalog(vec![asset("stored")]).await;
        engine.upsert_profile(profile("p1")).await.unwrap();

        let stored = engine.recommend("p1", 10).await.unwrap();
        assert_eq!(stored[0].asset_id, "stored");

        let other = Arc::new(CatalogSnapshot {
            version: 1,
            assets: vec![asset("other")],
        });
        let recs = engine.recommend_with_catalog("p1", other, 10).await.unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["other"]);

        // The stored catalog's cached entry is untouched.
        assert_eq!(engine.recommend("p1", 10).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn replace_catalog_rejects_repeated_ids() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        engine.upsert_profile(profile("p1")).await.unwrap();

        let mut padded = asset("a1");
        padded.id = " a1".to_string();
        let load = engine
            .replace_catalog(vec![asset("a1"), padded, asset("a2")])
            .await
            .unwrap();
        assert_eq!((load.accepted, load.rejected.len()), (2, 1));

        let recs = engine.recommend("p1", 10).await.unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn lists_profiles_and_assets() {
        let engine = engine_with_catalog(vec![asset("b"), asset("a")]).await;
        engine.upsert_profile(profile("p2")).await.unwrap();
        engine.upsert_profile(profile("p1")).await.unwrap();
        engine.upsert_profile(profile("p1")).await.unwrap();

        let profiles = engine.profiles().await.unwrap();
        let ids: Vec<_> = profiles.iter().map(|p| (p.id.as_str(), p.version)).collect();
        assert_eq!(ids, vec![("p1", 2), ("p2", 1)]);

        let catalog = engine.assets().await.unwrap();
        assert_eq!(catalog.version, 1);
        let ids: Vec<_> = catalog.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn single_entry_cache_still_serves_every_profile() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1()).with_cache_capacity(0);
        engine.replace_catalog(vec![asset("a1")]).await.unwrap();
        engine.upsert_profile(profile("p1")).await.unwrap();
        engine.upsert_profile(profile("p2")).await.unwrap();

        for id in ["p1", "p2", "p1"] {
            let recs = engine.recommend(id, 10).await.unwrap();
            assert_eq!(recs.len(), 1);
        }
        assert_eq!(engine.cache.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn explicit_catalog_snapshot_is_scored() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        engine.upsert_profile(profile("p1")).await.unwrap();
        let snapshot = Arc::new(CatalogSnapshot {
            version: 0,
            assets: vec![asset("x")],
        });
        let recs = engine
            .recommend_with_catalog("p1", snapshot, 10)
            .await
            .unwrap();
        assert_eq!(recs.len(), 1);
    }

    #[tokio::test]
    async fn segments_publish_whole_snapshot() {
        let engine = MatchingEngine::in_memory(ScoringConfig::v1());
        assert!(engine.segments().await.clusters.is_empty());

        for (id, tol, score) in [
            ("c1", RiskTolerance::Conservative, 30.0),
            ("m1", RiskTolerance::Moderate, 55.0),
            ("a1", RiskTolerance::Aggressive, 85.0),
            ("a2", RiskTolerance::Aggressive, 75.0),
        ] {
            engine
                .upsert_profile(profile_with_risk(id, tol, score))
                .await
                .unwrap();
        }
        // A superseded version must not be double counted.
        engine
            .upsert_profile(profile_with_risk("a2", RiskTolerance::Aggressive, 95.0))
            .await
            .unwrap();

        let snapshot = engine.refresh_segments().await.unwrap();
        assert_eq!(snapshot.profile_count, 4);
        let total: usize = snapshot.clusters.iter().map(|c| c.member_count).sum();
        assert_eq!(total, 4);
        assert_eq!(engine.segments().await.clusters, snapshot.clusters);
    }

    #[tokio::test]
    async fn feedback_validates_rating_and_feeds_metrics() {
        let engine = engine_with_catalog(vec![asset("a1")]).await;
        engine.upsert_profile(profile("p1")).await.unwrap();

        assert!(matches!(
            engine.record_feedback("p1", "a1", 6, None).await,
            Err(MatchingError::InvalidRating(6))
        ));
        engine.record_feedback("p1", "a1", 4, None).await.unwrap();
        engine
            .record_feedback("p1", "a1", 2, Some("too illiquid".to_string()))
            .await
            .unwrap();

        assert_eq!(engine.feedback_for("p1").await.unwrap().len(), 2);

        let m = engine.metrics().await.unwrap();
        assert_eq!(m.total_profiles, 1);
        assert_eq!(m.total_assets, 1);
        assert_eq!(m.feedback_count, 2);
        assert_eq!(m.avg_feedback_rating, Some(3.0));
        assert_eq!(m.avg_match_score, Some(95.0));
    }
}
