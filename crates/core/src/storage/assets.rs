use crate::domain::asset::Asset;
use crate::storage::{AssetCatalog, CatalogSnapshot};
use anyhow::Context;
use chrono::Utc;
use sqlx::types::Json;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_INSERT_BATCH: usize = 200;

/// Postgres-backed catalog. Every load is a new immutable version; readers hold on to the
/// snapshot they were given while newer versions land.
#[derive(Debug)]
pub struct PgAssetCatalog {
    pool: sqlx::PgPool,
    source: String,
    cached: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl PgAssetCatalog {
    pub fn new(pool: sqlx::PgPool, source: impl Into<String>) -> Self {
        Self {
            pool,
            source: source.into(),
            cached: RwLock::new(None),
        }
    }

    async fn latest_version(&self) -> anyhow::Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT version FROM asset_catalog_versions ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("select asset_catalog_versions failed")
    }

    async fn load_version(&self, version: i64) -> anyhow::Result<Vec<Asset>> {
        let rows = sqlx::query_as::<_, (Json<Asset>,)>(
            "SELECT asset FROM catalog_assets \
             WHERE catalog_version = $1 \
             ORDER BY asset_id ASC",
        )
        .bind(version)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select catalog_assets failed (version={version})"))?;

        Ok(rows.into_iter().map(|(Json(a),)| a).collect())
    }

    /// Records how many feed records were dropped for the given version.
    pub async fn record_rejections(&self, version: u64, rejected: usize) -> anyhow::Result<()> {
        sqlx::query("UPDATE asset_catalog_versions SET rejected_count = $2 WHERE version = $1")
            .bind(version as i64)
            .bind(rejected as i32)
            .execute(&self.pool)
            .await
            .context("update asset_catalog_versions failed")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssetCatalog for PgAssetCatalog {
    async fn snapshot(&self) -> anyhow::Result<Arc<CatalogSnapshot>> {
        let Some(version) = self.latest_version().await? else {
            return Ok(Arc::new(CatalogSnapshot::default()));
        };

        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.version == version as u64 {
                return Ok(Arc::clone(cached));
            }
        }

        let assets = self.load_version(version).await?;
        let snapshot = Arc::new(CatalogSnapshot {
            version: version as u64,
            assets,
        });
        *self.cached.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn replace(&self, assets: Vec<Asset>) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        let version: i64 = sqlx::query_scalar(
            "INSERT INTO asset_catalog_versions (loaded_at, source, record_count) \
             VALUES ($1, $2, $3) \
             RETURNING version",
        )
        .bind(Utc::now())
        .bind(&self.source)
        .bind(assets.len() as i32)
        .fetch_one(&mut *tx)
        .await
        .context("insert asset_catalog_versions failed")?;

        let chunk_size: usize = std::env::var("CATALOG_INSERT_BATCH")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_INSERT_BATCH);
        anyhow::ensure!(chunk_size >= 1, "CATALOG_INSERT_BATCH must be >= 1");

        for (batch_idx, chunk) in assets.chunks(chunk_size).enumerate() {
            let t0 = std::time::Instant::now();
            let mut qb = sqlx::QueryBuilder::new(
                "INSERT INTO catalog_assets (catalog_version, asset_id, asset) ",
            );
            qb.push_values(chunk, |mut b, asset| {
                b.push_bind(version)
                    .push_bind(asset.id.trim().to_string())
                    .push_bind(Json(asset.clone()));
            });

            qb.build()
                .persistent(false)
                .execute(&mut *tx)
                .await
                .context("batch insert catalog_assets failed")?;

            tracing::debug!(
                version,
                batch_idx,
                batch_size = chunk.len(),
                elapsed_ms = t0.elapsed().as_millis(),
                "catalog_assets batch insert"
            );
        }

        tx.commit().await.context("commit transaction failed")?;
        Ok(version as u64)
    }
}
