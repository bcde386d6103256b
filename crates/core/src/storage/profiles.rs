use crate::domain::profile::InvestorProfile;
use crate::storage::ProfileRepository;
use anyhow::Context;
use chrono::Utc;
use sqlx::types::Json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PgProfileRepository {
    pool: sqlx::PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn upsert(&self, mut profile: InvestorProfile) -> anyhow::Result<Arc<InvestorProfile>> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        // Serialize writers per profile id; the lock is released on commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .persistent(false)
            .bind(&profile.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to lock profile {}", profile.id))?;

        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM investor_profiles WHERE id = $1",
        )
        .bind(&profile.id)
        .fetch_one(&mut *tx)
        .await
        .context("select next profile version failed")?;

        profile.version = next as u64;
        profile.updated_at = Utc::now();

        sqlx::query(
            "INSERT INTO investor_profiles (id, version, updated_at, risk_tolerance, profile) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&profile.id)
        .bind(next)
        .bind(profile.updated_at)
        .bind(profile.risk_profile.risk_tolerance.as_str())
        .bind(Json(&profile))
        .execute(&mut *tx)
        .await
        .context("insert investor_profiles failed")?;

        tx.commit().await.context("commit transaction failed")?;

        tracing::debug!(profile_id = %profile.id, version = next, "stored profile version");
        Ok(Arc::new(profile))
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Arc<InvestorProfile>>> {
        let row = sqlx::query_as::<_, (Json<InvestorProfile>,)>(
            "SELECT profile FROM investor_profiles \
             WHERE id = $1 \
             ORDER BY version DESC \
             LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select investor_profiles failed (id={id})"))?;

        Ok(row.map(|(Json(p),)| Arc::new(p)))
    }

    async fn history(&self, id: &str) -> anyhow::Result<Vec<Arc<InvestorProfile>>> {
        let rows = sqlx::query_as::<_, (Json<InvestorProfile>,)>(
            "SELECT profile FROM investor_profiles \
             WHERE id = $1 \
             ORDER BY version ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select profile history failed (id={id})"))?;

        Ok(rows.into_iter().map(|(Json(p),)| Arc::new(p)).collect())
    }

    async fn list_latest(&self) -> anyhow::Result<Vec<Arc<InvestorProfile>>> {
        let rows = sqlx::query_as::<_, (Json<InvestorProfile>,)>(
            "SELECT DISTINCT ON (id) profile FROM investor_profiles \
             ORDER BY id ASC, version DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("select latest investor_profiles failed")?;

        Ok(rows.into_iter().map(|(Json(p),)| Arc::new(p)).collect())
    }
}
