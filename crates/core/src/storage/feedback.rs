use crate::domain::feedback::{FeedbackRecord, Rating};
use crate::storage::{FeedbackSink, FeedbackSummary};
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgFeedbackSink {
    pool: sqlx::PgPool,
}

impl PgFeedbackSink {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackSink for PgFeedbackSink {
    async fn append(&self, record: FeedbackRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO recommendation_feedback (id, profile_id, asset_id, rating, comment, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(&record.profile_id)
        .bind(&record.asset_id)
        .bind(i16::from(record.rating.get()))
        .bind(&record.comment)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .context("insert recommendation_feedback failed")?;
        Ok(())
    }

    async fn list_for_profile(&self, profile_id: &str) -> anyhow::Result<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, i16, Option<String>, DateTime<Utc>)>(
            "SELECT id, profile_id, asset_id, rating, comment, recorded_at \
             FROM recommendation_feedback \
             WHERE profile_id = $1 \
             ORDER BY recorded_at ASC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select recommendation_feedback failed (profile_id={profile_id})"))?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, profile_id, asset_id, rating, comment, recorded_at) in rows {
            let rating = Rating::new(i64::from(rating))
                .with_context(|| format!("invalid rating in DB for feedback id={id}"))?;
            out.push(FeedbackRecord {
                id,
                profile_id,
                asset_id,
                rating,
                comment,
                recorded_at,
            });
        }
        Ok(out)
    }

    async fn summary(&self) -> anyhow::Result<FeedbackSummary> {
        let (count, avg_rating): (i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*), AVG(rating)::float8 FROM recommendation_feedback",
        )
        .fetch_one(&self.pool)
        .await
        .context("summarize recommendation_feedback failed")?;

        Ok(FeedbackSummary {
            count: count as u64,
            avg_rating,
        })
    }
}
