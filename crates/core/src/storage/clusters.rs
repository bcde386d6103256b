use crate::domain::cluster::ClusterAnalysis;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

/// Persists a full segmentation result in one transaction so readers never see a partial set.
pub async fn persist_snapshot(
    pool: &sqlx::PgPool,
    generated_at: DateTime<Utc>,
    profile_count: usize,
    clusters: &[ClusterAnalysis],
) -> anyhow::Result<Uuid> {
    let total: usize = clusters.iter().map(|c| c.member_count).sum();
    anyhow::ensure!(
        total == profile_count,
        "cluster member counts ({total}) do not add up to profile count ({profile_count})"
    );

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let snapshot_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO cluster_snapshots (id, generated_at, profile_count) \
         VALUES ($1, $2, $3)",
    )
    .bind(snapshot_id)
    .bind(generated_at)
    .bind(profile_count as i32)
    .execute(&mut *tx)
    .await
    .context("insert cluster_snapshots failed")?;

    for (position, cluster) in clusters.iter().enumerate() {
        sqlx::query(
            "INSERT INTO cluster_snapshot_items (snapshot_id, position, cluster_id, member_count, analysis) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(snapshot_id)
        .bind(position as i32)
        .bind(&cluster.cluster_id)
        .bind(cluster.member_count as i32)
        .bind(Json(cluster))
        .execute(&mut *tx)
        .await
        .context("insert cluster_snapshot_items failed")?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(snapshot_id)
}

/// Latest persisted segmentation, if any.
pub async fn fetch_latest(
    pool: &sqlx::PgPool,
) -> anyhow::Result<Option<(Uuid, DateTime<Utc>, Vec<ClusterAnalysis>)>> {
    let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
        "SELECT id, generated_at FROM cluster_snapshots \
         ORDER BY generated_at DESC \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("select cluster_snapshots failed")?;

    let Some((snapshot_id, generated_at)) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, (Json<ClusterAnalysis>,)>(
        "SELECT analysis FROM cluster_snapshot_items \
         WHERE snapshot_id = $1 \
         ORDER BY position ASC",
    )
    .bind(snapshot_id)
    .fetch_all(pool)
    .await
    .context("select cluster_snapshot_items failed")?;

    Ok(Some((
        snapshot_id,
        generated_at,
        items.into_iter().map(|(Json(c),)| c).collect(),
    )))
}
