use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// Advisory locks are scoped to the Postgres session, so the guard keeps its connection
// checked out until release.
const LOCK_NAMESPACE: i64 = 0x5257_414D_4154; // "RWAMAT"

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    CatalogIngest,
    Segmentation,
}

impl Job {
    fn key(self) -> i64 {
        let id = match self {
            Job::CatalogIngest => 1,
            Job::Segmentation => 2,
        };
        LOCK_NAMESPACE ^ id
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Job::CatalogIngest => "catalog_ingest",
            Job::Segmentation => "segmentation",
        }
    }
}

#[derive(Debug)]
pub struct JobLock {
    conn: PoolConnection<Postgres>,
    job: Job,
}

/// Returns `None` when another session already holds the lock for `job`.
pub async fn try_acquire_job_lock(pool: &sqlx::PgPool, job: Job) -> anyhow::Result<Option<JobLock>> {
    let key = job.key();
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for advisory lock")?;

    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (job={}, key={key})", job.as_str()))?;

    Ok(acquired.0.then_some(JobLock { conn, job }))
}

impl JobLock {
    pub async fn release(mut self) -> anyhow::Result<()> {
        let key = self.job.key();
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (job={}, key={key})", self.job.as_str()))?;
        Ok(())
    }
}
