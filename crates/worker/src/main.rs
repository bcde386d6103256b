use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rwa_match_core::ingest::provider::{AssetFeedClient, FileAssetFeed, HttpJsonAssetFeed};
use rwa_match_core::storage::assets::PgAssetCatalog;
use rwa_match_core::storage::lock::{try_acquire_job_lock, Job};
use rwa_match_core::storage::profiles::PgProfileRepository;
use rwa_match_core::storage::{AssetCatalog, ProfileRepository};

#[derive(Debug, Parser)]
#[command(name = "rwa_match_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pull the asset feed, drop malformed records and publish a new catalog version.
    IngestAssets {
        /// Read a feed export from disk instead of ASSET_FEED_BASE_URL.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Fetch and validate only; do not write to the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Recompute investor segments and persist them as one snapshot.
    Segment {
        /// Compute and log only; do not persist the snapshot.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = rwa_match_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = match args.command {
        Command::IngestAssets { file, dry_run } => ingest_assets(&settings, file, dry_run).await,
        Command::Segment { dry_run } => segment(&settings, dry_run).await,
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker job failed");
    }
    res
}

async fn ingest_assets(
    settings: &rwa_match_core::config::Settings,
    file: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let feed: Box<dyn AssetFeedClient> = match file {
        Some(path) => Box::new(FileAssetFeed::new(path)),
        None => Box::new(HttpJsonAssetFeed::from_settings(settings)?),
    };

    let response = feed.fetch_assets().await?;
    let batch = rwa_match_core::ingest::partition_records(response.items);

    tracing::info!(
        provider = feed.provider_name(),
        generated_at = %response.generated_at,
        accepted = batch.accepted.len(),
        rejected = batch.rejected.len(),
        dry_run,
        "asset feed decoded"
    );

    if dry_run {
        return Ok(());
    }

    anyhow::ensure!(
        !batch.accepted.is_empty(),
        "asset feed produced no valid records ({} rejected); keeping current catalog",
        batch.rejected.len()
    );

    let pool = connect(settings).await?;
    let Some(lock) = try_acquire_job_lock(&pool, Job::CatalogIngest).await? else {
        tracing::warn!("catalog ingest lock not acquired; another run in progress");
        return Ok(());
    };

    let catalog = PgAssetCatalog::new(pool.clone(), feed.provider_name());
    let rejected = batch.rejected.len();
    let accepted = batch.accepted;
    let res = async move {
        let version = catalog.replace(accepted).await?;
        catalog.record_rejections(version, rejected).await?;
        anyhow::Ok(version)
    }
    .await;

    let _ = lock.release().await;
    let version = res?;
    tracing::info!(version, rejected, "published asset catalog version");
    Ok(())
}

async fn segment(settings: &rwa_match_core::config::Settings, dry_run: bool) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    let Some(lock) = try_acquire_job_lock(&pool, Job::Segmentation).await? else {
        tracing::warn!("segmentation lock not acquired; another run in progress");
        return Ok(());
    };

    let res = async {
        let repo = PgProfileRepository::new(pool.clone());
        let profiles: Vec<_> = repo
            .list_latest()
            .await?
            .iter()
            .map(|p| (**p).clone())
            .collect();
        let generated_at = chrono::Utc::now();
        let clusters = rwa_match_core::segmentation::segment(&profiles);

        for c in &clusters {
            tracing::info!(
                cluster_id = %c.cluster_id,
                member_count = c.member_count,
                avg_risk_score = c.characteristics.avg_risk_score,
                "segment computed"
            );
        }

        if dry_run {
            tracing::info!(profile_count = profiles.len(), dry_run, "segmentation complete");
            return anyhow::Ok(());
        }

        let snapshot_id = rwa_match_core::storage::clusters::persist_snapshot(
            &pool,
            generated_at,
            profiles.len(),
            &clusters,
        )
        .await?;
        tracing::info!(%snapshot_id, profile_count = profiles.len(), "persisted segment snapshot");
        anyhow::Ok(())
    }
    .await;

    let _ = lock.release().await;
    res
}

async fn connect(settings: &rwa_match_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;
    rwa_match_core::storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &rwa_match_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
