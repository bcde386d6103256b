use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rwa_match_core::domain::feedback::FeedbackRecord;
use rwa_match_core::domain::profile::InvestorProfile;
use rwa_match_core::domain::recommendation::MatchingRecommendation;
use rwa_match_core::domain::contract::decode_profile;
use rwa_match_core::engine::{CatalogLoad, SegmentSnapshot, DEFAULT_CACHE_CAPACITY};
use rwa_match_core::error::FieldViolation;
use rwa_match_core::metrics::MatchingMetrics;
use rwa_match_core::storage::assets::PgAssetCatalog;
use rwa_match_core::storage::feedback::PgFeedbackSink;
use rwa_match_core::storage::profiles::PgProfileRepository;
use rwa_match_core::storage::CatalogSnapshot;
use rwa_match_core::{MatchingEngine, MatchingError, ScoringConfig};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

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

    let scoring = ScoringConfig::from_env()?;
    tracing::info!(scoring_version = scoring.version, floor = scoring.acceptance_floor, "scoring config loaded");

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match rwa_match_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; serving from in-memory store");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; serving from in-memory store");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; serving from in-memory store");
            None
        }
    };

    let engine = match &pool {
        Some(pool) => {
            let engine = MatchingEngine::new(
                Arc::new(PgProfileRepository::new(pool.clone())),
                Arc::new(PgAssetCatalog::new(pool.clone(), "api")),
                Arc::new(PgFeedbackSink::new(pool.clone())),
                scoring,
            );
            match rwa_match_core::storage::clusters::fetch_latest(pool).await {
                Ok(Some((snapshot_id, generated_at, clusters))) => {
                    tracing::info!(%snapshot_id, %generated_at, "seeded segments from last snapshot");
                    let profile_count = clusters.iter().map(|c| c.member_count).sum();
                    engine
                        .publish_segments(Arc::new(SegmentSnapshot {
                            generated_at: Some(generated_at),
                            profile_count,
                            clusters,
                        }))
                        .await;
                }
                Ok(None) => {}
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "failed to load last segment snapshot");
                }
            }
            engine
        }
        None => MatchingEngine::in_memory(scoring),
    };

    let cache_capacity: usize = std::env::var("RECOMMENDATION_CACHE_CAPACITY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CACHE_CAPACITY);

    let state = AppState {
        engine: Arc::new(engine.with_cache_capacity(cache_capacity)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/profiles", get(list_profiles))
        .route("/profiles/:profile_id", put(upsert_profile).get(get_profile))
        .route("/profiles/:profile_id/history", get(get_profile_history))
        .route(
            "/profiles/:profile_id/recommendations",
            get(get_recommendations),
        )
        .route(
            "/profiles/:profile_id/feedback",
            post(post_feedback).get(get_feedback),
        )
        .route("/segments", get(get_segments))
        .route("/segments/refresh", post(refresh_segments))
        .route("/assets", put(put_assets).get(get_assets))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, persistent = pool.is_some(), "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    engine: Arc<MatchingEngine>,
}

struct ApiError(MatchingError);

impl From<MatchingError> for ApiError {
    fn from(e: MatchingError) -> Self {
        Self(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    violations: &'a [FieldViolation],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MatchingError::InvalidProfile { .. }
            | MatchingError::InvalidAsset { .. }
            | MatchingError::InvalidRating(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MatchingError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            MatchingError::ScoringTask(_) | MatchingError::Storage(_) => {
                let err = anyhow::anyhow!("{}", self.0);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.0.to_string(),
            violations: self.0.violations(),
        };
        (status, Json(body)).into_response()
    }
}

async fn upsert_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
    Json(raw): Json<Value>,
) -> Result<Json<InvestorProfile>, ApiError> {
    let mut profile = decode_profile(raw)?;
    if profile.id.is_empty() {
        profile.id = profile_id.clone();
    }
    if profile.id.trim() != profile_id.trim() {
        return Err(MatchingError::invalid_profile(
            &profile_id,
            vec![FieldViolation::new(
                "id",
                format!("body id {:?} does not match path id", profile.id),
            )],
        )
        .into());
    }

    let stored = state.engine.upsert_profile(profile).await?;
    Ok(Json((*stored).clone()))
}

async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvestorProfile>>, ApiError> {
    let profiles = state.engine.profiles().await?;
    Ok(Json(profiles.iter().map(|p| (**p).clone()).collect()))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<InvestorProfile>, ApiError> {
    let profile = state.engine.profile(&profile_id).await?;
    Ok(Json((*profile).clone()))
}

async fn get_profile_history(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<Vec<InvestorProfile>>, ApiError> {
    let history = state.engine.profile_history(&profile_id).await?;
    Ok(Json(history.iter().map(|p| (**p).clone()).collect()))
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    limit: Option<usize>,
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Vec<MatchingRecommendation>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let recs = state.engine.recommend(&profile_id, limit).await?;
    Ok(Json(recs))
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    asset_id: String,
    rating: i64,
    comment: Option<String>,
}

async fn post_feedback(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRecord>), ApiError> {
    let record = state
        .engine
        .record_feedback(&profile_id, &req.asset_id, req.rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_feedback(
    State(state): State<AppState>,
    Path(profile_id): Path<String>,
) -> Result<Json<Vec<FeedbackRecord>>, ApiError> {
    Ok(Json(state.engine.feedback_for(&profile_id).await?))
}

async fn get_segments(State(state): State<AppState>) -> Result<Json<SegmentSnapshot>, ApiError> {
    let current = state.engine.segments().await;
    if current.generated_at.is_some() {
        return Ok(Json((*current).clone()));
    }
    let fresh = state.engine.refresh_segments().await?;
    Ok(Json((*fresh).clone()))
}

async fn refresh_segments(
    State(state): State<AppState>,
) -> Result<Json<SegmentSnapshot>, ApiError> {
    let fresh = state.engine.refresh_segments().await?;
    Ok(Json((*fresh).clone()))
}

async fn put_assets(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<CatalogLoad>, Response> {
    let feed = rwa_match_core::ingest::provider::parse_feed_body(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{e:#}")).into_response())?;
    let load = state
        .engine
        .load_catalog(feed.items)
        .await
        .map_err(|e| ApiError(e).into_response())?;
    Ok(Json(load))
}

async fn get_assets(State(state): State<AppState>) -> Result<Json<CatalogSnapshot>, ApiError> {
    let catalog = state.engine.assets().await?;
    Ok(Json((*catalog).clone()))
}

async fn get_metrics(State(state): State<AppState>) -> Result<Json<MatchingMetrics>, ApiError> {
    Ok(Json(state.engine.metrics().await?))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
