mod auth;
mod cache;
mod certificates;
mod config;
mod courses;
mod db;
mod errors;
mod insights;
mod interviews;
mod llm_client;
mod models;
mod rate_limit;
mod resumes;
mod routes;
mod state;
mod streak;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::MemoryCache;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::rate_limit::{MemoryRateLimiter, RedisRateLimiter, SharedRateLimiter};
use crate::routes::build_router;
use crate::state::AppState;

const INSIGHT_CACHE_CAPACITY: usize = 256;
const INSIGHT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("coach_api={},tower_http=info", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let rate_limiter = build_rate_limiter(&config).await?;

    let state = AppState {
        db,
        s3,
        llm,
        config: config.clone(),
        rate_limiter,
        insight_cache: MemoryCache::new(INSIGHT_CACHE_CAPACITY, INSIGHT_CACHE_TTL),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when `REDIS_URL` is set, otherwise per-process counters.
async fn build_rate_limiter(config: &Config) -> Result<SharedRateLimiter> {
    let window = Duration::from_secs(config.rate_limit_window_secs);
    let limiter: SharedRateLimiter = match &config.redis_url {
        Some(url) => Arc::new(
            RedisRateLimiter::connect(url, config.rate_limit_max_requests, window).await?,
        ),
        None => Arc::new(MemoryRateLimiter::new(config.rate_limit_max_requests, window)),
    };
    info!(
        "Rate limiter: {} requests per {}s ({})",
        config.rate_limit_max_requests,
        config.rate_limit_window_secs,
        if config.redis_url.is_some() { "redis" } else { "memory" }
    );
    Ok(limiter)
}

fn build_cors(config: &Config) -> Result<CorsLayer> {
    let Some(origin) = &config.cors_allowed_origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin: HeaderValue = origin
        .parse()
        .context("CORS_ALLOWED_ORIGIN is not a valid header value")?;
    Ok(CorsLayer::very_permissive().allow_origin(origin))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "coach-static",
    );

    let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO only serves path-style bucket addressing.
    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
