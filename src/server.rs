//! HTTP server bootstrap for Proofdesk.
//!
//! This module wires together:
//! - configuration
//! - the SQLite connection pool and migrations
//! - the stores (proofs, merchants, audit) and collaborators (evidence blob
//!   store, admin session store)
//! - the Axum router with its auth middlewares

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{
    admin_auth_middleware, merchant_auth_middleware, AdminAuthState, InMemorySessionStore,
    MerchantAuthState, SessionStore,
};
use crate::evidence::{EvidenceStore, FsEvidenceStore};
use crate::store::{AuditLog, MerchantStore, ProofStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL (e.g. `sqlite:proofdesk.db`).
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Directory for uploaded evidence files.
    pub upload_dir: String,
    /// Admin login name.
    pub admin_username: String,
    /// Admin password. Must be set in release builds.
    pub admin_password: String,
    /// Admin session lifetime.
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:proofdesk.db".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5);

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_default();

        if admin_password.is_empty() && !cfg!(debug_assertions) {
            anyhow::bail!("ADMIN_PASSWORD must be set");
        }

        let session_ttl = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|hours| Duration::from_secs(hours * 60 * 60))
            .unwrap_or(crate::auth::DEFAULT_SESSION_TTL);

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            upload_dir,
            admin_username,
            admin_password,
            session_ttl,
        })
    }
}

/// Admin credentials checked by the login handler.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub proofs: Arc<ProofStore>,
    pub merchants: Arc<MerchantStore>,
    pub audit: Arc<AuditLog>,
    pub evidence: Arc<dyn EvidenceStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub admin: AdminCredentials,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Proofdesk v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Database: {}", config.database_url);
    info!("  Upload dir: {}", config.upload_dir);

    let pool = connect_pool(&config.database_url, config.max_connections).await?;
    info!("Connected to SQLite");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    let state = AppState {
        pool: pool.clone(),
        proofs: Arc::new(ProofStore::new(pool.clone())),
        merchants: Arc::new(MerchantStore::new(pool.clone())),
        audit: Arc::new(AuditLog::new(pool)),
        evidence: Arc::new(FsEvidenceStore::new(&config.upload_dir)),
        sessions: Arc::new(InMemorySessionStore::new(config.session_ttl)),
        admin: AdminCredentials {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        },
    };

    let app = build_router(state)?;

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Proofdesk is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the SQLite pool with WAL and foreign keys enabled.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Assemble the application router over the given state.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let merchant_auth = MerchantAuthState {
        merchants: state.merchants.clone(),
    };
    let admin_auth = AdminAuthState {
        sessions: state.sessions.clone(),
    };

    let api = crate::api::public_router()
        .merge(
            crate::api::merchant_router().layer(axum::middleware::from_fn_with_state(
                merchant_auth,
                merchant_auth_middleware,
            )),
        )
        .merge(
            crate::api::admin_router().layer(axum::middleware::from_fn_with_state(
                admin_auth,
                admin_auth_middleware,
            )),
        );

    let mut router = Router::new()
        .nest("/api", api)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "proofdesk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => {
            tracing::error!(error = %e, "readiness probe failed");
            Err((
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable".to_string(),
            ))
        }
    }
}
