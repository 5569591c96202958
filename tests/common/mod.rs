//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use proofdesk::auth::InMemorySessionStore;
use proofdesk::evidence::FsEvidenceStore;
use proofdesk::server::{AdminCredentials, AppState};
use proofdesk::store::{AuditLog, MerchantStore, ProofStore};

pub const TEST_ADMIN_USER: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "integration-test-password";

/// Single-connection in-memory database with migrations applied.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    proofdesk::migrations::run(&pool).await.unwrap();
    pool
}

/// File-backed database for tests that need real concurrent connections.
pub async fn file_pool(dir: &TempDir) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("proofdesk-test.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .unwrap();
    proofdesk::migrations::run(&pool).await.unwrap();
    pool
}

/// Full application state over the given pool, with evidence files stored
/// under `upload_dir`.
pub fn test_state(pool: SqlitePool, upload_dir: &std::path::Path) -> AppState {
    AppState {
        pool: pool.clone(),
        proofs: Arc::new(ProofStore::new(pool.clone())),
        merchants: Arc::new(MerchantStore::new(pool.clone())),
        audit: Arc::new(AuditLog::new(pool)),
        evidence: Arc::new(FsEvidenceStore::new(upload_dir)),
        sessions: Arc::new(InMemorySessionStore::with_default_ttl()),
        admin: AdminCredentials {
            username: TEST_ADMIN_USER.to_string(),
            password: TEST_ADMIN_PASSWORD.to_string(),
        },
    }
}
