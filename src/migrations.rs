//! Database migrations.
//!
//! SQLx embedded migrations: an explicit, ordered, idempotent list applied
//! against the migration version sqlx records in the database.

use sqlx::SqlitePool;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn run(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
