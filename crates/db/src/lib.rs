//! Database connection factory and migration tooling.

use std::time::Duration;

use anyhow::Context;
use classifieds_kernel::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

pub mod migrations;

pub use migrations::run_migrations;

/// Open a connection pool for the configured database URL.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(settings.sqlx_logging);

    let db = Database::connect(options)
        .await
        .with_context(|| "failed to connect to database")?;

    tracing::info!(
        target: "classifieds-db",
        backend = ?db.get_database_backend(),
        "database connection established"
    );
    Ok(db)
}

/// Open a private in-memory SQLite database.
///
/// The pool is pinned to a single connection since every SQLite memory
/// connection is its own database.
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .with_context(|| "failed to open in-memory database")
}
