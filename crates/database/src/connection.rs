use crate::error::DbError;
use configuration::DatabaseConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The URL and pool sizing come from the `[database]` settings, which already fall back to
/// `DATABASE_URL`. The pool can be shared across the entire application.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    if config.url.trim().is_empty() {
        return Err(DbError::ConnectionConfigError(
            "DATABASE_URL must be set.".to_string(),
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies the embedded migrations so the schema is up-to-date before serving.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
