use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Stored data could not be decoded: {0}")]
    InvalidData(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl DbError {
    /// Maps `RowNotFound` to `NotFound`, everything else to a query error.
    pub(crate) fn from_fetch(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DbError::NotFound,
            other => DbError::QueryError(other),
        }
    }
}
