use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    /// Rejected write payload or filter value.
    #[error("{0}")]
    Invalid(#[from] core_types::CoreError),

    /// Malformed query parameter, typically a date.
    #[error("{0}")]
    Query(#[from] analytics::AnalyticsError),
}

impl AnalyzerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalyzerError::Database(database::DbError::NotFound))
    }
}
