use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid date for '{field}': '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
}
