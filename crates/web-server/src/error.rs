use analytics::AnalyticsError;
use analyzer::AnalyzerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::{CoreError, FieldErrors};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
}

fn single_field(field: &str, message: String) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add(field, message);
    errors
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Bad input is a 400 whose body maps each offending field to its messages. Unknown ids are a
/// 404. Storage failures are logged and answered with a generic 500.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Analyzer(error) = self;
        match error {
            AnalyzerError::Invalid(CoreError::Validation(errors)) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            AnalyzerError::Invalid(CoreError::InvalidInput(field, value)) => {
                let errors = single_field(&field, format!("Valor no válido: \"{value}\"."));
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            AnalyzerError::Query(AnalyticsError::InvalidDate { field, value }) => {
                let errors = single_field(
                    field,
                    format!("Fecha no válida: \"{value}\". Use el formato AAAA-MM-DD."),
                );
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            AnalyzerError::Database(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "No encontrado." })),
            )
                .into_response(),
            AnalyzerError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "An internal database error occurred" })),
                )
                    .into_response()
            }
        }
    }
}
