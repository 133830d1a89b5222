use crate::validation::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
}
