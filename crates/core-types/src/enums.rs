use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a rescue case.
///
/// Whether a case is *active* is decided by its discharge date, not by this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Abierto,
    EnTratamiento,
    Adoptado,
    Cerrado,
    Fallecido,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Abierto,
        CaseStatus::EnTratamiento,
        CaseStatus::Adoptado,
        CaseStatus::Cerrado,
        CaseStatus::Fallecido,
    ];

    /// The literal stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Abierto => "ABIERTO",
            CaseStatus::EnTratamiento => "EN_TRATAMIENTO",
            CaseStatus::Adoptado => "ADOPTADO",
            CaseStatus::Cerrado => "CERRADO",
            CaseStatus::Fallecido => "FALLECIDO",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidInput("estado".to_string(), s.to_string()))
    }
}
