//! Query-string filters as the admin UI sends them. Values stay raw until the service parses
//! them, so a malformed date can be reported against its parameter name.

use analytics::{AnalyticsError, DateWindow, parse_date};
use chrono::NaiveDate;
use serde::Deserialize;

/// `start_date` / `end_date` pair, `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRange {
    pub fn new(start_date: Option<&str>, end_date: Option<&str>) -> Self {
        Self {
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
        }
    }

    pub fn parse(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AnalyticsError> {
        Ok((
            parse_date("start_date", self.start_date.as_deref())?,
            parse_date("end_date", self.end_date.as_deref())?,
        ))
    }

    /// Either side may be missing.
    pub fn window(&self) -> Result<DateWindow, AnalyticsError> {
        let (start, end) = self.parse()?;
        Ok(DateWindow::new(start, end))
    }

    /// Filters only when both dates are present.
    pub fn closed_window(&self) -> Result<DateWindow, AnalyticsError> {
        Ok(match self.parse()? {
            (Some(start), Some(end)) => DateWindow::closed(start, end),
            _ => DateWindow::UNBOUNDED,
        })
    }
}

/// Trims a free-text parameter; blank counts as absent.
pub(crate) fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseKpiFilter {
    #[serde(flatten)]
    pub range: DateRange,
    /// Case name substring.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseKpiFilter {
    #[serde(flatten)]
    pub range: DateRange,
    /// Name substring of the related case; applies to both periods.
    pub caso: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseListFilter {
    #[serde(flatten)]
    pub range: DateRange,
    pub search: Option<String>,
    pub estado: Option<String>,
    pub veterinaria: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationListFilter {
    #[serde(flatten)]
    pub range: DateRange,
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseListFilter {
    #[serde(flatten)]
    pub range: DateRange,
    pub caso: Option<String>,
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonorListFilter {
    #[serde(flatten)]
    pub range: DateRange,
    pub ciudad: Option<String>,
    pub tipo_donante: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShelterHomeFilter {
    /// City substring.
    pub ciudad: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_window_needs_both_dates() {
        let one_sided = DateRange::new(Some("2024-01-01"), None);
        assert_eq!(one_sided.closed_window().unwrap(), DateWindow::UNBOUNDED);
        assert!(one_sided.window().unwrap().is_filtered());
    }

    #[test]
    fn test_malformed_date_names_the_parameter() {
        let err = DateRange::new(Some("2024-01-01"), Some("31/01/2024"))
            .parse()
            .unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::InvalidDate {
                field: "end_date",
                value: "31/01/2024".to_string()
            }
        );
    }

    #[test]
    fn test_blank_text_is_absent() {
        assert_eq!(non_blank(Some(&"  ".to_string())), None);
        assert_eq!(non_blank(Some(&" Luna ".to_string())), Some("Luna".to_string()));
    }
}
