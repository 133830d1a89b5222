//! Reporting windows and how each call site derives its comparison window.

use crate::error::AnalyticsError;
use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use serde::Serialize;

/// An inclusive date interval; a missing bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub const UNBOUNDED: DateWindow = DateWindow {
        start: None,
        end: None,
    };

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// Both bounds, when the window is closed.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }

    /// True when at least one side is bounded.
    pub fn is_filtered(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// The smallest window covering both `self` and `other`.
    pub fn union(&self, other: &DateWindow) -> DateWindow {
        let start = match (self.start, other.start) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        DateWindow { start, end }
    }
}

/// The same date one calendar month earlier, clamped to the last day of that month.
///
/// 2024-03-31 becomes 2024-02-29 and 2024-05-31 becomes 2024-04-30.
pub fn month_shift(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(1)).unwrap_or(date)
}

/// The interval of identical length ending the day before `start`, or `None` when it would
/// fall outside the representable calendar.
pub fn day_shift(start: NaiveDate, end: NaiveDate) -> Option<DateWindow> {
    let length = end.signed_duration_since(start);
    let previous_end = start.checked_sub_signed(TimeDelta::days(1))?;
    let previous_start = previous_end.checked_sub_signed(length)?;
    Some(DateWindow::closed(previous_start, previous_end))
}

/// How a call site derives its comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousPeriod {
    /// Congruent interval immediately before the current one. Without a closed range the
    /// current period is unbounded in the missing direction(s).
    DayShift,
    /// Both bounds moved back one calendar month. Without any dates the current period is
    /// the year to date.
    MonthShift,
}

/// A current window plus an optional comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub current: DateWindow,
    pub previous: Option<DateWindow>,
}

impl Period {
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        policy: PreviousPeriod,
        today: NaiveDate,
    ) -> Period {
        match (start, end, policy) {
            (Some(start), Some(end), PreviousPeriod::DayShift) => Period {
                current: DateWindow::closed(start, end),
                previous: day_shift(start, end),
            },
            (Some(start), Some(end), PreviousPeriod::MonthShift) => Period {
                current: DateWindow::closed(start, end),
                previous: Some(DateWindow::closed(month_shift(start), month_shift(end))),
            },
            (None, None, PreviousPeriod::MonthShift) => {
                let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                Period {
                    current: DateWindow::closed(year_start, today),
                    previous: Some(DateWindow::closed(
                        month_shift(year_start),
                        month_shift(today),
                    )),
                }
            }
            (start, end, _) => Period {
                current: DateWindow::new(start, end),
                previous: None,
            },
        }
    }

    /// Window covering both the current and previous periods, for loading records once.
    pub fn span(&self) -> DateWindow {
        match &self.previous {
            Some(previous) => self.current.union(previous),
            None => self.current,
        }
    }
}

/// Years a query date may carry; the store cannot hold anything outside this range.
const QUERY_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parses an optional `YYYY-MM-DD` query value. Blank values count as absent.
pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, AnalyticsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .filter(|date| QUERY_YEARS.contains(&date.year()))
            .map(Some)
            .ok_or_else(|| AnalyticsError::InvalidDate {
                field,
                value: raw.to_string(),
            }),
    }
}

/// Number of months the case KPIs divide the case count by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthSpan {
    /// A closed admission range; both end months count.
    Range(NaiveDate, NaiveDate),
    /// The request carried dates that could not be parsed.
    Unparseable,
    /// No closed range: months elapsed since the first admission on record.
    SinceFirstAdmission(Option<NaiveDate>),
}

impl MonthSpan {
    pub fn months(&self, today: NaiveDate) -> i64 {
        let months = match *self {
            MonthSpan::Range(start, end) => month_index(end) - month_index(start) + 1,
            MonthSpan::Unparseable => 12,
            MonthSpan::SinceFirstAdmission(Some(first)) => month_index(today) - month_index(first),
            MonthSpan::SinceFirstAdmission(None) => 0,
        };
        months.max(1)
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month())
}
