//! Sum/average/count over records that fall in a window and carry a status of a given family.

use crate::period::DateWindow;
use chrono::{Datelike, NaiveDate};
use core_types::status::StatusSet;
use core_types::{Donation, Expense};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A dated money movement with a free-text status.
pub trait Entry {
    fn amount(&self) -> Decimal;
    fn date(&self) -> NaiveDate;
    fn status(&self) -> &str;
    /// The entity counted by `Aggregate::distinct` (donor of a donation, provider of an expense).
    fn counterparty(&self) -> Option<i64>;
    fn case_id(&self) -> Option<i64>;
}

impl Entry for Donation {
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> NaiveDate {
        self.donated_on
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn counterparty(&self) -> Option<i64> {
        self.donor_id
    }
    fn case_id(&self) -> Option<i64> {
        self.case_id
    }
}

impl Entry for Expense {
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn date(&self) -> NaiveDate {
        self.paid_on
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn counterparty(&self) -> Option<i64> {
        self.provider_id
    }
    fn case_id(&self) -> Option<i64> {
        self.case_id
    }
}

/// Records inside `window` whose status belongs to `statuses`.
pub fn matching<'a, E: Entry>(
    records: &'a [E],
    window: &'a DateWindow,
    statuses: &'a StatusSet,
) -> impl Iterator<Item = &'a E> + 'a {
    records
        .iter()
        .filter(move |r| window.contains(r.date()) && statuses.matches(r.status()))
}

/// Totals over a filtered record set. An empty set yields zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Aggregate {
    pub sum: Decimal,
    pub average: Decimal,
    pub count: usize,
    /// Number of distinct counterparties among the records that have one.
    pub distinct: usize,
}

impl Aggregate {
    pub fn over<E: Entry>(records: &[E], window: &DateWindow, statuses: &StatusSet) -> Self {
        Self::of(matching(records, window, statuses))
    }

    pub fn of<'a, E: Entry + 'a>(records: impl IntoIterator<Item = &'a E>) -> Self {
        let mut sum = Decimal::ZERO;
        let mut count = 0usize;
        let mut counterparties = BTreeSet::new();
        for record in records {
            sum += record.amount();
            count += 1;
            if let Some(id) = record.counterparty() {
                counterparties.insert(id);
            }
        }
        let average = if count == 0 {
            Decimal::ZERO
        } else {
            sum / Decimal::from(count)
        };
        Self {
            sum,
            average,
            count,
            distinct: counterparties.len(),
        }
    }
}

/// Sum of matching amounts per case id. Records without a case are skipped.
pub fn sum_by_case<E: Entry>(
    records: &[E],
    window: &DateWindow,
    statuses: &StatusSet,
) -> BTreeMap<i64, Decimal> {
    let mut totals = BTreeMap::new();
    for record in matching(records, window, statuses) {
        if let Some(case_id) = record.case_id() {
            *totals.entry(case_id).or_insert(Decimal::ZERO) += record.amount();
        }
    }
    totals
}

/// One month of a time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    #[serde(rename = "fecha")]
    pub month: String,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "cantidad")]
    pub count: usize,
}

/// Groups records by calendar month in ascending order. Months without records are absent.
pub fn monthly_series<'a, E: Entry + 'a>(
    records: impl IntoIterator<Item = &'a E>,
) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<(i32, u32), (Decimal, usize)> = BTreeMap::new();
    for record in records {
        let date = record.date();
        let bucket = months
            .entry((date.year(), date.month()))
            .or_insert((Decimal::ZERO, 0));
        bucket.0 += record.amount();
        bucket.1 += 1;
    }
    months
        .into_iter()
        .map(|((year, month), (amount, count))| MonthlyBucket {
            month: month_key(year, month),
            amount,
            count,
        })
        .collect()
}

fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Rounds half away from zero, the way the figures are shown to people.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::status::{ANY_STATUS, DONATION_SUCCESS, EXPENSE_SETTLED};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn donation(id: i64, donor: Option<i64>, amount: Decimal, on: NaiveDate, status: &str) -> Donation {
        Donation {
            id,
            donor_id: donor,
            case_id: Some(1),
            amount,
            donated_on: on,
            payment_method: None,
            status: status.to_string(),
        }
    }

    fn expense(case_id: i64, amount: Decimal, status: &str) -> Expense {
        Expense {
            id: 0,
            concept: "Consulta".to_string(),
            provider_id: Some(1),
            case_id: Some(case_id),
            amount,
            paid_on: d(2024, 1, 10),
            payment_method: None,
            status: status.to_string(),
            receipt: None,
        }
    }

    #[test]
    fn test_empty_set_yields_zeros() {
        let none: Vec<Donation> = Vec::new();
        let agg = Aggregate::over(&none, &DateWindow::UNBOUNDED, &DONATION_SUCCESS);
        assert_eq!(agg, Aggregate::default());
        assert_eq!(agg.average, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_filters_by_window_and_status() {
        let records = vec![
            donation(1, Some(1), dec!(100), d(2024, 1, 5), "Aprobada"),
            donation(2, Some(1), dec!(50), d(2024, 1, 6), "RECHAZADA"),
            donation(3, Some(2), dec!(200), d(2024, 1, 7), "completada"),
            donation(4, Some(3), dec!(999), d(2024, 2, 1), "APROBADA"),
        ];
        let window = DateWindow::closed(d(2024, 1, 1), d(2024, 1, 31));
        let agg = Aggregate::over(&records, &window, &DONATION_SUCCESS);
        assert_eq!(agg.sum, dec!(300));
        assert_eq!(agg.count, 2);
        assert_eq!(agg.average, dec!(150));
        assert_eq!(agg.distinct, 2);
    }

    #[test]
    fn test_distinct_ignores_missing_counterparties() {
        let records = vec![
            donation(1, None, dec!(10), d(2024, 1, 5), "Aprobada"),
            donation(2, Some(4), dec!(10), d(2024, 1, 5), "Aprobada"),
            donation(3, Some(4), dec!(10), d(2024, 1, 5), "Aprobada"),
        ];
        let agg = Aggregate::over(&records, &DateWindow::UNBOUNDED, &DONATION_SUCCESS);
        assert_eq!(agg.count, 3);
        assert_eq!(agg.distinct, 1);
    }

    #[test]
    fn test_sum_by_case_respects_status_family() {
        let records = vec![
            expense(1, dec!(100), "PAGADO"),
            expense(1, dec!(40), "PENDIENTE"),
            expense(2, dec!(25), "APROBADA"),
        ];
        let settled = sum_by_case(&records, &DateWindow::UNBOUNDED, &EXPENSE_SETTLED);
        assert_eq!(settled.get(&1), Some(&dec!(100)));
        assert_eq!(settled.get(&2), Some(&dec!(25)));

        let all = sum_by_case(&records, &DateWindow::UNBOUNDED, &ANY_STATUS);
        assert_eq!(all.get(&1), Some(&dec!(140)));
    }

    #[test]
    fn test_monthly_series_is_sorted_and_sparse() {
        let records = vec![
            donation(1, None, dec!(30), d(2024, 3, 2), "Aprobada"),
            donation(2, None, dec!(10), d(2024, 1, 20), "Aprobada"),
            donation(3, None, dec!(5), d(2024, 1, 21), "Aprobada"),
        ];
        let series = monthly_series(&records);
        let months: Vec<&str> = series.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-03"]);
        assert_eq!(series[0].amount, dec!(15));
        assert_eq!(series[0].count, 2);
        assert_eq!(series[1].count, 1);
    }

    #[test]
    fn test_round_dp_half_away_from_zero() {
        assert_eq!(round_dp(dec!(2.345), 2), dec!(2.35));
        assert_eq!(round_dp(dec!(-2.345), 2), dec!(-2.35));
    }
}
