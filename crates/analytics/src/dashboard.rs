use crate::aggregate::{Aggregate, matching, monthly_series};
use crate::engine::KpiEngine;
use crate::period::Period;
use crate::report::{BalancePoint, CountryRanking, DashboardReport, DashboardTotals, DashboardTrends};
use crate::rollup::CaseRollups;
use crate::trend::Trend;
use core_types::status::{DONATION_SUCCESS, EXPENSE_PAID};
use core_types::{Case, Donation, Donor, Expense, ShelterHome};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the dashboard reads.
#[derive(Debug, Clone, Copy)]
pub struct DashboardInput<'a> {
    pub cases: &'a [Case],
    pub donations: &'a [Donation],
    pub expenses: &'a [Expense],
    pub donors: &'a [Donor],
    pub homes: &'a [ShelterHome],
}

/// Lengths of the ranked lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLimits {
    pub top_countries: usize,
    pub highlighted_cases: usize,
}

impl KpiEngine {
    /// The landing-page summary: money in against money out, with day-shifted trends.
    ///
    /// Donations count when approved or completed; expenses only once paid.
    pub fn dashboard(
        &self,
        input: &DashboardInput<'_>,
        period: &Period,
        limits: DashboardLimits,
    ) -> DashboardReport {
        let window = &period.current;
        let donated = Aggregate::over(input.donations, window, &DONATION_SUCCESS).sum;
        let spent = Aggregate::over(input.expenses, window, &EXPENSE_PAID).sum;
        let net_balance = donated - spent;

        let previous = period.previous.map(|w| {
            (
                Aggregate::over(input.donations, &w, &DONATION_SUCCESS).sum,
                Aggregate::over(input.expenses, &w, &EXPENSE_PAID).sum,
            )
        });
        let trends = DashboardTrends {
            total_donado: Trend::between(donated, previous.map(|(d, _)| d)),
            total_gastado: Trend::between(spent, previous.map(|(_, s)| s)),
            balance_neto: Trend::between(net_balance, previous.map(|(d, s)| d - s)),
        };

        let active_cases = input.cases.iter().filter(|c| c.is_active()).count();

        // --- Highlighted cases: active ones that raised money in the window ---
        let rollups = CaseRollups::new(
            input.donations,
            input.expenses,
            window,
            &DONATION_SUCCESS,
            &EXPENSE_PAID,
        );
        let mut highlighted: Vec<&Case> = input
            .cases
            .iter()
            .filter(|c| c.is_active() && rollups.raised(c.id) > Decimal::ZERO)
            .collect();
        highlighted.sort_by(|a, b| {
            rollups
                .raised(b.id)
                .cmp(&rollups.raised(a.id))
                .then_with(|| a.id.cmp(&b.id))
        });
        let casos_destacados = highlighted
            .into_iter()
            .take(limits.highlighted_cases)
            .map(|c| rollups.summarize(c, input.homes, self.today()))
            .collect();

        let top_paises = rank_countries(input, period, limits.top_countries);
        let balance_historico = merge_timelines(input, period);

        debug!(
            %donated,
            %spent,
            active_cases,
            has_previous = period.previous.is_some(),
            "dashboard computed"
        );

        DashboardReport {
            kpis: DashboardTotals {
                donated,
                spent,
                net_balance,
                active_cases,
            },
            trends,
            top_paises,
            casos_destacados,
            balance_historico,
        }
    }
}

/// Countries ordered by the money their donors gave in the window. Countries whose donors
/// gave nothing that counts are left out.
fn rank_countries(input: &DashboardInput<'_>, period: &Period, limit: usize) -> Vec<CountryRanking> {
    let country_of: BTreeMap<i64, Option<&str>> = input
        .donors
        .iter()
        .map(|d| (d.id, d.country.as_deref()))
        .collect();

    let mut donors_per_country: BTreeMap<Option<&str>, usize> = BTreeMap::new();
    for donor in input.donors {
        *donors_per_country.entry(donor.country.as_deref()).or_insert(0) += 1;
    }

    let mut money_per_country: BTreeMap<Option<&str>, Decimal> = BTreeMap::new();
    for donation in matching(input.donations, &period.current, &DONATION_SUCCESS) {
        let Some(country) = donation.donor_id.and_then(|id| country_of.get(&id)) else {
            continue;
        };
        *money_per_country.entry(*country).or_insert(Decimal::ZERO) += donation.amount;
    }

    let mut ranking: Vec<CountryRanking> = money_per_country
        .into_iter()
        .map(|(country, total_money)| CountryRanking {
            country: country.map(str::to_string),
            count: donors_per_country.get(&country).copied().unwrap_or(0),
            total_money,
        })
        .collect();
    ranking.sort_by(|a, b| b.total_money.cmp(&a.total_money));
    ranking.truncate(limit);
    ranking
}

/// Monthly donations and paid expenses side by side, ascending, months with neither omitted.
fn merge_timelines(input: &DashboardInput<'_>, period: &Period) -> Vec<BalancePoint> {
    let donations = monthly_series(matching(input.donations, &period.current, &DONATION_SUCCESS));
    let expenses = monthly_series(matching(input.expenses, &period.current, &EXPENSE_PAID));

    let mut months: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for bucket in donations {
        months.entry(bucket.month).or_default().0 = bucket.amount;
    }
    for bucket in expenses {
        months.entry(bucket.month).or_default().1 = bucket.amount;
    }

    months
        .into_iter()
        .map(|(month, (donations, expenses))| BalancePoint {
            month,
            donations,
            expenses,
            balance: donations - expenses,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PreviousPeriod;
    use chrono::{NaiveDate, TimeZone, Utc};
    use core_types::CaseStatus;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn case(id: i64, discharged_on: Option<NaiveDate>) -> Case {
        Case {
            id,
            name: format!("Caso {id}"),
            status: CaseStatus::EnTratamiento,
            admitted_on: d(2024, 1, 1),
            discharged_on,
            clinic: None,
            diagnosis: None,
            shelter_home_id: None,
            estimated_budget: None,
        }
    }

    fn donor(id: i64, country: Option<&str>) -> Donor {
        Donor {
            id,
            name: format!("Donante {id}"),
            id_kind: None,
            identification: None,
            email: None,
            phone: None,
            city: None,
            country: country.map(str::to_string),
            donor_kind: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn donation(donor_id: i64, case_id: i64, amount: Decimal, on: NaiveDate, status: &str) -> Donation {
        Donation {
            id: 0,
            donor_id: Some(donor_id),
            case_id: Some(case_id),
            amount,
            donated_on: on,
            payment_method: None,
            status: status.to_string(),
        }
    }

    fn expense(case_id: i64, amount: Decimal, on: NaiveDate, status: &str) -> Expense {
        Expense {
            id: 0,
            concept: "Alimento".to_string(),
            provider_id: Some(1),
            case_id: Some(case_id),
            amount,
            paid_on: on,
            payment_method: None,
            status: status.to_string(),
            receipt: None,
        }
    }

    fn limits() -> DashboardLimits {
        DashboardLimits {
            top_countries: 5,
            highlighted_cases: 5,
        }
    }

    #[test]
    fn test_dashboard_totals_trends_and_rankings() {
        let cases = vec![case(1, None), case(2, None), case(3, Some(d(2024, 2, 1)))];
        let donors = vec![
            donor(1, Some("Colombia")),
            donor(2, Some("Colombia")),
            donor(3, Some("España")),
            donor(4, Some("Chile")),
        ];
        let donations = vec![
            donation(1, 1, dec!(300), d(2024, 3, 5), "Aprobada"),
            donation(3, 2, dec!(500), d(2024, 3, 6), "COMPLETADA"),
            donation(4, 2, dec!(700), d(2024, 3, 7), "RECHAZADA"),
            donation(1, 3, dec!(50), d(2024, 3, 8), "aprobada"),
            // previous window
            donation(2, 1, dec!(425), d(2024, 2, 10), "APROBADA"),
        ];
        let expenses = vec![
            expense(1, dec!(100), d(2024, 3, 10), "Pagado"),
            expense(2, dec!(999), d(2024, 3, 11), "PENDIENTE"),
            expense(1, dec!(25), d(2024, 4, 1), "PAGADO"),
            expense(1, dec!(200), d(2024, 2, 20), "PAGADO"),
        ];
        let homes: Vec<ShelterHome> = Vec::new();
        let input = DashboardInput {
            cases: &cases,
            donations: &donations,
            expenses: &expenses,
            donors: &donors,
            homes: &homes,
        };
        let period = Period::resolve(
            Some(d(2024, 3, 1)),
            Some(d(2024, 3, 31)),
            PreviousPeriod::DayShift,
            d(2024, 4, 15),
        );
        let report = KpiEngine::new(d(2024, 4, 15)).dashboard(&input, &period, limits());

        assert_eq!(report.kpis.donated, dec!(850));
        assert_eq!(report.kpis.spent, dec!(100));
        assert_eq!(report.kpis.net_balance, dec!(750));
        assert_eq!(report.kpis.active_cases, 2);

        // Previous window 2024-01-30..2024-02-29: 425 in, 200 out.
        assert_eq!(report.trends.total_donado.value, dec!(100));
        assert!(report.trends.total_donado.is_positive);
        assert_eq!(report.trends.total_gastado.value, dec!(50));
        assert!(!report.trends.total_gastado.is_positive);
        assert_eq!(report.trends.balance_neto.value, dec!(233.3));

        let countries: Vec<(Option<&str>, usize, Decimal)> = report
            .top_paises
            .iter()
            .map(|r| (r.country.as_deref(), r.count, r.total_money))
            .collect();
        assert_eq!(
            countries,
            vec![(Some("España"), 1, dec!(500)), (Some("Colombia"), 2, dec!(350))]
        );

        let highlighted: Vec<i64> = report.casos_destacados.iter().map(|c| c.case.id).collect();
        assert_eq!(highlighted, vec![2, 1]);
        assert_eq!(report.casos_destacados[1].total_spent, dec!(100));

        assert_eq!(report.balance_historico.len(), 1);
        assert_eq!(report.balance_historico[0].month, "2024-03");
        assert_eq!(report.balance_historico[0].balance, dec!(750));
    }

    #[test]
    fn test_dashboard_without_dates_has_baseline_free_trends() {
        let donations = vec![donation(1, 1, dec!(10), d(2023, 11, 1), "Completada")];
        let expenses = vec![expense(1, dec!(4), d(2024, 1, 1), "PAGADO")];
        let input = DashboardInput {
            cases: &[],
            donations: &donations,
            expenses: &expenses,
            donors: &[],
            homes: &[],
        };
        let period = Period::resolve(None, None, PreviousPeriod::DayShift, d(2024, 4, 15));
        let report = KpiEngine::new(d(2024, 4, 15)).dashboard(&input, &period, limits());
        assert_eq!(report.kpis.net_balance, dec!(6));
        assert_eq!(report.trends.balance_neto.value, dec!(100));
        assert!(report.top_paises.is_empty());
        let months: Vec<&str> = report
            .balance_historico
            .iter()
            .map(|p| p.month.as_str())
            .collect();
        assert_eq!(months, vec!["2023-11", "2024-01"]);
        assert_eq!(report.balance_historico[1].balance, dec!(-4));
    }
}
