use crate::aggregate::{Aggregate, matching, monthly_series, round_dp, sum_by_case};
use crate::period::{DateWindow, MonthSpan, Period};
use crate::report::{
    CaseKpis, CaseTrends, DonationKpis, DonorKpis, DonorTrends, ExpenseKpis, ProviderKpis,
};
use crate::rollup::CaseRollups;
use crate::trend::Trend;
use chrono::{Datelike, NaiveDate};
use core_types::status::{
    ANY_STATUS, DONATION_FAILED, DONATION_REJECTED, DONATION_SUCCESS, DONOR_VALID, EXPENSE_PAID,
    EXPENSE_PENDING,
};
use core_types::{Case, CaseStatus, Donation, Donor, Expense, Provider};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A stateless calculator for the KPI sets of every resource.
///
/// Every calculation takes plain record slices and a resolved `Period`, so callers decide how
/// records are loaded. Records outside the relevant window are ignored, which means passing a
/// superset is always safe. Missing data produces zeros, never errors.
#[derive(Debug, Clone, Copy)]
pub struct KpiEngine {
    today: NaiveDate,
}

impl KpiEngine {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Case indicators.
    ///
    /// # Arguments
    ///
    /// * `cases` - Cases matching the resource filter, any admission date. The current and
    ///   previous windows select among them by admission date.
    /// * `donations`, `expenses` - Money movements of those cases, any date.
    /// * `span` - How many months `promedio_casos_mensuales` divides by.
    pub fn case_kpis(
        &self,
        cases: &[Case],
        donations: &[Donation],
        expenses: &[Expense],
        period: &Period,
        span: MonthSpan,
    ) -> CaseKpis {
        let current: Vec<&Case> = cases
            .iter()
            .filter(|c| period.current.contains(c.admitted_on))
            .collect();
        let active: Vec<&Case> = current.iter().copied().filter(|c| c.is_active()).collect();
        let by_status = |status: CaseStatus| current.iter().filter(|c| c.status == status).count();

        let without_home = active
            .iter()
            .filter(|c| c.status == CaseStatus::EnTratamiento && c.shelter_home_id.is_none())
            .count();

        // --- Days ---
        let days: Vec<i64> = active
            .iter()
            .filter_map(|c| c.days_active(self.today))
            .collect();
        let day_sum: i64 = days.iter().sum();
        let average_days = if days.is_empty() {
            0
        } else {
            day_sum / days.len() as i64
        };

        // --- Money ---
        let rollups = CaseRollups::standard(donations, expenses);
        // Pending bills are part of what a case costs per day.
        let spent_any_status = sum_by_case(expenses, &DateWindow::UNBOUNDED, &ANY_STATUS);
        let active_spend: Decimal = active
            .iter()
            .filter_map(|c| spent_any_status.get(&c.id))
            .sum();

        let burn_rate = if day_sum > 0 {
            active_spend / Decimal::from(day_sum)
        } else {
            Decimal::ZERO
        };
        let foundation_rate = burn_rate * Decimal::from(active.len());

        let cases_in_deficit = active
            .iter()
            .filter(|c| rollups.spent(c.id) > rollups.raised(c.id))
            .count();

        let average_raised = if current.is_empty() {
            Decimal::ZERO
        } else {
            let raised: Decimal = current.iter().map(|c| rollups.raised(c.id)).sum();
            round_dp(raised / Decimal::from(current.len()), 2)
        };
        let average_spent = if active.is_empty() {
            Decimal::ZERO
        } else {
            round_dp(active_spend / Decimal::from(active.len()), 2)
        };

        let months = span.months(self.today);
        let monthly_average_cases = current.len() as i64 / months;

        let trends = period.previous.map(|window| {
            let previous: Vec<&Case> = cases
                .iter()
                .filter(|c| window.contains(c.admitted_on))
                .collect();
            let previous_active = previous.iter().filter(|c| c.is_active()).count();
            CaseTrends {
                total_historico: Trend::between_counts(current.len(), Some(previous.len())),
                casos_activos: Trend::between_counts(active.len(), Some(previous_active)),
            }
        });

        debug!(
            total = current.len(),
            active = active.len(),
            day_sum,
            %burn_rate,
            months,
            "case KPIs computed"
        );

        CaseKpis {
            average_days_active: average_days,
            daily_cost_per_case: round_dp(burn_rate, 2),
            daily_cost_foundation: round_dp(foundation_rate, 2),
            cases_in_deficit,
            average_raised,
            average_spent,
            monthly_average_cases,
            total: current.len(),
            active: active.len(),
            abierto: by_status(CaseStatus::Abierto),
            en_tratamiento: by_status(CaseStatus::EnTratamiento),
            adoptado: by_status(CaseStatus::Adoptado),
            cerrado: by_status(CaseStatus::Cerrado),
            fallecido: by_status(CaseStatus::Fallecido),
            without_home,
            average_time: average_days,
            trends,
        }
    }

    /// Donation indicators. The comparison window comes from `period.previous`; without one
    /// every variation is measured against zero.
    pub fn donation_kpis(&self, donations: &[Donation], period: &Period) -> DonationKpis {
        let current = DonationOutcomes::over(donations, &period.current);
        let previous = period
            .previous
            .map(|window| DonationOutcomes::over(donations, &window));
        let prev = |pick: fn(&DonationOutcomes) -> Decimal| previous.as_ref().map(pick);

        debug!(
            successful = current.success.count,
            rejected = current.rejected.count,
            failed = current.failed.count,
            has_previous = previous.is_some(),
            "donation KPIs computed"
        );

        DonationKpis {
            total_raised: current.success.sum,
            average_donation: current.success.average,
            donation_count: current.success.count,
            successful: current.success.count,
            rejected: current.rejected.count,
            failed: current.failed.count,
            unique_donors: current.success.distinct,
            raised_variation: variation(current.success.sum, prev(|o| o.success.sum)),
            average_variation: variation(current.success.average, prev(|o| o.success.average)),
            successful_variation: variation(
                Decimal::from(current.success.count),
                prev(|o| Decimal::from(o.success.count)),
            ),
            rejected_variation: variation(
                Decimal::from(current.rejected.count),
                prev(|o| Decimal::from(o.rejected.count)),
            ),
            failed_variation: variation(
                Decimal::from(current.failed.count),
                prev(|o| Decimal::from(o.failed.count)),
            ),
            unique_donors_variation: variation(
                Decimal::from(current.success.distinct),
                prev(|o| Decimal::from(o.success.distinct)),
            ),
            attempts_variation: variation(current.attempts(), prev(DonationOutcomes::attempts)),
            chart_data: monthly_series(matching(donations, &period.current, &DONATION_SUCCESS)),
        }
    }

    /// Expense indicators. Paid figures drive totals and variations; pending ones are
    /// reported on their own.
    pub fn expense_kpis(&self, expenses: &[Expense], period: &Period) -> ExpenseKpis {
        let paid = Aggregate::over(expenses, &period.current, &EXPENSE_PAID);
        let pending = Aggregate::over(expenses, &period.current, &EXPENSE_PENDING);
        let previous = period
            .previous
            .map(|window| Aggregate::over(expenses, &window, &EXPENSE_PAID));

        debug!(
            paid = paid.count,
            pending = pending.count,
            has_previous = previous.is_some(),
            "expense KPIs computed"
        );

        ExpenseKpis {
            total_paid: paid.sum,
            average_paid: round_dp(paid.average, 2),
            paid_count: paid.count,
            total_pending: pending.sum,
            pending_count: pending.count,
            total_variation: variation(paid.sum, previous.map(|p| p.sum)),
            average_variation: variation(paid.average, previous.map(|p| p.average)),
            chart_data: monthly_series(matching(expenses, &period.current, &EXPENSE_PAID)),
        }
    }

    /// Cohort indicators for donors created inside `period.current`.
    ///
    /// `donations` should cover the cohort's whole history: lifetime value and recurrence
    /// look at every valid donation, not just those in the window.
    pub fn donor_kpis(&self, donors: &[Donor], donations: &[Donation], period: &Period) -> DonorKpis {
        let cohort: Vec<&Donor> = donors
            .iter()
            .filter(|d| period.current.contains(d.created_at.date_naive()))
            .collect();
        let cohort_ids: BTreeSet<i64> = cohort.iter().map(|d| d.id).collect();

        let new_this_month = if period.current.is_filtered() {
            cohort.len()
        } else {
            donors
                .iter()
                .filter(|d| same_month(d.created_at.date_naive(), self.today))
                .count()
        };

        let mut valid_per_donor: BTreeMap<i64, usize> = BTreeMap::new();
        let mut cohort_total = Decimal::ZERO;
        let mut largest_donation = Decimal::ZERO;
        for donation in donations.iter().filter(|d| DONOR_VALID.matches(&d.status)) {
            let Some(donor_id) = donation.donor_id else {
                continue;
            };
            if !cohort_ids.contains(&donor_id) {
                continue;
            }
            *valid_per_donor.entry(donor_id).or_insert(0) += 1;
            cohort_total += donation.amount;
            largest_donation = largest_donation.max(donation.amount);
        }
        let recurring = valid_per_donor.values().filter(|count| **count > 1).count();

        let average_lifetime_value = if cohort.is_empty() {
            Decimal::ZERO
        } else {
            round_dp(cohort_total / Decimal::from(cohort.len()), 2)
        };

        let total_donantes = period.previous.map(|window| {
            let previous = donors
                .iter()
                .filter(|d| window.contains(d.created_at.date_naive()))
                .count();
            Trend::between_counts(cohort.len(), Some(previous))
        });

        debug!(cohort = cohort.len(), recurring, "donor KPIs computed");

        DonorKpis {
            total: cohort.len(),
            new_this_month,
            recurring,
            average_lifetime_value,
            largest_donation,
            trends: DonorTrends { total_donantes },
        }
    }

    pub fn provider_kpis(&self, providers: &[Provider], expenses: &[Expense]) -> ProviderKpis {
        let active_providers: BTreeSet<i64> =
            expenses.iter().filter_map(|e| e.provider_id).collect();
        ProviderKpis {
            total: providers.len(),
            new_this_month: providers
                .iter()
                .filter(|p| same_month(p.created_at.date_naive(), self.today))
                .count(),
            with_activity: providers
                .iter()
                .filter(|p| active_providers.contains(&p.id))
                .count(),
        }
    }
}

/// Donation totals split by outcome family.
struct DonationOutcomes {
    success: Aggregate,
    rejected: Aggregate,
    failed: Aggregate,
}

impl DonationOutcomes {
    fn over(donations: &[Donation], window: &DateWindow) -> Self {
        Self {
            success: Aggregate::over(donations, window, &DONATION_SUCCESS),
            rejected: Aggregate::over(donations, window, &DONATION_REJECTED),
            failed: Aggregate::over(donations, window, &DONATION_FAILED),
        }
    }

    fn attempts(&self) -> Decimal {
        Decimal::from(self.success.count + self.rejected.count + self.failed.count)
    }
}

fn variation(current: Decimal, previous: Option<Decimal>) -> Decimal {
    Trend::between(current, previous).signed()
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}
