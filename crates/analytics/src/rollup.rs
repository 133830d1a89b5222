//! Per-record financial summaries: what each case raised and spent, what each donor gave.

use crate::aggregate::{Aggregate, Entry, round_dp, sum_by_case};
use crate::period::DateWindow;
use chrono::NaiveDate;
use core_types::status::{ANY_STATUS, DONATION_SUCCESS, DONOR_VALID, EXPENSE_SETTLED, StatusSet};
use core_types::{Case, Donation, Donor, Expense, ShelterHome};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Raised/spent totals per case, indexed once and looked up per case.
#[derive(Debug, Clone, Default)]
pub struct CaseRollups {
    raised: BTreeMap<i64, Decimal>,
    spent: BTreeMap<i64, Decimal>,
}

impl CaseRollups {
    pub fn new(
        donations: &[Donation],
        expenses: &[Expense],
        window: &DateWindow,
        raised_statuses: &StatusSet,
        spent_statuses: &StatusSet,
    ) -> Self {
        Self {
            raised: sum_by_case(donations, window, raised_statuses),
            spent: sum_by_case(expenses, window, spent_statuses),
        }
    }

    /// All-time totals: approved/completed donations against approved/paid expenses.
    /// Pending expenses are not spent money yet.
    pub fn standard(donations: &[Donation], expenses: &[Expense]) -> Self {
        Self::new(
            donations,
            expenses,
            &DateWindow::UNBOUNDED,
            &DONATION_SUCCESS,
            &EXPENSE_SETTLED,
        )
    }

    pub fn raised(&self, case_id: i64) -> Decimal {
        self.raised.get(&case_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn spent(&self, case_id: i64) -> Decimal {
        self.spent.get(&case_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn summarize(&self, case: &Case, homes: &[ShelterHome], today: NaiveDate) -> CaseSummary {
        let shelter_home_name = case.shelter_home_id.and_then(|id| {
            homes
                .iter()
                .find(|home| home.id == id)
                .map(|home| home.name.clone())
        });
        CaseSummary {
            case: case.clone(),
            total_raised: self.raised(case.id),
            total_spent: self.spent(case.id),
            shelter_home_name,
            days_active: case.days_active(today),
        }
    }
}

/// A case as listed in the admin screens, with its money and elapsed days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    #[serde(flatten)]
    pub case: Case,
    #[serde(rename = "total_recaudado")]
    pub total_raised: Decimal,
    #[serde(rename = "total_gastado")]
    pub total_spent: Decimal,
    #[serde(rename = "nombre_hogar_de_paso")]
    pub shelter_home_name: Option<String>,
    #[serde(rename = "dias_activo")]
    pub days_active: Option<i64>,
}

/// Every donation and expense of one case regardless of status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseBalance {
    #[serde(rename = "caso")]
    pub case_name: String,
    #[serde(rename = "total_recaudado")]
    pub total_raised: Decimal,
    #[serde(rename = "total_gastado")]
    pub total_spent: Decimal,
    pub balance: Decimal,
    #[serde(rename = "donaciones")]
    pub donations: Vec<Donation>,
    #[serde(rename = "gastos")]
    pub expenses: Vec<Expense>,
}

impl CaseBalance {
    pub fn new(case: &Case, mut donations: Vec<Donation>, mut expenses: Vec<Expense>) -> Self {
        donations.retain(|d| d.case_id == Some(case.id));
        expenses.retain(|e| e.case_id == Some(case.id));
        let total_raised =
            Aggregate::over(&donations, &DateWindow::UNBOUNDED, &ANY_STATUS).sum;
        let total_spent = Aggregate::over(&expenses, &DateWindow::UNBOUNDED, &ANY_STATUS).sum;
        Self {
            case_name: case.name.clone(),
            total_raised,
            total_spent,
            balance: total_raised - total_spent,
            donations,
            expenses,
        }
    }
}

/// A donor with the history of their valid donations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorSummary {
    #[serde(flatten)]
    pub donor: Donor,
    #[serde(rename = "total_donado")]
    pub total_donated: Decimal,
    #[serde(rename = "cantidad_donaciones")]
    pub donation_count: usize,
    #[serde(rename = "promedio_donacion")]
    pub average_donation: Decimal,
    #[serde(rename = "ultima_donacion")]
    pub last_donation: Option<NaiveDate>,
}

fn donations_by_donor(donations: &[Donation]) -> BTreeMap<i64, Vec<&Donation>> {
    let mut by_donor: BTreeMap<i64, Vec<&Donation>> = BTreeMap::new();
    for donation in donations {
        if let Some(donor_id) = donation.donor_id {
            by_donor.entry(donor_id).or_default().push(donation);
        }
    }
    by_donor
}

fn summarize_donor(donor: &Donor, history: &[&Donation]) -> DonorSummary {
    let valid: Vec<&Donation> = history
        .iter()
        .copied()
        .filter(|d| DONOR_VALID.matches(&d.status))
        .collect();
    let totals = Aggregate::of(valid.iter().copied());
    DonorSummary {
        donor: donor.clone(),
        total_donated: totals.sum,
        donation_count: totals.count,
        average_donation: round_dp(totals.average, 2),
        last_donation: valid.iter().map(|d| d.date()).max(),
    }
}

/// Summaries for `donors`, in the order given.
pub fn summarize_donors(donors: &[Donor], donations: &[Donation]) -> Vec<DonorSummary> {
    let by_donor = donations_by_donor(donations);
    donors
        .iter()
        .map(|donor| {
            let history = by_donor.get(&donor.id).map(Vec::as_slice).unwrap_or(&[]);
            summarize_donor(donor, history)
        })
        .collect()
}

/// The `limit` donors who gave the most, counting every donation whatever its status.
/// Donors who never gave rank last.
pub fn top_donors(donors: &[Donor], donations: &[Donation], limit: usize) -> Vec<DonorSummary> {
    let by_donor = donations_by_donor(donations);
    let mut ranked: Vec<(Decimal, &Donor)> = donors
        .iter()
        .map(|donor| {
            let total = by_donor
                .get(&donor.id)
                .map(|history| history.iter().map(|d| d.amount).sum::<Decimal>())
                .unwrap_or(Decimal::ZERO);
            (total, donor)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, donor)| {
            let history = by_donor.get(&donor.id).map(Vec::as_slice).unwrap_or(&[]);
            summarize_donor(donor, history)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::CaseStatus;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn case(id: i64, home: Option<i64>, discharged_on: Option<NaiveDate>) -> Case {
        Case {
            id,
            name: format!("Caso {id}"),
            status: CaseStatus::EnTratamiento,
            admitted_on: d(2024, 1, 1),
            discharged_on,
            clinic: None,
            diagnosis: None,
            shelter_home_id: home,
            estimated_budget: None,
        }
    }

    fn donation(id: i64, donor_id: i64, case_id: i64, amount: Decimal, status: &str) -> Donation {
        Donation {
            id,
            donor_id: Some(donor_id),
            case_id: Some(case_id),
            amount,
            donated_on: d(2024, 1, id as u32),
            payment_method: None,
            status: status.to_string(),
        }
    }

    fn expense(case_id: i64, amount: Decimal, status: &str) -> Expense {
        Expense {
            id: 1,
            concept: "Cirugía".to_string(),
            provider_id: Some(1),
            case_id: Some(case_id),
            amount,
            paid_on: d(2024, 1, 20),
            payment_method: None,
            status: status.to_string(),
            receipt: None,
        }
    }

    fn donor(id: i64) -> Donor {
        Donor {
            id,
            name: format!("Donante {id}"),
            id_kind: None,
            identification: None,
            email: None,
            phone: None,
            city: None,
            country: Some("Colombia".to_string()),
            donor_kind: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_spent_excludes_pending_expenses() {
        let donations = vec![
            donation(1, 1, 7, dec!(100), "Aprobada"),
            donation(2, 1, 7, dec!(50), "RECHAZADA"),
        ];
        let expenses = vec![
            expense(7, dec!(80), "PAGADO"),
            expense(7, dec!(20), "APROBADA"),
            expense(7, dec!(500), "PENDIENTE"),
        ];
        let rollups = CaseRollups::standard(&donations, &expenses);
        assert_eq!(rollups.raised(7), dec!(100));
        assert_eq!(rollups.spent(7), dec!(100));
        assert_eq!(rollups.raised(8), Decimal::ZERO);
    }

    #[test]
    fn test_summary_resolves_home_name_and_days() {
        let homes = vec![ShelterHome {
            id: 3,
            name: "Hogar Patitas".to_string(),
            contact_name: None,
            phone: None,
            city: None,
            capacity: Some(4),
        }];
        let rollups = CaseRollups::default();
        let today = d(2024, 1, 11);

        let housed = rollups.summarize(&case(1, Some(3), None), &homes, today);
        assert_eq!(housed.shelter_home_name.as_deref(), Some("Hogar Patitas"));
        assert_eq!(housed.days_active, Some(10));

        let closed = rollups.summarize(&case(2, None, Some(d(2024, 1, 5))), &homes, today);
        assert_eq!(closed.shelter_home_name, None);
        assert_eq!(closed.days_active, None);

        let json = serde_json::to_value(&housed).unwrap();
        assert_eq!(json["nombre_caso"], "Caso 1");
        assert_eq!(json["dias_activo"], 10);
        assert_eq!(json["total_recaudado"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_case_balance_counts_every_status() {
        let balance = CaseBalance::new(
            &case(7, None, None),
            vec![
                donation(1, 1, 7, dec!(100), "Aprobada"),
                donation(2, 1, 7, dec!(50), "RECHAZADA"),
            ],
            vec![expense(7, dec!(30), "PENDIENTE")],
        );
        assert_eq!(balance.total_raised, dec!(150));
        assert_eq!(balance.total_spent, dec!(30));
        assert_eq!(balance.balance, dec!(120));
        assert_eq!(balance.donations.len(), 2);
    }

    #[test]
    fn test_donor_summary_uses_the_valid_family() {
        let donations = vec![
            donation(1, 1, 7, dec!(100), "CONFIRMADO"),
            donation(2, 1, 7, dec!(50), "Exitosa"),
            donation(3, 1, 7, dec!(1000), "RECHAZADA"),
            donation(4, 1, 7, dec!(25), "COMPLETADA"),
        ];
        let summaries = summarize_donors(&[donor(1), donor(2)], &donations);
        assert_eq!(summaries[0].total_donated, dec!(150));
        assert_eq!(summaries[0].donation_count, 2);
        assert_eq!(summaries[0].average_donation, dec!(75));
        assert_eq!(summaries[0].last_donation, Some(d(2024, 1, 2)));
        assert_eq!(summaries[1].donation_count, 0);
        assert_eq!(summaries[1].last_donation, None);
    }

    #[test]
    fn test_top_donors_rank_by_every_donation() {
        let donations = vec![
            donation(1, 1, 7, dec!(100), "Aprobada"),
            donation(2, 2, 7, dec!(300), "RECHAZADA"),
        ];
        let top = top_donors(&[donor(1), donor(2), donor(3)], &donations, 2);
        let ids: Vec<i64> = top.iter().map(|s| s.donor.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
