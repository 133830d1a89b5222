use crate::error::DbError;
use crate::ledger::{
    CaseQuery, DonationQuery, DonorQuery, ExpenseQuery, Ledger, ProviderQuery, ShelterHomeQuery,
    contains_ignore_case,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use core_types::{
    Case, Donation, Donor, Expense, NewCase, NewDonation, NewDonor, NewExpense, NewProvider,
    NewShelterHome, Provider, ShelterHome,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Seed rows for a `MemoryLedger`. Ids are kept as given.
#[derive(Debug, Clone, Default)]
pub struct Records {
    pub cases: Vec<Case>,
    pub donations: Vec<Donation>,
    pub expenses: Vec<Expense>,
    pub donors: Vec<Donor>,
    pub providers: Vec<Provider>,
    pub shelter_homes: Vec<ShelterHome>,
}

#[derive(Debug, Default)]
struct Tables {
    cases: BTreeMap<i64, Case>,
    donations: BTreeMap<i64, Donation>,
    expenses: BTreeMap<i64, Expense>,
    donors: BTreeMap<i64, Donor>,
    providers: BTreeMap<i64, Provider>,
    shelter_homes: BTreeMap<i64, ShelterHome>,
}

/// Next free id of a table, mimicking a serial column.
fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

/// A `Ledger` held entirely in process memory.
///
/// Used by the test suites and by `serve --in-memory` for demos without a database.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: RwLock<Tables>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Records) -> Self {
        let tables = Tables {
            cases: records.cases.into_iter().map(|r| (r.id, r)).collect(),
            donations: records.donations.into_iter().map(|r| (r.id, r)).collect(),
            expenses: records.expenses.into_iter().map(|r| (r.id, r)).collect(),
            donors: records.donors.into_iter().map(|r| (r.id, r)).collect(),
            providers: records.providers.into_iter().map(|r| (r.id, r)).collect(),
            shelter_homes: records.shelter_homes.into_iter().map(|r| (r.id, r)).collect(),
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, DbError> {
        let tables = self.tables.read().await;
        let mut cases: Vec<Case> = tables
            .cases
            .values()
            .filter(|c| query.admitted.contains(c.admitted_on))
            .filter(|c| {
                query
                    .name_contains
                    .as_deref()
                    .is_none_or(|needle| contains_ignore_case(&c.name, needle))
            })
            .filter(|c| query.status.is_none_or(|s| c.status == s))
            .filter(|c| {
                query
                    .clinic
                    .as_deref()
                    .is_none_or(|clinic| c.clinic.as_deref() == Some(clinic))
            })
            .filter(|c| !query.active_only || c.is_active())
            .cloned()
            .collect();
        cases.sort_by_key(|c| (Reverse(c.admitted_on), Reverse(c.id)));
        Ok(cases)
    }

    async fn get_case(&self, id: i64) -> Result<Case, DbError> {
        let tables = self.tables.read().await;
        tables.cases.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_case(&self, case: NewCase) -> Result<Case, DbError> {
        let mut tables = self.tables.write().await;
        let case = case.into_case(next_id(&tables.cases));
        tables.cases.insert(case.id, case.clone());
        debug!(id = case.id, "case stored in memory");
        Ok(case)
    }

    async fn update_case(&self, id: i64, case: NewCase) -> Result<Case, DbError> {
        let mut tables = self.tables.write().await;
        let slot = tables.cases.get_mut(&id).ok_or(DbError::NotFound)?;
        *slot = case.into_case(id);
        Ok(slot.clone())
    }

    async fn first_admission(&self) -> Result<Option<NaiveDate>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.cases.values().map(|c| c.admitted_on).min())
    }

    async fn list_donations(&self, query: &DonationQuery) -> Result<Vec<Donation>, DbError> {
        let tables = self.tables.read().await;
        let mut donations: Vec<Donation> = tables
            .donations
            .values()
            .filter(|d| query.dated.contains(d.donated_on))
            .filter(|d| query.status.as_deref().is_none_or(|s| d.status == s))
            .filter(|d| query.case_id.is_none_or(|id| d.case_id == Some(id)))
            .filter(|d| query.donor_id.is_none_or(|id| d.donor_id == Some(id)))
            .cloned()
            .collect();
        donations.sort_by_key(|d| (Reverse(d.donated_on), Reverse(d.id)));
        Ok(donations)
    }

    async fn get_donation(&self, id: i64) -> Result<Donation, DbError> {
        let tables = self.tables.read().await;
        tables.donations.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, DbError> {
        let mut tables = self.tables.write().await;
        let donation = donation.into_donation(next_id(&tables.donations));
        tables.donations.insert(donation.id, donation.clone());
        Ok(donation)
    }

    async fn update_donation(&self, id: i64, donation: NewDonation) -> Result<Donation, DbError> {
        let mut tables = self.tables.write().await;
        let slot = tables.donations.get_mut(&id).ok_or(DbError::NotFound)?;
        *slot = donation.into_donation(id);
        Ok(slot.clone())
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, DbError> {
        let tables = self.tables.read().await;
        let case_name_matches = |case_id: Option<i64>| match query.case_name_contains.as_deref() {
            None => true,
            Some(needle) => case_id
                .and_then(|id| tables.cases.get(&id))
                .is_some_and(|c| contains_ignore_case(&c.name, needle)),
        };
        let mut expenses: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|e| query.dated.contains(e.paid_on))
            .filter(|e| query.status.as_deref().is_none_or(|s| e.status == s))
            .filter(|e| query.case_id.is_none_or(|id| e.case_id == Some(id)))
            .filter(|e| query.provider_id.is_none_or(|id| e.provider_id == Some(id)))
            .filter(|e| case_name_matches(e.case_id))
            .cloned()
            .collect();
        expenses.sort_by_key(|e| (Reverse(e.paid_on), Reverse(e.id)));
        Ok(expenses)
    }

    async fn get_expense(&self, id: i64) -> Result<Expense, DbError> {
        let tables = self.tables.read().await;
        tables.expenses.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, DbError> {
        let mut tables = self.tables.write().await;
        let expense = expense.into_expense(next_id(&tables.expenses));
        tables.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    async fn update_expense(&self, id: i64, expense: NewExpense) -> Result<Expense, DbError> {
        let mut tables = self.tables.write().await;
        let slot = tables.expenses.get_mut(&id).ok_or(DbError::NotFound)?;
        *slot = expense.into_expense(id);
        Ok(slot.clone())
    }

    async fn relabel_expense_status(&self, from: &str, to: &str) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for expense in tables.expenses.values_mut().filter(|e| e.status == from) {
            expense.status = to.to_string();
            changed += 1;
        }
        Ok(changed)
    }

    async fn list_donors(&self, query: &DonorQuery) -> Result<Vec<Donor>, DbError> {
        let tables = self.tables.read().await;
        let mut donors: Vec<Donor> = tables
            .donors
            .values()
            .filter(|d| query.created.contains(d.created_at.date_naive()))
            .filter(|d| {
                query
                    .city
                    .as_deref()
                    .is_none_or(|city| d.city.as_deref() == Some(city))
            })
            .filter(|d| {
                query
                    .donor_kind
                    .as_deref()
                    .is_none_or(|kind| d.donor_kind.as_deref() == Some(kind))
            })
            .cloned()
            .collect();
        donors.sort_by_key(|d| (Reverse(d.created_at), Reverse(d.id)));
        Ok(donors)
    }

    async fn get_donor(&self, id: i64) -> Result<Donor, DbError> {
        let tables = self.tables.read().await;
        tables.donors.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_donor(&self, donor: NewDonor) -> Result<Donor, DbError> {
        let mut tables = self.tables.write().await;
        let donor = donor.into_donor(next_id(&tables.donors), Utc::now());
        tables.donors.insert(donor.id, donor.clone());
        Ok(donor)
    }

    async fn list_providers(&self, query: &ProviderQuery) -> Result<Vec<Provider>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .values()
            .rev()
            .filter(|p| query.created.contains(p.created_at.date_naive()))
            .cloned()
            .collect())
    }

    async fn get_provider(&self, id: i64) -> Result<Provider, DbError> {
        let tables = self.tables.read().await;
        tables.providers.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_provider(&self, provider: NewProvider) -> Result<Provider, DbError> {
        let mut tables = self.tables.write().await;
        let provider = provider.into_provider(next_id(&tables.providers), Utc::now());
        tables.providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    async fn list_shelter_homes(
        &self,
        query: &ShelterHomeQuery,
    ) -> Result<Vec<ShelterHome>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shelter_homes
            .values()
            .rev()
            .filter(|h| match query.city_contains.as_deref() {
                None => true,
                Some(needle) => h
                    .city
                    .as_deref()
                    .is_some_and(|city| contains_ignore_case(city, needle)),
            })
            .cloned()
            .collect())
    }

    async fn get_shelter_home(&self, id: i64) -> Result<ShelterHome, DbError> {
        let tables = self.tables.read().await;
        tables.shelter_homes.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_shelter_home(&self, home: NewShelterHome) -> Result<ShelterHome, DbError> {
        let mut tables = self.tables.write().await;
        let home = home.into_shelter_home(next_id(&tables.shelter_homes));
        tables.shelter_homes.insert(home.id, home.clone());
        Ok(home)
    }
}
