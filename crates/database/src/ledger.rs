use crate::error::DbError;
use analytics::DateWindow;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{
    Case, CaseStatus, Donation, Donor, Expense, NewCase, NewDonation, NewDonor, NewExpense,
    NewProvider, NewShelterHome, Provider, ShelterHome,
};

/// Filters for case listings. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
    pub admitted: DateWindow,
    /// Case-insensitive substring of the case name.
    pub name_contains: Option<String>,
    pub status: Option<CaseStatus>,
    /// Exact clinic name.
    pub clinic: Option<String>,
    /// Only cases without a discharge date.
    pub active_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DonationQuery {
    pub dated: DateWindow,
    /// Exact status literal, as stored.
    pub status: Option<String>,
    pub case_id: Option<i64>,
    pub donor_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub dated: DateWindow,
    /// Exact status literal, as stored.
    pub status: Option<String>,
    /// Case-insensitive substring of the related case's name.
    pub case_name_contains: Option<String>,
    pub case_id: Option<i64>,
    pub provider_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct DonorQuery {
    /// Compared against the calendar date of `created_at`.
    pub created: DateWindow,
    pub city: Option<String>,
    pub donor_kind: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderQuery {
    /// Compared against the calendar date of `created_at`.
    pub created: DateWindow,
}

#[derive(Debug, Clone, Default)]
pub struct ShelterHomeQuery {
    /// Case-insensitive substring of the city.
    pub city_contains: Option<String>,
}

/// The storage interface the KPI service and the write path are built on.
///
/// Listings come back newest first: cases by admission date, donations and expenses by their
/// date, donors by creation time, providers and shelter homes by id. Lookups by id return
/// `DbError::NotFound` when the row does not exist. Nothing here validates input; callers do.
#[async_trait]
pub trait Ledger: Send + Sync {
    // --- Cases ---
    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, DbError>;
    async fn get_case(&self, id: i64) -> Result<Case, DbError>;
    async fn create_case(&self, case: NewCase) -> Result<Case, DbError>;
    async fn update_case(&self, id: i64, case: NewCase) -> Result<Case, DbError>;
    /// Earliest admission date on record, ignoring every filter.
    async fn first_admission(&self) -> Result<Option<NaiveDate>, DbError>;

    // --- Donations ---
    async fn list_donations(&self, query: &DonationQuery) -> Result<Vec<Donation>, DbError>;
    async fn get_donation(&self, id: i64) -> Result<Donation, DbError>;
    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, DbError>;
    async fn update_donation(&self, id: i64, donation: NewDonation)
    -> Result<Donation, DbError>;

    // --- Expenses ---
    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, DbError>;
    async fn get_expense(&self, id: i64) -> Result<Expense, DbError>;
    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, DbError>;
    async fn update_expense(&self, id: i64, expense: NewExpense) -> Result<Expense, DbError>;
    /// Rewrites every expense whose status is exactly `from`. Returns the number of rows changed.
    async fn relabel_expense_status(&self, from: &str, to: &str) -> Result<u64, DbError>;

    // --- Donors ---
    async fn list_donors(&self, query: &DonorQuery) -> Result<Vec<Donor>, DbError>;
    async fn get_donor(&self, id: i64) -> Result<Donor, DbError>;
    async fn create_donor(&self, donor: NewDonor) -> Result<Donor, DbError>;

    // --- Providers ---
    async fn list_providers(&self, query: &ProviderQuery) -> Result<Vec<Provider>, DbError>;
    async fn get_provider(&self, id: i64) -> Result<Provider, DbError>;
    async fn create_provider(&self, provider: NewProvider) -> Result<Provider, DbError>;

    // --- Shelter homes ---
    async fn list_shelter_homes(&self, query: &ShelterHomeQuery)
    -> Result<Vec<ShelterHome>, DbError>;
    async fn get_shelter_home(&self, id: i64) -> Result<ShelterHome, DbError>;
    async fn create_shelter_home(&self, home: NewShelterHome) -> Result<ShelterHome, DbError>;
}

/// Case-insensitive substring match used by the name and city filters.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
