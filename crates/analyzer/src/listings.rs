//! Read paths behind the admin screens: filtered listings, detail views and histories.

use crate::error::AnalyzerError;
use crate::filters::{
    CaseListFilter, DateRange, DonationListFilter, DonorListFilter, ExpenseListFilter,
    ShelterHomeFilter, non_blank,
};
use crate::service::KpiService;
use analytics::{CaseBalance, CaseRollups, CaseSummary, DonorSummary, summarize_donors, top_donors};
use chrono::NaiveDate;
use core_types::{CaseStatus, Donation, Expense, Provider, ShelterHome};
use database::{
    CaseQuery, DonationQuery, DonorQuery, ExpenseQuery, ProviderQuery, ShelterHomeQuery,
};

impl KpiService {
    /// Cases newest first, each with its all-time raised/spent rollup.
    pub async fn list_cases(
        &self,
        filter: &CaseListFilter,
        today: NaiveDate,
    ) -> Result<Vec<CaseSummary>, AnalyzerError> {
        let status = non_blank(filter.estado.as_ref())
            .map(|raw| raw.parse::<CaseStatus>())
            .transpose()?;
        let query = CaseQuery {
            admitted: filter.range.closed_window()?,
            name_contains: non_blank(filter.search.as_ref()),
            status,
            clinic: non_blank(filter.veterinaria.as_ref()),
            active_only: false,
        };
        self.summarize_cases(&query, today).await
    }

    /// Cases still in the foundation's care.
    pub async fn active_cases(&self, today: NaiveDate) -> Result<Vec<CaseSummary>, AnalyzerError> {
        let query = CaseQuery {
            active_only: true,
            ..CaseQuery::default()
        };
        self.summarize_cases(&query, today).await
    }

    pub async fn case_detail(&self, id: i64, today: NaiveDate) -> Result<CaseSummary, AnalyzerError> {
        let case = self.ledger.get_case(id).await?;
        let donations = self
            .ledger
            .list_donations(&DonationQuery {
                case_id: Some(id),
                ..DonationQuery::default()
            })
            .await?;
        let expenses = self
            .ledger
            .list_expenses(&ExpenseQuery {
                case_id: Some(id),
                ..ExpenseQuery::default()
            })
            .await?;
        let homes = self.shelter_homes_of(case.shelter_home_id).await?;
        Ok(CaseRollups::standard(&donations, &expenses).summarize(&case, &homes, today))
    }

    /// Every donation and expense of the case whatever its status, with the resulting balance.
    pub async fn case_balance(&self, id: i64) -> Result<CaseBalance, AnalyzerError> {
        let case = self.ledger.get_case(id).await?;
        let donations = self
            .ledger
            .list_donations(&DonationQuery {
                case_id: Some(id),
                ..DonationQuery::default()
            })
            .await?;
        let expenses = self
            .ledger
            .list_expenses(&ExpenseQuery {
                case_id: Some(id),
                ..ExpenseQuery::default()
            })
            .await?;
        Ok(CaseBalance::new(&case, donations, expenses))
    }

    async fn summarize_cases(
        &self,
        query: &CaseQuery,
        today: NaiveDate,
    ) -> Result<Vec<CaseSummary>, AnalyzerError> {
        let cases = self.ledger.list_cases(query).await?;
        let donations = self.ledger.list_donations(&DonationQuery::default()).await?;
        let expenses = self.ledger.list_expenses(&ExpenseQuery::default()).await?;
        let homes = self
            .ledger
            .list_shelter_homes(&ShelterHomeQuery::default())
            .await?;
        let rollups = CaseRollups::standard(&donations, &expenses);
        Ok(cases
            .iter()
            .map(|case| rollups.summarize(case, &homes, today))
            .collect())
    }

    async fn shelter_homes_of(&self, id: Option<i64>) -> Result<Vec<ShelterHome>, AnalyzerError> {
        let Some(id) = id else {
            return Ok(Vec::new());
        };
        match self.ledger.get_shelter_home(id).await {
            Ok(home) => Ok(vec![home]),
            Err(database::DbError::NotFound) => Ok(Vec::new()),
            Err(other) => Err(other.into()),
        }
    }

    /// Donations newest first. The date filter applies only when both ends are given.
    pub async fn list_donations(
        &self,
        filter: &DonationListFilter,
    ) -> Result<Vec<Donation>, AnalyzerError> {
        let query = DonationQuery {
            dated: filter.range.closed_window()?,
            status: non_blank(filter.estado.as_ref()),
            ..DonationQuery::default()
        };
        Ok(self.ledger.list_donations(&query).await?)
    }

    pub async fn donation(&self, id: i64) -> Result<Donation, AnalyzerError> {
        Ok(self.ledger.get_donation(id).await?)
    }

    /// Expenses newest first. Either end of the date range may be given alone.
    pub async fn list_expenses(
        &self,
        filter: &ExpenseListFilter,
    ) -> Result<Vec<Expense>, AnalyzerError> {
        let query = ExpenseQuery {
            dated: filter.range.window()?,
            status: non_blank(filter.estado.as_ref()),
            case_name_contains: non_blank(filter.caso.as_ref()),
            ..ExpenseQuery::default()
        };
        Ok(self.ledger.list_expenses(&query).await?)
    }

    pub async fn expense(&self, id: i64) -> Result<Expense, AnalyzerError> {
        Ok(self.ledger.get_expense(id).await?)
    }

    /// Donors newest first, each with the history of their valid donations.
    pub async fn list_donors(
        &self,
        filter: &DonorListFilter,
    ) -> Result<Vec<DonorSummary>, AnalyzerError> {
        let query = DonorQuery {
            created: filter.range.window()?,
            city: non_blank(filter.ciudad.as_ref()),
            donor_kind: non_blank(filter.tipo_donante.as_ref()),
        };
        let donors = self.ledger.list_donors(&query).await?;
        let donations = self.ledger.list_donations(&DonationQuery::default()).await?;
        Ok(summarize_donors(&donors, &donations))
    }

    pub async fn donor_detail(&self, id: i64) -> Result<DonorSummary, AnalyzerError> {
        let donor = self.ledger.get_donor(id).await?;
        let donations = self.donor_donations(id).await?;
        let mut summaries = summarize_donors(std::slice::from_ref(&donor), &donations);
        summaries.pop().ok_or(AnalyzerError::Database(database::DbError::NotFound))
    }

    /// The configured number of donors who gave the most, whatever the donation status.
    pub async fn top_donors(&self) -> Result<Vec<DonorSummary>, AnalyzerError> {
        let donors = self.ledger.list_donors(&DonorQuery::default()).await?;
        let donations = self.ledger.list_donations(&DonationQuery::default()).await?;
        Ok(top_donors(&donors, &donations, self.config.top_donors))
    }

    /// A donor's donations, newest first. Unknown donors are a `NotFound`.
    pub async fn donor_donations(&self, id: i64) -> Result<Vec<Donation>, AnalyzerError> {
        self.ledger.get_donor(id).await?;
        let query = DonationQuery {
            donor_id: Some(id),
            ..DonationQuery::default()
        };
        Ok(self.ledger.list_donations(&query).await?)
    }

    pub async fn list_providers(&self, range: &DateRange) -> Result<Vec<Provider>, AnalyzerError> {
        let query = ProviderQuery {
            created: range.window()?,
        };
        Ok(self.ledger.list_providers(&query).await?)
    }

    pub async fn provider(&self, id: i64) -> Result<Provider, AnalyzerError> {
        Ok(self.ledger.get_provider(id).await?)
    }

    /// A provider's expenses, newest first. Unknown providers are a `NotFound`.
    pub async fn provider_expenses(&self, id: i64) -> Result<Vec<Expense>, AnalyzerError> {
        self.ledger.get_provider(id).await?;
        let query = ExpenseQuery {
            provider_id: Some(id),
            ..ExpenseQuery::default()
        };
        Ok(self.ledger.list_expenses(&query).await?)
    }

    pub async fn list_shelter_homes(
        &self,
        filter: &ShelterHomeFilter,
    ) -> Result<Vec<ShelterHome>, AnalyzerError> {
        let query = ShelterHomeQuery {
            city_contains: non_blank(filter.ciudad.as_ref()),
        };
        Ok(self.ledger.list_shelter_homes(&query).await?)
    }

    pub async fn shelter_home(&self, id: i64) -> Result<ShelterHome, AnalyzerError> {
        Ok(self.ledger.get_shelter_home(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::filters::{CaseListFilter, DateRange, DonorListFilter, ExpenseListFilter};
    use crate::service::tests::{service, today};
    use crate::AnalyzerError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_case_listing_carries_rollups_newest_first() {
        let cases = service()
            .list_cases(&CaseListFilter::default(), today())
            .await
            .unwrap();
        let ids: Vec<i64> = cases.iter().map(|c| c.case.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        let luna = &cases[1];
        assert_eq!(luna.total_raised, dec!(350));
        // "Pagado" is not a settled spelling.
        assert_eq!(luna.total_spent, dec!(120));
        assert_eq!(luna.days_active, Some(45));
        assert_eq!(luna.shelter_home_name.as_deref(), Some("Casa Azul"));
    }

    #[tokio::test]
    async fn test_case_listing_rejects_unknown_status() {
        let filter = CaseListFilter {
            estado: Some("PERDIDO".to_string()),
            ..CaseListFilter::default()
        };
        let err = service().list_cases(&filter, today()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_case_listing_ignores_one_sided_range() {
        let filter = CaseListFilter {
            range: DateRange::new(Some("2024-03-05"), None),
            ..CaseListFilter::default()
        };
        let cases = service().list_cases(&filter, today()).await.unwrap();
        assert_eq!(cases.len(), 3);
    }

    #[tokio::test]
    async fn test_case_balance_counts_every_status() {
        let balance = service().case_balance(2).await.unwrap();
        assert_eq!(balance.total_raised, dec!(180));
        assert_eq!(balance.total_spent, dec!(60));
        assert_eq!(balance.balance, dec!(120));
        assert_eq!(balance.donations.len(), 2);
    }

    #[tokio::test]
    async fn test_active_cases_and_missing_case() {
        let service = service();
        assert_eq!(service.active_cases(today()).await.unwrap().len(), 2);
        let err = service.case_balance(99).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_expense_listing_accepts_one_sided_range() {
        let filter = ExpenseListFilter {
            range: DateRange::new(Some("2024-03-01"), None),
            ..ExpenseListFilter::default()
        };
        let expenses = service().list_expenses(&filter).await.unwrap();
        let ids: Vec<i64> = expenses.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_donor_listing_summarizes_valid_donations() {
        let donors = service().list_donors(&DonorListFilter::default()).await.unwrap();
        let first = donors.iter().find(|d| d.donor.id == 1).unwrap();
        assert_eq!(first.total_donated, dec!(350));
        assert_eq!(first.donation_count, 2);
        assert_eq!(first.average_donation, dec!(175));

        // "COMPLETADA" is not a valid spelling for donor history.
        let second = donors.iter().find(|d| d.donor.id == 2).unwrap();
        assert_eq!(second.donation_count, 0);
    }

    #[tokio::test]
    async fn test_top_donors_and_histories() {
        let service = service();
        let top = service.top_donors().await.unwrap();
        let ids: Vec<i64> = top.iter().map(|d| d.donor.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let history = service.donor_donations(1).await.unwrap();
        let ids: Vec<i64> = history.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(service.donor_donations(42).await.unwrap_err().is_not_found());

        let expenses = service.provider_expenses(1).await.unwrap();
        assert_eq!(expenses.len(), 3);
    }
}
