use crate::error::AnalyzerError;
use crate::filters::{CaseKpiFilter, DateRange, ExpenseKpiFilter, non_blank};
use analytics::{
    CaseKpis, DashboardInput, DashboardLimits, DashboardReport, DateWindow, DonationKpis,
    DonorKpis, ExpenseKpis, KpiEngine, MonthSpan, Period, PreviousPeriod, ProviderKpis,
};
use chrono::NaiveDate;
use configuration::KpiConfig;
use database::{
    CaseQuery, DonationQuery, DonorQuery, ExpenseQuery, Ledger, ProviderQuery, ShelterHomeQuery,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads record sets from a `Ledger` and hands them to the KPI engine.
///
/// Every method takes `today` explicitly; the HTTP layer passes the local date.
#[derive(Clone)]
pub struct KpiService {
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) config: KpiConfig,
}

impl KpiService {
    pub fn new(ledger: Arc<dyn Ledger>, config: KpiConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn config(&self) -> KpiConfig {
        self.config
    }

    /// Case KPIs over the admission window. Malformed dates do not fail the request: the
    /// window is dropped and the monthly average falls back to a twelve-month divisor.
    pub async fn case_kpis(
        &self,
        filter: &CaseKpiFilter,
        today: NaiveDate,
    ) -> Result<CaseKpis, AnalyzerError> {
        let (period, span) = match filter.range.parse() {
            Ok((start, end)) => {
                let period = Period::resolve(start, end, PreviousPeriod::DayShift, today);
                let span = match (start, end) {
                    (Some(start), Some(end)) => MonthSpan::Range(start, end),
                    _ => MonthSpan::SinceFirstAdmission(self.ledger.first_admission().await?),
                };
                (period, span)
            }
            Err(error) => {
                warn!(%error, "Ignoring malformed case KPI dates");
                let period = Period {
                    current: DateWindow::UNBOUNDED,
                    previous: None,
                };
                (period, MonthSpan::Unparseable)
            }
        };

        let cases = self
            .ledger
            .list_cases(&CaseQuery {
                name_contains: non_blank(filter.search.as_ref()),
                ..CaseQuery::default()
            })
            .await?;
        let donations = self.ledger.list_donations(&DonationQuery::default()).await?;
        let expenses = self.ledger.list_expenses(&ExpenseQuery::default()).await?;

        Ok(KpiEngine::new(today).case_kpis(&cases, &donations, &expenses, &period, span))
    }

    /// Donation KPIs, compared against the same window one month earlier.
    pub async fn donation_kpis(
        &self,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<DonationKpis, AnalyzerError> {
        let (start, end) = range.parse()?;
        let period = Period::resolve(start, end, PreviousPeriod::MonthShift, today);
        let donations = self
            .ledger
            .list_donations(&DonationQuery {
                dated: period.span(),
                ..DonationQuery::default()
            })
            .await?;
        Ok(KpiEngine::new(today).donation_kpis(&donations, &period))
    }

    /// Expense KPIs, compared against the same window one month earlier.
    pub async fn expense_kpis(
        &self,
        filter: &ExpenseKpiFilter,
        today: NaiveDate,
    ) -> Result<ExpenseKpis, AnalyzerError> {
        let (start, end) = filter.range.parse()?;
        let period = Period::resolve(start, end, PreviousPeriod::MonthShift, today);
        let expenses = self
            .ledger
            .list_expenses(&ExpenseQuery {
                dated: period.span(),
                case_name_contains: non_blank(filter.caso.as_ref()),
                ..ExpenseQuery::default()
            })
            .await?;
        Ok(KpiEngine::new(today).expense_kpis(&expenses, &period))
    }

    pub async fn donor_kpis(
        &self,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<DonorKpis, AnalyzerError> {
        let (start, end) = range.parse()?;
        let period = Period::resolve(start, end, PreviousPeriod::DayShift, today);
        let donors = self.ledger.list_donors(&DonorQuery::default()).await?;
        let donations = self.ledger.list_donations(&DonationQuery::default()).await?;
        Ok(KpiEngine::new(today).donor_kpis(&donors, &donations, &period))
    }

    pub async fn provider_kpis(&self, today: NaiveDate) -> Result<ProviderKpis, AnalyzerError> {
        let providers = self.ledger.list_providers(&ProviderQuery::default()).await?;
        let expenses = self.ledger.list_expenses(&ExpenseQuery::default()).await?;
        Ok(KpiEngine::new(today).provider_kpis(&providers, &expenses))
    }

    pub async fn dashboard(
        &self,
        range: &DateRange,
        today: NaiveDate,
    ) -> Result<DashboardReport, AnalyzerError> {
        let (start, end) = range.parse()?;
        let period = Period::resolve(start, end, PreviousPeriod::DayShift, today);
        let span = period.span();

        let cases = self.ledger.list_cases(&CaseQuery::default()).await?;
        let donations = self
            .ledger
            .list_donations(&DonationQuery {
                dated: span,
                ..DonationQuery::default()
            })
            .await?;
        let expenses = self
            .ledger
            .list_expenses(&ExpenseQuery {
                dated: span,
                ..ExpenseQuery::default()
            })
            .await?;
        let donors = self.ledger.list_donors(&DonorQuery::default()).await?;
        let homes = self
            .ledger
            .list_shelter_homes(&ShelterHomeQuery::default())
            .await?;

        let input = DashboardInput {
            cases: &cases,
            donations: &donations,
            expenses: &expenses,
            donors: &donors,
            homes: &homes,
        };
        let limits = DashboardLimits {
            top_countries: self.config.top_countries,
            highlighted_cases: self.config.highlighted_cases,
        };
        let report = KpiEngine::new(today).dashboard(&input, &period, limits);
        info!(
            donated = %report.kpis.donated,
            spent = %report.kpis.spent,
            "Dashboard served"
        );
        Ok(report)
    }
}
