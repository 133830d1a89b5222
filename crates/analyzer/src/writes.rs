//! Create and update paths. Field checks run first, then every referenced row is looked up so
//! the caller gets one error map covering both.

use crate::error::AnalyzerError;
use crate::service::KpiService;
use chrono::NaiveDate;
use core_types::validation::{
    validate_case, validate_donation, validate_donor, validate_expense, validate_provider,
    validate_shelter_home,
};
use core_types::{
    Case, CoreError, Donation, Donor, Expense, FieldErrors, NewCase, NewDonation, NewDonor,
    NewExpense, NewProvider, NewShelterHome, Provider, ShelterHome,
};
use database::DbError;
use tracing::{info, warn};

/// Unpacks field errors so more can be added; other failures pass through.
fn field_errors(checked: Result<(), CoreError>) -> Result<FieldErrors, AnalyzerError> {
    match checked {
        Ok(()) => Ok(FieldErrors::new()),
        Err(CoreError::Validation(errors)) => Ok(errors),
        Err(other) => Err(other.into()),
    }
}

fn exists<T>(lookup: Result<T, DbError>) -> Result<bool, DbError> {
    match lookup {
        Ok(_) => Ok(true),
        Err(DbError::NotFound) => Ok(false),
        Err(other) => Err(other),
    }
}

fn missing_reference(id: i64) -> String {
    format!("Clave primaria \"{id}\" inválida - objeto no existe.")
}

fn finish(errors: FieldErrors, entity: &str) -> Result<(), AnalyzerError> {
    if !errors.is_empty() {
        warn!(entity, %errors, "Rejected write");
    }
    Ok(errors.into_result()?)
}

impl KpiService {
    async fn check_case_refs(&self, case: &NewCase, errors: &mut FieldErrors) -> Result<(), AnalyzerError> {
        if let Some(id) = case.shelter_home_id {
            if !exists(self.ledger.get_shelter_home(id).await)? {
                errors.add("id_hogar_de_paso", missing_reference(id));
            }
        }
        Ok(())
    }

    async fn check_donation_refs(
        &self,
        donation: &NewDonation,
        errors: &mut FieldErrors,
    ) -> Result<(), AnalyzerError> {
        if let Some(id) = donation.donor_id {
            if !exists(self.ledger.get_donor(id).await)? {
                errors.add("id_donante", missing_reference(id));
            }
        }
        if let Some(id) = donation.case_id {
            if !exists(self.ledger.get_case(id).await)? {
                errors.add("id_caso", missing_reference(id));
            }
        }
        Ok(())
    }

    async fn check_expense_refs(
        &self,
        expense: &NewExpense,
        errors: &mut FieldErrors,
    ) -> Result<(), AnalyzerError> {
        if let Some(id) = expense.provider_id {
            if !exists(self.ledger.get_provider(id).await)? {
                errors.add("id_proveedor", missing_reference(id));
            }
        }
        if let Some(id) = expense.case_id {
            if !exists(self.ledger.get_case(id).await)? {
                errors.add("id_caso", missing_reference(id));
            }
        }
        Ok(())
    }

    pub async fn create_case(&self, case: NewCase, today: NaiveDate) -> Result<Case, AnalyzerError> {
        let mut errors = field_errors(validate_case(&case, today))?;
        self.check_case_refs(&case, &mut errors).await?;
        finish(errors, "case")?;
        let created = self.ledger.create_case(case).await?;
        info!(id = created.id, name = %created.name, "Case opened");
        Ok(created)
    }

    /// Replaces a case. Unknown ids are a `NotFound` before any field is checked.
    pub async fn update_case(
        &self,
        id: i64,
        case: NewCase,
        today: NaiveDate,
    ) -> Result<Case, AnalyzerError> {
        self.ledger.get_case(id).await?;
        let mut errors = field_errors(validate_case(&case, today))?;
        self.check_case_refs(&case, &mut errors).await?;
        finish(errors, "case")?;
        Ok(self.ledger.update_case(id, case).await?)
    }

    pub async fn create_donation(
        &self,
        donation: NewDonation,
        today: NaiveDate,
    ) -> Result<Donation, AnalyzerError> {
        let mut errors = field_errors(validate_donation(&donation, today))?;
        self.check_donation_refs(&donation, &mut errors).await?;
        finish(errors, "donation")?;
        Ok(self.ledger.create_donation(donation).await?)
    }

    pub async fn update_donation(
        &self,
        id: i64,
        donation: NewDonation,
        today: NaiveDate,
    ) -> Result<Donation, AnalyzerError> {
        self.ledger.get_donation(id).await?;
        let mut errors = field_errors(validate_donation(&donation, today))?;
        self.check_donation_refs(&donation, &mut errors).await?;
        finish(errors, "donation")?;
        Ok(self.ledger.update_donation(id, donation).await?)
    }

    pub async fn create_expense(
        &self,
        expense: NewExpense,
        today: NaiveDate,
    ) -> Result<Expense, AnalyzerError> {
        let mut errors = field_errors(validate_expense(&expense, today))?;
        self.check_expense_refs(&expense, &mut errors).await?;
        finish(errors, "expense")?;
        Ok(self.ledger.create_expense(expense).await?)
    }

    pub async fn update_expense(
        &self,
        id: i64,
        expense: NewExpense,
        today: NaiveDate,
    ) -> Result<Expense, AnalyzerError> {
        self.ledger.get_expense(id).await?;
        let mut errors = field_errors(validate_expense(&expense, today))?;
        self.check_expense_refs(&expense, &mut errors).await?;
        finish(errors, "expense")?;
        Ok(self.ledger.update_expense(id, expense).await?)
    }

    pub async fn create_donor(&self, donor: NewDonor) -> Result<Donor, AnalyzerError> {
        validate_donor(&donor)?;
        Ok(self.ledger.create_donor(donor).await?)
    }

    pub async fn create_provider(&self, provider: NewProvider) -> Result<Provider, AnalyzerError> {
        validate_provider(&provider)?;
        Ok(self.ledger.create_provider(provider).await?)
    }

    pub async fn create_shelter_home(
        &self,
        home: NewShelterHome,
    ) -> Result<ShelterHome, AnalyzerError> {
        validate_shelter_home(&home)?;
        Ok(self.ledger.create_shelter_home(home).await?)
    }
}
