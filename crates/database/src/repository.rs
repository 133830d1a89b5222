use crate::error::DbError;
use crate::ledger::{
    CaseQuery, DonationQuery, DonorQuery, ExpenseQuery, Ledger, ProviderQuery, ShelterHomeQuery,
};
use analytics::DateWindow;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{
    Case, CaseStatus, Donation, Donor, Expense, NewCase, NewDonation, NewDonor, NewExpense,
    NewProvider, NewShelterHome, Provider, ShelterHome,
};
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use tracing::{debug, info};

const CASE_COLUMNS: &str = "id, name, status, admitted_on, discharged_on, clinic, diagnosis, \
     shelter_home_id, estimated_budget";
const DONATION_COLUMNS: &str = "id, donor_id, case_id, amount, donated_on, payment_method, status";
const EXPENSE_COLUMNS: &str =
    "id, concept, provider_id, case_id, amount, paid_on, payment_method, status, receipt";
const DONOR_COLUMNS: &str = "id, name, id_kind, identification, email, phone, city, country, \
     donor_kind, notes, created_at";
const PROVIDER_COLUMNS: &str =
    "id, name, kind, tax_id, contact_name, email, phone, city, created_at";
const SHELTER_HOME_COLUMNS: &str = "id, name, contact_name, phone, city, capacity";

/// The PostgreSQL `Ledger`. Every query is built at runtime; filters are bound, never formatted.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Appends inclusive bounds on `column` for each side of `window` that is set.
fn push_window(builder: &mut QueryBuilder<'_, Postgres>, column: &str, window: &DateWindow) {
    if let Some(start) = window.start {
        builder.push(format!(" AND {column} >= ")).push_bind(start);
    }
    if let Some(end) = window.end {
        builder.push(format!(" AND {column} <= ")).push_bind(end);
    }
}

/// Appends a case-insensitive substring match of `needle` against `column`.
fn push_contains(builder: &mut QueryBuilder<'_, Postgres>, column: &str, needle: &str) {
    builder
        .push(format!(" AND strpos(lower({column}), lower("))
        .push_bind(needle.to_string())
        .push(")) > 0");
}

// --- Row mapping ---

fn case_from_row(row: &PgRow) -> Result<Case, DbError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<CaseStatus>()
        .map_err(|e| DbError::InvalidData(e.to_string()))?;
    Ok(Case {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        status,
        admitted_on: row.try_get("admitted_on")?,
        discharged_on: row.try_get("discharged_on")?,
        clinic: row.try_get("clinic")?,
        diagnosis: row.try_get("diagnosis")?,
        shelter_home_id: row.try_get("shelter_home_id")?,
        estimated_budget: row.try_get("estimated_budget")?,
    })
}

fn donation_from_row(row: &PgRow) -> Result<Donation, DbError> {
    Ok(Donation {
        id: row.try_get("id")?,
        donor_id: row.try_get("donor_id")?,
        case_id: row.try_get("case_id")?,
        amount: row.try_get("amount")?,
        donated_on: row.try_get("donated_on")?,
        payment_method: row.try_get("payment_method")?,
        status: row.try_get("status")?,
    })
}

fn expense_from_row(row: &PgRow) -> Result<Expense, DbError> {
    Ok(Expense {
        id: row.try_get("id")?,
        concept: row.try_get("concept")?,
        provider_id: row.try_get("provider_id")?,
        case_id: row.try_get("case_id")?,
        amount: row.try_get("amount")?,
        paid_on: row.try_get("paid_on")?,
        payment_method: row.try_get("payment_method")?,
        status: row.try_get("status")?,
        receipt: row.try_get("receipt")?,
    })
}

fn donor_from_row(row: &PgRow) -> Result<Donor, DbError> {
    Ok(Donor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        id_kind: row.try_get("id_kind")?,
        identification: row.try_get("identification")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        donor_kind: row.try_get("donor_kind")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn provider_from_row(row: &PgRow) -> Result<Provider, DbError> {
    Ok(Provider {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind: row.try_get("kind")?,
        tax_id: row.try_get("tax_id")?,
        contact_name: row.try_get("contact_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        city: row.try_get("city")?,
        created_at: row.try_get("created_at")?,
    })
}

fn shelter_home_from_row(row: &PgRow) -> Result<ShelterHome, DbError> {
    Ok(ShelterHome {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        contact_name: row.try_get("contact_name")?,
        phone: row.try_get("phone")?,
        city: row.try_get("city")?,
        capacity: row.try_get("capacity")?,
    })
}

#[async_trait]
impl Ledger for DbRepository {
    async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, DbError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {CASE_COLUMNS} FROM cases WHERE TRUE"));
        push_window(&mut builder, "admitted_on", &query.admitted);
        if let Some(needle) = query.name_contains.as_deref() {
            push_contains(&mut builder, "name", needle);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(clinic) = query.clinic.as_deref() {
            builder.push(" AND clinic = ").push_bind(clinic.to_string());
        }
        if query.active_only {
            builder.push(" AND discharged_on IS NULL");
        }
        builder.push(" ORDER BY admitted_on DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "cases fetched");
        rows.iter().map(case_from_row).collect()
    }

    async fn get_case(&self, id: i64) -> Result<Case, DbError> {
        let row = sqlx::query(&format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_fetch)?;
        case_from_row(&row)
    }

    async fn create_case(&self, case: NewCase) -> Result<Case, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cases (
                name, status, admitted_on, discharged_on, clinic, diagnosis,
                shelter_home_id, estimated_budget
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CASE_COLUMNS}
            "#
        ))
        .bind(&case.name)
        .bind(case.status.as_str())
        .bind(case.admitted_on)
        .bind(case.discharged_on)
        .bind(&case.clinic)
        .bind(&case.diagnosis)
        .bind(case.shelter_home_id)
        .bind(case.estimated_budget)
        .fetch_one(&self.pool)
        .await?;
        let case = case_from_row(&row)?;
        info!(id = case.id, "case created");
        Ok(case)
    }

    async fn update_case(&self, id: i64, case: NewCase) -> Result<Case, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE cases SET
                name = $2, status = $3, admitted_on = $4, discharged_on = $5, clinic = $6,
                diagnosis = $7, shelter_home_id = $8, estimated_budget = $9
            WHERE id = $1
            RETURNING {CASE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&case.name)
        .bind(case.status.as_str())
        .bind(case.admitted_on)
        .bind(case.discharged_on)
        .bind(&case.clinic)
        .bind(&case.diagnosis)
        .bind(case.shelter_home_id)
        .bind(case.estimated_budget)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        case_from_row(&row)
    }

    async fn first_admission(&self) -> Result<Option<NaiveDate>, DbError> {
        let row = sqlx::query("SELECT MIN(admitted_on) AS first FROM cases")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("first")?)
    }

    async fn list_donations(&self, query: &DonationQuery) -> Result<Vec<Donation>, DbError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE TRUE"
        ));
        push_window(&mut builder, "donated_on", &query.dated);
        if let Some(status) = query.status.as_deref() {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(case_id) = query.case_id {
            builder.push(" AND case_id = ").push_bind(case_id);
        }
        if let Some(donor_id) = query.donor_id {
            builder.push(" AND donor_id = ").push_bind(donor_id);
        }
        builder.push(" ORDER BY donated_on DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "donations fetched");
        rows.iter().map(donation_from_row).collect()
    }

    async fn get_donation(&self, id: i64) -> Result<Donation, DbError> {
        let row = sqlx::query(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        donation_from_row(&row)
    }

    async fn create_donation(&self, donation: NewDonation) -> Result<Donation, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO donations (donor_id, case_id, amount, donated_on, payment_method, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(donation.donor_id)
        .bind(donation.case_id)
        .bind(donation.amount)
        .bind(donation.donated_on)
        .bind(&donation.payment_method)
        .bind(&donation.status)
        .fetch_one(&self.pool)
        .await?;
        let donation = donation_from_row(&row)?;
        info!(id = donation.id, amount = %donation.amount, "donation recorded");
        Ok(donation)
    }

    async fn update_donation(&self, id: i64, donation: NewDonation) -> Result<Donation, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE donations SET
                donor_id = $2, case_id = $3, amount = $4, donated_on = $5,
                payment_method = $6, status = $7
            WHERE id = $1
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(donation.donor_id)
        .bind(donation.case_id)
        .bind(donation.amount)
        .bind(donation.donated_on)
        .bind(&donation.payment_method)
        .bind(&donation.status)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        donation_from_row(&row)
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, DbError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE TRUE"
        ));
        push_window(&mut builder, "paid_on", &query.dated);
        if let Some(status) = query.status.as_deref() {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(case_id) = query.case_id {
            builder.push(" AND case_id = ").push_bind(case_id);
        }
        if let Some(provider_id) = query.provider_id {
            builder.push(" AND provider_id = ").push_bind(provider_id);
        }
        if let Some(needle) = query.case_name_contains.as_deref() {
            builder.push(" AND EXISTS (SELECT 1 FROM cases c WHERE c.id = expenses.case_id");
            push_contains(&mut builder, "c.name", needle);
            builder.push(")");
        }
        builder.push(" ORDER BY paid_on DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "expenses fetched");
        rows.iter().map(expense_from_row).collect()
    }

    async fn get_expense(&self, id: i64) -> Result<Expense, DbError> {
        let row = sqlx::query(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_fetch)?;
        expense_from_row(&row)
    }

    async fn create_expense(&self, expense: NewExpense) -> Result<Expense, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO expenses (
                concept, provider_id, case_id, amount, paid_on, payment_method, status, receipt
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(&expense.concept)
        .bind(expense.provider_id)
        .bind(expense.case_id)
        .bind(expense.amount)
        .bind(expense.paid_on)
        .bind(&expense.payment_method)
        .bind(&expense.status)
        .bind(&expense.receipt)
        .fetch_one(&self.pool)
        .await?;
        let expense = expense_from_row(&row)?;
        info!(id = expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    async fn update_expense(&self, id: i64, expense: NewExpense) -> Result<Expense, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE expenses SET
                concept = $2, provider_id = $3, case_id = $4, amount = $5, paid_on = $6,
                payment_method = $7, status = $8, receipt = $9
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&expense.concept)
        .bind(expense.provider_id)
        .bind(expense.case_id)
        .bind(expense.amount)
        .bind(expense.paid_on)
        .bind(&expense.payment_method)
        .bind(&expense.status)
        .bind(&expense.receipt)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        expense_from_row(&row)
    }

    async fn relabel_expense_status(&self, from: &str, to: &str) -> Result<u64, DbError> {
        let result = sqlx::query("UPDATE expenses SET status = $1 WHERE status = $2")
            .bind(to)
            .bind(from)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_donors(&self, query: &DonorQuery) -> Result<Vec<Donor>, DbError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {DONOR_COLUMNS} FROM donors WHERE TRUE"));
        push_window(
            &mut builder,
            "(created_at AT TIME ZONE 'UTC')::date",
            &query.created,
        );
        if let Some(city) = query.city.as_deref() {
            builder.push(" AND city = ").push_bind(city.to_string());
        }
        if let Some(kind) = query.donor_kind.as_deref() {
            builder.push(" AND donor_kind = ").push_bind(kind.to_string());
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(donor_from_row).collect()
    }

    async fn get_donor(&self, id: i64) -> Result<Donor, DbError> {
        let row = sqlx::query(&format!("SELECT {DONOR_COLUMNS} FROM donors WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from_fetch)?;
        donor_from_row(&row)
    }

    async fn create_donor(&self, donor: NewDonor) -> Result<Donor, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO donors (
                name, id_kind, identification, email, phone, city, country, donor_kind, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DONOR_COLUMNS}
            "#
        ))
        .bind(&donor.name)
        .bind(&donor.id_kind)
        .bind(&donor.identification)
        .bind(&donor.email)
        .bind(&donor.phone)
        .bind(&donor.city)
        .bind(&donor.country)
        .bind(&donor.donor_kind)
        .bind(&donor.notes)
        .fetch_one(&self.pool)
        .await?;
        donor_from_row(&row)
    }

    async fn list_providers(&self, query: &ProviderQuery) -> Result<Vec<Provider>, DbError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE TRUE"
        ));
        push_window(
            &mut builder,
            "(created_at AT TIME ZONE 'UTC')::date",
            &query.created,
        );
        builder.push(" ORDER BY id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(provider_from_row).collect()
    }

    async fn get_provider(&self, id: i64) -> Result<Provider, DbError> {
        let row = sqlx::query(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        provider_from_row(&row)
    }

    async fn create_provider(&self, provider: NewProvider) -> Result<Provider, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO providers (name, kind, tax_id, contact_name, email, phone, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PROVIDER_COLUMNS}
            "#
        ))
        .bind(&provider.name)
        .bind(&provider.kind)
        .bind(&provider.tax_id)
        .bind(&provider.contact_name)
        .bind(&provider.email)
        .bind(&provider.phone)
        .bind(&provider.city)
        .fetch_one(&self.pool)
        .await?;
        provider_from_row(&row)
    }

    async fn list_shelter_homes(
        &self,
        query: &ShelterHomeQuery,
    ) -> Result<Vec<ShelterHome>, DbError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SHELTER_HOME_COLUMNS} FROM shelter_homes WHERE TRUE"
        ));
        if let Some(needle) = query.city_contains.as_deref() {
            push_contains(&mut builder, "city", needle);
        }
        builder.push(" ORDER BY id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(shelter_home_from_row).collect()
    }

    async fn get_shelter_home(&self, id: i64) -> Result<ShelterHome, DbError> {
        let row = sqlx::query(&format!(
            "SELECT {SHELTER_HOME_COLUMNS} FROM shelter_homes WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_fetch)?;
        shelter_home_from_row(&row)
    }

    async fn create_shelter_home(&self, home: NewShelterHome) -> Result<ShelterHome, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO shelter_homes (name, contact_name, phone, city, capacity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SHELTER_HOME_COLUMNS}
            "#
        ))
        .bind(&home.name)
        .bind(&home.contact_name)
        .bind(&home.phone)
        .bind(&home.city)
        .bind(home.capacity)
        .fetch_one(&self.pool)
        .await?;
        shelter_home_from_row(&row)
    }
}
