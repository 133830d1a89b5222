use crate::{AppState, error::AppError};
use analytics::{
    CaseBalance, CaseKpis, CaseSummary, DashboardReport, DonationKpis, DonorKpis, DonorSummary,
    ExpenseKpis, ProviderKpis,
};
use analyzer::{
    CaseKpiFilter, CaseListFilter, DateRange, DonationListFilter, DonorListFilter,
    ExpenseKpiFilter, ExpenseListFilter, ShelterHomeFilter,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use core_types::{
    Case, Donation, Donor, Expense, NewCase, NewDonation, NewDonor, NewExpense, NewProvider,
    NewShelterHome, Provider, ShelterHome,
};
use serde::Serialize;
use std::sync::Arc;

type Created<T> = (StatusCode, Json<T>);

/// Every KPI and validation is anchored on the server's local calendar date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

/// # GET /api/health
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// --- KPIs ---

/// # GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Json<DashboardReport>, AppError> {
    Ok(Json(state.service.dashboard(&range, today()).await?))
}

/// # GET /api/casos/kpis
pub async fn case_kpis(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CaseKpiFilter>,
) -> Result<Json<CaseKpis>, AppError> {
    Ok(Json(state.service.case_kpis(&filter, today()).await?))
}

/// # GET /api/donaciones/kpis
pub async fn donation_kpis(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Json<DonationKpis>, AppError> {
    Ok(Json(state.service.donation_kpis(&range, today()).await?))
}

/// # GET /api/gastos/kpis
pub async fn expense_kpis(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseKpiFilter>,
) -> Result<Json<ExpenseKpis>, AppError> {
    Ok(Json(state.service.expense_kpis(&filter, today()).await?))
}

/// # GET /api/donantes/kpis
pub async fn donor_kpis(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Json<DonorKpis>, AppError> {
    Ok(Json(state.service.donor_kpis(&range, today()).await?))
}

/// # GET /api/proveedores/kpis
pub async fn provider_kpis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProviderKpis>, AppError> {
    Ok(Json(state.service.provider_kpis(today()).await?))
}

// --- Cases ---

/// # GET /api/casos
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CaseListFilter>,
) -> Result<Json<Vec<CaseSummary>>, AppError> {
    Ok(Json(state.service.list_cases(&filter, today()).await?))
}

/// # POST /api/casos
pub async fn create_case(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewCase>,
) -> Result<Created<Case>, AppError> {
    let case = state.service.create_case(payload, today()).await?;
    Ok((StatusCode::CREATED, Json(case)))
}

/// # GET /api/casos/activos
pub async fn active_cases(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CaseSummary>>, AppError> {
    Ok(Json(state.service.active_cases(today()).await?))
}

/// # GET /api/casos/:id
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CaseSummary>, AppError> {
    Ok(Json(state.service.case_detail(id, today()).await?))
}

/// # PUT /api/casos/:id
pub async fn update_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewCase>,
) -> Result<Json<Case>, AppError> {
    Ok(Json(state.service.update_case(id, payload, today()).await?))
}

/// # GET /api/casos/:id/balance
pub async fn case_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CaseBalance>, AppError> {
    Ok(Json(state.service.case_balance(id).await?))
}

// --- Donations ---

/// # GET /api/donaciones
pub async fn list_donations(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DonationListFilter>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.service.list_donations(&filter).await?))
}

/// # POST /api/donaciones
pub async fn create_donation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDonation>,
) -> Result<Created<Donation>, AppError> {
    let donation = state.service.create_donation(payload, today()).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

/// # GET /api/donaciones/:id
pub async fn get_donation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Donation>, AppError> {
    Ok(Json(state.service.donation(id).await?))
}

/// # PUT /api/donaciones/:id
pub async fn update_donation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewDonation>,
) -> Result<Json<Donation>, AppError> {
    Ok(Json(state.service.update_donation(id, payload, today()).await?))
}

// --- Expenses ---

/// # GET /api/gastos
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseListFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.service.list_expenses(&filter).await?))
}

/// # POST /api/gastos
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewExpense>,
) -> Result<Created<Expense>, AppError> {
    let expense = state.service.create_expense(payload, today()).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// # GET /api/gastos/:id
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.service.expense(id).await?))
}

/// # PUT /api/gastos/:id
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.service.update_expense(id, payload, today()).await?))
}

// --- Donors ---

/// # GET /api/donantes
pub async fn list_donors(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DonorListFilter>,
) -> Result<Json<Vec<DonorSummary>>, AppError> {
    Ok(Json(state.service.list_donors(&filter).await?))
}

/// # POST /api/donantes
pub async fn create_donor(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDonor>,
) -> Result<Created<Donor>, AppError> {
    let donor = state.service.create_donor(payload).await?;
    Ok((StatusCode::CREATED, Json(donor)))
}

/// # GET /api/donantes/top
pub async fn top_donors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DonorSummary>>, AppError> {
    Ok(Json(state.service.top_donors().await?))
}

/// # GET /api/donantes/:id
pub async fn get_donor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DonorSummary>, AppError> {
    Ok(Json(state.service.donor_detail(id).await?))
}

/// # GET /api/donantes/:id/donaciones
pub async fn donor_donations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Donation>>, AppError> {
    Ok(Json(state.service.donor_donations(id).await?))
}

// --- Providers ---

/// # GET /api/proveedores
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Provider>>, AppError> {
    Ok(Json(state.service.list_providers(&range).await?))
}

/// # POST /api/proveedores
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewProvider>,
) -> Result<Created<Provider>, AppError> {
    let provider = state.service.create_provider(payload).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// # GET /api/proveedores/:id
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Provider>, AppError> {
    Ok(Json(state.service.provider(id).await?))
}

/// # GET /api/proveedores/:id/gastos
pub async fn provider_expenses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.service.provider_expenses(id).await?))
}

// --- Shelter homes ---

/// # GET /api/hogares
pub async fn list_shelter_homes(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ShelterHomeFilter>,
) -> Result<Json<Vec<ShelterHome>>, AppError> {
    Ok(Json(state.service.list_shelter_homes(&filter).await?))
}

/// # POST /api/hogares
pub async fn create_shelter_home(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewShelterHome>,
) -> Result<Created<ShelterHome>, AppError> {
    let home = state.service.create_shelter_home(payload).await?;
    Ok((StatusCode::CREATED, Json(home)))
}

/// # GET /api/hogares/:id
pub async fn get_shelter_home(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ShelterHome>, AppError> {
    Ok(Json(state.service.shelter_home(id).await?))
}
