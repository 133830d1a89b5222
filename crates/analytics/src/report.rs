//! KPI result sets, one per resource, serialized with the keys the admin UI reads.

use crate::aggregate::MonthlyBucket;
use crate::rollup::CaseSummary;
use crate::trend::Trend;
use rust_decimal::Decimal;
use serde::Serialize;

/// Operational and financial indicators over a set of cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseKpis {
    // I. Operational
    #[serde(rename = "dias_promedio_por_caso")]
    pub average_days_active: i64,
    /// Blended burn rate: every expense of the active cases over their summed days.
    #[serde(rename = "costo_diario_promedio_caso")]
    pub daily_cost_per_case: Decimal,
    #[serde(rename = "costo_diario_fundacion")]
    pub daily_cost_foundation: Decimal,
    #[serde(rename = "casos_con_deficit")]
    pub cases_in_deficit: usize,

    // II. Financial
    #[serde(rename = "promedio_recaudado")]
    pub average_raised: Decimal,
    #[serde(rename = "promedio_gastado")]
    pub average_spent: Decimal,
    #[serde(rename = "promedio_casos_mensuales")]
    pub monthly_average_cases: i64,

    // III. Status
    #[serde(rename = "total_historico")]
    pub total: usize,
    #[serde(rename = "casos_activos")]
    pub active: usize,
    pub abierto: usize,
    pub en_tratamiento: usize,
    #[serde(rename = "adoptados")]
    pub adoptado: usize,
    pub cerrado: usize,
    pub fallecido: usize,

    // IV. Secondary
    #[serde(rename = "sin_hogar")]
    pub without_home: usize,
    #[serde(rename = "tiempo_promedio")]
    pub average_time: i64,
    #[serde(rename = "tendencias")]
    pub trends: Option<CaseTrends>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseTrends {
    pub total_historico: Trend,
    pub casos_activos: Trend,
}

/// Donation income, outcome counts and month-over-month variations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationKpis {
    #[serde(rename = "total_recaudado")]
    pub total_raised: Decimal,
    #[serde(rename = "promedio_donacion")]
    pub average_donation: Decimal,
    /// Same figure as `successful`; kept under both keys for the UI.
    #[serde(rename = "cantidad_donaciones")]
    pub donation_count: usize,
    #[serde(rename = "cantidad_exitosas")]
    pub successful: usize,
    #[serde(rename = "cantidad_rechazadas")]
    pub rejected: usize,
    #[serde(rename = "cantidad_fallidas")]
    pub failed: usize,
    #[serde(rename = "donantes_unicos")]
    pub unique_donors: usize,

    // Signed percentages against the previous period.
    #[serde(rename = "variacion_recaudo")]
    pub raised_variation: Decimal,
    #[serde(rename = "variacion_promedio")]
    pub average_variation: Decimal,
    #[serde(rename = "variacion_exitosas")]
    pub successful_variation: Decimal,
    #[serde(rename = "variacion_rechazadas")]
    pub rejected_variation: Decimal,
    #[serde(rename = "variacion_fallidas")]
    pub failed_variation: Decimal,
    #[serde(rename = "variacion_donantes_unicos")]
    pub unique_donors_variation: Decimal,
    #[serde(rename = "variacion_total_intentos")]
    pub attempts_variation: Decimal,

    pub chart_data: Vec<MonthlyBucket>,
}

/// Paid and pending spending with month-over-month variations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseKpis {
    #[serde(rename = "total_gasto")]
    pub total_paid: Decimal,
    #[serde(rename = "promedio_gasto")]
    pub average_paid: Decimal,
    #[serde(rename = "numero_gastos")]
    pub paid_count: usize,
    #[serde(rename = "gastos_pendientes")]
    pub total_pending: Decimal,
    #[serde(rename = "count_pendientes")]
    pub pending_count: usize,
    #[serde(rename = "variacion_total")]
    pub total_variation: Decimal,
    #[serde(rename = "variacion_promedio")]
    pub average_variation: Decimal,
    pub chart_data: Vec<MonthlyBucket>,
}

/// Cohort indicators for the donors created in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorKpis {
    #[serde(rename = "total_donantes")]
    pub total: usize,
    #[serde(rename = "nuevos_mes")]
    pub new_this_month: usize,
    #[serde(rename = "recurrentes")]
    pub recurring: usize,
    /// Lifetime value: valid donations of the cohort per donor.
    #[serde(rename = "ltv_promedio")]
    pub average_lifetime_value: Decimal,
    #[serde(rename = "mayor_donacion")]
    pub largest_donation: Decimal,
    #[serde(rename = "tendencias")]
    pub trends: DonorTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorTrends {
    pub total_donantes: Option<Trend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderKpis {
    #[serde(rename = "total_proveedores")]
    pub total: usize,
    #[serde(rename = "nuevos_mes")]
    pub new_this_month: usize,
    #[serde(rename = "con_actividad")]
    pub with_activity: usize,
}

/// The consolidated landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub kpis: DashboardTotals,
    pub trends: DashboardTrends,
    pub top_paises: Vec<CountryRanking>,
    pub casos_destacados: Vec<CaseSummary>,
    pub balance_historico: Vec<BalancePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardTotals {
    #[serde(rename = "total_donado")]
    pub donated: Decimal,
    #[serde(rename = "total_gastado")]
    pub spent: Decimal,
    #[serde(rename = "balance_neto")]
    pub net_balance: Decimal,
    #[serde(rename = "casos_activos_count")]
    pub active_cases: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardTrends {
    pub total_donado: Trend,
    pub total_gastado: Trend,
    pub balance_neto: Trend,
}

/// Money raised from the donors of one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRanking {
    #[serde(rename = "pais")]
    pub country: Option<String>,
    /// Donors registered in the country.
    pub count: usize,
    #[serde(rename = "total_dinero")]
    pub total_money: Decimal,
}

/// Donations against paid expenses for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    #[serde(rename = "fecha")]
    pub month: String,
    #[serde(rename = "donaciones")]
    pub donations: Decimal,
    #[serde(rename = "gastos")]
    pub expenses: Decimal,
    pub balance: Decimal,
}
