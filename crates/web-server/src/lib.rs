use analyzer::KpiService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use configuration::ServerConfig;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub service: KpiService,
}

/// Builds the API router over `state`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/dashboard", get(handlers::dashboard))
        // Cases
        .route("/api/casos", get(handlers::list_cases).post(handlers::create_case))
        .route("/api/casos/kpis", get(handlers::case_kpis))
        .route("/api/casos/activos", get(handlers::active_cases))
        .route("/api/casos/:id", get(handlers::get_case).put(handlers::update_case))
        .route("/api/casos/:id/balance", get(handlers::case_balance))
        // Donations
        .route(
            "/api/donaciones",
            get(handlers::list_donations).post(handlers::create_donation),
        )
        .route("/api/donaciones/kpis", get(handlers::donation_kpis))
        .route(
            "/api/donaciones/:id",
            get(handlers::get_donation).put(handlers::update_donation),
        )
        // Expenses
        .route("/api/gastos", get(handlers::list_expenses).post(handlers::create_expense))
        .route("/api/gastos/kpis", get(handlers::expense_kpis))
        .route(
            "/api/gastos/:id",
            get(handlers::get_expense).put(handlers::update_expense),
        )
        // Donors
        .route("/api/donantes", get(handlers::list_donors).post(handlers::create_donor))
        .route("/api/donantes/kpis", get(handlers::donor_kpis))
        .route("/api/donantes/top", get(handlers::top_donors))
        .route("/api/donantes/:id", get(handlers::get_donor))
        .route("/api/donantes/:id/donaciones", get(handlers::donor_donations))
        // Providers
        .route(
            "/api/proveedores",
            get(handlers::list_providers).post(handlers::create_provider),
        )
        .route("/api/proveedores/kpis", get(handlers::provider_kpis))
        .route("/api/proveedores/:id", get(handlers::get_provider))
        .route("/api/proveedores/:id/gastos", get(handlers::provider_expenses))
        // Shelter homes
        .route(
            "/api/hogares",
            get(handlers::list_shelter_homes).post(handlers::create_shelter_home),
        )
        .route("/api/hogares/:id", get(handlers::get_shelter_home))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Binds the configured address and serves the API until the process stops.
pub async fn run_server(config: &ServerConfig, service: KpiService) -> anyhow::Result<()> {
    let app = create_router(Arc::new(AppState { service }));
    let addr = config.address();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Days, Local, NaiveDate, TimeZone, Utc};
    use configuration::KpiConfig;
    use core_types::{Case, CaseStatus, Donation, Donor, Expense, Provider, ShelterHome};
    use database::{MemoryLedger, Records};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn records() -> Records {
        Records {
            cases: vec![Case {
                id: 1,
                name: "Luna".to_string(),
                status: CaseStatus::EnTratamiento,
                admitted_on: d(2024, 3, 1),
                discharged_on: None,
                clinic: Some("VetSur".to_string()),
                diagnosis: Some("Fractura".to_string()),
                shelter_home_id: Some(1),
                estimated_budget: Some(dec!(900)),
            }],
            donations: vec![
                Donation {
                    id: 1,
                    donor_id: Some(1),
                    case_id: Some(1),
                    amount: dec!(200),
                    donated_on: d(2024, 3, 5),
                    payment_method: Some("Nequi".to_string()),
                    status: "Aprobada".to_string(),
                },
                Donation {
                    id: 2,
                    donor_id: Some(1),
                    case_id: Some(1),
                    amount: dec!(100),
                    donated_on: d(2024, 3, 6),
                    payment_method: None,
                    status: "COMPLETADA".to_string(),
                },
                Donation {
                    id: 3,
                    donor_id: Some(1),
                    case_id: Some(1),
                    amount: dec!(50),
                    donated_on: d(2024, 3, 7),
                    payment_method: None,
                    status: "RECHAZADA".to_string(),
                },
            ],
            expenses: vec![Expense {
                id: 1,
                concept: "Cirugía".to_string(),
                provider_id: Some(1),
                case_id: Some(1),
                amount: dec!(120.50),
                paid_on: d(2024, 3, 8),
                payment_method: None,
                status: "PAGADO".to_string(),
                receipt: None,
            }],
            donors: vec![Donor {
                id: 1,
                name: "Ana Gómez".to_string(),
                id_kind: Some("CC".to_string()),
                identification: Some("1020".to_string()),
                email: Some("ana@example.com".to_string()),
                phone: None,
                city: Some("Bogotá".to_string()),
                country: Some("Colombia".to_string()),
                donor_kind: Some("PERSONA".to_string()),
                notes: None,
                created_at: Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap(),
            }],
            providers: vec![Provider {
                id: 1,
                name: "VetSur".to_string(),
                kind: Some("VETERINARIA".to_string()),
                tax_id: Some("900123".to_string()),
                contact_name: None,
                email: None,
                phone: None,
                city: Some("Bogotá".to_string()),
                created_at: Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap(),
            }],
            shelter_homes: vec![ShelterHome {
                id: 1,
                name: "Casa Azul".to_string(),
                contact_name: Some("Marta".to_string()),
                phone: None,
                city: Some("Bogotá".to_string()),
                capacity: Some(4),
            }],
        }
    }

    fn server() -> TestServer {
        let ledger = Arc::new(MemoryLedger::from_records(records()));
        let service = KpiService::new(ledger, KpiConfig::default());
        TestServer::new(create_router(Arc::new(AppState { service }))).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = server().get("/api/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_donation_kpis_over_a_closed_range() {
        let response = server()
            .get("/api/donaciones/kpis")
            .add_query_param("start_date", "2024-03-01")
            .add_query_param("end_date", "2024-03-31")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_recaudado"].as_f64(), Some(300.0));
        assert_eq!(body["cantidad_exitosas"], 2);
        assert_eq!(body["cantidad_rechazadas"], 1);
        assert_eq!(body["donantes_unicos"], 1);
        assert_eq!(body["chart_data"][0]["fecha"], "2024-03");
    }

    #[tokio::test]
    async fn test_malformed_date_is_a_field_error() {
        let response = server()
            .get("/api/donaciones/kpis")
            .add_query_param("start_date", "01-03-2024")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["start_date"][0].as_str().unwrap().contains("01-03-2024"));
    }

    #[tokio::test]
    async fn test_case_kpis_ignore_malformed_dates() {
        let response = server()
            .get("/api/casos/kpis")
            .add_query_param("start_date", "ayer")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_historico"], 1);
        assert!(body["tendencias"].is_null());
    }

    #[tokio::test]
    async fn test_out_of_range_years_are_rejected_not_shifted() {
        let response = server()
            .get("/api/dashboard")
            .add_query_param("start_date", "-262143-01-01")
            .add_query_param("end_date", "2024-01-01")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["start_date"][0].as_str().unwrap().contains("-262143-01-01"));

        let response = server()
            .get("/api/casos/kpis")
            .add_query_param("start_date", "-262143-01-01")
            .add_query_param("end_date", "2024-01-01")
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["tendencias"].is_null());
    }

    #[tokio::test]
    async fn test_dashboard_shape() {
        let response = server()
            .get("/api/dashboard")
            .add_query_param("start_date", "2024-03-01")
            .add_query_param("end_date", "2024-03-31")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["kpis"]["total_donado"].as_f64(), Some(300.0));
        assert_eq!(body["kpis"]["total_gastado"].as_f64(), Some(120.5));
        assert_eq!(body["kpis"]["casos_activos_count"], 1);
        assert_eq!(body["trends"]["total_donado"]["isPositive"], true);
        assert_eq!(body["trends"]["total_donado"]["label"], "vs periodo anterior");
        assert_eq!(body["top_paises"][0]["pais"], "Colombia");
        assert_eq!(body["casos_destacados"][0]["nombre_hogar_de_paso"], "Casa Azul");
        assert_eq!(body["balance_historico"][0]["balance"].as_f64(), Some(179.5));
    }

    #[tokio::test]
    async fn test_case_listing_and_balance() {
        let server = server();
        let response = server.get("/api/casos").add_query_param("search", "lun").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body[0]["nombre_caso"], "Luna");
        assert_eq!(body[0]["total_recaudado"].as_f64(), Some(300.0));
        assert_eq!(body[0]["estado"], "EN_TRATAMIENTO");

        let response = server.get("/api/casos/1/balance").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["caso"], "Luna");
        assert_eq!(body["total_recaudado"].as_f64(), Some(350.0));
        assert_eq!(body["balance"].as_f64(), Some(229.5));
    }

    #[tokio::test]
    async fn test_unknown_case_is_404() {
        let response = server().get("/api/casos/99").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["detail"], "No encontrado.");
    }

    #[tokio::test]
    async fn test_unknown_case_status_filter_is_400() {
        let response = server()
            .get("/api/casos")
            .add_query_param("estado", "PERDIDO")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["estado"].is_array());
    }

    #[tokio::test]
    async fn test_create_donation_and_read_history() {
        let server = server();
        let response = server
            .post("/api/donaciones")
            .json(&json!({
                "id_donante": 1,
                "id_caso": 1,
                "monto": 75.25,
                "fecha_donacion": "2024-04-02",
                "medio_pago": "Transferencia",
                "estado": "aprobada"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["id_donacion"], 4);
        assert_eq!(body["estado"], "aprobada");

        let response = server.get("/api/donantes/1/donaciones").await;
        let history: Value = response.json();
        assert_eq!(history[0]["id_donacion"], 4);
        assert_eq!(history.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_donation_returns_field_errors() {
        let tomorrow = Local::now().date_naive() + Days::new(1);
        let response = server()
            .post("/api/donaciones")
            .json(&json!({
                "id_caso": 1,
                "monto": 0,
                "fecha_donacion": tomorrow.to_string(),
                "estado": "Aprobada"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["monto"][0], "El monto de la donación debe ser mayor a 0.");
        assert_eq!(body["fecha_donacion"][0], "La fecha de donación no puede ser futura.");
        assert_eq!(body["id_donante"][0], "Este campo es requerido.");
    }

    #[tokio::test]
    async fn test_oversized_donation_is_a_field_error() {
        let response = server()
            .post("/api/donaciones")
            .json(&json!({
                "id_donante": 1,
                "id_caso": 1,
                "monto": 1e11,
                "fecha_donacion": "2024-03-05",
                "estado": "Aprobada"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body["monto"][0],
            "Asegúrese de que no haya más de 10 dígitos antes del punto decimal."
        );
    }

    #[tokio::test]
    async fn test_update_expense_with_unknown_provider() {
        let response = server()
            .put("/api/gastos/1")
            .json(&json!({
                "nombre_gasto": "Cirugía",
                "id_proveedor": 5,
                "id_caso": 1,
                "monto": 120.5,
                "fecha_pago": "2024-03-08",
                "estado": "PAGADO"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body["id_proveedor"][0],
            "Clave primaria \"5\" inválida - objeto no existe."
        );
    }

    #[tokio::test]
    async fn test_donor_listing_and_top() {
        let server = server();
        let response = server.get("/api/donantes").add_query_param("ciudad", "Bogotá").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body[0]["donante"], "Ana Gómez");
        // Only the "Aprobada" donation is valid donor history.
        assert_eq!(body[0]["cantidad_donaciones"], 1);
        assert_eq!(body[0]["ultima_donacion"], "2024-03-05");

        let response = server.get("/api/donantes/top").await;
        let body: Value = response.json();
        assert_eq!(body[0]["id_donante"], 1);
    }

    #[tokio::test]
    async fn test_shelter_homes_and_provider_expenses() {
        let server = server();
        let response = server
            .post("/api/hogares")
            .json(&json!({ "nombre_hogar": "Casa Verde", "ciudad": "Medellín", "cupo_maximo": 2 }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let response = server.get("/api/hogares").add_query_param("ciudad", "medell").await;
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["nombre_hogar"], "Casa Verde");

        let response = server.get("/api/proveedores/1/gastos").await;
        let body: Value = response.json();
        assert_eq!(body[0]["nombre_gasto"], "Cirugía");
        server
            .get("/api/proveedores/8/gastos")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
