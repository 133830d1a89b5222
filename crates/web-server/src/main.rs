use analyzer::KpiService;
use anyhow::Context;
use database::DbRepository;
use std::sync::Arc;

// This main function is the entry point when running `cargo run -p web-server`.
// It serves the API against PostgreSQL; `refugio serve` offers the same plus an in-memory mode.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = configuration::load_settings().context("Failed to load settings")?;
    let _guard = configuration::init_tracing(&settings.logging)?;

    let pool = database::connect(&settings.database).await?;
    database::run_migrations(&pool).await?;
    let service = KpiService::new(Arc::new(DbRepository::new(pool)), settings.kpi);

    web_server::run_server(&settings.server, service).await
}
