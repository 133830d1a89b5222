use analyzer::{CaseKpiFilter, DateRange, ExpenseKpiFilter, KpiService, RelabelReport};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::Settings;
use database::{DbRepository, Ledger, MemoryLedger};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The main entry point for the Refugio shelter administration backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; settings also come from refugio.toml and the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = configuration::load_settings_from(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config))?;
    let _guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, settings).await,
        Commands::Migrate => handle_migrate(&settings).await,
        Commands::Kpis(args) => handle_kpis(args, &settings).await,
        Commands::RelabelExpenses(args) => handle_relabel(args, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// KPI engine and admin API for an animal-rescue foundation.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file; missing files are ignored.
    #[arg(long, global = true, default_value = configuration::DEFAULT_CONFIG_FILE)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API.
    Serve(ServeArgs),
    /// Apply the database migrations and exit.
    Migrate,
    /// Print one KPI set as a table.
    Kpis(KpisArgs),
    /// Rewrite one expense status literal to another.
    RelabelExpenses(RelabelArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Serve from an empty in-memory ledger instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Cases,
    Donations,
    Expenses,
    Donors,
    Providers,
    Dashboard,
}

#[derive(Parser)]
struct KpisArgs {
    #[arg(value_enum)]
    resource: Resource,

    /// Start of the reporting window (format: YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the reporting window (format: YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Case name filter (cases: name substring, expenses: related case).
    #[arg(long)]
    search: Option<String>,

    /// Print the raw JSON document instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct RelabelArgs {
    /// Status literal to replace, matched exactly.
    #[arg(long, default_value = "RECHAZADO")]
    from: String,

    /// Replacement status literal.
    #[arg(long, default_value = "PAGADO")]
    to: String,

    /// Report what would change without writing.
    #[arg(long)]
    dry_run: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn postgres_ledger(settings: &Settings) -> anyhow::Result<Arc<dyn Ledger>> {
    let pool = database::connect(&settings.database)
        .await
        .context("Failed to connect to the database")?;
    database::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(Arc::new(DbRepository::new(pool)))
}

async fn handle_serve(args: ServeArgs, settings: Settings) -> anyhow::Result<()> {
    let ledger: Arc<dyn Ledger> = if args.in_memory {
        warn!("Serving from an in-memory ledger; nothing will be persisted");
        Arc::new(MemoryLedger::new())
    } else {
        postgres_ledger(&settings).await?
    };
    let service = KpiService::new(ledger, settings.kpi);
    web_server::run_server(&settings.server, service).await
}

async fn handle_migrate(settings: &Settings) -> anyhow::Result<()> {
    postgres_ledger(settings).await?;
    info!("Schema is up to date");
    Ok(())
}

async fn handle_kpis(args: KpisArgs, settings: &Settings) -> anyhow::Result<()> {
    let service = KpiService::new(postgres_ledger(settings).await?, settings.kpi);
    let today = Local::now().date_naive();
    let start = args.start.map(|d| d.to_string());
    let end = args.end.map(|d| d.to_string());
    let range = DateRange::new(start.as_deref(), end.as_deref());

    let report = match args.resource {
        Resource::Cases => {
            let filter = CaseKpiFilter {
                range,
                search: args.search,
            };
            serde_json::to_value(service.case_kpis(&filter, today).await?)?
        }
        Resource::Donations => serde_json::to_value(service.donation_kpis(&range, today).await?)?,
        Resource::Expenses => {
            let filter = ExpenseKpiFilter {
                range,
                caso: args.search,
            };
            serde_json::to_value(service.expense_kpis(&filter, today).await?)?
        }
        Resource::Donors => serde_json::to_value(service.donor_kpis(&range, today).await?)?,
        Resource::Providers => serde_json::to_value(service.provider_kpis(today).await?)?,
        Resource::Dashboard => serde_json::to_value(service.dashboard(&range, today).await?)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", kpi_table(&report));
    }
    Ok(())
}

async fn handle_relabel(args: RelabelArgs, settings: &Settings) -> anyhow::Result<()> {
    let service = KpiService::new(postgres_ledger(settings).await?, settings.kpi);
    let report = service
        .relabel_expenses(&args.from, &args.to, args.dry_run)
        .await?;
    println!("{}", relabel_table(&report, args.dry_run));
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

/// One row per scalar of the report, nested keys joined with dots. Lists are summarized by
/// their length.
fn kpi_table(report: &Value) -> Table {
    let mut rows = Vec::new();
    flatten_into(&mut rows, String::new(), report);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Indicador", "Valor"]);
    for (key, value) in rows {
        table.add_row(vec![key, value]);
    }
    table
}

fn flatten_into(rows: &mut Vec<(String, String)>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(rows, path, inner);
            }
        }
        Value::Array(items) => rows.push((prefix, format!("{} elementos", items.len()))),
        Value::Null => rows.push((prefix, "-".to_string())),
        Value::String(text) => rows.push((prefix, text.clone())),
        other => rows.push((prefix, other.to_string())),
    }
}

fn relabel_table(report: &RelabelReport, dry_run: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Monto", "Estado"]);
    for expense in &report.sample {
        table.add_row(vec![
            expense.id.to_string(),
            expense.amount.to_string(),
            expense.status.clone(),
        ]);
    }
    let verb = if dry_run { "would be updated" } else { "updated" };
    table.add_row(vec![
        format!("{} with {}", report.matched, report.from),
        format!("{} {verb}", report.updated),
        format!("{} now {}", report.total_with_target, report.to),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_joins_nested_keys_and_summarizes_lists() {
        let report = json!({
            "kpis": { "total_donado": 300.0, "casos_activos_count": 2 },
            "top_paises": [{ "pais": "Colombia" }],
            "tendencias": null
        });
        let mut rows = Vec::new();
        flatten_into(&mut rows, String::new(), &report);
        assert!(rows.contains(&("kpis.total_donado".to_string(), "300.0".to_string())));
        assert!(rows.contains(&("top_paises".to_string(), "1 elementos".to_string())));
        assert!(rows.contains(&("tendencias".to_string(), "-".to_string())));
    }

    #[test]
    fn test_cli_parses_kpis_with_range() {
        let cli = Cli::try_parse_from([
            "refugio", "kpis", "donations", "--start", "2024-03-01", "--end", "2024-03-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Kpis(args) => {
                assert!(matches!(args.resource, Resource::Donations));
                assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 3, 1));
            }
            _ => panic!("expected the kpis command"),
        }
    }
}
