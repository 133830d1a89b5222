use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{DatabaseConfig, KpiConfig, LoggingConfig, ServerConfig, Settings};

/// Default configuration file, looked up in the working directory. It is optional.
pub const DEFAULT_CONFIG_FILE: &str = "refugio.toml";

/// Prefix of the environment overrides, e.g. `REFUGIO__SERVER__PORT=8080`.
const ENV_PREFIX: &str = "REFUGIO";

/// Loads the application settings from `refugio.toml` and the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(DEFAULT_CONFIG_FILE)
}

/// Loads the application settings from the given file (if it exists) layered with
/// `REFUGIO__*` environment variables, then validates them.
pub fn load_settings_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );
    let mut settings = build(builder)?;

    if settings.database.url.is_empty() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url;
        }
    }

    settings.validate()?;
    Ok(settings)
}

fn build(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Settings, ConfigError> {
    let settings = builder.build()?.try_deserialize::<Settings>()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Result<Settings, ConfigError> {
        build(
            config::Config::builder()
                .add_source(config::File::from_str(source, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.kpi, KpiConfig::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 8080

            [kpi]
            top_countries = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.kpi.top_countries, 3);
        assert_eq!(settings.kpi.top_donors, 10);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let settings = from_toml("[kpi]\ntop_donors = 0").unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("kpi.top_donors"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let settings = load_settings_from("does-not-exist.toml");
        assert!(settings.is_ok());
    }
}
