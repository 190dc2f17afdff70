use crate::lending::{
    BiasAnalyzer, CatalogError, DecisionEngine, LendingService, ThresholdError,
    UnderwritingThresholds, VariantCatalog, DEFAULT_SCORE_TOLERANCE,
};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lending: LendingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            lending: LendingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Underwriting thresholds, variant catalog and bias tolerance, fixed at startup.
#[derive(Debug, Clone)]
pub struct LendingConfig {
    pub thresholds: UnderwritingThresholds,
    pub catalog: VariantCatalog,
    pub score_tolerance: f64,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            thresholds: UnderwritingThresholds::default(),
            catalog: VariantCatalog::standard(),
            score_tolerance: DEFAULT_SCORE_TOLERANCE,
        }
    }
}

impl LendingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut thresholds = UnderwritingThresholds::default();
        if let Some(value) = parse_var("LENDING_MIN_CREDIT_SCORE")? {
            thresholds.min_credit_score = value;
        }
        if let Some(value) = parse_var("LENDING_MAX_DTI_RATIO")? {
            thresholds.max_dti_ratio = value;
        }
        if let Some(value) = parse_var("LENDING_MAX_LOAN_TO_INCOME")? {
            thresholds.max_loan_to_income = value;
        }
        if let Some(value) = parse_var("LENDING_MAX_DELINQUENCIES")? {
            thresholds.max_delinquencies = value;
        }
        if let Some(value) = parse_var("LENDING_MIN_EMPLOYMENT_YEARS")? {
            thresholds.min_employment_years = value;
        }
        if let Some(value) = parse_var("LENDING_MIN_CREDIT_HISTORY_YEARS")? {
            thresholds.min_credit_history_years = value;
        }
        thresholds.validate().map_err(ConfigError::Thresholds)?;

        let catalog = match parse_var::<PathBuf>("LENDING_VARIANT_CATALOG")? {
            Some(path) => VariantCatalog::from_path(path).map_err(ConfigError::Catalog)?,
            None => VariantCatalog::standard(),
        };

        let score_tolerance = match parse_var::<f64>("LENDING_SCORE_TOLERANCE")? {
            Some(value) if value.is_finite() && value >= 0.0 => value,
            Some(value) => {
                return Err(ConfigError::InvalidValue {
                    var: "LENDING_SCORE_TOLERANCE",
                    value: value.to_string(),
                })
            }
            None => DEFAULT_SCORE_TOLERANCE,
        };

        Ok(Self {
            thresholds,
            catalog,
            score_tolerance,
        })
    }

    /// Build the service these settings describe.
    pub fn service(&self) -> Result<LendingService, ConfigError> {
        let engine = DecisionEngine::new(self.thresholds.clone()).map_err(ConfigError::Thresholds)?;
        Ok(LendingService::new(
            engine,
            self.catalog.clone(),
            BiasAnalyzer::new(self.score_tolerance),
        ))
    }
}

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { var: &'static str, value: String },
    Thresholds(ThresholdError),
    Catalog(CatalogError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { var, value } => {
                write!(f, "{var} has an invalid value '{value}'")
            }
            ConfigError::Thresholds(err) => write!(f, "invalid underwriting thresholds: {err}"),
            ConfigError::Catalog(err) => write!(f, "invalid variant catalog: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Thresholds(err) => Some(err),
            ConfigError::Catalog(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LENDING_MIN_CREDIT_SCORE",
            "LENDING_MAX_DTI_RATIO",
            "LENDING_MAX_LOAN_TO_INCOME",
            "LENDING_MAX_DELINQUENCIES",
            "LENDING_MIN_EMPLOYMENT_YEARS",
            "LENDING_MIN_CREDIT_HISTORY_YEARS",
            "LENDING_VARIANT_CATALOG",
            "LENDING_SCORE_TOLERANCE",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.lending.thresholds, UnderwritingThresholds::default());
        assert_eq!(config.lending.catalog, VariantCatalog::standard());
        assert_eq!(config.lending.score_tolerance, DEFAULT_SCORE_TOLERANCE);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn threshold_overrides_are_applied() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_MIN_CREDIT_SCORE", "700");
        env::set_var("LENDING_MAX_DTI_RATIO", "0.4");
        let config = LendingConfig::from_env().expect("overrides parse");
        assert_eq!(config.thresholds.min_credit_score, 700);
        assert_eq!(config.thresholds.max_dti_ratio, 0.4);
        assert_eq!(config.thresholds.max_delinquencies, 2);
        reset_env();
    }

    #[test]
    fn rejects_unparseable_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_MAX_DELINQUENCIES", "several");
        match LendingConfig::from_env() {
            Err(ConfigError::InvalidValue { var, value }) => {
                assert_eq!(var, "LENDING_MAX_DELINQUENCIES");
                assert_eq!(value, "several");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_negative_score_tolerance() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_SCORE_TOLERANCE", "-0.5");
        match LendingConfig::from_env() {
            Err(ConfigError::InvalidValue { var, value }) => {
                assert_eq!(var, "LENDING_SCORE_TOLERANCE");
                assert_eq!(value, "-0.5");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LENDING_MAX_DTI_RATIO", "1.5");
        assert!(matches!(
            LendingConfig::from_env(),
            Err(ConfigError::Thresholds(ThresholdError::OutOfRange {
                name: "max_dti_ratio",
                ..
            }))
        ));
        reset_env();
    }

    #[test]
    fn loads_variant_catalog_from_file() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let path = env::temp_dir().join(format!("fairlend-catalog-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).expect("create catalog file");
        write!(
            file,
            r#"{{"version": 3, "variants": [{{"name": "Ana", "gender": "female"}}, {{"name": "Ben", "gender": "male"}}]}}"#
        )
        .expect("write catalog");
        env::set_var("LENDING_VARIANT_CATALOG", &path);

        let config = LendingConfig::from_env().expect("catalog loads");
        assert_eq!(config.catalog.version(), 3);
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog.variants()[0].label(), "Ana (female)");

        reset_env();
        std::fs::remove_file(path).ok();
    }
}
