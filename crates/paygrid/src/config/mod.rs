use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::estimation::{EstimatorKind, QueryLimits};

const DEFAULT_MODEL_DIR: &str = "Data/models";

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
    pub estimation: EstimationConfig,
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
            estimation: EstimationConfig::from_env()?,
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

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Which scorer answers requests that do not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerChoice {
    Heuristic,
    TrainedModel,
}

impl ScorerChoice {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "mock" => Some(Self::Heuristic),
            "model" | "trained" => Some(Self::TrainedModel),
            _ => None,
        }
    }
}

/// Scorer selection and enumeration bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationConfig {
    pub scorer: ScorerChoice,
    pub model_dir: PathBuf,
    pub top_n: usize,
    pub max_combinations: usize,
    pub search_timeout: Option<Duration>,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        let limits = QueryLimits::default();
        Self {
            scorer: ScorerChoice::Heuristic,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            top_n: limits.default_top_n,
            max_combinations: limits.max_combinations,
            search_timeout: limits.search_timeout,
        }
    }
}

impl EstimationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scorer = match env::var("PAYGRID_SCORER") {
            Ok(raw) => ScorerChoice::parse(&raw).ok_or(ConfigError::InvalidScorer(raw))?,
            Err(_) => defaults.scorer,
        };
        let model_dir = env::var("PAYGRID_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        let top_n = positive("PAYGRID_TOP_N")?.unwrap_or(defaults.top_n);
        let max_combinations =
            positive("PAYGRID_MAX_COMBINATIONS")?.unwrap_or(defaults.max_combinations);
        let search_timeout = positive("PAYGRID_SEARCH_TIMEOUT_MS")?
            .map(|millis| Duration::from_millis(millis as u64));

        Ok(Self {
            scorer,
            model_dir,
            top_n,
            max_combinations,
            search_timeout,
        })
    }

    pub fn estimator_kind(&self) -> EstimatorKind {
        match self.scorer {
            ScorerChoice::Heuristic => EstimatorKind::Heuristic,
            ScorerChoice::TrainedModel => EstimatorKind::TrainedModel {
                artifact_dir: self.model_dir.clone(),
            },
        }
    }

    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            default_top_n: self.top_n,
            max_combinations: self.max_combinations,
            search_timeout: self.search_timeout,
        }
    }
}

fn positive(key: &'static str) -> Result<Option<usize>, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidScorer(String),
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidScorer(value) => {
                write!(f, "PAYGRID_SCORER must be 'heuristic' or 'model', got '{value}'")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidScorer(_)
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::DEFAULT_MAX_COMBINATIONS;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PAYGRID_SCORER",
            "PAYGRID_MODEL_DIR",
            "PAYGRID_TOP_N",
            "PAYGRID_MAX_COMBINATIONS",
            "PAYGRID_SEARCH_TIMEOUT_MS",
        ] {
            env::remove_var(key);
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
        assert_eq!(config.estimation, EstimationConfig::default());
        assert_eq!(config.estimation.estimator_kind(), EstimatorKind::Heuristic);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn trained_scorer_points_at_the_model_dir() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PAYGRID_SCORER", "model");
        env::set_var("PAYGRID_MODEL_DIR", "/srv/paygrid/models");
        env::set_var("PAYGRID_TOP_N", "25");
        env::set_var("PAYGRID_SEARCH_TIMEOUT_MS", "1500");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.estimation.estimator_kind(),
            EstimatorKind::TrainedModel {
                artifact_dir: PathBuf::from("/srv/paygrid/models"),
            }
        );
        let limits = config.estimation.query_limits();
        assert_eq!(limits.default_top_n, 25);
        assert_eq!(limits.max_combinations, DEFAULT_MAX_COMBINATIONS);
        assert_eq!(limits.search_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn rejects_unknown_scorer_and_bad_limits() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PAYGRID_SCORER", "oracle");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidScorer(value)) if value == "oracle"
        ));

        reset_env();
        env::set_var("PAYGRID_MAX_COMBINATIONS", "0");
        let err = AppConfig::load().expect_err("zero limit rejected");
        reset_env();
        assert!(err.to_string().contains("PAYGRID_MAX_COMBINATIONS"));
    }
}
