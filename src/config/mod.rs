use crate::ranking::EngineConfig;
use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of a deployment.
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

/// Top-level configuration for the ranker binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("RANKER_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("RANKER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EngineConfig::default();
        let scratch_capacity = match env::var("RANKER_SCRATCH_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidScratchCapacity { value: raw })?,
            Err(_) => defaults.scratch_capacity,
        };
        let start_active = match env::var("RANKER_START_ACTIVE") {
            Ok(raw) => parse_flag("RANKER_START_ACTIVE", &raw)?,
            Err(_) => defaults.start_active,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig {
                scratch_capacity,
                start_active,
            },
        })
    }
}

fn parse_flag(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            variable,
            value: raw.to_string(),
        }),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidScratchCapacity {
        value: String,
    },
    InvalidFlag {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidScratchCapacity { value } => write!(
                f,
                "RANKER_SCRATCH_CAPACITY must be a non-negative integer, got '{value}'"
            ),
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{variable} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("RANKER_ENV");
        env::remove_var("RANKER_LOG_LEVEL");
        env::remove_var("RANKER_SCRATCH_CAPACITY");
        env::remove_var("RANKER_START_ACTIVE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn reads_engine_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RANKER_ENV", "ci");
        env::set_var("RANKER_SCRATCH_CAPACITY", " 128 ");
        env::set_var("RANKER_START_ACTIVE", "off");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Test);
        assert_eq!(config.engine.scratch_capacity, 128);
        assert!(!config.engine.start_active);
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RANKER_SCRATCH_CAPACITY", "lots");
        let err = AppConfig::load().expect_err("capacity must be numeric");
        assert!(matches!(err, ConfigError::InvalidScratchCapacity { .. }));

        reset_env();
        env::set_var("RANKER_START_ACTIVE", "maybe");
        let err = AppConfig::load().expect_err("flag must be boolean");
        reset_env();
        assert_eq!(
            err.to_string(),
            "RANKER_START_ACTIVE must be true or false, got 'maybe'"
        );
    }
}
