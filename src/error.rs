use crate::config::ConfigError;
use crate::ranking::{CurveError, RankingError};
use crate::replay::ReplayError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Replay(ReplayError),
    Ranking(RankingError),
    Curve(CurveError),
    Serialization(serde_json::Error),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Replay(err) => write!(f, "replay error: {}", err),
            AppError::Ranking(err) => write!(f, "ranking error: {}", err),
            AppError::Curve(err) => write!(f, "weight curve error: {}", err),
            AppError::Serialization(err) => write!(f, "serialization error: {}", err),
            AppError::Usage(message) => write!(f, "usage error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Replay(err) => Some(err),
            AppError::Ranking(err) => Some(err),
            AppError::Curve(err) => Some(err),
            AppError::Serialization(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ReplayError> for AppError {
    fn from(value: ReplayError) -> Self {
        Self::Replay(value)
    }
}

impl From<RankingError> for AppError {
    fn from(value: RankingError) -> Self {
        Self::Ranking(value)
    }
}

impl From<CurveError> for AppError {
    fn from(value: CurveError) -> Self {
        Self::Curve(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
