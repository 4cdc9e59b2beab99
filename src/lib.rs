pub mod config;
pub mod error;
pub mod ranking;
pub mod replay;
pub mod telemetry;
