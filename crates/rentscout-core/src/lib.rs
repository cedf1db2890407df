pub mod app_config;
pub mod brokers;
pub mod config;
pub mod property;

use thiserror::Error;

pub use app_config::AppConfig;
pub use brokers::{find_broker, load_brokers, require_broker, BrokerConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use property::{PropertyRecord, ScrapingResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("cannot read brokers file {path}: {reason}")]
    BrokersFile { path: String, reason: String },

    #[error("broker '{0}' not found in configuration")]
    BrokerNotFound(String),
}
