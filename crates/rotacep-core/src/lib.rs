pub mod app_config;
pub mod cep;
pub mod config;
pub mod geo;
pub mod jobs;
pub mod records;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{haversine_km, Coordinate};
pub use records::{GeocodeRecord, GeocodeSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read jobs file {path}: {source}")]
    JobsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse jobs file: {0}")]
    JobsFileParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
