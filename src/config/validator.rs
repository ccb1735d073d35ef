use thiserror::Error;
use tracing_subscriber::EnvFilter;

use super::Config;
use crate::query::{GENERATED_NAMES, is_cpp_identifier};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let statement = self.generator.statement.as_str();
        if !is_cpp_identifier(statement) {
            return Err(ConfigError::InvalidConfig(format!(
                "generator.statement {statement:?} must be a C identifier"
            )));
        }
        if statement != "stmt" && GENERATED_NAMES.contains(&statement) {
            return Err(ConfigError::InvalidConfig(format!(
                "generator.statement {statement:?} is already used by the generated code"
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be pretty or json, got {:?}",
                self.logging.format
            )));
        }

        if EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.level {:?} is not a valid filter",
                self.logging.level
            )));
        }

        if let Some(catalog) = &self.catalog {
            if catalog.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "catalog path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
