use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "QUERY_GEN_CONFIG";
pub const DATABASE_URL_ENV: &str = "QUERY_GEN_DATABASE_URL";
pub const CATALOG_ENV: &str = "QUERY_GEN_CATALOG";
const DEFAULT_CONFIG_PATH: &str = "query-gen.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Path of a YAML query catalog. The built-in catalog is used when unset.
    #[serde(default)]
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub indent: usize,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_statement")]
    pub statement: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent: 0,
            prefix: default_prefix(),
            statement: default_statement(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl DatabaseConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            filename: None,
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        let url = self.connection_string();
        if url.is_empty() {
            return None;
        }
        Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
    }
}

impl Config {
    /// Loads from an explicit path, `QUERY_GEN_CONFIG`, or `query-gen.yaml`.
    /// Only an explicitly named file has to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::read_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(DATABASE_URL_ENV) {
            self.database.url = Some(value);
        }
        if let Ok(value) = std::env::var(CATALOG_ENV) {
            self.catalog = Some(value);
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_prefix() -> String {
    "inline ".to_string()
}

fn default_statement() -> String {
    "stmt".to_string()
}
