pub use self::parser::{Config, DatabaseConfig, GeneratorConfig, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
