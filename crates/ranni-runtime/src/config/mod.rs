//! Configuration for the Ranni runtime.
//!
//! Layered loading (defaults, files, `RANNI_*` environment, overrides) and
//! validation of gateway, REST front-end and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{
    ApiConfig, GatewayConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    RanniConfig, SpanEventConfig,
};
pub use validation::validate_config;
