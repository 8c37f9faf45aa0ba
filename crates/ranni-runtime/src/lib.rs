//! # Ranni Runtime
//!
//! Everything that turns the framework into a running bot:
//!
//! - [`config`]: layered configuration loading and validation
//! - [`logging`]: `tracing-subscriber` setup driven by configuration
//! - [`RobotEngine`]: the gateway connection, read loop and shutdown
//! - [`scheduler`]: cron jobs running next to the read loop
//! - `api_server` *(feature `api-server`)*: the `POST /send` REST front-end
//!
//! ```rust,ignore
//! use ranni_runtime::{RobotEngine, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut engine = RobotEngine::new(config)?;
//!     engine.register(MyHandler);
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

#[cfg(feature = "api-server")]
pub mod api_server;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, ConfigLoader, ConfigResult, RanniConfig};
pub use engine::{RobotEngine, ShutdownHandle};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use scheduler::{CronJob, CronTask, Scheduler};

pub use tracing;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
