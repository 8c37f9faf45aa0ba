//! # Ranni
//!
//! A small, typed client framework for OneBot v11 chat gateways.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  ws   ┌─────────────┐  Event  ┌────────────┐     ┌──────────────────────────┐
//! │ Gateway  │──────▶│ RobotEngine │────────▶│ Dispatcher │────▶│ handler (own task)       │
//! │          │       │ (read loop) │         │  (filters) │────▶│ handler (own task)       │
//! │          │◀──────│             │         └────────────┘     └────────────┬─────────────┘
//! └──────────┘ http  └─────────────┘                                         │
//!       ▲                                                                    │
//!       └──────────────────────────── Gateway API ◀── EventContext::send ◀───┘
//! ```
//!
//! - **Core**: messages, message chains, events and their wire form
//! - **Transport**: the WebSocket event stream and the HTTP API client
//! - **Framework**: handlers, the dispatcher and the per-event context
//! - **Runtime**: configuration, logging, the engine, cron jobs, REST front-end
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ranni::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let mut engine = RobotEngine::new(config)?;
//!     engine.register(handler_fn("ping - pong", filters::starts_with("ping"), |ctx| async move {
//!         let _ = ctx.send_text("pong").await;
//!     }));
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log format
//! - `api-server` *(default)*: the `POST /send` REST front-end

pub use ranni_core as core;
pub use ranni_framework as framework;
pub use ranni_runtime as runtime;
pub use ranni_transport as transport;

/// Commonly used types for building a bot:
///
/// ```rust,ignore
/// use ranni::prelude::*;
/// ```
pub mod prelude {
    // Runtime
    pub use ranni_runtime::config::{ConfigLoader, RanniConfig, load_config, load_config_from_file};
    pub use ranni_runtime::{RobotEngine, RuntimeError, ShutdownHandle, logging};

    // Handlers
    pub use ranni_framework::{
        EventContext, EventHandler, Gateway, SendReceipt, filters, handler_fn,
    };

    // Messages and events
    pub use ranni_core::{
        ApiError, Event, EventType, Message, MessageChain, MessageKind, avatar_url,
    };

    pub use ranni_runtime::prelude::*;
}
