//! # Ranni Framework
//!
//! Handler registration, event dispatch and the outbound gateway API.
//!
//! ## Overview
//!
//! - [`EventHandler`]: the filter / handle / help capability set
//! - [`Dispatcher`]: the handler registry and per-event fan-out
//! - [`EventContext`]: per-dispatch facade handed to handlers
//! - [`Gateway`]: typed calls against the gateway HTTP API, over an
//!   [`ApiCaller`]

pub mod context;
pub mod dispatcher;
pub mod gateway;
pub mod handler;

pub use context::EventContext;
pub use dispatcher::{Dispatcher, HELP_HEADER};
pub use gateway::{ApiCaller, BoxedApiCaller, Gateway, SendReceipt};
pub use handler::{BoxedHandler, EventHandler, FnHandler, filters, handler_fn};
