//! # Ranni Transport
//!
//! Network plumbing for the Ranni bot framework.
//!
//! ## Features
//!
//! - `ws-client`: WebSocket client for the gateway event stream
//! - `http-client`: HTTP client for the gateway API
//! - `http-server`: helper for hosting local HTTP routes
//! - `full`: all of the above
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  ranni-runtime      │  (engine, REST front-end)
//! ├─────────────────────┤
//! │  ranni-framework    │  (dispatch, gateway API)
//! ├─────────────────────┤
//! │  ranni-transport    │  <- This crate
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```

pub mod query;
pub mod state;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

pub use state::ConnectionState;

#[cfg(feature = "http-client")]
pub use http::HttpClient;

#[cfg(feature = "http-server")]
pub use http::{HttpServerHandle, serve};

#[cfg(feature = "ws-client")]
pub use websocket::{FrameHandler, WsClient, WsConnection};
