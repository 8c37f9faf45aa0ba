//! HTTP transport.
//!
//! The client calls the gateway's HTTP API; the server helper hosts locally
//! defined routes.

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_TIMEOUT, HttpClient};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{HttpServerHandle, serve};
