//! WebSocket transport.

mod client;
pub use client::{CLOSE_TIMEOUT, FrameHandler, WsClient, WsConnection, parse_ws_url};
