//! Core types for the Ranni bot framework.
//!
//! This crate holds everything that does not touch the network:
//!
//! - [`Message`] and [`MessageChain`]: the message model and its wire form
//! - [`Event`]: group and private message events
//! - [`decode_frame`]: turns an inbound frame into an [`Event`]
//! - [`model::api`]: request and response documents for the gateway API
//! - the shared error types

pub mod decode;
pub mod error;
pub mod model;

pub use decode::{decode_frame, decode_message_chain};
pub use error::{
    ApiError, ApiResult, DecodeError, DecodeResult, TransportError, TransportResult,
};
pub use model::*;
