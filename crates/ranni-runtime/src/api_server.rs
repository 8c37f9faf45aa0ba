//! REST front-end for externally triggered sends.
//!
//! One route, `POST /send`:
//!
//! ```json
//! {
//!   "type": "group",
//!   "number": 123456,
//!   "messages": [
//!     {"type": "Text", "text": "hello"},
//!     {"type": "At", "qq": 10001},
//!     {"type": "Image", "url": "https://example.com/a.png"}
//!   ]
//! }
//! ```
//!
//! `type` is `privacy` or `group`. Descriptors with an unknown type or an
//! empty payload are dropped. Every answer is `{isOk, msg, data}` with
//! status 200.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ranni_core::{EventType, Message, MessageChain};
use ranni_framework::Gateway;
use ranni_transport::HttpServerHandle;

use crate::error::RuntimeResult;

pub const MSG_BAD_REQUEST: &str = "参数异常";
pub const MSG_SEND_FAILED: &str = "发送失败！";
pub const MSG_UNKNOWN_TARGET: &str = "未知的发送类型";

/// A simplified message descriptor. Only text, images and mentions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub qq: i64,
    #[serde(default)]
    pub text: String,
}

impl ApiMessage {
    /// `None` for unknown types and empty payloads.
    pub fn to_message(&self) -> Option<Message> {
        match self.kind.as_str() {
            "Text" if !self.text.is_empty() => Some(Message::text(self.text.as_str())),
            "Image" if !self.url.is_empty() => Some(Message::image(self.url.as_str())),
            "At" if self.qq != 0 => Some(Message::at(self.qq)),
            _ => None,
        }
    }
}

/// Body of `POST /send`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    /// `privacy` or `group`.
    #[serde(rename = "type")]
    pub target: String,
    /// User or group id.
    pub number: i64,
    pub messages: Vec<ApiMessage>,
}

impl SendRequest {
    pub fn chain(&self) -> MessageChain {
        self.messages.iter().filter_map(ApiMessage::to_message).collect()
    }

    fn event_type(&self) -> Option<EventType> {
        match self.target.as_str() {
            "privacy" => Some(EventType::Private),
            "group" => Some(EventType::Group),
            _ => None,
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiReply {
    #[serde(rename = "isOk")]
    pub is_ok: bool,
    pub msg: String,
    pub data: Value,
}

impl ApiReply {
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            is_ok: true,
            msg: String::new(),
            data: data.into(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            is_ok: false,
            msg: msg.into(),
            data: Value::Null,
        }
    }
}

/// The front-end routes, bound to `gateway`.
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/send", post(send_message))
        .with_state(gateway)
}

/// Serves the front-end on `addr` until `shutdown` is cancelled.
pub async fn start(
    addr: &str,
    gateway: Gateway,
    shutdown: CancellationToken,
) -> RuntimeResult<HttpServerHandle> {
    Ok(ranni_transport::serve(addr, router(gateway), shutdown).await?)
}

async fn send_message(State(gateway): State<Gateway>, body: Bytes) -> Json<ApiReply> {
    let request: SendRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejected send request");
            return Json(ApiReply::error(MSG_BAD_REQUEST));
        }
    };
    if request.number == 0 {
        return Json(ApiReply::error(MSG_BAD_REQUEST));
    }
    let Some(kind) = request.event_type() else {
        return Json(ApiReply::error(MSG_UNKNOWN_TARGET));
    };

    let chain = request.chain();
    match gateway.send(kind, request.number, &chain).await {
        Ok(receipt) if !receipt.is_failed() => Json(ApiReply::ok(receipt.message_id())),
        Ok(_) => Json(ApiReply::error(MSG_SEND_FAILED)),
        Err(e) => {
            warn!(target_id = request.number, error = %e, "REST send failed");
            Json(ApiReply::error(MSG_SEND_FAILED))
        }
    }
}
