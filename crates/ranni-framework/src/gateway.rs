//! Outbound calls against the gateway API.
//!
//! [`Gateway`] turns typed requests into JSON documents and hands them to an
//! [`ApiCaller`]. The caller is the only seam to the network, so tests swap it
//! for an in-memory recorder.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use ranni_core::{
    ApiError, ApiResponse, ApiResult, BotInfo, EventType, ForwardMessageRequest, GroupMemberData,
    GroupMemberList, MessageChain, MessageIdRequest, SendAck, SendMessageRequest,
    decode_message_chain, endpoint,
};

// =============================================================================
// ApiCaller
// =============================================================================

/// Performs raw JSON calls against the gateway API.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// `POST <base><path>` with a JSON body.
    async fn post_json(&self, path: &str, body: Value) -> ApiResult<Value>;

    /// `GET <base><path>?<params>`.
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> ApiResult<Value>;
}

/// Shared, type-erased caller.
pub type BoxedApiCaller = Arc<dyn ApiCaller>;

#[cfg(feature = "http-client")]
#[async_trait]
impl ApiCaller for ranni_transport::HttpClient {
    async fn post_json(&self, path: &str, body: Value) -> ApiResult<Value> {
        Ok(ranni_transport::HttpClient::post_json(self, path, &body).await?)
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> ApiResult<Value> {
        Ok(ranni_transport::HttpClient::get_json(self, path, params).await?)
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Typed facade over the gateway API.
///
/// Cheap to clone; every clone shares the same caller.
#[derive(Clone)]
pub struct Gateway {
    caller: BoxedApiCaller,
}

impl Gateway {
    pub fn new(caller: BoxedApiCaller) -> Self {
        Self { caller }
    }

    /// Sends `chain` to a group or user.
    ///
    /// A gateway-reported failure is not an error: check
    /// [`SendReceipt::is_failed`].
    pub async fn send(
        &self,
        kind: EventType,
        subject_id: i64,
        chain: &MessageChain,
    ) -> ApiResult<SendReceipt> {
        let request = SendMessageRequest::new(kind, subject_id, chain);
        let ack: SendAck = self.post(endpoint::SEND_MSG, &request).await?;
        if ack.is_failed() {
            warn!(
                kind = %kind,
                subject_id,
                retcode = ack.retcode,
                reason = ack.reason().unwrap_or_default(),
                "Gateway rejected message"
            );
        }
        Ok(SendReceipt {
            ack,
            gateway: self.clone(),
        })
    }

    pub async fn send_to_group(&self, group_id: i64, chain: &MessageChain) -> ApiResult<SendReceipt> {
        self.send(EventType::Group, group_id, chain).await
    }

    pub async fn send_to_private(&self, user_id: i64, chain: &MessageChain) -> ApiResult<SendReceipt> {
        self.send(EventType::Private, user_id, chain).await
    }

    /// Sends `chain` to a group as a combined forward message.
    ///
    /// Each element of `chain` is normally a [`Message::Node`](ranni_core::Message::Node).
    pub async fn send_group_forward(
        &self,
        group_id: i64,
        chain: &MessageChain,
    ) -> ApiResult<SendReceipt> {
        let request = ForwardMessageRequest {
            group_id,
            messages: chain,
        };
        let ack: SendAck = self.post(endpoint::SEND_GROUP_FORWARD_MSG, &request).await?;
        Ok(SendReceipt {
            ack,
            gateway: self.clone(),
        })
    }

    /// Recalls a message.
    pub async fn delete_message(&self, message_id: i64) -> ApiResult<()> {
        let resp: ApiResponse<Value> = self
            .post(endpoint::DELETE_MSG, &MessageIdRequest { message_id })
            .await?;
        ensure_ok(&resp)
    }

    /// Fetches a message by id and decodes its content.
    pub async fn get_message(&self, message_id: i64) -> ApiResult<MessageChain> {
        let resp: ApiResponse<Value> = self
            .post(endpoint::GET_MSG, &MessageIdRequest { message_id })
            .await?;
        ensure_ok(&resp)?;
        let data = resp.data.ok_or(ApiError::MissingData("data"))?;
        Ok(decode_message_chain(&data["message"]))
    }

    pub async fn group_member_list(&self, group_id: i64) -> ApiResult<Vec<GroupMemberData>> {
        let value = self
            .caller
            .get_json(endpoint::GET_GROUP_MEMBER_LIST, &[("group_id", group_id.to_string())])
            .await?;
        let resp: GroupMemberList = serde_json::from_value(value)?;
        ensure_ok(&resp)?;
        Ok(resp.data.unwrap_or_default())
    }

    /// Returns the bot's own account.
    pub async fn login_info(&self) -> ApiResult<BotInfo> {
        let value = self.caller.get_json(endpoint::GET_LOGIN_INFO, &[]).await?;
        let resp: ApiResponse<BotInfo> = serde_json::from_value(value)?;
        ensure_ok(&resp)?;
        resp.data.ok_or(ApiError::MissingData("data"))
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        debug!(path, "Calling gateway API");
        let value = self.caller.post_json(path, body).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

fn ensure_ok<T>(resp: &ApiResponse<T>) -> ApiResult<()> {
    if resp.is_failed() {
        return Err(ApiError::Gateway {
            retcode: resp.retcode,
            message: resp.reason().unwrap_or("failed").to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// SendReceipt
// =============================================================================

/// The acknowledgment of a send, bound to the gateway that sent it.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    ack: SendAck,
    gateway: Gateway,
}

impl SendReceipt {
    pub fn ack(&self) -> &SendAck {
        &self.ack
    }

    /// Returns `true` if the gateway reported the send as failed.
    pub fn is_failed(&self) -> bool {
        self.ack.is_failed()
    }

    pub fn message_id(&self) -> Option<i64> {
        self.ack.message_id()
    }

    /// Schedules a recall of the sent message after `delay`.
    ///
    /// Returns `None` without scheduling anything if the send failed or the
    /// gateway returned no message id.
    pub fn recall_after(&self, delay: Duration) -> Option<JoinHandle<()>> {
        if self.is_failed() {
            return None;
        }
        let message_id = self.message_id()?;
        let gateway = self.gateway.clone();

        Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = gateway.delete_message(message_id).await {
                error!(message_id, error = %e, "Failed to recall message");
            }
        }))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// A recorded call.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub method: &'static str,
        pub path: String,
        pub body: Value,
    }

    /// In-memory caller that records every call and answers with canned
    /// responses keyed by path.
    #[derive(Default)]
    pub struct MockCaller {
        pub calls: Mutex<Vec<Call>>,
        responses: Mutex<Vec<(String, Value)>>,
    }

    impl MockCaller {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn respond(&self, path: &str, value: Value) {
            self.responses.lock().push((path.to_string(), value));
        }

        pub fn calls_to(&self, path: &str) -> Vec<Call> {
            self.calls
                .lock()
                .iter()
                .filter(|c| c.path == path)
                .cloned()
                .collect()
        }

        fn answer(&self, path: &str) -> Value {
            self.responses
                .lock()
                .iter()
                .rev()
                .find(|(p, _)| p == path)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| serde_json::json!({"status": "ok", "retcode": 0, "data": null}))
        }
    }

    #[async_trait]
    impl ApiCaller for MockCaller {
        async fn post_json(&self, path: &str, body: Value) -> ApiResult<Value> {
            self.calls.lock().push(Call {
                method: "POST",
                path: path.to_string(),
                body,
            });
            Ok(self.answer(path))
        }

        async fn get_json(&self, path: &str, params: &[(&str, String)]) -> ApiResult<Value> {
            let query: serde_json::Map<String, Value> = params
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
            self.calls.lock().push(Call {
                method: "GET",
                path: path.to_string(),
                body: Value::Object(query),
            });
            Ok(self.answer(path))
        }
    }
}
