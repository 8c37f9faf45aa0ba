//! Request and response documents for the gateway HTTP API.
//!
//! Every call answers with the same envelope, [`ApiResponse`]; only the shape
//! of `data` differs.

use serde::{Deserialize, Serialize};

use super::chain::MessageChain;
use super::event::EventType;

// =============================================================================
// Endpoints
// =============================================================================

/// Endpoint paths, relative to the callback base address.
pub mod endpoint {
    pub const SEND_MSG: &str = "/send_msg";
    pub const DELETE_MSG: &str = "/delete_msg";
    pub const GET_MSG: &str = "/get_msg";
    pub const GET_GROUP_MEMBER_LIST: &str = "/get_group_member_list";
    pub const SEND_GROUP_FORWARD_MSG: &str = "/send_group_forward_msg";
    pub const GET_LOGIN_INFO: &str = "/get_login_info";
}

/// Builds the avatar URL for a user.
pub fn avatar_url(user_id: i64) -> String {
    format!("https://q1.qlogo.cn/g?b=qq&nk={user_id}&s=640")
}

// =============================================================================
// Envelope
// =============================================================================

/// Generic response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `"ok"`, `"async"` or `"failed"`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub retcode: i64,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wording: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Returns `true` if the gateway reported the call as failed.
    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }

    /// Human readable failure reason, if the gateway gave one.
    pub fn reason(&self) -> Option<&str> {
        self.wording.as_deref().or(self.msg.as_deref())
    }
}

// =============================================================================
// Send
// =============================================================================

/// `POST /send_msg` body.
///
/// The subject id is written to both `user_id` and `group_id`; the gateway
/// reads the one matching `message_type`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub message_type: EventType,
    pub user_id: i64,
    pub group_id: i64,
    pub message: &'a MessageChain,
}

impl<'a> SendMessageRequest<'a> {
    pub fn new(kind: EventType, subject_id: i64, message: &'a MessageChain) -> Self {
        Self {
            message_type: kind,
            user_id: subject_id,
            group_id: subject_id,
            message,
        }
    }
}

/// `POST /send_group_forward_msg` body.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardMessageRequest<'a> {
    pub group_id: i64,
    pub messages: &'a MessageChain,
}

/// Payload of a send acknowledgment.
///
/// Failed sends often carry `"data": {}`, which decodes to id 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageIdData {
    pub message_id: i64,
}

/// Acknowledgment returned for every send.
pub type SendAck = ApiResponse<MessageIdData>;

impl SendAck {
    /// The id of the sent message, if the gateway returned one.
    pub fn message_id(&self) -> Option<i64> {
        self.data.map(|d| d.message_id).filter(|&id| id != 0)
    }
}

// =============================================================================
// Message lookup
// =============================================================================

/// `POST /delete_msg` and `POST /get_msg` body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MessageIdRequest {
    pub message_id: i64,
}

// =============================================================================
// Group & account info
// =============================================================================

/// One entry of `get_group_member_list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMemberData {
    pub group_id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub card: String,
    pub sex: String,
    pub age: i32,
    pub area: String,
    pub join_time: i64,
    pub last_sent_time: i64,
    pub level: String,
    /// `"owner"`, `"admin"` or `"member"`.
    pub role: String,
    pub unfriendly: bool,
    pub title: String,
    pub title_expire_time: i64,
    pub card_changeable: bool,
    pub shut_up_timestamp: i64,
}

/// Response of `get_group_member_list`.
pub type GroupMemberList = ApiResponse<Vec<GroupMemberData>>;

/// Response payload of `get_login_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub user_id: i64,
    pub nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_request_fills_both_ids() {
        let chain = MessageChain::from("hello");
        let req = SendMessageRequest::new(EventType::Group, 123, &chain);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "message_type": "group",
                "user_id": 123,
                "group_id": 123,
                "message": [{"type": "text", "data": {"text": "hello"}}]
            })
        );
    }

    #[test]
    fn forward_request_shape() {
        let chain = MessageChain::from("x");
        let req = ForwardMessageRequest {
            group_id: 9,
            messages: &chain,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["group_id"], 9);
        assert_eq!(value["messages"][0]["type"], "text");
    }

    #[test]
    fn failed_ack_has_no_message_id() {
        let ack: SendAck = serde_json::from_value(json!({
            "status": "failed",
            "retcode": 100,
            "data": null,
            "wording": "bad"
        }))
        .unwrap();
        assert!(ack.is_failed());
        assert_eq!(ack.message_id(), None);
        assert_eq!(ack.reason(), Some("bad"));
    }

    #[test]
    fn failed_ack_with_empty_data_decodes() {
        let ack: SendAck = serde_json::from_value(json!({
            "status": "failed",
            "retcode": 1200,
            "data": {},
            "wording": "muted"
        }))
        .unwrap();
        assert!(ack.is_failed());
        assert_eq!(ack.message_id(), None);
    }

    #[test]
    fn ok_ack_exposes_message_id() {
        let ack: SendAck = serde_json::from_value(json!({
            "status": "ok",
            "retcode": 0,
            "data": {"message_id": 5566}
        }))
        .unwrap();
        assert!(!ack.is_failed());
        assert_eq!(ack.message_id(), Some(5566));
    }

    #[test]
    fn avatar_url_format() {
        assert_eq!(avatar_url(10001), "https://q1.qlogo.cn/g?b=qq&nk=10001&s=640");
    }
}
