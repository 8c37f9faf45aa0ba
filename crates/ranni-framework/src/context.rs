//! Per-dispatch event context.
//!
//! One [`EventContext`] is built for every dispatched event and shared, behind
//! an `Arc`, by all handlers selected for it. It is dropped once the last of
//! those handlers finishes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use ranni_core::{ApiError, ApiResult, Event, EventType, GroupMemberData, MessageChain, Sender};

use crate::gateway::{Gateway, SendReceipt};

/// The context handed to handlers.
pub struct EventContext {
    event: Arc<Event>,
    gateway: Gateway,
    values: Mutex<HashMap<String, Value>>,
}

impl EventContext {
    pub fn new(event: Arc<Event>, gateway: Gateway) -> Self {
        Self {
            event,
            gateway,
            values: Mutex::new(HashMap::new()),
        }
    }

    // ─── Event accessors ──────────────────────────────────────────────────────

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    pub fn chain(&self) -> &MessageChain {
        self.event.chain()
    }

    pub fn sender(&self) -> &Sender {
        self.event.sender()
    }

    /// The bot's own id.
    pub fn self_id(&self) -> i64 {
        self.event.message_event().self_id
    }

    pub fn user_id(&self) -> i64 {
        self.event.user_id()
    }

    pub fn group_id(&self) -> Option<i64> {
        self.event.group_id()
    }

    /// The group id for group events, the sender id for private ones.
    pub fn subject_id(&self) -> i64 {
        self.event.subject_id()
    }

    /// Plain text of the message.
    pub fn plain_text(&self) -> String {
        self.event.plain_text()
    }

    /// Returns `true` if the message mentions the bot.
    pub fn is_to_me(&self) -> bool {
        self.chain().contains_at(self.self_id())
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // ─── Gateway shortcuts ────────────────────────────────────────────────────

    /// Replies to wherever the event came from.
    pub async fn send(&self, chain: &MessageChain) -> ApiResult<SendReceipt> {
        self.gateway
            .send(self.event_type(), self.subject_id(), chain)
            .await
    }

    /// Replies with plain text.
    pub async fn send_text(&self, text: impl Into<String>) -> ApiResult<SendReceipt> {
        self.send(&MessageChain::from(text.into())).await
    }

    /// Lists the members of the group the event came from.
    ///
    /// Fails with [`ApiError::Unsupported`] for private events.
    pub async fn group_member_list(&self) -> ApiResult<Vec<GroupMemberData>> {
        let group_id = self
            .group_id()
            .ok_or(ApiError::Unsupported("group member list of a private event"))?;
        self.gateway.group_member_list(group_id).await
    }

    /// Fetches an earlier message by id.
    pub async fn get_message(&self, message_id: i64) -> ApiResult<MessageChain> {
        self.gateway.get_message(message_id).await
    }

    // ─── Values ───────────────────────────────────────────────────────────────

    /// Stores a value for other handlers of this dispatch.
    pub fn insert_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.lock().insert(key.into(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    pub fn remove_value(&self, key: &str) -> Option<Value> {
        self.values.lock().remove(key)
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("event_type", &self.event_type())
            .field("subject_id", &self.subject_id())
            .field("values", &self.values.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use ranni_core::{GroupMessageEvent, MessageEvent, PrivateMessageEvent};

    use super::*;

    pub fn message_event(user_id: i64, chain: MessageChain) -> MessageEvent {
        MessageEvent {
            time: 1_700_000_000,
            self_id: 10000,
            message_id: 1,
            user_id,
            sub_type: "normal".to_string(),
            raw_message: chain.plain_text(),
            font: 0,
            sender: Sender {
                user_id,
                nickname: "tester".to_string(),
                ..Default::default()
            },
            chain,
        }
    }

    pub fn group_event(group_id: i64, user_id: i64, chain: MessageChain) -> Arc<Event> {
        Arc::new(Event::Group(GroupMessageEvent {
            inner: message_event(user_id, chain),
            group_id,
            anonymous: None,
        }))
    }

    pub fn private_event(user_id: i64, chain: MessageChain) -> Arc<Event> {
        Arc::new(Event::Private(PrivateMessageEvent {
            inner: message_event(user_id, chain),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{group_event, private_event};
    use super::*;
    use crate::gateway::testing::MockCaller;
    use ranni_core::endpoint;
    use serde_json::json;

    #[test]
    fn subject_id_follows_event_kind() {
        let mock = MockCaller::new();
        let gateway = Gateway::new(mock);

        let group = EventContext::new(group_event(555, 42, "hi".into()), gateway.clone());
        assert_eq!(group.subject_id(), 555);
        assert_eq!(group.user_id(), 42);

        let private = EventContext::new(private_event(42, "hi".into()), gateway);
        assert_eq!(private.subject_id(), 42);
        assert_eq!(private.group_id(), None);
    }

    #[test]
    fn values_are_shared_within_the_context() {
        let ctx = EventContext::new(
            private_event(1, MessageChain::new()),
            Gateway::new(MockCaller::new()),
        );
        ctx.insert_value("count", 3);
        assert_eq!(ctx.value("count"), Some(json!(3)));
        assert_eq!(ctx.remove_value("count"), Some(json!(3)));
        assert_eq!(ctx.value("count"), None);
    }

    #[test]
    fn is_to_me_checks_mentions_of_self() {
        let mut chain = MessageChain::new();
        chain.add_at(10000).add_text(" ping");
        let ctx = EventContext::new(group_event(1, 2, chain), Gateway::new(MockCaller::new()));
        assert!(ctx.is_to_me());
        assert_eq!(ctx.plain_text(), "ping");
    }

    #[tokio::test]
    async fn send_replies_to_subject() {
        let mock = MockCaller::new();
        let ctx = EventContext::new(group_event(555, 42, "hi".into()), Gateway::new(mock.clone()));

        ctx.send_text("pong").await.unwrap();

        let calls = mock.calls_to(endpoint::SEND_MSG);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body["message_type"], "group");
        assert_eq!(calls[0].body["group_id"], 555);
        assert_eq!(calls[0].body["message"][0]["data"]["text"], "pong");
    }

    #[tokio::test]
    async fn group_member_list_rejects_private_events() {
        let mock = MockCaller::new();
        let ctx = EventContext::new(private_event(42, "hi".into()), Gateway::new(mock.clone()));

        let err = ctx.group_member_list().await.unwrap_err();
        assert!(matches!(err, ApiError::Unsupported(_)));
        assert!(mock.calls.lock().is_empty());
    }
}
