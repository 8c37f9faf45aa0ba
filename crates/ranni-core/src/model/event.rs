//! Message events received from the gateway.
//!
//! Group and private events share [`MessageEvent`], which each variant
//! flattens and derefs to.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::chain::MessageChain;

/// Where a message came from, and where a reply should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Group,
    Private,
}

impl EventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sender information as reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub user_id: i64,
    pub nickname: String,
    /// `"male"`, `"female"` or `"unknown"`.
    pub sex: String,
    pub age: i32,
    /// Group card, group events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// Group role, group events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Anonymous sender descriptor in group events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anonymous {
    pub id: i64,
    pub name: String,
    /// Opaque token used by moderation calls.
    pub flag: String,
}

/// Fields shared by every message event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Unix timestamp the event was produced at.
    pub time: i64,
    /// The bot's own id.
    pub self_id: i64,
    pub message_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub raw_message: String,
    #[serde(default)]
    pub font: i32,
    #[serde(default)]
    pub sender: Sender,
    /// The decoded message content.
    #[serde(rename = "message", default)]
    pub chain: MessageChain,
}

/// A message posted in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessageEvent {
    #[serde(flatten)]
    pub inner: MessageEvent,
    pub group_id: i64,
    #[serde(default)]
    pub anonymous: Option<Anonymous>,
}

impl Deref for GroupMessageEvent {
    type Target = MessageEvent;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A message sent directly to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessageEvent {
    #[serde(flatten)]
    pub inner: MessageEvent,
}

impl Deref for PrivateMessageEvent {
    type Target = MessageEvent;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Group(GroupMessageEvent),
    Private(PrivateMessageEvent),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Group(_) => EventType::Group,
            Self::Private(_) => EventType::Private,
        }
    }

    /// The fields shared by both variants.
    pub fn message_event(&self) -> &MessageEvent {
        match self {
            Self::Group(e) => &e.inner,
            Self::Private(e) => &e.inner,
        }
    }

    pub fn chain(&self) -> &MessageChain {
        &self.message_event().chain
    }

    pub fn sender(&self) -> &Sender {
        &self.message_event().sender
    }

    pub fn user_id(&self) -> i64 {
        self.message_event().user_id
    }

    pub fn group_id(&self) -> Option<i64> {
        match self {
            Self::Group(e) => Some(e.group_id),
            Self::Private(_) => None,
        }
    }

    /// The id replies are addressed to: the group for group events, the
    /// sender for private ones.
    pub fn subject_id(&self) -> i64 {
        match self {
            Self::Group(e) => e.group_id,
            Self::Private(e) => e.user_id,
        }
    }

    /// Plain text of the message, see [`MessageChain::plain_text`].
    pub fn plain_text(&self) -> String {
        self.chain().plain_text()
    }
}

impl From<GroupMessageEvent> for Event {
    fn from(e: GroupMessageEvent) -> Self {
        Self::Group(e)
    }
}

impl From<PrivateMessageEvent> for Event {
    fn from(e: PrivateMessageEvent) -> Self {
        Self::Private(e)
    }
}
