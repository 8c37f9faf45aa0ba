//! The ordered message container.
//!
//! Mutating operations work in place and return `&mut Self` so calls can be
//! chained. Query operations never touch the receiver; they return a fresh
//! chain or a scalar.
//!
//! # Example
//!
//! ```rust
//! use ranni_core::{MessageChain, MessageKind};
//!
//! let mut chain = MessageChain::new();
//! chain.add_text("  hello ").add_at(10001).add_text("world  ");
//!
//! assert_eq!(chain.len(), 3);
//! assert_eq!(chain.match_kind(MessageKind::At).len(), 1);
//! assert_eq!(chain.plain_text(), "hello world");
//! assert!(chain.contains_at(10001));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::segment::{Message, MessageKind};

/// An ordered sequence of [`Message`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageChain {
    messages: Vec<Message>,
}

impl MessageChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Consumes the chain and returns its messages.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    // ==================== Mutation ====================

    /// Appends a message.
    pub fn add(&mut self, message: impl Into<Message>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.add(Message::text(text))
    }

    pub fn add_image(&mut self, file: impl Into<String>) -> &mut Self {
        self.add(Message::image(file))
    }

    pub fn add_record(&mut self, file: impl Into<String>) -> &mut Self {
        self.add(Message::record(file))
    }

    pub fn add_at(&mut self, user_id: i64) -> &mut Self {
        self.add(Message::at(user_id))
    }

    /// Appends every message of `other`, in order.
    pub fn append_chain(&mut self, other: &MessageChain) -> &mut Self {
        self.messages.extend(other.messages.iter().cloned());
        self
    }

    /// Removes the message at `position`. Out-of-range positions are ignored.
    pub fn remove(&mut self, position: usize) -> &mut Self {
        if position < self.messages.len() {
            self.messages.remove(position);
        }
        self
    }

    // ==================== Queries ====================

    /// Splits the chain into groups of `size` messages.
    ///
    /// Full groups come first in order, followed by one group holding the
    /// remainder if there is one. A `size` of zero yields the whole chain as a
    /// single group. An empty chain yields no groups.
    pub fn split(&self, size: usize) -> Vec<MessageChain> {
        if self.messages.is_empty() {
            return Vec::new();
        }
        if size == 0 {
            return vec![self.clone()];
        }
        self.messages
            .chunks(size)
            .map(|chunk| MessageChain::from(chunk.to_vec()))
            .collect()
    }

    /// Returns the messages of the given kind, in order.
    pub fn match_kind(&self, kind: MessageKind) -> MessageChain {
        self.filter(|m| m.kind() == kind)
    }

    /// Returns the messages accepted by `predicate`, in order.
    pub fn filter<F>(&self, mut predicate: F) -> MessageChain
    where
        F: FnMut(&Message) -> bool,
    {
        self.messages.iter().filter(|m| predicate(m)).cloned().collect()
    }

    pub fn any_match<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&Message) -> bool,
    {
        self.messages.iter().any(predicate)
    }

    pub fn find_first(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn find_last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns `true` if the chain holds at least one message.
    pub fn exist(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Returns `true` if the chain mentions `user_id` directly.
    pub fn contains_at(&self, user_id: i64) -> bool {
        self.any_match(|m| {
            m.as_at()
                .is_some_and(|at| at.target_id() == Some(user_id))
        })
    }

    /// Concatenates the text messages and trims surrounding whitespace.
    pub fn plain_text(&self) -> String {
        let joined: String = self.messages.iter().filter_map(Message::as_text).collect();
        joined.trim().to_string()
    }

    /// Converts every message into its wire form.
    pub fn to_wire_form(&self) -> serde_json::Result<Vec<Value>> {
        self.messages.iter().map(Message::build_wire_form).collect()
    }
}

impl fmt::Display for MessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text())
    }
}

impl From<Message> for MessageChain {
    fn from(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }
}

impl From<Vec<Message>> for MessageChain {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl From<&str> for MessageChain {
    fn from(text: &str) -> Self {
        Message::text(text).into()
    }
}

impl From<String> for MessageChain {
    fn from(text: String) -> Self {
        Message::text(text).into()
    }
}

impl FromIterator<Message> for MessageChain {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MessageChain {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageChain {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl<'de> Deserialize<'de> for MessageChain {
    /// Decodes leniently: elements that cannot be decoded are skipped.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(crate::decode::decode_message_chain(&value))
    }
}
