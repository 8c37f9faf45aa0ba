//! Message variants.
//!
//! A [`Message`] is one element of a [`MessageChain`]. Every variant is a plain
//! value object; constructing one never fails. On the wire each message is an
//! object `{"type": "<tag>", "data": {...}}` where the tag is the lowercase
//! variant name.
//!
//! # Example
//!
//! ```rust
//! use ranni_core::{Message, MessageKind};
//!
//! let at = Message::at_all();
//! assert_eq!(at.kind(), MessageKind::At);
//!
//! let wire = Message::text("hi").build_wire_form().unwrap();
//! assert_eq!(wire["type"], "text");
//! assert_eq!(wire["data"]["text"], "hi");
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::chain::MessageChain;

/// A single message element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Message {
    /// Plain text.
    Text(TextMessage),
    /// Image.
    Image(ImageMessage),
    /// Voice recording.
    Record(RecordMessage),
    /// Video.
    Video(VideoMessage),
    /// Mention.
    At(AtMessage),
    /// Reply to an earlier message.
    Reply(ReplyMessage),
    /// Built-in face/emoji.
    Face(FaceMessage),
    /// Forwarded bundle wrapping its own chain.
    Node(NodeMessage),
}

/// The kind of a [`Message`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Image,
    Record,
    Video,
    At,
    Reply,
    Face,
    Node,
}

impl MessageKind {
    /// The canonical lowercase wire tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Record => "record",
            Self::Video => "video",
            Self::At => "at",
            Self::Reply => "reply",
            Self::Face => "face",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Returns the kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Image(_) => MessageKind::Image,
            Self::Record(_) => MessageKind::Record,
            Self::Video(_) => MessageKind::Video,
            Self::At(_) => MessageKind::At,
            Self::Reply(_) => MessageKind::Reply,
            Self::Face(_) => MessageKind::Face,
            Self::Node(_) => MessageKind::Node,
        }
    }

    /// Converts this message into its `{type, data}` wire form.
    ///
    /// A [`Message::Node`] embeds its chain as an array of wire forms under
    /// `data.content`.
    pub fn build_wire_form(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    // ==================== Constructors ====================

    /// Creates a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextMessage { text: text.into() })
    }

    /// Creates an image message from a file reference (path, URL or base64).
    pub fn image(file: impl Into<String>) -> Self {
        Self::Image(ImageMessage::new(file))
    }

    /// Creates a voice message from a file reference.
    pub fn record(file: impl Into<String>) -> Self {
        Self::Record(RecordMessage::new(file))
    }

    /// Creates a video message from a file reference.
    pub fn video(file: impl Into<String>) -> Self {
        Self::Video(VideoMessage {
            file: file.into(),
            url: None,
        })
    }

    /// Creates a mention of a single user.
    pub fn at(user_id: i64) -> Self {
        Self::At(AtMessage {
            target: AtTarget::User(user_id),
        })
    }

    /// Creates a mention of everyone in the group.
    pub fn at_all() -> Self {
        Self::At(AtMessage {
            target: AtTarget::All,
        })
    }

    /// Creates a reply to the message with the given id.
    pub fn reply(id: impl Into<String>) -> Self {
        Self::Reply(ReplyMessage { id: id.into() })
    }

    /// Creates a face message.
    pub fn face(id: impl Into<String>) -> Self {
        Self::Face(FaceMessage {
            id: id.into(),
            face_type: None,
        })
    }

    /// Creates a forward node attributed to `user_id`.
    pub fn node(name: impl Into<String>, user_id: i64, content: MessageChain) -> Self {
        Self::Node(NodeMessage {
            name: name.into(),
            user_id,
            content,
        })
    }

    // ==================== Accessors ====================

    /// Returns the text payload if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Returns the mention if this is an at message.
    pub fn as_at(&self) -> Option<&AtMessage> {
        match self {
            Self::At(at) => Some(at),
            _ => None,
        }
    }
}

impl From<TextMessage> for Message {
    fn from(m: TextMessage) -> Self {
        Self::Text(m)
    }
}

impl From<ImageMessage> for Message {
    fn from(m: ImageMessage) -> Self {
        Self::Image(m)
    }
}

impl From<AtMessage> for Message {
    fn from(m: AtMessage) -> Self {
        Self::At(m)
    }
}

impl From<NodeMessage> for Message {
    fn from(m: NodeMessage) -> Self {
        Self::Node(m)
    }
}

// =============================================================================
// Variant payloads
// =============================================================================

/// Text payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: String,
}

/// Image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMessage {
    /// File reference.
    pub file: String,
    /// Remote URL, present on received images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `"flash"` for flash images.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
}

impl ImageMessage {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            url: None,
            image_type: None,
        }
    }

    /// Marks this image as a flash image.
    pub fn flash(mut self) -> Self {
        self.image_type = Some("flash".to_string());
        self
    }

    pub fn is_flash(&self) -> bool {
        self.image_type.as_deref() == Some("flash")
    }
}

/// Voice payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMessage {
    pub file: String,
    /// `"1"` enables voice changing on send.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub magic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RecordMessage {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            magic: None,
            url: None,
        }
    }
}

/// Video payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMessage {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Who an [`AtMessage`] mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtTarget {
    /// Everyone in the group.
    All,
    /// A single user.
    User(i64),
}

/// Mention payload.
///
/// On the wire the target is the `qq` field: `"all"` or the numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtMessage {
    #[serde(rename = "qq")]
    pub target: AtTarget,
}

impl AtMessage {
    pub fn is_all(&self) -> bool {
        self.target == AtTarget::All
    }

    /// The mentioned user, `None` for an at-all.
    pub fn target_id(&self) -> Option<i64> {
        match self.target {
            AtTarget::All => None,
            AtTarget::User(id) => Some(id),
        }
    }
}

impl Serialize for AtTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::User(id) => serializer.collect_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for AtTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AtTargetVisitor;

        impl Visitor<'_> for AtTargetVisitor {
            type Value = AtTarget;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"all\" or a non-negative user id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<AtTarget, E> {
                i64::try_from(v)
                    .map(AtTarget::User)
                    .map_err(|_| E::custom(format!("user id {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<AtTarget, E> {
                if v < 0 {
                    return Err(E::custom(format!("negative user id {v}")));
                }
                Ok(AtTarget::User(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AtTarget, E> {
                if v == "all" {
                    return Ok(AtTarget::All);
                }
                v.parse::<u64>()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                    .and_then(|id| self.visit_u64(id))
            }
        }

        deserializer.deserialize_any(AtTargetVisitor)
    }
}

/// Reply payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Face payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub face_type: Option<String>,
}

/// Forward node payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMessage {
    /// Display name of the attributed sender.
    #[serde(default)]
    pub name: String,
    /// Attributed sender id.
    #[serde(default, deserialize_with = "i64_or_string")]
    pub user_id: i64,
    /// The forwarded content.
    #[serde(default)]
    pub content: MessageChain,
}

// =============================================================================
// Lenient scalars
// =============================================================================

// Gateways are inconsistent about quoting ids; accept both forms.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

fn i64_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("id {n} out of range"))),
        Value::String(s) => s.parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected id, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_tags_are_lowercase() {
        assert_eq!(Message::text("x").kind().as_str(), "text");
        assert_eq!(Message::record("a.amr").kind().as_str(), "record");
        assert_eq!(Message::node("n", 1, MessageChain::new()).kind().as_str(), "node");
    }

    #[test]
    fn image_wire_form_skips_absent_fields() {
        let wire = Message::image("a.png").build_wire_form().unwrap();
        assert_eq!(wire, json!({"type": "image", "data": {"file": "a.png"}}));

        let flash = Message::Image(ImageMessage::new("b.png").flash());
        let wire = flash.build_wire_form().unwrap();
        assert_eq!(wire["data"]["type"], "flash");
    }

    #[test]
    fn at_wire_form_uses_qq_field() {
        let wire = Message::at(10001).build_wire_form().unwrap();
        assert_eq!(wire, json!({"type": "at", "data": {"qq": "10001"}}));

        let wire = Message::at_all().build_wire_form().unwrap();
        assert_eq!(wire["data"]["qq"], "all");
    }

    #[test]
    fn at_target_parses_all_forms() {
        let all: AtMessage = serde_json::from_value(json!({"qq": "all"})).unwrap();
        assert!(all.is_all());
        assert_eq!(all.target_id(), None);

        let quoted: AtMessage = serde_json::from_value(json!({"qq": "123"})).unwrap();
        assert_eq!(quoted.target_id(), Some(123));

        let bare: AtMessage = serde_json::from_value(json!({"qq": 456})).unwrap();
        assert_eq!(bare.target_id(), Some(456));
    }

    #[test]
    fn at_target_rejects_garbage() {
        assert!(serde_json::from_value::<AtMessage>(json!({"qq": "abc"})).is_err());
        assert!(serde_json::from_value::<AtMessage>(json!({"qq": "-5"})).is_err());
        assert!(serde_json::from_value::<AtMessage>(json!({"qq": -5})).is_err());
    }

    #[test]
    fn node_wire_form_nests_content_in_order() {
        let mut content = MessageChain::new();
        content.add_text("first").add_image("second.png");
        let node = Message::node("bot", 42, content);

        let wire = node.build_wire_form().unwrap();
        assert_eq!(wire["type"], "node");
        assert_eq!(wire["data"]["user_id"], 42);
        let entries = wire["data"]["content"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], json!({"type": "text", "data": {"text": "first"}}));
        assert_eq!(entries[1]["type"], "image");
    }

    #[test]
    fn reply_and_face_accept_numeric_ids() {
        let reply: ReplyMessage = serde_json::from_value(json!({"id": 987})).unwrap();
        assert_eq!(reply.id, "987");

        let face: FaceMessage = serde_json::from_value(json!({"id": "14"})).unwrap();
        assert_eq!(face.id, "14");
        assert_eq!(face.face_type, None);
    }
}
