//! Inbound frame decoding.
//!
//! A frame is one JSON document pushed by the gateway. Only message events are
//! decoded; every other category is ignored without error. Inside an event the
//! message array is decoded element by element, so one bad element never costs
//! the rest of the chain.

use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{DecodeError, DecodeResult};
use crate::model::{Event, GroupMessageEvent, Message, MessageChain, PrivateMessageEvent};

/// Decodes one inbound frame.
///
/// Returns `Ok(None)` for frames that are well-formed but not message events
/// (heartbeats, notices, requests, unknown message types).
pub fn decode_frame(frame: &[u8]) -> DecodeResult<Option<Event>> {
    let value: Value = serde_json::from_slice(frame).map_err(DecodeError::Malformed)?;

    let post_type = value.get("post_type").and_then(Value::as_str);
    if post_type != Some("message") {
        trace!(post_type = ?post_type, "Ignoring non-message frame");
        return Ok(None);
    }

    match value.get("message_type").and_then(Value::as_str) {
        Some("group") => GroupMessageEvent::deserialize(&value)
            .map(|e| Some(Event::Group(e)))
            .map_err(|source| DecodeError::Event {
                kind: "group",
                source,
            }),
        Some("private") => PrivateMessageEvent::deserialize(&value)
            .map(|e| Some(Event::Private(e)))
            .map_err(|source| DecodeError::Event {
                kind: "private",
                source,
            }),
        other => {
            trace!(message_type = ?other, "Ignoring unknown message type");
            Ok(None)
        }
    }
}

/// Decodes a wire-form message array into a chain.
///
/// Elements with an unknown `type`, or whose `data` does not fit the variant,
/// are logged and skipped. A value that is not an array yields an empty chain.
pub fn decode_message_chain(value: &Value) -> MessageChain {
    let Some(elements) = value.as_array() else {
        if !value.is_null() {
            warn!(value = %value, "Message field is not an array, treating as empty");
        }
        return MessageChain::new();
    };

    elements
        .iter()
        .filter_map(|element| match Message::deserialize(element) {
            Ok(message) => Some(message),
            Err(e) => {
                let kind = element.get("type").and_then(Value::as_str).unwrap_or("?");
                warn!(kind, error = %e, "Skipping undecodable message element");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AtTarget, EventType, MessageKind};
    use serde_json::json;

    fn group_frame(message: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "time": 1700000000,
            "self_id": 10000,
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 321,
            "group_id": 555,
            "user_id": 42,
            "anonymous": null,
            "message": message,
            "raw_message": "hi",
            "font": 0,
            "sender": {"user_id": 42, "nickname": "alice", "sex": "female", "age": 20, "card": "", "role": "member"}
        }))
        .unwrap()
    }

    #[test]
    fn decodes_group_event() {
        let frame = group_frame(json!([{"type": "text", "data": {"text": "hi"}}]));
        let event = decode_frame(&frame).unwrap().unwrap();

        assert_eq!(event.event_type(), EventType::Group);
        assert_eq!(event.subject_id(), 555);
        assert_eq!(event.user_id(), 42);
        assert_eq!(event.sender().nickname, "alice");
        assert_eq!(event.plain_text(), "hi");
        let Event::Group(group) = &event else {
            panic!("expected group event");
        };
        assert_eq!(group.self_id, 10000);
        assert!(group.anonymous.is_none());
    }

    #[test]
    fn decodes_private_event() {
        let frame = json!({
            "time": 1, "self_id": 2, "post_type": "message", "message_type": "private",
            "sub_type": "friend", "message_id": 3, "user_id": 4,
            "message": [{"type": "face", "data": {"id": "14"}}],
            "raw_message": "", "font": 0,
            "sender": {"user_id": 4, "nickname": "bob"}
        });
        let event = decode_frame(&serde_json::to_vec(&frame).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type(), EventType::Private);
        assert_eq!(event.subject_id(), 4);
        assert_eq!(event.group_id(), None);
        assert_eq!(event.chain().find_first().map(Message::kind), Some(MessageKind::Face));
    }

    #[test]
    fn ignores_other_categories() {
        let heartbeat = br#"{"post_type":"meta_event","meta_event_type":"heartbeat"}"#;
        assert!(decode_frame(heartbeat).unwrap().is_none());

        let notice = br#"{"post_type":"notice","notice_type":"group_increase"}"#;
        assert!(decode_frame(notice).unwrap().is_none());

        let odd = br#"{"post_type":"message","message_type":"guild"}"#;
        assert!(decode_frame(odd).unwrap().is_none());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let err = decode_frame(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn event_shape_mismatch_is_an_error() {
        let frame = br#"{"post_type":"message","message_type":"group","user_id":"x"}"#;
        let err = decode_frame(frame).unwrap_err();
        assert!(matches!(err, DecodeError::Event { kind: "group", .. }));
    }

    #[test]
    fn at_all_and_numeric_targets() {
        let chain = decode_message_chain(&json!([
            {"type": "at", "data": {"qq": "all"}},
            {"type": "at", "data": {"qq": "123"}}
        ]));
        let targets: Vec<_> = chain
            .iter()
            .filter_map(Message::as_at)
            .map(|at| at.target)
            .collect();
        assert_eq!(targets, vec![AtTarget::All, AtTarget::User(123)]);
    }

    #[test]
    fn bad_elements_are_skipped_not_fatal() {
        let chain = decode_message_chain(&json!([
            {"type": "text", "data": {"text": "a"}},
            {"type": "at", "data": {"qq": "nobody"}},
            {"type": "markdown", "data": {"content": "# x"}},
            {"type": "image", "data": {"file": "p.png", "url": "http://x/p.png"}},
            {"type": "text", "data": {"text": "b"}}
        ]));
        let kinds: Vec<_> = chain.iter().map(Message::kind).collect();
        assert_eq!(kinds, vec![MessageKind::Text, MessageKind::Image, MessageKind::Text]);
    }

    #[test]
    fn bad_element_inside_event_keeps_event() {
        let frame = group_frame(json!([
            {"type": "unknown_thing", "data": {}},
            {"type": "text", "data": {"text": " ok "}}
        ]));
        let event = decode_frame(&frame).unwrap().unwrap();
        assert_eq!(event.chain().len(), 1);
        assert_eq!(event.plain_text(), "ok");
    }

    #[test]
    fn node_content_is_decoded_recursively() {
        let chain = decode_message_chain(&json!([
            {"type": "node", "data": {"name": "n", "user_id": "7", "content": [
                {"type": "text", "data": {"text": "inner"}},
                {"type": "bogus", "data": {}}
            ]}}
        ]));
        let Some(Message::Node(node)) = chain.find_first() else {
            panic!("expected node");
        };
        assert_eq!(node.user_id, 7);
        assert_eq!(node.content.plain_text(), "inner");
    }

    #[test]
    fn non_array_message_is_empty() {
        assert!(decode_message_chain(&json!("[CQ:face,id=1]")).is_empty());
        assert!(decode_message_chain(&Value::Null).is_empty());
    }
}
