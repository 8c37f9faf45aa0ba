//! Typed message and event model.

pub mod api;
pub mod chain;
pub mod event;
pub mod segment;

pub use api::{
    ApiResponse, BotInfo, ForwardMessageRequest, GroupMemberData,
    GroupMemberList, MessageIdData, MessageIdRequest, SendAck, SendMessageRequest, avatar_url,
    endpoint,
};
pub use chain::MessageChain;
pub use event::{
    Anonymous, Event, EventType, GroupMessageEvent, MessageEvent, PrivateMessageEvent, Sender,
};
pub use segment::{
    AtMessage, AtTarget, FaceMessage, ImageMessage, Message, MessageKind, NodeMessage,
    RecordMessage, ReplyMessage, TextMessage, VideoMessage,
};
