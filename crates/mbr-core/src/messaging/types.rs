use crate::domain::{ChatId, MessageId, MessageRef, UpdateId};

/// Profile returned by `getMe`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BotProfile {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// One item from `getUpdates`. Non-message updates carry no payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: UpdateId,
    pub message: Option<InboundMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub chat_kind: ChatKind,
    pub sender_name: Option<String>,
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}

/// Telegram chat type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    Other(String),
}

impl ChatKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "private" => ChatKind::Private,
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            other => ChatKind::Other(other.to_string()),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}
