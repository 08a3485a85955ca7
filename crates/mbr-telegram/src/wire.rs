//! Bot API JSON shapes and their mapping onto the core update model.

use serde::Deserialize;
use serde_json::Value;

use mbr_core::{
    domain::{ChatId, MessageId, UpdateId},
    messaging::types::{BotProfile, ChatKind, InboundMessage, InboundUpdate},
};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn description_or_default(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    pub fn retry_after(&self) -> Option<u64> {
        self.parameters.as_ref().and_then(|p| p.retry_after)
    }
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<User> for BotProfile {
    fn from(u: User) -> Self {
        BotProfile {
            id: u.id,
            first_name: u.first_name,
            username: u.username,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
}

impl From<Message> for InboundMessage {
    fn from(m: Message) -> Self {
        InboundMessage {
            chat_id: ChatId(m.chat.id),
            message_id: MessageId(m.message_id),
            chat_kind: ChatKind::parse(&m.chat.kind),
            sender_name: m.from.and_then(|u| u.first_name),
            text: m.text,
        }
    }
}

/// Convert raw `getUpdates` items one by one.
///
/// An item whose `message` does not decode still yields an update (without
/// payload) so the cursor moves past it. Items without a numeric `update_id`
/// are dropped.
pub fn updates_from_values(items: Vec<Value>) -> Vec<InboundUpdate> {
    items
        .into_iter()
        .filter_map(|mut item| {
            let update_id = item.get("update_id")?.as_i64()?;
            let message = item
                .get_mut("message")
                .map(Value::take)
                .and_then(|raw| serde_json::from_value::<Message>(raw).ok())
                .map(InboundMessage::from);
            Some(InboundUpdate {
                update_id: UpdateId(update_id),
                message,
            })
        })
        .collect()
}
