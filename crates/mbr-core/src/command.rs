//! Classification of inbound group messages.
//!
//! `/reaction <chat-id> <message-id> [count]` asks for a manual dispatch
//! against any message; every other plain (non-command) group message gets
//! reactions itself.

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::InboundMessage,
};

pub const REACTION_COMMAND: &str = "/reaction";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Ignore,
    ImplicitReaction { target: MessageRef },
    ManualDispatch { target: MessageRef, count: u32 },
    MalformedCommand { reason: String },
}

#[derive(Clone, Debug)]
pub struct CommandParser {
    default_count: u32,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self { default_count: 5 }
    }
}

impl CommandParser {
    pub fn new(default_count: u32) -> Self {
        Self { default_count }
    }

    pub fn classify(&self, msg: &InboundMessage) -> Classification {
        if !msg.chat_kind.is_group() {
            return Classification::Ignore;
        }

        let text = msg.text.as_deref().unwrap_or("").trim_start();
        if !text.starts_with('/') {
            return Classification::ImplicitReaction {
                target: msg.message_ref(),
            };
        }

        let mut tokens = text.split_whitespace();
        let head = tokens.next().unwrap_or("");
        if !is_reaction_command(head) {
            return Classification::Ignore;
        }

        let args: Vec<&str> = tokens.collect();
        self.parse_manual(&args)
    }

    fn parse_manual(&self, args: &[&str]) -> Classification {
        let malformed = |reason: String| Classification::MalformedCommand { reason };

        if args.len() < 2 {
            return malformed(format!(
                "usage: {REACTION_COMMAND} <chat-id> <message-id> [count]"
            ));
        }
        let Ok(chat_id) = args[0].parse::<i64>() else {
            return malformed(format!("invalid chat id: {}", args[0]));
        };
        let Ok(message_id) = args[1].parse::<i64>() else {
            return malformed(format!("invalid message id: {}", args[1]));
        };
        let count = match args.get(2) {
            None => self.default_count,
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) => u32::try_from(n).unwrap_or(u32::MAX),
                Err(_) => return malformed(format!("invalid count: {raw}")),
            },
        };

        Classification::ManualDispatch {
            target: MessageRef {
                chat_id: ChatId(chat_id),
                message_id: MessageId(message_id),
            },
            count,
        }
    }
}

/// `/reaction` or `/reaction@SomeBot`.
fn is_reaction_command(head: &str) -> bool {
    match head.split_once('@') {
        Some((cmd, bot)) => cmd == REACTION_COMMAND && !bot.is_empty(),
        None => head == REACTION_COMMAND,
    }
}
