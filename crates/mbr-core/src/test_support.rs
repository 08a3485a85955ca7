//! In-memory `BotApi` used by the unit tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ChatId, Credential, MessageId, MessageRef, UpdateId},
    errors::Error,
    messaging::{
        failure::ReactionFailure,
        port::BotApi,
        types::{BotProfile, ChatKind, InboundMessage, InboundUpdate},
    },
    Result,
};

pub enum PollStep {
    Updates(Vec<InboundUpdate>),
    Fail(String),
    Panic,
}

#[derive(Clone, Debug)]
pub struct ReactionCall {
    pub token: String,
    pub target: MessageRef,
    pub emoji: String,
    pub at: Instant,
}

#[derive(Default)]
pub struct FakeApi {
    profiles: HashMap<String, BotProfile>,
    unreachable: HashSet<String>,
    webhooks_fail: bool,
    reaction_failures: HashMap<String, ReactionFailure>,
    webhook_deletes: Mutex<Vec<String>>,
    poll_script: Mutex<VecDeque<PollStep>>,
    poll_offsets: Mutex<Vec<i64>>,
    cancel_when_drained: Option<CancellationToken>,
    reactions: Mutex<Vec<ReactionCall>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bot(mut self, token: &str, first_name: Option<&str>, username: Option<&str>) -> Self {
        let id = self.profiles.len() as i64 + 1;
        self.profiles.insert(
            token.to_string(),
            BotProfile {
                id,
                first_name: first_name.map(str::to_string),
                username: username.map(str::to_string),
            },
        );
        self
    }

    pub fn unreachable_token(mut self, token: &str) -> Self {
        self.unreachable.insert(token.to_string());
        self
    }

    pub fn failing_webhooks(mut self) -> Self {
        self.webhooks_fail = true;
        self
    }

    pub fn reaction_fails(mut self, token: &str, failure: ReactionFailure) -> Self {
        self.reaction_failures.insert(token.to_string(), failure);
        self
    }

    pub fn poll_step(self, step: PollStep) -> Self {
        self.poll_script.lock().unwrap().push_back(step);
        self
    }

    /// Once the scripted polls run out, cancel `token` and return nothing.
    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.cancel_when_drained = Some(token);
        self
    }

    pub fn webhook_deletes(&self) -> Vec<String> {
        self.webhook_deletes.lock().unwrap().clone()
    }

    pub fn poll_offsets(&self) -> Vec<i64> {
        self.poll_offsets.lock().unwrap().clone()
    }

    pub fn reactions(&self) -> Vec<ReactionCall> {
        self.reactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotApi for FakeApi {
    async fn get_me(&self, credential: &Credential) -> Result<BotProfile> {
        let token = credential.token.expose();
        if self.unreachable.contains(token) {
            return Err(Error::Unreachable("connection refused".to_string()));
        }
        self.profiles
            .get(token)
            .cloned()
            .ok_or_else(|| Error::InvalidCredential("Unauthorized".to_string()))
    }

    async fn delete_webhook(&self, credential: &Credential) -> Result<()> {
        self.webhook_deletes
            .lock()
            .unwrap()
            .push(credential.token.expose().to_string());
        if self.webhooks_fail {
            return Err(Error::Unreachable("timeout".to_string()));
        }
        Ok(())
    }

    async fn get_updates(
        &self,
        _credential: &Credential,
        offset: i64,
        _wait: Duration,
    ) -> Result<Vec<InboundUpdate>> {
        self.poll_offsets.lock().unwrap().push(offset);
        let step = self.poll_script.lock().unwrap().pop_front();
        match step {
            Some(PollStep::Updates(updates)) => Ok(updates),
            Some(PollStep::Fail(msg)) => Err(Error::Unreachable(msg)),
            Some(PollStep::Panic) => panic!("scripted poll panic"),
            None => {
                if let Some(tok) = &self.cancel_when_drained {
                    tok.cancel();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn set_reaction(
        &self,
        credential: &Credential,
        target: MessageRef,
        emoji: &str,
    ) -> std::result::Result<(), ReactionFailure> {
        let token = credential.token.expose().to_string();
        self.reactions.lock().unwrap().push(ReactionCall {
            token: token.clone(),
            target,
            emoji: emoji.to_string(),
            at: Instant::now(),
        });
        match self.reaction_failures.get(&token) {
            Some(f) => Err(f.clone()),
            None => Ok(()),
        }
    }
}

pub fn group_text(update_id: i64, chat_id: i64, message_id: i64, text: Option<&str>) -> InboundUpdate {
    message_update(update_id, chat_id, message_id, ChatKind::Supergroup, text)
}

pub fn message_update(
    update_id: i64,
    chat_id: i64,
    message_id: i64,
    chat_kind: ChatKind,
    text: Option<&str>,
) -> InboundUpdate {
    InboundUpdate {
        update_id: UpdateId(update_id),
        message: Some(InboundMessage {
            chat_id: ChatId(chat_id),
            message_id: MessageId(message_id),
            chat_kind,
            sender_name: Some("Tester".to_string()),
            text: text.map(str::to_string),
        }),
    }
}
