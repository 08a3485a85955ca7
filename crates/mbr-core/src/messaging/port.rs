use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{Credential, MessageRef},
    messaging::{
        failure::ReactionFailure,
        types::{BotProfile, InboundUpdate},
    },
    Result,
};

/// Port onto the bot backend (Telegram Bot API in production).
///
/// Every call is made on behalf of one credential; the adapter owns the HTTP
/// client and the per-call timeouts.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// `getMe`. Fails with `Error::Unreachable` or `Error::InvalidCredential`.
    async fn get_me(&self, credential: &Credential) -> Result<BotProfile>;

    /// `deleteWebhook`. Callers treat this as best-effort.
    async fn delete_webhook(&self, credential: &Credential) -> Result<()>;

    /// `getUpdates` long poll, message updates only.
    async fn get_updates(
        &self,
        credential: &Credential,
        offset: i64,
        wait: Duration,
    ) -> Result<Vec<InboundUpdate>>;

    /// `setMessageReaction` with a single emoji.
    async fn set_reaction(
        &self,
        credential: &Credential,
        target: MessageRef,
        emoji: &str,
    ) -> std::result::Result<(), ReactionFailure>;
}
