//! Telegram adapter (Bot API over HTTP).
//!
//! This crate implements the `mbr-core` `BotApi` port with `reqwest`. One
//! adapter instance serves every bot in the pool; the credential passed to
//! each call selects the endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::debug;

pub mod wire;

use mbr_core::{
    config::Config,
    domain::{Credential, MessageRef},
    errors::Error,
    messaging::{
        failure::ReactionFailure,
        port::BotApi,
        types::{BotProfile, InboundUpdate},
    },
    Result,
};

use crate::wire::{updates_from_values, ApiResponse, User};

/// Extra time on top of the long-poll wait before the HTTP call gives up.
pub const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
pub struct TelegramTimeouts {
    pub verify: Duration,
    pub webhook: Duration,
    pub reaction: Duration,
}

impl Default for TelegramTimeouts {
    fn default() -> Self {
        Self {
            verify: Duration::from_secs(10),
            webhook: Duration::from_secs(5),
            reaction: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for TelegramTimeouts {
    fn from(cfg: &Config) -> Self {
        Self {
            verify: cfg.verify_timeout,
            webhook: cfg.webhook_timeout,
            reaction: cfg.reaction_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TelegramBotApi {
    http: Client,
    timeouts: TelegramTimeouts,
}

impl TelegramBotApi {
    pub fn new(timeouts: TelegramTimeouts) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("mbr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http, timeouts })
    }

    /// Request URLs embed the bot token, so it is stripped from transport errors.
    fn transport_err(e: reqwest::Error) -> String {
        e.without_url().to_string()
    }

    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<ApiResponse<T>> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Unreachable(Self::transport_err(e)))?;
        let status = resp.status();
        resp.json::<ApiResponse<T>>().await.map_err(|e| {
            Error::Backend(format!(
                "undecodable response ({status}): {}",
                Self::transport_err(e)
            ))
        })
    }

    async fn react_once(
        &self,
        credential: &Credential,
        body: &Value,
    ) -> std::result::Result<ApiResponse<bool>, ReactionFailure> {
        let req = self
            .http
            .post(credential.method_url("setMessageReaction"))
            .timeout(self.timeouts.reaction)
            .json(body);
        self.call::<bool>(req).await.map_err(|e| match e {
            Error::Unreachable(msg) | Error::Backend(msg) => ReactionFailure::NetworkError(msg),
            other => ReactionFailure::NetworkError(other.to_string()),
        })
    }
}

#[async_trait]
impl BotApi for TelegramBotApi {
    async fn get_me(&self, credential: &Credential) -> Result<BotProfile> {
        let req = self
            .http
            .get(credential.method_url("getMe"))
            .timeout(self.timeouts.verify);
        let resp = self.call::<User>(req).await?;

        match (resp.ok, resp.result) {
            (true, Some(user)) => Ok(user.into()),
            (true, None) => Err(Error::Backend("getMe returned no result".to_string())),
            (false, _) => Err(Error::InvalidCredential(
                resp.description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }

    async fn delete_webhook(&self, credential: &Credential) -> Result<()> {
        let req = self
            .http
            .get(credential.method_url("deleteWebhook"))
            .timeout(self.timeouts.webhook);
        let resp = self.call::<bool>(req).await?;
        if !resp.ok {
            return Err(Error::Backend(resp.description_or_default()));
        }
        Ok(())
    }

    async fn get_updates(
        &self,
        credential: &Credential,
        offset: i64,
        wait: Duration,
    ) -> Result<Vec<InboundUpdate>> {
        let req = self
            .http
            .get(credential.method_url("getUpdates"))
            .query(&[
                ("timeout", wait.as_secs().to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
                ("offset", offset.to_string()),
            ])
            .timeout(wait + POLL_TIMEOUT_MARGIN);
        let resp = self.call::<Vec<Value>>(req).await?;

        if !resp.ok {
            return Err(Error::Backend(format!(
                "getUpdates failed: {}",
                resp.description_or_default()
            )));
        }
        Ok(updates_from_values(resp.result.unwrap_or_default()))
    }

    async fn set_reaction(
        &self,
        credential: &Credential,
        target: MessageRef,
        emoji: &str,
    ) -> std::result::Result<(), ReactionFailure> {
        const MAX_RETRIES: usize = 1;

        let body = json!({
            "chat_id": target.chat_id.0,
            "message_id": target.message_id.0,
            "reaction": [{"type": "emoji", "emoji": emoji}],
        });

        let mut attempts = 0usize;
        loop {
            let resp = self.react_once(credential, &body).await?;
            if resp.ok {
                return Ok(());
            }

            // 429: honour a short retry_after once, like any other flood wait.
            if let Some(secs) = resp.retry_after() {
                let wait = Duration::from_secs(secs);
                if attempts < MAX_RETRIES && wait <= self.timeouts.reaction {
                    attempts += 1;
                    debug!(retry_after = secs, "reaction rate limited; retrying");
                    sleep(wait).await;
                    continue;
                }
            }

            return Err(ReactionFailure::from_description(
                &resp.description_or_default(),
            ));
        }
    }
}
