//! Bot identities and the verified pool built from them at startup.

use tracing::{info, warn};

use crate::{
    domain::{BotToken, Credential},
    errors::Error,
    messaging::port::BotApi,
    Result,
};

/// One verified bot: its credential plus the profile `getMe` returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub credential: Credential,
    pub display_name: String,
    pub handle: String,
    pub verified: bool,
}

/// Probe a credential with `getMe`.
///
/// `position` is the 1-based index of the credential in the configured list;
/// it names bots whose profile lacks `first_name` / `username`.
pub async fn verify(api: &dyn BotApi, credential: Credential, position: usize) -> Result<Identity> {
    let profile = api.get_me(&credential).await?;

    let display_name = profile
        .first_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("bot-{position}"));
    let handle = profile
        .username
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("bot_{position}"));

    Ok(Identity {
        credential,
        display_name,
        handle,
        verified: true,
    })
}

/// Ordered set of verified identities. Never empty once built.
#[derive(Clone, Debug)]
pub struct IdentityPool {
    identities: Vec<Identity>,
}

impl IdentityPool {
    /// Verify every token in order, keeping the ones that answer `getMe`.
    ///
    /// Each verified bot also gets its webhook cleared so `getUpdates` works;
    /// that call is best-effort. Fails with `NoWorkingIdentities` when nothing
    /// verifies.
    pub async fn build(api: &dyn BotApi, tokens: &[BotToken], api_base: &str) -> Result<Self> {
        let mut identities = Vec::with_capacity(tokens.len());

        for (idx, token) in tokens.iter().enumerate() {
            let position = idx + 1;
            let credential = Credential::new(token.clone(), api_base);

            match verify(api, credential, position).await {
                Ok(identity) => {
                    info!(
                        position,
                        name = %identity.display_name,
                        handle = %identity.handle,
                        "bot verified"
                    );
                    if let Err(e) = api.delete_webhook(&identity.credential).await {
                        warn!(handle = %identity.handle, error = %e, "deleteWebhook failed; ignoring");
                    }
                    identities.push(identity);
                }
                Err(e) => {
                    warn!(position, token = %token, error = %e, "bot verification failed; skipping");
                }
            }
        }

        info!(
            verified = identities.len(),
            supplied = tokens.len(),
            "identity pool ready"
        );
        Self::from_identities(identities)
    }

    pub fn from_identities(identities: Vec<Identity>) -> Result<Self> {
        if identities.is_empty() {
            return Err(Error::NoWorkingIdentities);
        }
        Ok(Self { identities })
    }

    pub fn size(&self) -> usize {
        self.identities.len()
    }

    pub fn all(&self) -> &[Identity] {
        &self.identities
    }

    /// First verified identity; the one used for polling.
    pub fn primary(&self) -> &Identity {
        &self.identities[0]
    }
}
