//! Reaction fan-out: pick distinct bots at random and have each one react to
//! the target message, one after another with a random pause in between.

use std::{sync::Arc, sync::Mutex, time::Duration};

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::{Config, DEFAULT_EMOJIS},
    domain::MessageRef,
    identity::IdentityPool,
    messaging::{failure::ReactionFailure, port::BotApi},
    state::RuntimeState,
};

/// One dispatch: react to `target` with up to `requested` bots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReactionRequest {
    pub target: MessageRef,
    /// `None` means "as many as the cap allows".
    pub requested: Option<u32>,
}

/// Result of one bot's attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub handle: String,
    pub emoji: String,
    pub failure: Option<ReactionFailure>,
}

impl ReactionOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Aggregate of a dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<ReactionOutcome>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub max_per_dispatch: usize,
    pub pacing_min: Duration,
    pub pacing_max: Duration,
    pub emojis: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_per_dispatch: 10,
            pacing_min: Duration::from_millis(500),
            pacing_max: Duration::from_millis(2000),
            emojis: DEFAULT_EMOJIS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&Config> for DispatchConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            max_per_dispatch: cfg.max_reactions_per_dispatch,
            pacing_min: cfg.pacing_min,
            pacing_max: cfg.pacing_max,
            emojis: cfg.emojis.clone(),
        }
    }
}

/// A single planned attempt, drawn up front so the RNG lock is never held
/// across an await.
struct Attempt {
    identity: usize,
    emoji: String,
    pause_after: Duration,
}

pub struct ReactionDispatcher {
    api: Arc<dyn BotApi>,
    state: Arc<RuntimeState>,
    cfg: DispatchConfig,
    rng: Mutex<StdRng>,
    cancel: CancellationToken,
}

impl ReactionDispatcher {
    pub fn new(
        api: Arc<dyn BotApi>,
        state: Arc<RuntimeState>,
        cfg: DispatchConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self::with_rng(api, state, cfg, cancel, StdRng::from_os_rng())
    }

    /// Same as `new` with a caller-supplied RNG (seeded in tests).
    pub fn with_rng(
        api: Arc<dyn BotApi>,
        state: Arc<RuntimeState>,
        cfg: DispatchConfig,
        cancel: CancellationToken,
        rng: StdRng,
    ) -> Self {
        Self {
            api,
            state,
            cfg,
            rng: Mutex::new(rng),
            cancel,
        }
    }

    /// Number of bots a request will use against a pool of `pool_size`.
    pub fn planned_count(&self, requested: Option<u32>, pool_size: usize) -> usize {
        let cap = self.cfg.max_per_dispatch;
        let wanted = requested.map(|r| r as usize).unwrap_or(cap);
        wanted.min(cap).min(pool_size)
    }

    fn plan(&self, requested: Option<u32>, pool_size: usize) -> Vec<Attempt> {
        let n = self.planned_count(requested, pool_size);
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let picked = rand::seq::index::sample(&mut *rng, pool_size, n);
        picked
            .into_iter()
            .map(|identity| {
                let emoji = self
                    .cfg
                    .emojis
                    .choose(&mut *rng)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_EMOJIS[0].to_string());
                let pause_after = if self.cfg.pacing_max > self.cfg.pacing_min {
                    rng.random_range(self.cfg.pacing_min..=self.cfg.pacing_max)
                } else {
                    self.cfg.pacing_min
                };
                Attempt {
                    identity,
                    emoji,
                    pause_after,
                }
            })
            .collect()
    }

    /// Run one dispatch and return the number of successful reactions.
    ///
    /// Never fails: every per-bot failure is classified, logged and counted as
    /// unsuccessful.
    pub async fn dispatch(&self, pool: &IdentityPool, request: ReactionRequest) -> usize {
        self.dispatch_report(pool, request).await.succeeded()
    }

    pub async fn dispatch_report(
        &self,
        pool: &IdentityPool,
        request: ReactionRequest,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if pool.size() == 0 {
            error!("no working identities; nothing to dispatch");
            return report;
        }

        let attempts = self.plan(request.requested, pool.size());
        let total = attempts.len();
        info!(target_msg = %request.target, count = total, "dispatching reactions");

        for (idx, attempt) in attempts.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(done = idx, planned = total, "shutdown requested; dispatch cut short");
                break;
            }

            let identity = &pool.all()[attempt.identity];
            let result = self
                .api
                .set_reaction(&identity.credential, request.target, &attempt.emoji)
                .await;

            match &result {
                Ok(()) => {
                    self.state.record_reaction();
                    info!(bot = %identity.display_name, emoji = %attempt.emoji, "reaction ok");
                }
                Err(failure) => {
                    warn!(
                        bot = %identity.display_name,
                        emoji = %attempt.emoji,
                        kind = failure.kind(),
                        error = %failure,
                        "reaction failed"
                    );
                }
            }

            report.outcomes.push(ReactionOutcome {
                handle: identity.handle.clone(),
                emoji: attempt.emoji,
                failure: result.err(),
            });

            if idx + 1 < total {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = sleep(attempt.pause_after) => {}
                }
            }
        }

        info!(
            target_msg = %request.target,
            succeeded = report.succeeded(),
            attempted = report.attempted(),
            "dispatch finished"
        );
        report
    }
}
