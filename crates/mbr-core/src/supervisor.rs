//! Poll/dispatch loop with restart-on-failure.
//!
//! ```text
//! Running --cycle failed--> Backoff --delay elapsed--> Running
//! Running | Backoff --cancel--> Stopped
//! ```
//!
//! Each cycle runs in its own task so a panic inside it is reported as a
//! failed cycle instead of taking the loop down.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    command::{Classification, CommandParser},
    config::Config,
    dispatch::{ReactionDispatcher, ReactionRequest},
    errors::Error,
    identity::IdentityPool,
    poller::UpdatePoller,
    state::RuntimeState,
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct SupervisorConfig {
    /// Pause between successful cycles.
    pub idle_delay: Duration,
    /// Delay after the first consecutive failure.
    pub backoff: Duration,
    /// Upper bound for the doubled delay; equal to `backoff` for a fixed delay.
    pub backoff_max: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_secs(2),
            backoff: Duration::from_secs(10),
            backoff_max: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for SupervisorConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            idle_delay: cfg.idle_delay,
            backoff: cfg.backoff,
            backoff_max: cfg.backoff_max,
        }
    }
}

impl SupervisorConfig {
    /// Delay before restarting after `failures` consecutive failed cycles.
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        self.backoff
            .saturating_mul(1u32 << exp)
            .min(self.backoff_max.max(self.backoff))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Backoff(Duration),
    Stopped,
}

/// What the loop did over its lifetime; returned once it stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub cycles: u64,
    pub restarts: u64,
    pub messages_processed: u64,
    pub reactions_succeeded: u64,
}

enum CycleEnd {
    Completed,
    Cancelled,
}

struct CycleContext {
    pool: Arc<IdentityPool>,
    poller: UpdatePoller,
    dispatcher: ReactionDispatcher,
    parser: CommandParser,
    state: Arc<RuntimeState>,
    cancel: CancellationToken,
}

impl CycleContext {
    async fn run_cycle(&self) -> Result<CycleEnd> {
        let updates = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(CycleEnd::Cancelled),
            polled = self.poller.poll(&self.pool, self.state.cursor()) => polled?,
        };

        for update in updates {
            if self.cancel.is_cancelled() {
                return Ok(CycleEnd::Cancelled);
            }
            let Some(msg) = update.message else {
                continue;
            };

            match self.parser.classify(&msg) {
                Classification::Ignore => {}
                Classification::MalformedCommand { reason } => {
                    warn!(chat = msg.chat_id.0, %reason, "malformed reaction command");
                }
                Classification::ManualDispatch { target, count } => {
                    info!(target_msg = %target, count, "manual reaction requested");
                    let ok = self
                        .dispatcher
                        .dispatch(
                            &self.pool,
                            ReactionRequest {
                                target,
                                requested: Some(count),
                            },
                        )
                        .await;
                    info!(succeeded = ok, "manual reaction completed");
                }
                Classification::ImplicitReaction { target } => {
                    info!(
                        from = msg.sender_name.as_deref().unwrap_or("unknown"),
                        chat = target.chat_id.0,
                        "new group message"
                    );
                    let ok = self
                        .dispatcher
                        .dispatch(
                            &self.pool,
                            ReactionRequest {
                                target,
                                requested: None,
                            },
                        )
                        .await;
                    let total = self.state.record_message();
                    info!(messages = total, succeeded = ok, "message processed");
                }
            }
        }

        Ok(CycleEnd::Completed)
    }
}

pub struct Supervisor {
    ctx: Arc<CycleContext>,
    cfg: SupervisorConfig,
}

impl Supervisor {
    pub fn new(
        pool: Arc<IdentityPool>,
        poller: UpdatePoller,
        dispatcher: ReactionDispatcher,
        parser: CommandParser,
        state: Arc<RuntimeState>,
        cfg: SupervisorConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx: Arc::new(CycleContext {
                pool,
                poller,
                dispatcher,
                parser,
                state,
                cancel,
            }),
            cfg,
        }
    }

    /// Drive cycles until the cancellation token fires.
    pub async fn run(self) -> SupervisorReport {
        let cancel = self.ctx.cancel.clone();
        let mut report = SupervisorReport::default();
        let mut failures = 0u32;
        let mut state = LoopState::Running;

        info!(bots = self.ctx.pool.size(), "supervisor started");

        loop {
            state = match state {
                LoopState::Running => {
                    report.cycles += 1;
                    let ctx = self.ctx.clone();
                    let outcome = match tokio::spawn(async move { ctx.run_cycle().await }).await {
                        Ok(res) => res,
                        Err(join) => Err(Error::CycleAborted(join.to_string())),
                    };

                    match outcome {
                        Ok(CycleEnd::Cancelled) => LoopState::Stopped,
                        Ok(CycleEnd::Completed) => {
                            failures = 0;
                            tokio::select! {
                                _ = cancel.cancelled() => LoopState::Stopped,
                                _ = sleep(self.cfg.idle_delay) => LoopState::Running,
                            }
                        }
                        Err(e) => {
                            failures = failures.saturating_add(1);
                            let delay = self.cfg.backoff_delay(failures);
                            error!(
                                error = %e,
                                failures,
                                retry_in_secs = delay.as_secs_f64(),
                                "main loop error; restarting after backoff"
                            );
                            LoopState::Backoff(delay)
                        }
                    }
                }
                LoopState::Backoff(delay) => {
                    tokio::select! {
                        _ = cancel.cancelled() => LoopState::Stopped,
                        _ = sleep(delay) => {
                            report.restarts += 1;
                            info!(restarts = report.restarts, "restarting main loop");
                            LoopState::Running
                        }
                    }
                }
                LoopState::Stopped => break,
            };
        }

        report.messages_processed = self.ctx.state.messages_processed();
        report.reactions_succeeded = self.ctx.state.reactions_succeeded();
        info!(
            messages = report.messages_processed,
            reactions = report.reactions_succeeded,
            cycles = report.cycles,
            restarts = report.restarts,
            "system stopped"
        );
        report
    }
}
