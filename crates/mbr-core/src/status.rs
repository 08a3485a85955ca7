use std::{fmt, sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::state::RuntimeState;

/// Point-in-time view of the process for the periodic status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime: Duration,
    pub bots: usize,
    pub messages_processed: u64,
    pub reactions_succeeded: u64,
}

impl StatusSnapshot {
    pub fn capture(state: &RuntimeState, bots: usize) -> Self {
        Self {
            uptime: state.uptime(),
            bots,
            messages_processed: state.messages_processed(),
            reactions_succeeded: state.reactions_succeeded(),
        }
    }

    /// `"<hours>h <minutes>m"`.
    pub fn uptime_label(&self) -> String {
        let secs = self.uptime.as_secs();
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uptime {}, {} bots, {} msgs, {} reactions",
            self.uptime_label(),
            self.bots,
            self.messages_processed,
            self.reactions_succeeded
        )
    }
}

/// Shortest period the reporter accepts.
pub const MIN_STATUS_PERIOD: Duration = Duration::from_secs(1);

/// Emits a status line every `period` until cancelled. Read-only on state.
pub struct StatusReporter {
    state: Arc<RuntimeState>,
    bots: usize,
    period: Duration,
    cancel: CancellationToken,
}

impl StatusReporter {
    pub fn new(
        state: Arc<RuntimeState>,
        bots: usize,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state,
            bots,
            period: period.max(MIN_STATUS_PERIOD),
            cancel,
        }
    }

    /// Run on its own task; resolves to the number of ticks emitted.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }

    async fn run(self) -> u64 {
        let mut tick = interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick.tick() => {
                    let snap = StatusSnapshot::capture(&self.state, self.bots);
                    info!(
                        uptime = %snap.uptime_label(),
                        bots = snap.bots,
                        messages = snap.messages_processed,
                        reactions = snap.reactions_succeeded,
                        "status: ACTIVE"
                    );
                    ticks += 1;
                }
            }
        }

        ticks
    }
}
