use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Process-wide counters and poll cursor.
///
/// Shared by `Arc` between the supervisor (writer) and the status reporter
/// (reader). All fields are atomics, so no lock is needed.
#[derive(Debug)]
pub struct RuntimeState {
    started: Instant,
    started_at: DateTime<Local>,
    messages_processed: AtomicU64,
    reactions_succeeded: AtomicU64,
    cursor: PollCursor,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Local::now(),
            messages_processed: AtomicU64::new(0),
            reactions_succeeded: AtomicU64::new(0),
            cursor: PollCursor::default(),
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    pub fn cursor(&self) -> &PollCursor {
        &self.cursor
    }

    pub fn record_message(&self) -> u64 {
        self.messages_processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_reaction(&self) -> u64 {
        self.reactions_succeeded.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    pub fn reactions_succeeded(&self) -> u64 {
        self.reactions_succeeded.load(Ordering::Relaxed)
    }
}

/// Highest update id already consumed. Never decreases.
#[derive(Debug, Default)]
pub struct PollCursor(AtomicI64);

impl PollCursor {
    pub fn value(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }

    /// Offset to request next: one past the last consumed update.
    pub fn next_offset(&self) -> i64 {
        self.value().saturating_add(1)
    }

    /// Move the cursor forward to `update_id` if it is ahead; returns the new value.
    pub fn advance(&self, update_id: i64) -> i64 {
        let prev = self.0.fetch_max(update_id, Ordering::AcqRel);
        prev.max(update_id)
    }
}
