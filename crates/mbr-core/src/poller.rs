use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    identity::IdentityPool,
    messaging::{port::BotApi, types::InboundUpdate},
    state::PollCursor,
    Result,
};

/// Long-polls `getUpdates` as the pool's primary bot.
pub struct UpdatePoller {
    api: Arc<dyn BotApi>,
    wait: Duration,
}

impl UpdatePoller {
    pub fn new(api: Arc<dyn BotApi>, wait: Duration) -> Self {
        Self { api, wait }
    }

    /// Fetch the next batch after `cursor` and advance it past every returned
    /// update, before any content filtering.
    pub async fn poll(&self, pool: &IdentityPool, cursor: &PollCursor) -> Result<Vec<InboundUpdate>> {
        let primary = pool.primary();
        let offset = cursor.next_offset();

        let updates = self
            .api
            .get_updates(&primary.credential, offset, self.wait)
            .await?;

        for update in &updates {
            cursor.advance(update.update_id.0);
        }

        debug!(
            offset,
            received = updates.len(),
            cursor = cursor.value(),
            "poll returned"
        );
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BotToken, Credential, UpdateId},
        errors::Error,
        identity::Identity,
        test_support::{group_text, FakeApi, PollStep},
    };

    fn pool() -> IdentityPool {
        let mk = |t: &str, h: &str| Identity {
            credential: Credential::new(BotToken::new(t), "http://x"),
            display_name: h.to_string(),
            handle: h.to_string(),
            verified: true,
        };
        IdentityPool::from_identities(vec![mk("1:a", "first"), mk("2:b", "second")]).unwrap()
    }

    fn bare(update_id: i64) -> InboundUpdate {
        InboundUpdate {
            update_id: UpdateId(update_id),
            message: None,
        }
    }

    #[tokio::test]
    async fn advances_cursor_and_requests_next_offset() {
        let api = Arc::new(
            FakeApi::new()
                .poll_step(PollStep::Updates(vec![
                    group_text(10, -1, 1, Some("a")),
                    bare(11),
                ]))
                .poll_step(PollStep::Updates(vec![])),
        );
        let poller = UpdatePoller::new(api.clone(), Duration::from_secs(30));
        let cursor = PollCursor::default();

        let first = poller.poll(&pool(), &cursor).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(cursor.value(), 11);

        let second = poller.poll(&pool(), &cursor).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(cursor.value(), 11);

        assert_eq!(api.poll_offsets(), vec![1, 12]);
    }

    #[tokio::test]
    async fn out_of_order_ids_never_move_cursor_back() {
        let api = Arc::new(
            FakeApi::new()
                .poll_step(PollStep::Updates(vec![bare(20), bare(15), bare(18)]))
                .poll_step(PollStep::Updates(vec![bare(3)])),
        );
        let poller = UpdatePoller::new(api, Duration::from_secs(30));
        let cursor = PollCursor::default();

        poller.poll(&pool(), &cursor).await.unwrap();
        assert_eq!(cursor.value(), 20);
        poller.poll(&pool(), &cursor).await.unwrap();
        assert_eq!(cursor.value(), 20);
    }

    #[tokio::test]
    async fn failure_leaves_cursor_untouched() {
        let api = Arc::new(FakeApi::new().poll_step(PollStep::Fail("connection reset".into())));
        let poller = UpdatePoller::new(api, Duration::from_secs(30));
        let cursor = PollCursor::default();
        cursor.advance(7);

        let err = poller.poll(&pool(), &cursor).await.unwrap_err();
        assert!(matches!(err, Error::Unreachable(_)));
        assert_eq!(cursor.value(), 7);
    }
}
