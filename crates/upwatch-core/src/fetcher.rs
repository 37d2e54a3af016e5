//! Bounded calls to the status provider.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::trace;

use crate::error::FetchError;
use crate::provider::StatusProvider;
use crate::selector::TargetSelector;
use crate::types::{Event, ItemStatus, StableId};

/// Default per-call timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult<T> {
    /// The backend returned records.
    Snapshot(Vec<T>),
    /// The backend returned nothing.
    Empty,
    /// The call failed or timed out.
    Error(FetchError),
}

impl<T> PollResult<T> {
    fn from_result(result: Result<Vec<T>, FetchError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Snapshot(items),
            Err(err) => Self::Error(err),
        }
    }
}

/// Stateless wrapper that puts a timeout around every provider call.
///
/// The timeout is independent of the poll interval, so a slow backend delays
/// the next tick by at most `call_timeout`.
#[derive(Debug)]
pub struct SnapshotFetcher<P> {
    provider: P,
    call_timeout: Duration,
}

impl<P: StatusProvider> SnapshotFetcher<P> {
    /// Wraps `provider` with the given per-call timeout.
    #[must_use]
    pub const fn new(provider: P, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
        }
    }

    /// Fetches the current status of the selected probes.
    pub async fn fetch_snapshot(&self, selector: &TargetSelector) -> PollResult<ItemStatus> {
        trace!(?selector, "fetching snapshot");
        let result = timeout(self.call_timeout, self.provider.get_snapshot(selector))
            .await
            .unwrap_or(Err(FetchError::Timeout(self.call_timeout)));
        PollResult::from_result(result)
    }

    /// Fetches events for `item` after `since`.
    pub async fn fetch_events(
        &self,
        item: StableId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> PollResult<Event> {
        trace!(%item, %since, limit, "fetching events");
        let result = timeout(
            self.call_timeout,
            self.provider.get_events_since(item, since, limit),
        )
        .await
        .unwrap_or(Err(FetchError::Timeout(self.call_timeout)));
        PollResult::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckOutcome, ProbeStatus};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    struct SlowProvider {
        delay: Duration,
        events: Vec<Event>,
    }

    impl StatusProvider for SlowProvider {
        async fn get_snapshot(&self, _selector: &TargetSelector) -> Result<Vec<ItemStatus>, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![ItemStatus {
                id: StableId::new(Uuid::nil()),
                name: "api".into(),
                url: None,
                status: ProbeStatus::Up,
                last_checked_at: None,
                response_time_ms: Some(42),
                uptime_percent: None,
            }])
        }

        async fn get_events_since(
            &self,
            _item: StableId,
            _since: DateTime<Utc>,
            _limit: u32,
        ) -> Result<Vec<Event>, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.events.clone())
        }
    }

    fn event() -> Event {
        Event {
            probe_id: StableId::new(Uuid::nil()),
            timestamp: Utc::now(),
            outcome: CheckOutcome::Success,
            region: None,
            response_time_ms: None,
            status_code: None,
            message: None,
            metadata: BTreeMap::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_call_returns_snapshot() {
        let fetcher = SnapshotFetcher::new(
            SlowProvider {
                delay: Duration::from_millis(10),
                events: vec![],
            },
            Duration::from_secs(1),
        );
        let result = fetcher.fetch_snapshot(&TargetSelector::All { status: None }).await;
        assert!(matches!(result, PollResult::Snapshot(ref items) if items.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let fetcher = SnapshotFetcher::new(
            SlowProvider {
                delay: Duration::from_secs(30),
                events: vec![],
            },
            Duration::from_secs(2),
        );
        let result = fetcher.fetch_snapshot(&TargetSelector::All { status: None }).await;
        assert_eq!(result, PollResult::Error(FetchError::Timeout(Duration::from_secs(2))));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_events_are_empty() {
        let fetcher = SnapshotFetcher::new(
            SlowProvider {
                delay: Duration::ZERO,
                events: vec![],
            },
            DEFAULT_FETCH_TIMEOUT,
        );
        let result = fetcher
            .fetch_events(StableId::new(Uuid::nil()), Utc::now(), 10)
            .await;
        assert_eq!(result, PollResult::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_returned() {
        let fetcher = SnapshotFetcher::new(
            SlowProvider {
                delay: Duration::ZERO,
                events: vec![event(), event()],
            },
            DEFAULT_FETCH_TIMEOUT,
        );
        let result = fetcher
            .fetch_events(StableId::new(Uuid::nil()), Utc::now(), 10)
            .await;
        assert!(matches!(result, PollResult::Snapshot(ref e) if e.len() == 2));
    }
}
