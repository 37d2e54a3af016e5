//! The poll loop.
//!
//! ```text
//! Starting ─► Polling ─┬─► Rendering ───────┬─► Waiting ─► Polling ─► …
//!                      ├─► ErrorRecovering ─┤
//!                      └─► (empty) ─────────┘
//!                                  any wait ─► Stopped (cancelled / window closed)
//! ```
//!
//! Starting is [`PollConfig::new`] plus target resolution, both done by the
//! caller before a [`PollLoop`] exists. Everything after that is recoverable
//! in continuous mode: fetch and render failures are reported through
//! [`Renderer::report`] and the loop keeps its schedule. In one-shot mode the
//! loop fetches and renders exactly once and returns any failure.
//!
//! Cancellation is checked before each fetch and during the wait between
//! ticks. A fetch already in flight completes, and its batch is rendered
//! before the loop stops.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RenderError, Result, WatchError};
use crate::fetcher::{DEFAULT_FETCH_TIMEOUT, PollResult, SnapshotFetcher};
use crate::interactive::Mode;
use crate::provider::StatusProvider;
use crate::selector::TargetSelector;
use crate::types::{CheckOutcome, Event, ItemStatus, StableId};
use crate::watermark::Watermark;
use crate::window::TimeWindow;

/// Smallest accepted poll interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of events requested per poll.
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

/// Immutable settings for one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    selector: TargetSelector,
    window: TimeWindow,
    fetch_timeout: Duration,
    event_limit: u32,
}

impl PollConfig {
    /// Validates and builds a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::IntervalTooShort`] for intervals under one
    /// second. Short intervals are rejected, never clamped.
    pub fn new(interval: Duration, selector: TargetSelector, window: TimeWindow) -> Result<Self> {
        if interval < MIN_INTERVAL {
            return Err(WatchError::IntervalTooShort {
                requested: interval,
                minimum: MIN_INTERVAL,
            });
        }
        Ok(Self {
            interval,
            selector,
            window,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            event_limit: DEFAULT_EVENT_LIMIT,
        })
    }

    /// Sets the per-call fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] for a zero timeout.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Result<Self> {
        if fetch_timeout.is_zero() {
            return Err(WatchError::Config("fetch timeout must be greater than zero".into()));
        }
        self.fetch_timeout = fetch_timeout;
        Ok(self)
    }

    /// Sets how many events one poll may return.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] for a zero limit.
    pub fn with_event_limit(mut self, event_limit: u32) -> Result<Self> {
        if event_limit == 0 {
            return Err(WatchError::Config("event limit must be greater than zero".into()));
        }
        self.event_limit = event_limit;
        Ok(self)
    }

    /// Replaces the selector, typically once the target has been resolved.
    #[must_use]
    pub const fn with_selector(mut self, selector: TargetSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Time between polls.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// What is being watched.
    #[must_use]
    pub const fn selector(&self) -> &TargetSelector {
        &self.selector
    }

    /// Requested time range.
    #[must_use]
    pub const fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Per-call fetch timeout.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Events requested per poll.
    #[must_use]
    pub const fn event_limit(&self) -> u32 {
        self.event_limit
    }
}

/// How a batch should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Full state, redrawn every tick.
    Dashboard,
    /// New events, appended.
    Tail,
}

/// Records in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    /// Probe statuses for the dashboard.
    Statuses(Vec<ItemStatus>),
    /// Check events for the tail.
    Events(Vec<Event>),
}

impl Records {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Statuses(items) => items.len(),
            Self::Events(events) => events.len(),
        }
    }

    /// True if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the renderer gets for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Dashboard or tail.
    pub mode: DisplayMode,
    /// Configured poll interval, for headers.
    pub interval: Duration,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// The records.
    pub records: Records,
}

/// Turns batches into output.
///
/// Rendering is a side effect the loop treats as opaque. Screen clearing and
/// similar terminal handling belongs to implementations.
pub trait Renderer {
    /// Draws one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn render(&mut self, batch: &Batch) -> std::result::Result<(), RenderError>;

    /// Reports a recoverable error on a channel separate from the data.
    fn report(&mut self, error: &WatchError);
}

/// Why a loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// One-shot pass finished.
    Completed,
    /// The cancellation token fired.
    Cancelled,
    /// The wall clock passed the window's upper bound.
    WindowClosed,
}

/// Data source for the current command plus its streaming position.
#[derive(Debug, Clone, Copy)]
enum Feed {
    Dashboard,
    Tail { item: StableId, watermark: Watermark },
}

impl Feed {
    const fn display_mode(&self) -> DisplayMode {
        match self {
            Self::Dashboard => DisplayMode::Dashboard,
            Self::Tail { .. } => DisplayMode::Tail,
        }
    }
}

/// Result of one poll as seen by the state machine.
enum Tick {
    Batch(Records),
    Quiet,
    Failed(WatchError),
}

enum Phase {
    Polling,
    Rendering(Records),
    ErrorRecovering(WatchError),
    Waiting,
    Stopped(StopReason),
}

/// Cooperative poll loop for one command invocation.
pub struct PollLoop<P, R> {
    fetcher: SnapshotFetcher<P>,
    renderer: R,
    config: PollConfig,
    cancel: CancellationToken,
    outcome_filter: Option<CheckOutcome>,
}

impl<P: StatusProvider, R: Renderer> PollLoop<P, R> {
    /// Builds a loop. The fetch timeout comes from `config`.
    #[must_use]
    pub fn new(provider: P, renderer: R, config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            fetcher: SnapshotFetcher::new(provider, config.fetch_timeout),
            renderer,
            config,
            cancel,
            outcome_filter: None,
        }
    }

    /// Only render events with this outcome. The watermark still moves over
    /// every fetched event.
    #[must_use]
    pub const fn with_outcome_filter(mut self, outcome: Option<CheckOutcome>) -> Self {
        self.outcome_filter = outcome;
        self
    }

    #[cfg(test)]
    const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Runs the status dashboard.
    ///
    /// # Errors
    ///
    /// In one-shot mode, returns the fetch or render error. In continuous
    /// mode this only returns `Ok`.
    pub async fn watch(&mut self, mode: Mode) -> Result<StopReason> {
        info!(interval = ?self.config.interval, selector = ?self.config.selector, ?mode, "starting watch");
        self.run(Feed::Dashboard, mode).await
    }

    /// Tails check events for the selected probe.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] if the selector does not name a single
    /// probe. Otherwise as for [`PollLoop::watch`].
    pub async fn follow(&mut self, mode: Mode) -> Result<StopReason> {
        let item = self.config.selector.item().ok_or_else(|| {
            WatchError::Config("follow needs a single probe, not a selection".into())
        })?;
        let watermark = Watermark::initial(self.config.window.from, Utc::now());
        info!(%item, start = %watermark.instant(), interval = ?self.config.interval, ?mode, "starting follow");
        self.run(Feed::Tail { item, watermark }, mode).await
    }

    async fn run(&mut self, feed: Feed, mode: Mode) -> Result<StopReason> {
        if self.cancel.is_cancelled() {
            info!("cancelled before first poll");
            return Ok(StopReason::Cancelled);
        }
        let reason = match mode {
            Mode::OneShot => self.run_once(feed).await?,
            Mode::Continuous => self.run_continuous(feed).await,
        };
        info!(?reason, "poll loop stopped");
        Ok(reason)
    }

    async fn run_once(&mut self, feed: Feed) -> Result<StopReason> {
        let records = match feed {
            Feed::Dashboard => match self.fetcher.fetch_snapshot(&self.config.selector).await {
                PollResult::Snapshot(items) => Records::Statuses(items),
                PollResult::Empty => Records::Statuses(Vec::new()),
                PollResult::Error(err) => return Err(err.into()),
            },
            Feed::Tail { item, .. } => {
                let since = self.config.window.from.unwrap_or(DateTime::UNIX_EPOCH);
                match self
                    .fetcher
                    .fetch_events(item, since, self.config.event_limit)
                    .await
                {
                    PollResult::Snapshot(events) => {
                        self.warn_if_truncated(events.len());
                        Records::Events(self.visible(events))
                    }
                    PollResult::Empty => Records::Events(Vec::new()),
                    PollResult::Error(err) => return Err(err.into()),
                }
            }
        };

        self.render(feed.display_mode(), records)?;
        Ok(StopReason::Completed)
    }

    async fn run_continuous(&mut self, mut feed: Feed) -> StopReason {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut phase = Phase::Polling;
        loop {
            phase = match phase {
                Phase::Polling => {
                    if self.cancel.is_cancelled() {
                        Phase::Stopped(StopReason::Cancelled)
                    } else {
                        let (next, tick) = self.poll(feed).await;
                        feed = next;
                        match tick {
                            Tick::Batch(records) => Phase::Rendering(records),
                            Tick::Quiet => Phase::Waiting,
                            Tick::Failed(err) => Phase::ErrorRecovering(err),
                        }
                    }
                }
                Phase::Rendering(records) => match self.render(feed.display_mode(), records) {
                    Ok(()) => Phase::Waiting,
                    Err(err) => Phase::ErrorRecovering(err.into()),
                },
                Phase::ErrorRecovering(err) => {
                    warn!(error = %err, "poll failed, retrying on next tick");
                    self.renderer.report(&err);
                    Phase::Waiting
                }
                Phase::Waiting => {
                    if matches!(feed, Feed::Tail { .. }) && self.config.window.is_after_end(Utc::now()) {
                        Phase::Stopped(StopReason::WindowClosed)
                    } else {
                        tokio::select! {
                            biased;
                            () = self.cancel.cancelled() => Phase::Stopped(StopReason::Cancelled),
                            _ = ticker.tick() => Phase::Polling,
                        }
                    }
                }
                Phase::Stopped(reason) => return reason,
            };
        }
    }

    /// One fetch. The watermark goes in with `feed` and comes back advanced
    /// only if the fetch succeeded.
    async fn poll(&self, feed: Feed) -> (Feed, Tick) {
        match feed {
            Feed::Dashboard => {
                let tick = match self.fetcher.fetch_snapshot(&self.config.selector).await {
                    PollResult::Snapshot(items) => Tick::Batch(Records::Statuses(items)),
                    PollResult::Empty => Tick::Quiet,
                    PollResult::Error(err) => Tick::Failed(err.into()),
                };
                (feed, tick)
            }
            Feed::Tail { item, watermark } => {
                let since = watermark.next_since();
                match self
                    .fetcher
                    .fetch_events(item, since, self.config.event_limit)
                    .await
                {
                    PollResult::Snapshot(events) => {
                        self.warn_if_truncated(events.len());
                        let watermark = watermark.advance(&events);
                        debug!(fetched = events.len(), watermark = %watermark.instant(), "events fetched");
                        let visible = self.visible(events);
                        let tick = if visible.is_empty() {
                            Tick::Quiet
                        } else {
                            Tick::Batch(Records::Events(visible))
                        };
                        (Feed::Tail { item, watermark }, tick)
                    }
                    PollResult::Empty => (feed, Tick::Quiet),
                    PollResult::Error(err) => (feed, Tick::Failed(err.into())),
                }
            }
        }
    }

    /// Drops events past the window end or outside the outcome filter, and
    /// orders the rest oldest first.
    fn visible(&self, mut events: Vec<Event>) -> Vec<Event> {
        events.retain(|e| {
            !self.config.window.is_after_end(e.timestamp)
                && self.outcome_filter.is_none_or(|o| e.outcome == o)
        });
        events.sort_by_key(|e| e.timestamp);
        events
    }

    fn warn_if_truncated(&self, fetched: usize) {
        if fetched >= self.config.event_limit as usize {
            warn!(
                limit = self.config.event_limit,
                "event batch hit the limit, older events in this interval may be missing"
            );
        }
    }

    fn render(&mut self, mode: DisplayMode, records: Records) -> std::result::Result<(), RenderError> {
        debug!(?mode, records = records.len(), "rendering batch");
        let batch = Batch {
            mode,
            interval: self.config.interval,
            fetched_at: Utc::now(),
            records,
        };
        self.renderer.render(&batch)
    }
}
