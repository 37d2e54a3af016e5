//! Incremental-streaming position.
//!
//! The watermark is the newest event instant already handed to the renderer.
//! It is a plain value: the poll loop passes it into [`Watermark::advance`]
//! and keeps the returned value for the next tick.
//!
//! Known limitation: the next query asks for events from `watermark + 1ns`.
//! If the backend reports timestamps coarser than a nanosecond, two distinct
//! events sharing the same reported instant can still be collapsed.

use chrono::{DateTime, Duration, Utc};

use crate::types::Timestamped;

/// Newest instant already observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// Starts tracking at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self(start)
    }

    /// Starts at the window's lower bound, or at `now` when there is none.
    #[must_use]
    pub fn initial(from: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self(from.unwrap_or(now))
    }

    /// Current position.
    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns `max(self, newest timestamp in batch)`.
    ///
    /// Never moves backwards, whatever order the batch is in.
    #[must_use]
    pub fn advance<T: Timestamped>(self, batch: &[T]) -> Self {
        batch
            .iter()
            .map(Timestamped::timestamp)
            .max()
            .map_or(self, |newest| Self(self.0.max(newest)))
    }

    /// Lower bound for the next query: one nanosecond past the watermark, so
    /// the event sitting exactly on the watermark is not delivered again.
    #[must_use]
    pub fn next_since(&self) -> DateTime<Utc> {
        self.0
            .checked_add_signed(Duration::nanoseconds(1))
            .unwrap_or(self.0)
    }
}
