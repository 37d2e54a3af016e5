//! Backend operations consumed by the engine.
//!
//! The engine never talks HTTP directly. It is generic over these traits so
//! the CLI can plug in its REST client and tests can plug in scripted fakes.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::selector::TargetSelector;
use crate::types::{Event, ItemStatus, ItemSummary, StableId};

/// Source of probe status snapshots and check events.
pub trait StatusProvider: Send + Sync {
    /// Current status of the selected probes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_snapshot(
        &self,
        selector: &TargetSelector,
    ) -> impl Future<Output = Result<Vec<ItemStatus>, FetchError>> + Send;

    /// Check events for `item` strictly after `since`, at most `limit`.
    ///
    /// No ordering is guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_events_since(
        &self,
        item: StableId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Event>, FetchError>> + Send;
}

/// Name lookup used once per command to resolve a target.
pub trait ItemDirectory: Send + Sync {
    /// Probes whose name contains `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn search_items(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ItemSummary>, FetchError>> + Send;
}

impl<T: StatusProvider + ?Sized> StatusProvider for &T {
    fn get_snapshot(
        &self,
        selector: &TargetSelector,
    ) -> impl Future<Output = Result<Vec<ItemStatus>, FetchError>> + Send {
        (**self).get_snapshot(selector)
    }

    fn get_events_since(
        &self,
        item: StableId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Event>, FetchError>> + Send {
        (**self).get_events_since(item, since, limit)
    }
}

impl<T: ItemDirectory + ?Sized> ItemDirectory for &T {
    fn search_items(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ItemSummary>, FetchError>> + Send {
        (**self).search_items(query)
    }
}
