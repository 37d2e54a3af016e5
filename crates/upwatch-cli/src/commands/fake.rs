//! In-memory API used by command tests.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use upwatch_core::{
    CheckOutcome, Event, FetchError, ItemDirectory, ItemStatus, ItemSummary, ProbeStatus,
    StableId, StatusProvider, TargetSelector,
};
use uuid::Uuid;

#[derive(Default)]
pub struct FakeApi {
    pub probes: Vec<ItemStatus>,
    pub events: Vec<Event>,
    pub searches: Mutex<Vec<String>>,
    pub snapshots: Mutex<Vec<TargetSelector>>,
    pub event_calls: Mutex<Vec<(StableId, DateTime<Utc>, u32)>>,
}

impl FakeApi {
    pub fn with_probes(names: &[&str]) -> Self {
        let probes = names
            .iter()
            .enumerate()
            .map(|(i, name)| probe(i as u128 + 1, name, ProbeStatus::Up))
            .collect();
        Self {
            probes,
            ..Self::default()
        }
    }
}

pub fn id(n: u128) -> StableId {
    StableId::new(Uuid::from_u128(n))
}

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, h, m, s)
        .single()
        .expect("valid instant")
}

pub fn probe(n: u128, name: &str, status: ProbeStatus) -> ItemStatus {
    ItemStatus {
        id: id(n),
        name: name.into(),
        url: None,
        status,
        last_checked_at: None,
        response_time_ms: None,
        uptime_percent: None,
    }
}

pub fn event(probe: u128, timestamp: DateTime<Utc>, outcome: CheckOutcome) -> Event {
    Event {
        probe_id: id(probe),
        timestamp,
        outcome,
        region: None,
        response_time_ms: None,
        status_code: None,
        message: None,
        metadata: BTreeMap::new(),
    }
}

impl StatusProvider for FakeApi {
    async fn get_snapshot(&self, selector: &TargetSelector) -> Result<Vec<ItemStatus>, FetchError> {
        self.snapshots.lock().push(*selector);
        let items = match *selector {
            TargetSelector::All { status } => self
                .probes
                .iter()
                .filter(|p| status.is_none_or(|s| p.status == s))
                .cloned()
                .collect(),
            TargetSelector::Item(wanted) => {
                let found: Vec<ItemStatus> =
                    self.probes.iter().filter(|p| p.id == wanted).cloned().collect();
                if found.is_empty() {
                    return Err(FetchError::NotFound(wanted.to_string()));
                }
                found
            }
        };
        Ok(items)
    }

    async fn get_events_since(
        &self,
        item: StableId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Event>, FetchError> {
        self.event_calls.lock().push((item, since, limit));
        Ok(self
            .events
            .iter()
            .filter(|e| e.probe_id == item && e.timestamp > since)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

impl ItemDirectory for FakeApi {
    async fn search_items(&self, query: &str) -> Result<Vec<ItemSummary>, FetchError> {
        self.searches.lock().push(query.to_string());
        Ok(self
            .probes
            .iter()
            .filter(|p| p.name.contains(query))
            .map(|p| ItemSummary {
                id: p.id,
                name: p.name.clone(),
            })
            .collect())
    }
}
