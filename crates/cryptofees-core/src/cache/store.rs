use std::collections::BTreeMap;

use tracing::debug;

use crate::query_service::BatchResponse;
use crate::{DateKey, FeeRecord, ProtocolId, Window};

/// Raw per-day fees keyed by protocol, then day.
///
/// Values are never smoothed, so one store serves every smoothing factor.
/// `version` increases on every merge that wrote at least one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeStore {
    cells: BTreeMap<ProtocolId, BTreeMap<DateKey, f64>>,
    version: u64,
}

impl FeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ProtocolId, date: DateKey) -> Option<f64> {
        self.cells.get(id).and_then(|days| days.get(&date)).copied()
    }

    pub fn contains(&self, id: &ProtocolId, date: DateKey) -> bool {
        self.get(id, date).is_some()
    }

    /// Write `records` under `id`, replacing existing cells. Returns the number written.
    pub fn merge<I>(&mut self, id: &ProtocolId, records: I) -> usize
    where
        I: IntoIterator<Item = FeeRecord>,
    {
        let days = self.cells.entry(id.clone()).or_default();
        let mut written = 0;
        for record in records {
            days.insert(record.date, record.fee);
            written += 1;
        }

        if written > 0 {
            self.version += 1;
            debug!(protocol = %id, written, version = self.version, "fee store merge");
        }
        written
    }

    /// Merge every protocol section of a batch response.
    pub fn merge_response(&mut self, response: &BatchResponse) -> usize {
        response
            .data
            .iter()
            .map(|section| self.merge(&section.id, section.data.iter().copied()))
            .sum()
    }

    /// Days of `window` with no cell for `id`, ascending.
    pub fn missing_dates(&self, id: &ProtocolId, window: Window) -> Vec<DateKey> {
        match self.cells.get(id) {
            Some(days) => window.days().filter(|day| !days.contains_key(day)).collect(),
            None => window.days().collect(),
        }
    }

    /// Stored records for `id`, ascending by day.
    pub fn records<'a>(&'a self, id: &ProtocolId) -> impl Iterator<Item = FeeRecord> + 'a {
        self.cells
            .get(id)
            .into_iter()
            .flat_map(|days| days.iter().map(|(date, fee)| FeeRecord { date: *date, fee: *fee }))
    }

    pub fn protocols(&self) -> impl Iterator<Item = &ProtocolId> {
        self.cells.keys()
    }

    /// Total cells across all protocols.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
