//! Event ingestion
//!
//! The network task appends here; the simulation thread reads. Both sides
//! only ever hold the lock for a copy or an append.

use c64ap_core::ItemEvent;
use c64ap_protocol::{LocationId, NetworkItem};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct QueueInner {
    events: Vec<ItemEvent>,
    /// Arrivals ahead of the next expected index
    pending: BTreeMap<u64, ItemEvent>,
}

/// Received items, ordered and gapless from index 0
#[derive(Debug, Default)]
pub struct ItemQueue {
    inner: Mutex<QueueInner>,
}

impl ItemQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `ReceivedItems` batch starting at `start`.
    ///
    /// Indices already in the queue are ignored (the server resends the full
    /// list after a reconnect or `Sync`). Indices beyond the tail wait until
    /// the gap is filled. A batch whose indices would overflow is dropped.
    /// Returns how many events became available.
    pub fn push_batch(&self, start: u64, items: &[NetworkItem]) -> usize {
        if start.checked_add(items.len() as u64).is_none() {
            tracing::warn!(
                "Dropping {} item(s) with out-of-range start index {}",
                items.len(),
                start
            );
            return 0;
        }

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.events.len();

        for (offset, item) in items.iter().enumerate() {
            let index = start + offset as u64;
            if index < inner.events.len() as u64 {
                continue;
            }
            inner
                .pending
                .entry(index)
                .or_insert_with(|| ItemEvent::from_network(index, item));
        }

        loop {
            let next = inner.events.len() as u64;
            let Some(event) = inner.pending.remove(&next) else {
                break;
            };
            inner.events.push(event);
        }

        if !inner.pending.is_empty() {
            tracing::debug!(
                "Holding {} item(s) until index {} arrives",
                inner.pending.len(),
                inner.events.len()
            );
        }

        inner.events.len() - before
    }

    /// Events from `index` onwards, in order
    pub fn events_from(&self, index: u64) -> Vec<ItemEvent> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let start = usize::try_from(index).unwrap_or(usize::MAX);
        inner.events.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Number of contiguous events received
    pub fn len(&self) -> u64 {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.events.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locations reported as checked by the server, in arrival order
///
/// Entries may repeat; readers keep their own cursor.
#[derive(Debug, Default)]
pub struct CollectedLocations {
    log: Mutex<Vec<LocationId>>,
}

impl CollectedLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, locations: &[LocationId]) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.extend_from_slice(locations);
    }

    /// Entries from `cursor` onwards
    pub fn since(&self, cursor: usize) -> Vec<LocationId> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.get(cursor..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c64ap_protocol::{ItemId, SlotId};

    fn item(id: i64) -> NetworkItem {
        NetworkItem {
            item: ItemId(id),
            location: LocationId(0),
            player: SlotId(1),
            flags: 0,
        }
    }

    #[test]
    fn test_in_order_batches() {
        let queue = ItemQueue::new();
        assert_eq!(queue.push_batch(0, &[item(1), item(2)]), 2);
        assert_eq!(queue.push_batch(2, &[item(3)]), 1);

        let indices: Vec<u64> = queue.events_from(0).iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_out_of_order_batches_wait_for_gap() {
        let queue = ItemQueue::new();
        assert_eq!(queue.push_batch(2, &[item(3), item(4)]), 0);
        assert!(queue.is_empty());

        assert_eq!(queue.push_batch(0, &[item(1), item(2)]), 4);
        let items: Vec<ItemId> = queue.events_from(0).iter().map(|e| e.item).collect();
        assert_eq!(items, vec![ItemId(1), ItemId(2), ItemId(3), ItemId(4)]);
    }

    #[test]
    fn test_resent_indices_are_ignored() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(1), item(2)]);

        // Full resync after reconnect overlaps with what we have
        assert_eq!(queue.push_batch(0, &[item(1), item(2), item(3)]), 1);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.events_from(2)[0].item, ItemId(3));
    }

    #[test]
    fn test_overflowing_start_index_is_dropped() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(1)]);

        assert_eq!(queue.push_batch(u64::MAX, &[item(2), item(3)]), 0);
        assert_eq!(queue.push_batch(1, &[item(2)]), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_events_from_past_end_is_empty() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(1)]);
        assert!(queue.events_from(5).is_empty());
    }

    #[test]
    fn test_collected_cursor() {
        let collected = CollectedLocations::new();
        collected.extend(&[LocationId(1), LocationId(2)]);
        collected.extend(&[LocationId(3)]);

        assert_eq!(collected.since(0).len(), 3);
        assert_eq!(collected.since(2), vec![LocationId(3)]);
        assert!(collected.since(3).is_empty());
    }
}
