//! Local state reconciler
//!
//! Runs on the simulation thread. Applies received items to the save,
//! works out which completed objectives still need reporting, and folds
//! locations checked elsewhere back into the save.

use c64ap_core::tables::{self, ItemEffect, LocationCategory, ITEM_RECEIVED_FLAG};
use c64ap_core::{ItemEvent, SaveRecord, SlotSettings};
use c64ap_protocol::LocationId;
use std::collections::HashSet;

use crate::ingest::{CollectedLocations, ItemQueue};

/// Locations already reported this session
///
/// Append-only: nothing is ever removed.
#[derive(Debug, Default)]
pub struct SentLocations {
    sent: HashSet<LocationId>,
}

impl SentLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the given locations, returning the ones not seen before, in order
    pub fn insert_new(&mut self, locations: impl IntoIterator<Item = LocationId>) -> Vec<LocationId> {
        locations
            .into_iter()
            .filter(|id| self.sent.insert(*id))
            .collect()
    }

    pub fn contains(&self, id: LocationId) -> bool {
        self.sent.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

/// A save change made because a location was checked elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedChange {
    pub location: LocationId,
    pub name: String,
    pub category: LocationCategory,
}

/// Server view of locations, as needed for reporting
#[derive(Debug, Clone, Copy)]
pub struct ServerLocations<'a> {
    /// Every location in our slot
    pub known: &'a HashSet<LocationId>,
    /// Locations the server already has as checked
    pub checked: &'a HashSet<LocationId>,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    sent: SentLocations,
    collected_cursor: usize,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &SentLocations {
        &self.sent
    }

    /// Apply every item event past the persisted `ItemRcv` index, in order.
    ///
    /// The index is advanced after each event's effect. If the process dies
    /// between the flag change and the save being persisted, that event is
    /// applied again on the next run.
    pub fn apply_received_items(&mut self, save: &mut dyn SaveRecord, queue: &ItemQueue) -> Vec<ItemEvent> {
        let start = u64::try_from(save.get_flag(ITEM_RECEIVED_FLAG)).unwrap_or(0);
        let events = queue.events_from(start);

        for event in &events {
            match tables::items().effect_of(event.item) {
                Some(ItemEffect::Increment(flag)) => {
                    save.inc_flag(flag);
                }
                Some(ItemEffect::Set(flag)) => save.enable_flag(flag),
                None => tracing::warn!("Received unknown {} at index {}", event.item, event.index),
            }

            let next = i32::try_from(event.index + 1).unwrap_or(i32::MAX);
            save.set_flag(ITEM_RECEIVED_FLAG, next);
            tracing::debug!(index = event.index, item = %event.item, "Applied item");
        }

        events
    }

    /// Every objective the save shows as done, in enabled categories
    pub fn completed_locations(save: &dyn SaveRecord, settings: &SlotSettings) -> Vec<LocationId> {
        let table = tables::locations();
        let mut completed = Vec::new();

        for name in save.strawberries().iter().chain(save.completed_submaps().iter()) {
            match table.id_of(name) {
                Some(id) => completed.push(id),
                None => tracing::debug!("No location named {:?}", name),
            }
        }

        let flagged = table
            .iter()
            .filter(|entry| entry.category != LocationCategory::Strawberry)
            .filter(|entry| settings.category_enabled(entry.category))
            .filter(|entry| save.get_flag(&entry.flag) >= 1)
            .map(|entry| entry.id);
        completed.extend(flagged);

        completed
    }

    /// Work out the next `LocationChecks` batch. Empty when nothing is new.
    pub fn report_completed(
        &mut self,
        save: &dyn SaveRecord,
        settings: &SlotSettings,
        server: ServerLocations<'_>,
    ) -> Vec<LocationId> {
        let candidates = Self::completed_locations(save, settings)
            .into_iter()
            .filter(|id| server.known.contains(id))
            .filter(|id| !server.checked.contains(id));

        let batch = self.sent.insert_new(candidates);
        if !batch.is_empty() {
            tracing::info!("Reporting {} completed location(s)", batch.len());
        }
        batch
    }

    /// Fold locations checked elsewhere into the save.
    ///
    /// Only entries past the cursor are looked at, and each mutation is
    /// skipped if the save already has it. Returns only real changes.
    pub fn fold_collected(&mut self, save: &mut dyn SaveRecord, collected: &CollectedLocations) -> Vec<CollectedChange> {
        let new = collected.since(self.collected_cursor);
        self.collected_cursor += new.len();

        let mut changes = Vec::new();
        for id in new {
            // Already on the server; never report it ourselves
            self.sent.insert_new([id]);

            let Some(entry) = tables::locations().get(id) else {
                tracing::debug!("Ignoring collected {} outside our tables", id);
                continue;
            };

            let changed = match entry.category {
                LocationCategory::Strawberry => {
                    if save.contains_strawberry(&entry.flag) {
                        false
                    } else {
                        save.add_strawberry(&entry.flag);
                        true
                    }
                }
                _ => {
                    if save.get_flag(&entry.flag) != 0 {
                        false
                    } else {
                        save.enable_flag(&entry.flag);
                        true
                    }
                }
            };

            if changed {
                tracing::info!("Collected {} from another client", entry.name);
                changes.push(CollectedChange {
                    location: id,
                    name: entry.name.clone(),
                    category: entry.category,
                });
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c64ap_core::SaveFile;
    use c64ap_protocol::{ItemId, NetworkItem, SlotId};

    fn item(id: i64) -> NetworkItem {
        NetworkItem {
            item: ItemId(id),
            location: LocationId(0),
            player: SlotId(2),
            flags: 0,
        }
    }

    fn all_known() -> HashSet<LocationId> {
        tables::locations().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_strawberry_item_increments_once() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(0xCA0000)]);

        let mut save = SaveFile::new();
        let mut reconciler = Reconciler::new();

        assert_eq!(reconciler.apply_received_items(&mut save, &queue).len(), 1);
        assert_eq!(save.get_flag("Strawberries"), 1);
        assert_eq!(save.get_flag(ITEM_RECEIVED_FLAG), 1);

        assert!(reconciler.apply_received_items(&mut save, &queue).is_empty());
        assert_eq!(save.get_flag("Strawberries"), 1);
    }

    #[test]
    fn test_spring_item_sets_flag() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(0xCA0007)]);

        let mut save = SaveFile::new();
        Reconciler::new().apply_received_items(&mut save, &queue);
        assert_eq!(save.get_flag("Spring"), 1);
    }

    #[test]
    fn test_out_of_order_arrival_applies_in_index_order() {
        let queue = ItemQueue::new();
        let mut save = SaveFile::new();
        let mut reconciler = Reconciler::new();

        queue.push_batch(1, &[item(0xCA0003)]);
        assert!(reconciler.apply_received_items(&mut save, &queue).is_empty());

        queue.push_batch(0, &[item(0xCA0000)]);
        let applied: Vec<u64> = reconciler
            .apply_received_items(&mut save, &queue)
            .iter()
            .map(|e| e.index)
            .collect();

        assert_eq!(applied, vec![0, 1]);
        assert_eq!(save.get_flag("Feather"), 1);
        assert_eq!(save.get_flag(ITEM_RECEIVED_FLAG), 2);
    }

    #[test]
    fn test_unknown_item_still_advances_index() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(42), item(0xCA0004)]);

        let mut save = SaveFile::new();
        Reconciler::new().apply_received_items(&mut save, &queue);
        assert_eq!(save.get_flag(ITEM_RECEIVED_FLAG), 2);
        assert_eq!(save.get_flag("Coin"), 1);
    }

    #[test]
    fn test_resume_from_persisted_index() {
        let queue = ItemQueue::new();
        queue.push_batch(0, &[item(0xCA0000), item(0xCA0000), item(0xCA0000)]);

        let mut save = SaveFile::new();
        save.set_flag(ITEM_RECEIVED_FLAG, 2);
        save.set_flag("Strawberries", 2);

        Reconciler::new().apply_received_items(&mut save, &queue);
        assert_eq!(save.get_flag("Strawberries"), 3);
    }

    #[test]
    fn test_report_twice_second_batch_empty() {
        let mut save = SaveFile::new();
        save.add_strawberry("1/0");
        save.add_strawberry("1/12");

        let known = all_known();
        let checked = HashSet::new();
        let server = ServerLocations { known: &known, checked: &checked };
        let settings = SlotSettings::default();
        let mut reconciler = Reconciler::new();

        let first = reconciler.report_completed(&save, &settings, server);
        assert_eq!(first, vec![LocationId(0xCA0000), LocationId(0xCA0012)]);
        assert!(reconciler.report_completed(&save, &settings, server).is_empty());
    }

    #[test]
    fn test_no_location_reported_twice_across_batches() {
        let mut save = SaveFile::new();
        let known = all_known();
        let checked = HashSet::new();
        let server = ServerLocations { known: &known, checked: &checked };
        let settings = SlotSettings {
            checkpointsanity: true,
            ..Default::default()
        };
        let mut reconciler = Reconciler::new();
        let mut seen = HashSet::new();

        for name in ["1/1", "1/2", "1/3"] {
            save.add_strawberry(name);
            save.enable_flag("Granny");
            for id in reconciler.report_completed(&save, &settings, server) {
                assert!(seen.insert(id), "{} reported twice", id);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_report_respects_categories_and_server_state() {
        let mut save = SaveFile::new();
        save.enable_flag("Sign_1");
        save.enable_flag("Friend_Theo");
        save.add_strawberry("1/5");

        let known = all_known();
        let checked: HashSet<_> = [LocationId(0xCA0005)].into_iter().collect();
        let server = ServerLocations { known: &known, checked: &checked };
        let settings = SlotSettings {
            friendsanity: true,
            ..Default::default()
        };

        let batch = Reconciler::new().report_completed(&save, &settings, server);
        assert_eq!(batch, vec![LocationId(0xCA0101)]);
    }

    #[test]
    fn test_report_skips_locations_outside_slot() {
        let mut save = SaveFile::new();
        save.add_strawberry("1/7");

        let known = HashSet::new();
        let checked = HashSet::new();
        let server = ServerLocations { known: &known, checked: &checked };
        let batch = Reconciler::new().report_completed(&save, &SlotSettings::default(), server);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_fold_checkpoint_only_changes_once() {
        let collected = CollectedLocations::new();
        let granny = tables::locations().id_of("Checkpoint - Granny").unwrap();
        collected.extend(&[granny]);

        let mut save = SaveFile::new();
        let mut reconciler = Reconciler::new();

        let changes = reconciler.fold_collected(&mut save, &collected);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].category, LocationCategory::Checkpoint);
        assert_eq!(save.get_flag("Granny"), 1);

        // Same location arrives again from another RoomUpdate
        collected.extend(&[granny]);
        assert!(reconciler.fold_collected(&mut save, &collected).is_empty());
        assert!(reconciler.sent().contains(granny));
    }

    #[test]
    fn test_fold_strawberry_adds_to_save() {
        let collected = CollectedLocations::new();
        collected.extend(&[LocationId(0xCA0021), LocationId(0xDEAD)]);

        let mut save = SaveFile::new();
        let changes = Reconciler::new().fold_collected(&mut save, &collected);

        assert_eq!(changes.len(), 1);
        assert!(save.contains_strawberry("1/21"));
    }

    #[test]
    fn test_folded_locations_are_not_reported() {
        let collected = CollectedLocations::new();
        collected.extend(&[LocationId(0xCA0003)]);

        let mut save = SaveFile::new();
        let mut reconciler = Reconciler::new();
        reconciler.fold_collected(&mut save, &collected);

        let known = all_known();
        let checked = HashSet::new();
        let server = ServerLocations { known: &known, checked: &checked };
        assert!(reconciler
            .report_completed(&save, &SlotSettings::default(), server)
            .is_empty());
    }
}
