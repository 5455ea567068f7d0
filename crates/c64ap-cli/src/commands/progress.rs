//! Save summary

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::{category_name, format_items, print_info};
use c64ap_client::Reconciler;
use c64ap_core::hud::strawberries_label;
use c64ap_core::tables::{self, ItemEntry, ITEM_RECEIVED_FLAG, STRAWBERRIES_FLAG};
use c64ap_core::{LocationCategory, SaveFile, SaveRecord, SlotSettings};

/// Print what a save holds: strawberries, items and completed objectives
pub fn progress_command(save_path: &Path, required: u32) -> Result<()> {
    let save = SaveFile::load_or_default(save_path)
        .with_context(|| format!("Failed to load save from {:?}", save_path))?;

    print_info(&format!("Save file: {:?}", save_path));
    println!();

    let strawberries = u32::try_from(save.get_flag(STRAWBERRIES_FLAG)).unwrap_or(0);
    println!("Strawberries:   {}", strawberries_label(strawberries, required).trim_end());
    println!("Items received: {}", save.get_flag(ITEM_RECEIVED_FLAG));
    println!();

    let items: Vec<_> = tables::items().iter().collect();
    let have = |item: &ItemEntry| save.get_flag(item.effect.flag());
    println!("{}", format_items(&items, Some(&have)));
    println!();

    // Count every category, whatever the seed enabled
    let settings = SlotSettings {
        friendsanity: true,
        signsanity: true,
        carsanity: true,
        checkpointsanity: true,
        ..SlotSettings::default()
    };
    let completed = Reconciler::completed_locations(&save, &settings);

    println!("Completed objectives:");
    for category in [
        LocationCategory::Strawberry,
        LocationCategory::Friend,
        LocationCategory::Sign,
        LocationCategory::Car,
        LocationCategory::Checkpoint,
    ] {
        let total = tables::locations()
            .iter()
            .filter(|entry| entry.category == category)
            .count();
        let done = completed
            .iter()
            .filter(|id| LocationCategory::of(**id) == Some(category))
            .count();
        println!("  {:<11} {:>3}/{}", category_name(category), done, total);
    }

    Ok(())
}
