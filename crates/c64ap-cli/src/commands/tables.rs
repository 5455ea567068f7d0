//! Static table dumps

use anyhow::Result;

use crate::output::{category_name, format_items, format_locations};
use c64ap_core::tables;

/// Print the location table, optionally only one category
pub fn locations_command(category: Option<&str>) -> Result<()> {
    let entries: Vec<_> = tables::locations()
        .iter()
        .filter(|entry| category.map_or(true, |c| category_name(entry.category).eq_ignore_ascii_case(c)))
        .collect();

    if entries.is_empty() {
        if let Some(category) = category {
            anyhow::bail!(
                "Unknown category: {} (expected strawberry, friend, sign, car or checkpoint)",
                category
            );
        }
    }

    println!("{}", format_locations(&entries));
    Ok(())
}

/// Print the item table in id order
pub fn items_command() -> Result<()> {
    let entries: Vec<_> = tables::items().iter().collect();

    println!("{}", format_items(&entries, None));
    Ok(())
}
