//! Output formatting utilities for the CLI
//!
//! Tables for the static item and location lists, the save summary and
//! colored status messages.

use tabled::{settings::Style, Table, Tabled};

use c64ap_core::tables::{ItemEffect, ItemEntry, LocationEntry};
use c64ap_core::LocationCategory;

/// Format location entries as an ASCII table
pub fn format_locations(locations: &[&LocationEntry]) -> String {
    if locations.is_empty() {
        return "No locations".to_string();
    }

    #[derive(Tabled)]
    struct LocationRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "CATEGORY")]
        category: String,
        #[tabled(rename = "FLAG")]
        flag: String,
    }

    let rows: Vec<LocationRow> = locations
        .iter()
        .map(|l| LocationRow {
            id: format!("{:#x}", l.id.as_i64()),
            name: l.name.clone(),
            category: category_name(l.category).to_string(),
            flag: l.flag.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format item entries as an ASCII table
///
/// With `have`, a column shows whether the save holds each item.
pub fn format_items(items: &[&ItemEntry], have: Option<&dyn Fn(&ItemEntry) -> i32>) -> String {
    if items.is_empty() {
        return "No items".to_string();
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "EFFECT")]
        effect: String,
    }

    #[derive(Tabled)]
    struct ItemRowWithCount {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "EFFECT")]
        effect: String,
        #[tabled(rename = "HAVE")]
        have: i32,
    }

    match have {
        Some(have) => {
            let rows: Vec<ItemRowWithCount> = items
                .iter()
                .map(|i| ItemRowWithCount {
                    name: i.name.clone(),
                    effect: effect_text(&i.effect),
                    have: have(i),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        None => {
            let rows: Vec<ItemRow> = items
                .iter()
                .map(|i| ItemRow {
                    id: format!("{:#x}", i.id.as_i64()),
                    name: i.name.clone(),
                    effect: effect_text(&i.effect),
                })
                .collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
    }
}

fn effect_text(effect: &ItemEffect) -> String {
    match effect {
        ItemEffect::Increment(flag) => format!("{} +1", flag),
        ItemEffect::Set(flag) => format!("{} = 1", flag),
    }
}

pub fn category_name(category: LocationCategory) -> &'static str {
    match category {
        LocationCategory::Strawberry => "strawberry",
        LocationCategory::Friend => "friend",
        LocationCategory::Sign => "sign",
        LocationCategory::Car => "car",
        LocationCategory::Checkpoint => "checkpoint",
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Goes to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use c64ap_core::tables;

    #[test]
    fn test_location_table_has_names() {
        let entries: Vec<_> = tables::locations().iter().take(2).collect();
        let table = format_locations(&entries);
        assert!(table.contains("0xca0000"));
        assert!(table.contains("strawberry"));

        let first = table.find("1/0").unwrap();
        let second = table.find("1/1").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_item_table_with_counts() {
        let entries: Vec<_> = tables::items().iter().collect();
        let have = |item: &ItemEntry| i32::from(item.name == "Spring");
        let table = format_items(&entries, Some(&have));
        assert!(table.contains("HAVE"));
        assert!(table.contains("Spring = 1"));
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(format_locations(&[]), "No locations");
        assert_eq!(format_items(&[], None), "No items");
    }
}
