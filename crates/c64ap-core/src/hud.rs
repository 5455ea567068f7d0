//! HUD labels and item-grid layout

use crate::save::SaveRecord;
use crate::types::Vec2;

/// Gap between item icons
const ICON_SPACING: f32 = 8.0;

pub fn strawberries_label(count: u32, required: u32) -> String {
    format!("x{:02}/{:02}  ", count, required)
}

pub fn deaths_label(count: u32) -> String {
    format!("x{:03}", count)
}

/// Deaths absorbed toward the next broadcast, out of the amnesty
pub fn death_links_label(count: u32, amnesty: u32) -> String {
    format!("x{:02}/{:02}", count, amnesty)
}

/// One icon to draw
#[derive(Debug, Clone, PartialEq)]
pub struct HudIcon {
    pub sprite: &'static str,
    pub at: Vec2,
}

// (flag, filled sprite, grey sprite), two per row
const ITEM_ROWS: [[(&str, &str, &str); 2]; 4] = [
    [
        ("Breakables", "Breakables_Filled", "Breakables_Grey"),
        ("Cassette", "Cassettes_Filled", "Cassettes_Grey"),
    ],
    [
        ("Coin", "Coins_Filled", "Coins_Grey"),
        ("DashRefill", "Dash_Filled", "Dash_Grey"),
    ],
    [
        ("DoubleDashRefill", "DoubleDash_Filled", "DoubleDash_Grey"),
        ("Feather", "Feather_Filled", "Feather_Grey"),
    ],
    [
        ("Spring", "Springs_Filled", "Springs_Grey"),
        ("TrafficBlock", "Traffic_Filled", "Traffic_Grey"),
    ],
];

const MOVE_ROWS: [[(&str, &str, &str); 2]; 2] = [
    [
        ("Grounded Dash", "GroundDash", "GroundDashGrey"),
        ("Air Dash", "AirDash", "AirDashGrey"),
    ],
    [
        ("Skid Jump", "SkidJump", "SkidJumpGrey"),
        ("Climb", "Climb", "ClimbGrey"),
    ],
];

/// Lay out the received-item grid
///
/// Each icon is filled when its flag is set and grey otherwise. Move rows
/// only appear with move shuffle on; the Badeline badge sits at a fixed
/// screen position.
pub fn item_grid(
    save: &dyn SaveRecord,
    origin: Vec2,
    icon_size: f32,
    move_shuffle: bool,
    badelines_disabled: bool,
) -> Vec<HudIcon> {
    let step = icon_size + ICON_SPACING;
    let move_rows: &[[(&str, &str, &str); 2]] = if move_shuffle { &MOVE_ROWS } else { &[] };

    let mut icons = Vec::new();
    for (row, cells) in ITEM_ROWS.iter().chain(move_rows).enumerate() {
        for (col, (flag, filled, grey)) in cells.iter().enumerate() {
            icons.push(HudIcon {
                sprite: if save.get_flag(flag) == 0 { *grey } else { *filled },
                at: Vec2::new(origin.x + col as f32 * step, origin.y + row as f32 * step),
            });
        }
    }

    if badelines_disabled {
        icons.push(HudIcon {
            sprite: "BadelineDisabled",
            at: Vec2::new(100.0, 10.0),
        });
    }

    icons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::SaveFile;

    #[test]
    fn test_labels() {
        assert_eq!(strawberries_label(3, 20), "x03/20  ");
        assert_eq!(deaths_label(7), "x007");
        assert_eq!(death_links_label(1, 10), "x01/10");
    }

    #[test]
    fn test_grid_without_moves() {
        let mut save = SaveFile::new();
        save.enable_flag("Cassette");

        let icons = item_grid(&save, Vec2::new(10.0, 20.0), 30.0, false, false);
        assert_eq!(icons.len(), 8);
        assert_eq!(icons[0].sprite, "Breakables_Grey");
        assert_eq!(icons[1].sprite, "Cassettes_Filled");
        assert_eq!(icons[1].at, Vec2::new(48.0, 20.0));
        assert_eq!(icons[2].at, Vec2::new(10.0, 58.0));
    }

    #[test]
    fn test_grid_with_moves_and_badge() {
        let mut save = SaveFile::new();
        save.enable_flag("Climb");

        let icons = item_grid(&save, Vec2::default(), 30.0, true, true);
        assert_eq!(icons.len(), 13);
        assert_eq!(icons[11].sprite, "Climb");
        assert_eq!(icons[12].sprite, "BadelineDisabled");
        assert_eq!(icons[12].at, Vec2::new(100.0, 10.0));
    }
}
