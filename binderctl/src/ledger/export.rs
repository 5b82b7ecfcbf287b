//! Plain-text deck list rendering.
//!
//! ```text
//! 4 Lightning Bolt
//! 20 Mountain
//!
//! Sideboard
//! 2 Pyroblast
//! ```
//!
//! Lines within a section are ordered by card name. The sideboard section is omitted when it is
//! empty.

use crate::types::Zone;

/// One exported entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLine {
    pub zone: Zone,
    pub quantity: i32,
    pub name: String,
}

pub const SIDEBOARD_HEADER: &str = "Sideboard";

pub fn render_deck_list(mut lines: Vec<ExportLine>) -> String {
    lines.sort_by(|a, b| a.name.cmp(&b.name));

    let section = |zone: Zone| -> Vec<String> {
        lines
            .iter()
            .filter(|l| l.zone == zone)
            .map(|l| format!("{} {}", l.quantity, l.name))
            .collect()
    };

    let main = section(Zone::Main);
    let sideboard = section(Zone::Sideboard);

    let mut out = main.join("\n");
    if !sideboard.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(SIDEBOARD_HEADER);
        out.push('\n');
        out.push_str(&sideboard.join("\n"));
    }
    out
}
