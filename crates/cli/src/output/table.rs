//! comfy-table rendering

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

/// Table formatter
pub struct TableFormatter;

impl TableFormatter {
    /// Empty table with the CLI's styling
    pub fn styled() -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    /// Table with a header row; an empty `rows` renders the header alone
    pub fn grid(headers: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut table = Self::styled();
        table.set_header(headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
        for row in rows {
            table.add_row(row);
        }
        table.to_string()
    }

    /// Two columns, keys in bold
    pub fn key_value(items: &[(&str, String)]) -> String {
        let mut table = Self::styled();
        for (key, value) in items {
            table.add_row(vec![
                Cell::new(key).add_attribute(Attribute::Bold),
                Cell::new(value),
            ]);
        }
        table.to_string()
    }
}
