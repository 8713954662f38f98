//! Correlation reduction summary

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::report::display::print_indented;
use crate::utils::print_step_header;

/// Outcome of a correlation preview or an applied reduction
#[derive(Debug, Default)]
pub struct ReductionSummary {
    pub initial_columns: usize,
    pub dropped: Vec<String>,
    /// Correlated groups; the first member of each was kept
    pub groups: Vec<Vec<String>>,
    /// Identifier of the stored reduced dataset, if it was written back
    pub new_id: Option<String>,
}

impl ReductionSummary {
    pub fn new(initial_columns: usize) -> Self {
        Self {
            initial_columns,
            ..Default::default()
        }
    }

    pub fn record_drops(&mut self, columns: Vec<String>) {
        self.dropped = columns;
    }

    pub fn set_groups(&mut self, groups: Vec<Vec<String>>) {
        self.groups = groups;
    }

    pub fn set_new_id(&mut self, id: impl Into<String>) {
        self.new_id = Some(id.into());
    }

    pub fn remaining_columns(&self) -> usize {
        self.initial_columns.saturating_sub(self.dropped.len())
    }

    /// Share of columns removed, in percent
    pub fn removed_pct(&self) -> f64 {
        if self.initial_columns == 0 {
            return 0.0;
        }
        self.dropped.len() as f64 / self.initial_columns as f64 * 100.0
    }

    pub fn render_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Columns").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);

        let dropped_color = if self.dropped.is_empty() {
            Color::Green
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("Before"),
            Cell::new(self.initial_columns).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new("Correlated, removed"),
            Cell::new(self.dropped.len())
                .fg(dropped_color)
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new("After"),
            Cell::new(self.remaining_columns())
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new("Removed share"),
            Cell::new(format!("{:.1}%", self.removed_pct())).set_alignment(CellAlignment::Right),
        ]);

        if let Some(id) = &self.new_id {
            table.add_row(vec![Cell::new("Stored as"), Cell::new(id).fg(Color::Yellow)]);
        }

        table
    }

    pub fn display(&self) {
        print_step_header("CORRELATION REDUCTION");
        print_indented(&self.render_table());

        for (i, group) in self.groups.iter().enumerate() {
            let Some((kept, rest)) = group.split_first() else {
                continue;
            };
            println!();
            println!(
                "    {} {} {}",
                style(format!("Group {}", i + 1)).yellow(),
                style("keeps").dim(),
                style(kept).green().bold()
            );
            for column in rest {
                println!("      {} {}", style("-").red(), column);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_and_share() {
        let mut summary = ReductionSummary::new(4);
        summary.record_drops(vec!["b".to_string()]);
        assert_eq!(summary.remaining_columns(), 3);
        assert!((summary.removed_pct() - 25.0).abs() < 1e-12);
        assert_eq!(ReductionSummary::new(0).removed_pct(), 0.0);
    }

    #[test]
    fn test_table_lists_new_id() {
        let mut summary = ReductionSummary::new(2);
        summary.set_new_id("abc");
        assert!(summary.render_table().to_string().contains("abc"));
    }
}
