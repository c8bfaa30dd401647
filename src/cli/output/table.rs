//! Table output formatting for CLI commands
//!
//! Renders simulation results with comfy-table. Colors follow the house's
//! critical need and are disabled for `NO_COLOR` or dumb terminals.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

use crate::application::{HouseSummary, WeekSummary};
use crate::domain::models::CriticalNeed;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format the end-of-run state of every house
    pub fn format_houses(&self, houses: &[HouseSummary]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "House", "Need", "Gold", "Food", "Wood", "Soldiers", "Workers", "Completed",
            "Pending", "Active", "Idle",
        ]));

        for house in houses {
            table.add_row(vec![
                Cell::new(&house.faction).add_attribute(Attribute::Bold),
                self.need_cell(house.need),
                number(house.resources.gold),
                number(house.resources.food),
                number(house.resources.wood),
                number(house.soldiers),
                number(house.workers),
                number(house.tasks_completed),
                number(house.statistics.pending_count),
                number(house.statistics.active_count),
                number(house.statistics.idle_worker_count),
            ]);
        }

        table.to_string()
    }

    /// Format the per-week activity of every house
    pub fn format_timeline(&self, weeks: &[WeekSummary]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Week", "House", "Need", "Generated", "Bound", "Rejected", "Withdrawn", "Preempted",
            "Completed", "Relieved", "Pending", "Idle",
        ]));

        for week in weeks {
            let rejected = if self.use_colors && week.rejected > 0 {
                number(week.rejected).fg(Color::Yellow)
            } else {
                number(week.rejected)
            };
            table.add_row(vec![
                number(week.week),
                Cell::new(&week.faction),
                self.need_cell(week.need),
                number(week.generated),
                number(week.bound),
                rejected,
                number(week.withdrawn),
                number(week.preempted),
                number(week.completed),
                number(week.relieved),
                number(week.pending),
                number(week.idle),
            ]);
        }

        table.to_string()
    }

    fn need_cell(&self, need: CriticalNeed) -> Cell {
        if self.use_colors {
            Cell::new(need).fg(need_color(need))
        } else {
            Cell::new(need)
        }
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn number(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn need_color(need: CriticalNeed) -> Color {
    match need {
        CriticalNeed::Gold => Color::Yellow,
        CriticalNeed::Food => Color::Red,
        CriticalNeed::Soldiers => Color::Magenta,
        CriticalNeed::Construction => Color::Cyan,
        CriticalNeed::Normal => Color::Green,
    }
}
