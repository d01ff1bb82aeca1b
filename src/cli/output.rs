// Output formatting utilities

use crate::filter::FilterContext;
use crate::models::{Priority, WorkOrder};
use crate::pipeline::{CapacityReport, Column, MonthGrid, ProductionMetrics, StageLoad, StageRegistry};
use chrono::NaiveDate;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

// ANSI foreground colors (standard 16-color palette)
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_CYAN: &str = "\x1b[36m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 { // Sanity check
                return width;
            }
        }
    }

    120
}

/// Rendering options shared by the formatters
#[derive(Debug, Clone, Copy)]
pub struct OutputStyle {
    pub color: bool,
    pub width: usize,
}

impl OutputStyle {
    /// Style for the current stdout
    pub fn detect() -> Self {
        Self { color: is_tty(), width: get_terminal_width() }
    }

    pub fn plain() -> Self {
        Self { color: false, width: 120 }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, ANSI_RESET)
        } else {
            text.to_string()
        }
    }
}

/// Truncate to `width` characters, marking the cut with "…"
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Left-align into a fixed width column
fn pad(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// Format duration for display
pub fn format_duration(secs: i64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h{}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format fractional hours (e.g. 5.5 -> "5h30m")
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0s".to_string();
    }
    format_duration((hours * 3600.0).round() as i64)
}

/// Due date relative to today (e.g. "overdue 2d", "today", "in 3 days")
pub fn format_relative_due(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return "no due date".to_string();
    };
    let days = (due - today).num_days();
    match days {
        d if d < 0 => format!("overdue {}d", -d),
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d if d <= 60 => format!("in {} days", d),
        _ => due.format("%Y-%m-%d").to_string(),
    }
}

fn priority_label(priority: Priority, width: usize, style: &OutputStyle) -> String {
    let text = pad(priority.as_str(), width);
    match priority {
        Priority::High => style.paint(&text, ANSI_FG_RED),
        Priority::Medium => text,
        Priority::Low => style.paint(&text, ANSI_FG_BRIGHT_BLACK),
    }
}

fn load_badges(load: &StageLoad) -> String {
    let mut badges = Vec::new();
    if load.is_over_capacity {
        badges.push("AT CAPACITY");
    }
    if load.is_bottleneck {
        badges.push("BOTTLENECK");
    }
    if badges.is_empty() {
        String::new()
    } else {
        format!(" [{}]", badges.join("] ["))
    }
}

fn format_order_row(order: &WorkOrder, ctx: &FilterContext, style: &OutputStyle) -> String {
    let due_text = format_relative_due(order.due_date, ctx.today);
    let due = if order.is_overdue(ctx.today) {
        style.paint(&pad(&due_text, 14), ANSI_FG_RED)
    } else if order.is_urgent(ctx.today, ctx.urgent_days) {
        style.paint(&pad(&due_text, 14), ANSI_FG_YELLOW)
    } else {
        pad(&due_text, 14)
    };

    // Fixed columns: number, due, priority, assignee, progress; the item takes what is left
    let fixed = 16 + 15 + 7 + 15 + 5 + 8;
    let item_width = style.width.saturating_sub(fixed).clamp(16, 60);
    let item = format!("{} ({})", order.item_description, order.customer_name);

    format!(
        "  {} {} {} {} {} {:>3}%",
        pad(&order.order_number, 16),
        pad(&item, item_width),
        due,
        priority_label(order.priority, 6, style),
        pad(order.assignee_label(), 14),
        order.progress,
    )
}

/// Render the board: one section per column, in board order
pub fn format_board(columns: &[Column<'_>], unplaced: &[&WorkOrder], ctx: &FilterContext, style: &OutputStyle) -> String {
    let mut output = String::new();

    if columns.is_empty() {
        output.push_str("No stages visible. Restore one with `benchboard stages restore <stage>`.\n");
    }

    for column in columns {
        let counts = format!("{}/{}", column.load.count, column.load.capacity);
        let filtered = if column.orders.len() != column.total {
            format!(", showing {}", column.orders.len())
        } else {
            String::new()
        };
        let header = format!(
            "=== {} ({}{}){} ===",
            column.stage.name,
            counts,
            filtered,
            load_badges(&column.load)
        );
        let header = if column.load.is_over_capacity {
            style.paint(&header, ANSI_FG_RED)
        } else if column.load.is_bottleneck {
            style.paint(&header, ANSI_FG_YELLOW)
        } else {
            style.paint(&header, ANSI_BOLD)
        };
        output.push_str(&header);
        output.push('\n');

        if column.orders.is_empty() {
            output.push_str(&style.paint("  (no work orders)", ANSI_DIM));
            output.push('\n');
        } else {
            for order in &column.orders {
                output.push_str(&format_order_row(order, ctx, style));
                output.push('\n');
            }
        }
        output.push('\n');
    }

    if !unplaced.is_empty() {
        output.push_str(&format!(
            "{} work order(s) are in stages not on the board: {}\n",
            unplaced.len(),
            unplaced
                .iter()
                .map(|o| format!("{} ({})", o.order_number, o.current_stage))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    output
}

/// Capacity table: stage, count/limit, utilization, flags
pub fn format_capacity_report(report: &CapacityReport, style: &OutputStyle) -> String {
    if report.stages.is_empty() {
        return "No stages visible.\n".to_string();
    }
    let mut output = String::new();
    output.push_str(&style.paint(
        &format!("{} {:>7} {:>6}  {}", pad("Stage", 20), "Load", "Use", "Flags"),
        ANSI_BOLD,
    ));
    output.push('\n');
    for load in &report.stages {
        let line = format!(
            "{} {:>7} {:>5.0}% {}",
            pad(&load.name, 20),
            format!("{}/{}", load.count, load.capacity),
            load.utilization() * 100.0,
            load_badges(load),
        );
        let line = if load.is_over_capacity {
            style.paint(&line, ANSI_FG_RED)
        } else if load.is_bottleneck {
            style.paint(&line, ANSI_FG_YELLOW)
        } else {
            line
        };
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Metrics dashboard
pub fn format_metrics(metrics: &ProductionMetrics, registry: &StageRegistry, terminal_stage: &str) -> String {
    let mut output = String::new();

    output.push_str("=== Production Overview ===\n");
    output.push_str(&format!("Work in progress: {}\n", metrics.total_wip));
    output.push_str(&format!(
        "Avg cycle time (completed, in '{}'): {}\n",
        registry.label_for(terminal_stage),
        format_hours(metrics.average_cycle_time)
    ));
    output.push_str(&format!("Throughput: {:.1} orders/day\n", metrics.throughput));
    output.push('\n');

    output.push_str("=== WIP by Stage ===\n");
    if metrics.stage_wip_counts.is_empty() {
        output.push_str("No stages visible.\n");
    }
    for stage in &metrics.stage_wip_counts {
        output.push_str(&format!("{} {}/{}\n", pad(&stage.name, 20), stage.count, stage.wip_limit));
    }
    output.push('\n');

    output.push_str("=== Bottlenecks ===\n");
    if metrics.bottlenecks.is_empty() {
        output.push_str("No bottlenecks.\n");
    } else {
        for id in &metrics.bottlenecks {
            output.push_str(&format!("{}\n", registry.label_for(id)));
        }
    }
    output.push('\n');

    output.push_str("=== Cycle Time by Stage ===\n");
    for stage in &metrics.cycle_time_by_stage {
        let avg = if stage.samples == 0 {
            "-".to_string()
        } else {
            format_hours(stage.average_hours)
        };
        output.push_str(&format!("{} {} ({} sample(s))\n", pad(&stage.name, 20), avg, stage.samples));
    }
    output.push('\n');

    output.push_str("=== Workload ===\n");
    if metrics.craftsperson_workload.is_empty() {
        output.push_str("No work orders.\n");
    }
    for person in &metrics.craftsperson_workload {
        output.push_str(&format!("{} {}\n", pad(&person.name, 20), person.count));
    }

    output
}

/// Detail view of one work order
pub fn format_work_order_detail(order: &WorkOrder, registry: &StageRegistry, ctx: &FilterContext) -> String {
    let mut output = String::new();
    output.push_str(&format!("Work order {} ({})\n", order.order_number, order.id));
    output.push_str(&format!("  Customer:   {}\n", order.customer_name));
    output.push_str(&format!("  Item:       {}\n", order.item_description));
    let stage_note = if registry.contains_active(&order.current_stage) {
        String::new()
    } else {
        " (not on the board)".to_string()
    };
    output.push_str(&format!(
        "  Stage:      {}{}\n",
        registry.label_for(&order.current_stage),
        stage_note
    ));
    let due = match order.due_date {
        Some(d) => format!("{} ({})", d.format("%Y-%m-%d"), format_relative_due(Some(d), ctx.today)),
        None => "none".to_string(),
    };
    output.push_str(&format!("  Due:        {}\n", due));
    output.push_str(&format!("  Priority:   {}\n", order.priority.as_str()));
    output.push_str(&format!("  Assigned:   {}\n", order.assignee_label()));
    output.push_str(&format!("  In stage:   {}\n", format_hours(order.time_in_stage)));
    output.push_str(&format!("  Progress:   {}%\n", order.progress));
    if let Some(notes) = &order.notes {
        output.push_str(&format!("  Notes:      {}\n", notes));
    }

    output.push_str("\n  Stage history:\n");
    if order.stage_history.is_empty() {
        output.push_str("    (no history recorded)\n");
    }
    for entry in &order.stage_history {
        let exited = match entry.exited_at {
            Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
            None => "now".to_string(),
        };
        let spent = entry
            .closed_hours()
            .map(|h| format!(" ({})", format_hours(h)))
            .unwrap_or_default();
        output.push_str(&format!(
            "    {} {} -> {}{}\n",
            pad(registry.label_for(&entry.stage), 16),
            entry.entered_at.format("%Y-%m-%d %H:%M"),
            exited,
            spent
        ));
    }
    output
}

/// Active and removed stages
pub fn format_stage_list(registry: &StageRegistry) -> String {
    let mut output = String::new();
    output.push_str("=== Stages ===\n");
    if registry.active().is_empty() {
        output.push_str("No stages visible.\n");
    }
    for (idx, stage) in registry.active().iter().enumerate() {
        let renamed = if stage.is_renamed() {
            format!(" (was {})", stage.original_name)
        } else {
            String::new()
        };
        output.push_str(&format!(
            "{:>2}. {} id={} wip={}{}\n",
            idx,
            pad(&stage.name, 18),
            stage.id,
            stage.wip_limit,
            renamed
        ));
    }
    output.push('\n');
    output.push_str("=== Removed ===\n");
    if registry.removed().is_empty() {
        output.push_str("No removed stages.\n");
    }
    for stage in registry.removed() {
        output.push_str(&format!("    {} id={} wip={}\n", pad(&stage.name, 18), stage.id, stage.wip_limit));
    }
    output
}

/// Month grid with per-day totals, followed by the stage breakdown of each busy day
pub fn format_calendar(grid: &MonthGrid, today: NaiveDate, style: &OutputStyle) -> String {
    let mut output = String::new();
    output.push_str(&style.paint(&format!("=== {} ===", grid.month), ANSI_BOLD));
    output.push('\n');
    output.push_str(" Mon    Tue    Wed    Thu    Fri    Sat    Sun\n");

    for week in &grid.weeks {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                if !day.in_month {
                    return "  .    ".to_string();
                }
                let total = day.total();
                let text = if total > 0 {
                    format!("{:>2}:{:<2}", day.date.format("%d"), total)
                } else {
                    format!("{:>2}   ", day.date.format("%d"))
                };
                let text = pad(&text, 7);
                if day.date == today {
                    style.paint(&text, ANSI_FG_CYAN)
                } else if total > 0 {
                    style.paint(&text, ANSI_FG_GREEN)
                } else {
                    text
                }
            })
            .collect();
        output.push_str(cells.join("").trim_end());
        output.push('\n');
    }
    output.push('\n');

    let busy: Vec<_> = grid.days_in_month().filter(|d| d.total() > 0).collect();
    if busy.is_empty() {
        output.push_str("No work orders due this month.\n");
        return output;
    }
    for day in busy {
        let badges: Vec<String> = day
            .stages
            .iter()
            .map(|b| format!("{} x{} <{}>", b.name, b.count, b.link))
            .collect();
        output.push_str(&format!("{}  {}\n", day.date.format("%Y-%m-%d"), badges.join(", ")));
    }
    output
}
