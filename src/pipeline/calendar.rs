//! Calendar projection
//!
//! Lays the work-order set out on a month grid by due date. Each day cell groups
//! its orders by stage and carries a deep link to that stage's board column.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Priority, WorkOrder};
use crate::pipeline::registry::StageRegistry;

/// Default route prefix for stage deep links
pub const DEFAULT_LINK_BASE: &str = "/dashboard/production/kanban";

/// Version of the exported summary document
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// The month currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    /// None unless the month and the full Monday-first grid around it are representable dates
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        let cursor = Self { year, month };
        cursor.first_day()?.checked_sub_signed(Duration::days(6))?;
        cursor.last_day()?.checked_add_signed(Duration::days(6))?;
        Some(cursor)
    }

    /// Month containing `today`
    pub fn today(today: NaiveDate) -> Self {
        Self { year: today.year(), month: today.month() }
    }

    pub fn next(self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year.checked_add(1)?, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn prev(self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year.checked_sub(1)?, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// Parse "YYYY-MM"
    pub fn parse(expr: &str) -> Option<Self> {
        let (year, month) = expr.trim().split_once('-')?;
        let year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year.checked_add(1)?, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Stage / priority selection applied to the calendar
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarFilters {
    pub stages: Vec<String>,
    pub priorities: Vec<Priority>,
}

impl CalendarFilters {
    pub fn matches(&self, order: &WorkOrder) -> bool {
        (self.stages.is_empty() || self.stages.iter().any(|s| s == &order.current_stage))
            && (self.priorities.is_empty() || self.priorities.contains(&order.priority))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBadge {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub stages: Vec<StageBadge>,
}

impl DayCell {
    pub fn total(&self) -> usize {
        self.stages.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub month: String,
    /// Monday-first weeks covering the whole month
    pub weeks: Vec<Vec<DayCell>>,
}

impl MonthGrid {
    pub fn days_in_month(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten().filter(|d| d.in_month)
    }
}

/// Deep link to a stage column
pub fn stage_link(link_base: &str, stage_id: &str) -> String {
    format!("{}/{}", link_base.trim_end_matches('/'), stage_id)
}

/// Build the month grid. Orders without a due date or in an inactive stage are left out.
pub fn month_grid(
    cursor: MonthCursor,
    orders: &[WorkOrder],
    registry: &StageRegistry,
    filters: &CalendarFilters,
    link_base: &str,
) -> MonthGrid {
    let mut weeks = Vec::new();
    let (Some(first), Some(last)) = (cursor.first_day(), cursor.last_day()) else {
        return MonthGrid { month: cursor.label(), weeks };
    };
    let offset = first.weekday().num_days_from_monday() as i64;
    let mut day = first.checked_sub_signed(Duration::days(offset));

    while let Some(start) = day.filter(|d| *d <= last) {
        let mut week = Vec::with_capacity(7);
        let mut current = Some(start);
        for _ in 0..7 {
            let Some(date) = current else { break };
            week.push(DayCell {
                date,
                in_month: cursor.contains(date),
                stages: badges_for_day(date, orders, registry, filters, link_base),
            });
            current = date.succ_opt();
        }
        weeks.push(week);
        day = current;
    }

    MonthGrid { month: cursor.label(), weeks }
}

fn badges_for_day(
    day: NaiveDate,
    orders: &[WorkOrder],
    registry: &StageRegistry,
    filters: &CalendarFilters,
    link_base: &str,
) -> Vec<StageBadge> {
    registry
        .active()
        .iter()
        .filter_map(|stage| {
            let count = orders
                .iter()
                .filter(|o| o.due_date == Some(day) && o.current_stage == stage.id && filters.matches(o))
                .count();
            if count == 0 {
                return None;
            }
            Some(StageBadge {
                stage_id: stage.id.clone(),
                name: stage.name.clone(),
                count,
                link: stage_link(link_base, &stage.id),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
}

/// JSON summary of one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarExport {
    pub schema_version: u32,
    pub month: String,
    pub generated_at: DateTime<Utc>,
    pub total_orders: usize,
    pub stage_counts: Vec<StageCount>,
    pub filters: CalendarFilters,
}

/// Per-stage counts of orders due in the month, with the active filter selection
pub fn export_summary(
    cursor: MonthCursor,
    orders: &[WorkOrder],
    registry: &StageRegistry,
    filters: &CalendarFilters,
    generated_at: DateTime<Utc>,
) -> CalendarExport {
    let in_month: Vec<&WorkOrder> = orders
        .iter()
        .filter(|o| o.due_date.map_or(false, |d| cursor.contains(d)) && filters.matches(o))
        .collect();

    let stage_counts: Vec<StageCount> = registry
        .active()
        .iter()
        .map(|stage| StageCount {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            count: in_month.iter().filter(|o| o.current_stage == stage.id).count(),
        })
        .collect();

    CalendarExport {
        schema_version: EXPORT_SCHEMA_VERSION,
        month: cursor.label(),
        generated_at,
        total_orders: stage_counts.iter().map(|c| c.count).sum(),
        stage_counts,
        filters: filters.clone(),
    }
}
