use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Work order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" | "urgent" => Some(Priority::High),
            "medium" | "m" | "normal" => Some(Priority::Medium),
            "low" | "l" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Sort rank, lower sorts first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// One interval a work order spent in a stage.
/// `exited_at` stays unset while the order is still in that stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHistoryEntry {
    pub stage: String,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<DateTime<Utc>>,
}

impl StageHistoryEntry {
    pub fn open(stage: &str, entered_at: DateTime<Utc>) -> Self {
        Self {
            stage: stage.to_string(),
            entered_at,
            exited_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }

    /// Duration of a closed entry in hours; open entries contribute nothing
    pub fn closed_hours(&self) -> Option<f64> {
        let exited = self.exited_at?;
        let secs = (exited - self.entered_at).num_seconds();
        if secs < 0 {
            return None;
        }
        Some(secs as f64 / 3600.0)
    }
}

/// A piece of jewelry moving through the production pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub item_description: String,
    pub current_stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: String,
    /// Hours spent in the current stage
    #[serde(default)]
    pub time_in_stage: f64,
    /// Percent complete, 0-100
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub stage_history: Vec<StageHistoryEntry>,
}

impl WorkOrder {
    /// Create a new work order in the given stage, opening its first history entry
    pub fn new(order_number: &str, customer_name: &str, item_description: &str, stage: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: order_number.to_string(),
            customer_name: customer_name.to_string(),
            item_description: item_description.to_string(),
            current_stage: stage.to_string(),
            due_date: None,
            priority: Priority::Medium,
            assigned_to: String::new(),
            time_in_stage: 0.0,
            progress: 0,
            notes: None,
            stage_history: vec![StageHistoryEntry::open(stage, now)],
        }
    }

    /// Assignee label for display and grouping
    pub fn assignee_label(&self) -> &str {
        if self.assigned_to.trim().is_empty() {
            "Unassigned"
        } else {
            self.assigned_to.trim()
        }
    }

    /// Due date used for ordering; a missing date sorts as far future
    pub fn due_sort_key(&self) -> NaiveDate {
        self.due_date.unwrap_or(NaiveDate::MAX)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_date, Some(due) if due < today)
    }

    /// Due today or within `window_days`, and not already overdue
    pub fn is_urgent(&self, today: NaiveDate, window_days: i64) -> bool {
        match self.due_date {
            Some(due) => {
                let days = (due - today).num_days();
                (0..=window_days).contains(&days)
            }
            None => false,
        }
    }

    /// The history entry for the stage the order currently sits in, if open
    pub fn open_entry(&self) -> Option<&StageHistoryEntry> {
        self.stage_history.last().filter(|e| e.is_open())
    }

    /// Sum of all closed history intervals in hours
    pub fn closed_history_hours(&self) -> f64 {
        self.stage_history
            .iter()
            .filter_map(|e| e.closed_hours())
            .sum()
    }

    /// Check the history invariant: chronological entries, only the last may be open
    pub fn history_is_consistent(&self) -> bool {
        let mut previous_end: Option<DateTime<Utc>> = None;
        let last = self.stage_history.len().saturating_sub(1);
        for (idx, entry) in self.stage_history.iter().enumerate() {
            if let Some(prev) = previous_end {
                if entry.entered_at < prev {
                    return false;
                }
            }
            match entry.exited_at {
                Some(exited) => {
                    if exited < entry.entered_at {
                        return false;
                    }
                    previous_end = Some(exited);
                }
                None => {
                    if idx != last {
                        return false;
                    }
                    previous_end = Some(entry.entered_at);
                }
            }
        }
        true
    }
}
