//! Work-order records from JSON
//!
//! Records come from an external source and may be incomplete. Missing or
//! malformed fields fall back to safe defaults instead of failing the load:
//! no due date means "far future", unknown priority means medium, progress is
//! clamped to 0-100, and a missing id gets a generated one.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::models::{Priority, StageHistoryEntry, WorkOrder};

/// Parse a JSON document: either an array of records or `{ "workOrders": [...] }`
pub fn parse_work_orders(json: &str) -> Result<Vec<WorkOrder>> {
    let doc: Value = serde_json::from_str(json).context("Work order data is not valid JSON")?;
    let records = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("workOrders").or_else(|| map.remove("work_orders")) {
            Some(Value::Array(items)) => items,
            _ => anyhow::bail!("Expected a list of work orders or an object with a 'workOrders' list"),
        },
        _ => anyhow::bail!("Expected a list of work orders"),
    };

    let mut orders = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match record_to_work_order(record) {
            Some(order) => orders.push(order),
            None => log::warn!("Skipping work order record #{}: not a JSON object", idx + 1),
        }
    }
    Ok(orders)
}

/// Load work orders from a file
pub fn load_work_orders(path: &Path) -> Result<Vec<WorkOrder>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read work orders from {}", path.display()))?;
    parse_work_orders(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write work orders back as a pretty-printed JSON array
pub fn save_work_orders(path: &Path, orders: &[WorkOrder]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(orders)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write work orders to {}", path.display()))?;
    Ok(())
}

/// Map one record onto a WorkOrder. Returns None only when the record is not an object.
pub fn record_to_work_order(record: &Value) -> Option<WorkOrder> {
    let obj = record.as_object()?;
    let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null());
    let text = |keys: &[&str]| field(keys).map(value_to_string).unwrap_or_default();

    let id = match text(&["id", "_id"]) {
        s if s.is_empty() => uuid::Uuid::new_v4().to_string(),
        s => s,
    };
    let order_number = match text(&["orderNumber", "order_number"]) {
        s if s.is_empty() => id.clone(),
        s => s,
    };

    let due_date = field(&["dueDate", "due_date"]).and_then(|v| v.as_str()).and_then(parse_due_date);
    if due_date.is_none() {
        log::debug!("Work order {} has no usable due date", order_number);
    }

    let priority = field(&["priority"])
        .and_then(|v| v.as_str())
        .and_then(Priority::from_str)
        .unwrap_or_default();

    let time_in_stage = field(&["timeInStage", "time_in_stage"])
        .and_then(value_to_f64)
        .filter(|h| h.is_finite())
        .unwrap_or(0.0)
        .max(0.0);

    let progress = field(&["progress"])
        .and_then(value_to_f64)
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
        .round() as u8;

    let notes = field(&["notes"]).map(value_to_string).filter(|s| !s.trim().is_empty());

    let mut stage_history: Vec<StageHistoryEntry> = field(&["stageHistory", "stage_history"])
        .and_then(|v| v.as_array())
        .map(|entries| entries.iter().filter_map(parse_history_entry).collect())
        .unwrap_or_default();
    stage_history.sort_by_key(|entry| entry.entered_at);

    let mut current_stage = text(&["currentStage", "current_stage", "stage"]);
    if current_stage.is_empty() {
        log::warn!("Work order {} has no stage", order_number);
        current_stage = "unassigned".to_string();
    }

    let order = WorkOrder {
        id,
        order_number,
        customer_name: text(&["customerName", "customer_name", "customer"]),
        item_description: text(&["itemDescription", "item_description", "description"]),
        current_stage,
        due_date,
        priority,
        assigned_to: text(&["assignedTo", "assigned_to", "assignee"]),
        time_in_stage,
        progress,
        notes,
        stage_history,
    };
    if !order.history_is_consistent() {
        log::warn!("Work order {} has overlapping or unclosed stage history", order.order_number);
    }
    Some(order)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Accepts "YYYY-MM-DD" or a full RFC 3339 timestamp
fn parse_due_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|dt| dt.date_naive()))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_history_entry(value: &Value) -> Option<StageHistoryEntry> {
    let obj = value.as_object()?;
    let stage = obj.get("stage")?.as_str()?.to_string();
    let entered_at = obj
        .get("enteredAt")
        .or_else(|| obj.get("entered_at"))
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp)?;
    let exited_at = obj
        .get("exitedAt")
        .or_else(|| obj.get("exited_at"))
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp);
    Some(StageHistoryEntry { stage, entered_at, exited_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_full_record() {
        let json = r#"[{
            "id": "wo-1",
            "orderNumber": "JW-2026-0001",
            "customerName": "Helena Voss",
            "itemDescription": "Sapphire halo pendant",
            "currentStage": "setting",
            "dueDate": "2026-11-02",
            "priority": "high",
            "assignedTo": "Mara Ilic",
            "timeInStage": 6.5,
            "progress": 40,
            "notes": "Stones supplied",
            "stageHistory": [
                {"stage": "design", "enteredAt": "2026-10-01T09:00:00Z", "exitedAt": "2026-10-01T14:00:00Z"},
                {"stage": "setting", "enteredAt": "2026-10-01T14:00:00Z"}
            ]
        }]"#;
        let orders = parse_work_orders(json).unwrap();
        assert_eq!(orders.len(), 1);
        let o = &orders[0];
        assert_eq!(o.order_number, "JW-2026-0001");
        assert_eq!(o.current_stage, "setting");
        assert_eq!(o.due_date, NaiveDate::from_ymd_opt(2026, 11, 2));
        assert_eq!(o.priority, Priority::High);
        assert_eq!(o.progress, 40);
        assert_eq!(o.stage_history.len(), 2);
        assert_eq!(o.stage_history[0].closed_hours(), Some(5.0));
        assert!(o.history_is_consistent());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let json = r#"{"workOrders": [
            {"orderNumber": "JW-9", "currentStage": "design", "priority": "someday",
             "progress": 250, "timeInStage": -3, "dueDate": "not a date"},
            42
        ]}"#;
        let orders = parse_work_orders(json).unwrap();
        assert_eq!(orders.len(), 1);
        let o = &orders[0];
        assert!(!o.id.is_empty());
        assert_eq!(o.due_date, None);
        assert_eq!(o.due_sort_key(), NaiveDate::MAX);
        assert_eq!(o.priority, Priority::Medium);
        assert_eq!(o.progress, 100);
        assert_eq!(o.time_in_stage, 0.0);
        assert!(o.stage_history.is_empty());
        assert_eq!(o.assignee_label(), "Unassigned");
    }

    #[test]
    fn test_numeric_strings_and_timestamps() {
        let json = r#"[{"id": 17, "currentStage": "ready", "progress": "55.4",
                        "dueDate": "2026-12-01T10:00:00+02:00"}]"#;
        let orders = parse_work_orders(json).unwrap();
        assert_eq!(orders[0].id, "17");
        assert_eq!(orders[0].order_number, "17");
        assert_eq!(orders[0].progress, 55);
        assert_eq!(orders[0].due_date, NaiveDate::from_ymd_opt(2026, 12, 1));
    }

    #[test]
    fn test_history_is_sorted_by_entry_time() {
        let json = r#"[{"id": "wo-3", "currentStage": "casting", "stageHistory": [
            {"stage": "casting", "enteredAt": "2026-10-02T08:00:00Z"},
            {"stage": "design", "enteredAt": "2026-10-01T09:00:00Z", "exitedAt": "2026-10-02T08:00:00Z"}
        ]}]"#;
        let orders = parse_work_orders(json).unwrap();
        let history = &orders[0].stage_history;
        assert_eq!(history[0].stage, "design");
        assert_eq!(history[1].stage, "casting");
        assert!(orders[0].history_is_consistent());
    }

    #[test]
    fn test_inconsistent_history_is_kept() {
        let json = r#"[{"id": "wo-4", "currentStage": "ready", "stageHistory": [
            {"stage": "design", "enteredAt": "2026-10-01T09:00:00Z"},
            {"stage": "ready", "enteredAt": "2026-10-03T09:00:00Z"}
        ]}]"#;
        let orders = parse_work_orders(json).unwrap();
        assert_eq!(orders[0].stage_history.len(), 2);
        assert!(!orders[0].history_is_consistent());
    }

    #[test]
    fn test_rejects_non_list_document() {
        assert!(parse_work_orders("\"hello\"").is_err());
        assert!(parse_work_orders("{\"orders\": []}").is_err());
        assert!(parse_work_orders("not json").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("orders.json");
        let now = Utc::now();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", now);
        order.due_date = NaiveDate::from_ymd_opt(2026, 10, 30);
        save_work_orders(&path, &[order.clone()]).unwrap();

        let loaded = load_work_orders(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, order.id);
        assert_eq!(loaded[0].due_date, order.due_date);
        assert_eq!(loaded[0].stage_history.len(), 1);
    }
}
