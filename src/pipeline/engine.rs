//! Stage assignment engine
//!
//! Moves a work order into another stage and keeps its stage history in step.
//! WIP limits are advisory here: a move into a full stage is allowed and only
//! reported; the capacity analyzer flags the resulting overload.

use chrono::{DateTime, Utc};

use crate::models::{StageHistoryEntry, WorkOrder};
use crate::pipeline::error::BoardError;
use crate::pipeline::registry::StageRegistry;

/// Result of a move request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target was the current stage; nothing changed
    Unchanged,
    Moved { from: String, to: String },
}

/// Move `order` to `target_stage_id`.
///
/// The target must be an active stage. Moving to the current stage is a no-op.
pub fn move_work_order(
    order: &mut WorkOrder,
    target_stage_id: &str,
    registry: &StageRegistry,
    now: DateTime<Utc>,
) -> Result<MoveOutcome, BoardError> {
    if !registry.contains_active(target_stage_id) {
        return Err(BoardError::InvalidStage(target_stage_id.to_string()));
    }
    if order.current_stage == target_stage_id {
        return Ok(MoveOutcome::Unchanged);
    }

    let from = std::mem::replace(&mut order.current_stage, target_stage_id.to_string());

    // Close the open entry; never let exit precede entry
    let mut entered_at = now;
    if let Some(last) = order.stage_history.last_mut() {
        match last.exited_at {
            None => {
                let exited = now.max(last.entered_at);
                last.exited_at = Some(exited);
                entered_at = exited;
            }
            Some(exited) => entered_at = now.max(exited),
        }
    }
    order
        .stage_history
        .push(StageHistoryEntry::open(target_stage_id, entered_at));
    order.time_in_stage = 0.0;

    log::info!(
        "Moved work order {} from '{}' to '{}'",
        order.order_number,
        from,
        target_stage_id
    );

    Ok(MoveOutcome::Moved {
        from,
        to: target_stage_id.to_string(),
    })
}

/// Warn when a stage holds at least its WIP limit after a move
pub fn warn_if_over_capacity(registry: &StageRegistry, orders: &[WorkOrder], stage_id: &str) -> bool {
    let Some(stage) = registry.get(stage_id) else {
        return false;
    };
    let count = orders.iter().filter(|o| o.current_stage == stage_id).count();
    if count >= stage.wip_limit as usize {
        log::warn!(
            "Stage '{}' is at capacity ({}/{})",
            stage.name,
            count,
            stage.wip_limit
        );
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_move_updates_stage_and_history() {
        let registry = StageRegistry::default();
        let mut order = WorkOrder::new("JW-1", "Ada", "Signet ring", "design", t0());
        order.time_in_stage = 12.0;

        let later = t0() + Duration::hours(5);
        let outcome = move_work_order(&mut order, "casting", &registry, later).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Moved { from: "design".to_string(), to: "casting".to_string() }
        );
        assert_eq!(order.current_stage, "casting");
        assert_eq!(order.stage_history.len(), 2);
        assert_eq!(order.stage_history[0].exited_at, Some(later));
        assert_eq!(order.stage_history[1].stage, "casting");
        assert!(order.stage_history[1].is_open());
        assert_eq!(order.time_in_stage, 0.0);
        assert!(order.history_is_consistent());
    }

    #[test]
    fn test_move_to_same_stage_is_noop() {
        let registry = StageRegistry::default();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", t0());
        order.time_in_stage = 3.0;
        let before = order.clone();

        let outcome = move_work_order(&mut order, "design", &registry, t0() + Duration::hours(1)).unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(order, before);
    }

    #[test]
    fn test_move_to_unknown_stage_is_rejected() {
        let registry = StageRegistry::default();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", t0());
        let before = order.clone();

        let err = move_work_order(&mut order, "plating", &registry, t0()).unwrap_err();
        assert_eq!(err, BoardError::InvalidStage("plating".to_string()));
        assert_eq!(order, before);
    }

    #[test]
    fn test_move_to_removed_stage_is_rejected() {
        let mut registry = StageRegistry::default();
        registry.remove("casting").unwrap();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", t0());
        assert!(matches!(
            move_work_order(&mut order, "casting", &registry, t0()),
            Err(BoardError::InvalidStage(_))
        ));
    }

    #[test]
    fn test_move_without_history_opens_entry() {
        let registry = StageRegistry::default();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", t0());
        order.stage_history.clear();

        move_work_order(&mut order, "setting", &registry, t0()).unwrap();
        assert_eq!(order.stage_history.len(), 1);
        assert_eq!(order.open_entry().map(|e| e.stage.as_str()), Some("setting"));
    }

    #[test]
    fn test_move_with_clock_behind_history_stays_chronological() {
        let registry = StageRegistry::default();
        let mut order = WorkOrder::new("JW-1", "Ada", "Ring", "design", t0());

        move_work_order(&mut order, "casting", &registry, t0() - Duration::hours(2)).unwrap();
        assert!(order.history_is_consistent());
        assert_eq!(order.stage_history[0].closed_hours(), Some(0.0));
    }

    #[test]
    fn test_move_into_full_stage_is_allowed() {
        let mut registry = StageRegistry::default();
        registry.set_wip_limit("setting", 1).unwrap();
        let mut orders = vec![
            WorkOrder::new("JW-1", "Ada", "Ring", "setting", t0()),
            WorkOrder::new("JW-2", "Bo", "Pendant", "design", t0()),
        ];

        let outcome = move_work_order(&mut orders[1], "setting", &registry, t0()).unwrap();
        assert!(matches!(outcome, MoveOutcome::Moved { .. }));
        assert!(warn_if_over_capacity(&registry, &orders, "setting"));
        assert!(!warn_if_over_capacity(&registry, &orders, "design"));
    }
}
