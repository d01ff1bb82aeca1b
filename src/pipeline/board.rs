//! Kanban board
//!
//! `Board` owns the work-order set and the stage registry for the lifetime of a
//! view. It distributes orders into one column per active stage, drives the drag
//! protocol, and recomputes capacity and metrics on demand.

use chrono::{DateTime, Utc};

use crate::filter::{filter_orders, BoardFilter, FilterContext};
use crate::models::{Stage, WorkOrder};
use crate::pipeline::analyzer::{analyze, CapacityReport, StageLoad};
use crate::pipeline::drag::DragState;
use crate::pipeline::engine::{move_work_order, warn_if_over_capacity, MoveOutcome};
use crate::pipeline::error::BoardError;
use crate::pipeline::metrics::{compute_metrics, MetricsSettings, ProductionMetrics};
use crate::pipeline::registry::StageRegistry;

/// One rendered column: a stage, its load, and the visible orders
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub stage: &'a Stage,
    pub load: StageLoad,
    /// Orders in the stage before filtering
    pub total: usize,
    pub orders: Vec<&'a WorkOrder>,
}

impl Column<'_> {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    registry: StageRegistry,
    orders: Vec<WorkOrder>,
    settings: MetricsSettings,
    drag: DragState,
}

impl Board {
    pub fn new(registry: StageRegistry, orders: Vec<WorkOrder>, settings: MetricsSettings) -> Self {
        Self {
            registry,
            orders,
            settings,
            drag: DragState::Idle,
        }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn orders(&self) -> &[WorkOrder] {
        &self.orders
    }

    pub fn into_orders(self) -> Vec<WorkOrder> {
        self.orders
    }

    pub fn settings(&self) -> &MetricsSettings {
        &self.settings
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Find an order by id or order number (case-insensitive)
    pub fn find_order(&self, reference: &str) -> Option<&WorkOrder> {
        self.find_order_index(reference).map(|idx| &self.orders[idx])
    }

    fn find_order_index(&self, reference: &str) -> Option<usize> {
        let reference = reference.trim();
        self.orders
            .iter()
            .position(|o| o.id == reference)
            .or_else(|| {
                self.orders
                    .iter()
                    .position(|o| o.order_number.eq_ignore_ascii_case(reference))
            })
    }

    pub fn capacity(&self) -> CapacityReport {
        analyze(self.registry.active(), &self.orders, self.settings.bottleneck_ratio)
    }

    pub fn metrics(&self) -> ProductionMetrics {
        compute_metrics(&self.orders, self.registry.active(), &self.settings)
    }

    /// Orders whose stage is not on the board (unknown or removed stage)
    pub fn unplaced(&self) -> Vec<&WorkOrder> {
        self.orders
            .iter()
            .filter(|o| !self.registry.contains_active(&o.current_stage))
            .collect()
    }

    /// One column per active stage, each filtered by `filter`
    pub fn columns(&self, filter: &BoardFilter, ctx: &FilterContext) -> Vec<Column<'_>> {
        let report = self.capacity();
        self.registry
            .active()
            .iter()
            .zip(report.stages)
            .map(|(stage, load)| {
                let in_stage: Vec<&WorkOrder> = self
                    .orders
                    .iter()
                    .filter(|o| o.current_stage == stage.id)
                    .collect();
                Column {
                    stage,
                    load,
                    total: in_stage.len(),
                    orders: filter_orders(&in_stage, filter, ctx),
                }
            })
            .collect()
    }

    /// Pick up an order
    pub fn drag_start(&mut self, item_id: &str) -> Result<(), BoardError> {
        if let Some(active) = self.drag.active_item() {
            return Err(BoardError::DragInProgress(active.to_string()));
        }
        let idx = self
            .find_order_index(item_id)
            .ok_or_else(|| BoardError::UnknownWorkOrder(item_id.to_string()))?;
        let order = &self.orders[idx];
        self.drag = DragState::Dragging {
            item_id: order.id.clone(),
            from_stage: order.current_stage.clone(),
        };
        Ok(())
    }

    /// Drop the carried order. `None` means it was released outside any column.
    pub fn drag_end(&mut self, target: Option<&str>, now: DateTime<Utc>) -> Result<MoveOutcome, BoardError> {
        let (item_id, from_stage) = match std::mem::take(&mut self.drag) {
            DragState::Dragging { item_id, from_stage } => (item_id, from_stage),
            _ => return Err(BoardError::NoActiveDrag),
        };
        let Some(target) = target else {
            return Ok(MoveOutcome::Unchanged);
        };
        if !self.registry.contains_active(target) {
            return Err(BoardError::InvalidStage(target.to_string()));
        }

        self.drag = DragState::Completed {
            item_id: item_id.clone(),
            from_stage: from_stage.clone(),
            to_stage: target.to_string(),
        };
        let outcome = self.apply_completed_drop(now);
        self.drag = DragState::Idle;
        outcome
    }

    fn apply_completed_drop(&mut self, now: DateTime<Utc>) -> Result<MoveOutcome, BoardError> {
        let DragState::Completed { item_id, from_stage, to_stage } = &self.drag else {
            return Ok(MoveOutcome::Unchanged);
        };
        if from_stage == to_stage {
            return Ok(MoveOutcome::Unchanged);
        }
        let idx = self
            .orders
            .iter()
            .position(|o| &o.id == item_id)
            .ok_or_else(|| BoardError::UnknownWorkOrder(item_id.clone()))?;
        let to_stage = to_stage.clone();
        let outcome = move_work_order(&mut self.orders[idx], &to_stage, &self.registry, now)?;
        if matches!(outcome, MoveOutcome::Moved { .. }) {
            warn_if_over_capacity(&self.registry, &self.orders, &to_stage);
        }
        Ok(outcome)
    }

    /// Move an order in one step (start + drop)
    pub fn move_order(&mut self, reference: &str, target: &str, now: DateTime<Utc>) -> Result<MoveOutcome, BoardError> {
        let stage_id = self
            .registry
            .find(target)
            .map(|s| s.id.clone())
            .ok_or_else(|| BoardError::InvalidStage(target.to_string()))?;
        self.drag_start(reference)?;
        self.drag_end(Some(&stage_id), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn board() -> Board {
        let mut a = WorkOrder::new("JW-1", "Ada", "Signet ring", "design", t0());
        a.id = "wo-1".to_string();
        let mut b = WorkOrder::new("JW-2", "Bo", "Pearl necklace", "casting", t0());
        b.id = "wo-2".to_string();
        let mut c = WorkOrder::new("JW-3", "Cy", "Cuff", "archived", t0());
        c.id = "wo-3".to_string();
        Board::new(StageRegistry::default(), vec![a, b, c], MetricsSettings::default())
    }

    fn ctx() -> FilterContext {
        FilterContext::new(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap())
    }

    #[test]
    fn test_columns_follow_registry_order() {
        let board = board();
        let columns = board.columns(&BoardFilter::default(), &ctx());
        let ids: Vec<&str> = columns.iter().map(|c| c.stage.id.as_str()).collect();
        assert_eq!(ids, vec!["design", "casting", "setting", "polishing", "quality-check", "ready"]);
        assert_eq!(columns[0].orders.len(), 1);
        assert_eq!(columns[1].load.count, 1);
        assert!(columns[2].is_empty());
        assert_eq!(board.unplaced().len(), 1);
    }

    #[test]
    fn test_column_filter_keeps_total() {
        let board = board();
        let filter = parse_filter(vec!["necklace".to_string()]).unwrap();
        let columns = board.columns(&filter, &ctx());
        assert!(columns[0].orders.is_empty());
        assert_eq!(columns[0].total, 1);
        assert_eq!(columns[1].orders.len(), 1);
    }

    #[test]
    fn test_drag_protocol_moves_order() {
        let mut board = board();
        board.drag_start("wo-1").unwrap();
        assert_eq!(board.drag_state().active_item(), Some("wo-1"));

        let outcome = board.drag_end(Some("setting"), t0() + Duration::hours(2)).unwrap();
        assert!(matches!(outcome, MoveOutcome::Moved { .. }));
        assert!(board.drag_state().is_idle());
        assert_eq!(board.find_order("wo-1").unwrap().current_stage, "setting");
    }

    #[test]
    fn test_drop_outside_or_same_column_is_noop() {
        let mut board = board();
        let before = board.orders().to_vec();

        board.drag_start("JW-1").unwrap();
        assert_eq!(board.drag_end(None, t0()).unwrap(), MoveOutcome::Unchanged);

        board.drag_start("JW-1").unwrap();
        assert_eq!(board.drag_end(Some("design"), t0()).unwrap(), MoveOutcome::Unchanged);

        assert_eq!(board.orders(), before.as_slice());
        assert!(board.drag_state().is_idle());
    }

    #[test]
    fn test_drag_errors() {
        let mut board = board();
        assert_eq!(board.drag_end(Some("design"), t0()), Err(BoardError::NoActiveDrag));
        assert!(matches!(board.drag_start("JW-99"), Err(BoardError::UnknownWorkOrder(_))));

        board.drag_start("wo-1").unwrap();
        assert_eq!(board.drag_start("wo-2"), Err(BoardError::DragInProgress("wo-1".to_string())));
        assert_eq!(
            board.drag_end(Some("plating"), t0()),
            Err(BoardError::InvalidStage("plating".to_string()))
        );
        assert!(board.drag_state().is_idle());
    }

    #[test]
    fn test_move_order_by_stage_name_after_rename() {
        let mut registry = StageRegistry::default();
        registry.rename("Design", "Concept").unwrap();
        let order = WorkOrder::new("JW-7", "Ada", "Ring", "casting", t0());
        let mut board = Board::new(registry, vec![order], MetricsSettings::default());

        board.move_order("JW-7", "Concept", t0()).unwrap();
        assert_eq!(board.orders()[0].current_stage, "design");

        let columns = board.columns(&BoardFilter::default(), &ctx());
        assert_eq!(columns[0].stage.name, "Concept");
        assert_eq!(columns[0].orders.len(), 1);
    }

    #[test]
    fn test_move_order_to_removed_stage_fails() {
        let mut registry = StageRegistry::default();
        registry.remove("ready").unwrap();
        let mut board = Board::new(
            registry,
            vec![WorkOrder::new("JW-7", "Ada", "Ring", "casting", t0())],
            MetricsSettings::default(),
        );
        assert!(matches!(
            board.move_order("JW-7", "ready", t0()),
            Err(BoardError::InvalidStage(_))
        ));
        assert!(board.drag_state().is_idle());
    }
}
