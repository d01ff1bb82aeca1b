//! Bottleneck / capacity analyzer
//!
//! Counts work orders per active stage and compares them with the stage's WIP limit.
//!
//! - over capacity: `count >= wip_limit` (a full stage counts)
//! - bottleneck: `count > wip_limit * ratio`, never for the first stage in the board

use serde::Serialize;

use crate::models::{Stage, WorkOrder};

/// Default share of capacity above which a stage is flagged as a bottleneck
pub const DEFAULT_BOTTLENECK_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLoad {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
    pub capacity: u32,
    pub is_over_capacity: bool,
    pub is_bottleneck: bool,
}

impl StageLoad {
    /// Occupancy as a fraction of capacity
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.count as f64 / self.capacity as f64
    }
}

/// Per-stage load in board order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    pub stages: Vec<StageLoad>,
}

impl CapacityReport {
    pub fn get(&self, stage_id: &str) -> Option<&StageLoad> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    pub fn bottlenecks(&self) -> Vec<&StageLoad> {
        self.stages.iter().filter(|s| s.is_bottleneck).collect()
    }

    pub fn over_capacity(&self) -> Vec<&StageLoad> {
        self.stages.iter().filter(|s| s.is_over_capacity).collect()
    }

    /// Orders that landed in some active stage
    pub fn total_counted(&self) -> usize {
        self.stages.iter().map(|s| s.count).sum()
    }
}

pub fn analyze(stages: &[Stage], work_orders: &[WorkOrder], bottleneck_ratio: f64) -> CapacityReport {
    let loads = stages
        .iter()
        .enumerate()
        .map(|(idx, stage)| {
            let count = work_orders
                .iter()
                .filter(|o| o.current_stage == stage.id)
                .count();
            let capacity = stage.wip_limit;
            StageLoad {
                stage_id: stage.id.clone(),
                name: stage.name.clone(),
                count,
                capacity,
                is_over_capacity: count >= capacity as usize,
                is_bottleneck: idx != 0 && count as f64 > capacity as f64 * bottleneck_ratio,
            }
        })
        .collect();

    CapacityReport { stages: loads }
}
