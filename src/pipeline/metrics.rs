//! Production metrics
//!
//! All figures are derived from the current work-order set on every call.
//! Cycle time only looks at orders sitting in the terminal stage, so it is a
//! "completed orders" figure, not an average over everything in flight.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Stage, WorkOrder};
use crate::pipeline::analyzer::{analyze, DEFAULT_BOTTLENECK_RATIO};

/// Id of the stage that counts as finished
pub const DEFAULT_TERMINAL_STAGE: &str = "ready";

/// Lookback used to turn finished orders into a daily rate
pub const DEFAULT_THROUGHPUT_WINDOW_DAYS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSettings {
    pub terminal_stage: String,
    pub throughput_window_days: f64,
    pub bottleneck_ratio: f64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            terminal_stage: DEFAULT_TERMINAL_STAGE.to_string(),
            throughput_window_days: DEFAULT_THROUGHPUT_WINDOW_DAYS,
            bottleneck_ratio: DEFAULT_BOTTLENECK_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageWipCount {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
    pub wip_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCycleTime {
    pub stage_id: String,
    pub name: String,
    pub average_hours: f64,
    /// Number of closed history entries averaged
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionMetrics {
    pub total_wip: usize,
    pub stage_wip_counts: Vec<StageWipCount>,
    /// Hours, over orders in the terminal stage
    pub average_cycle_time: f64,
    /// Finished orders per day
    pub throughput: f64,
    pub bottlenecks: Vec<String>,
    pub craftsperson_workload: Vec<Workload>,
    pub cycle_time_by_stage: Vec<StageCycleTime>,
}

pub fn compute_metrics(work_orders: &[WorkOrder], stages: &[Stage], settings: &MetricsSettings) -> ProductionMetrics {
    let report = analyze(stages, work_orders, settings.bottleneck_ratio);

    let stage_wip_counts = report
        .stages
        .iter()
        .map(|load| StageWipCount {
            stage_id: load.stage_id.clone(),
            name: load.name.clone(),
            count: load.count,
            wip_limit: load.capacity,
        })
        .collect();

    let bottlenecks = report
        .bottlenecks()
        .into_iter()
        .map(|load| load.stage_id.clone())
        .collect();

    ProductionMetrics {
        total_wip: work_orders.len(),
        stage_wip_counts,
        average_cycle_time: average_cycle_time(work_orders, &settings.terminal_stage),
        throughput: throughput(work_orders, &settings.terminal_stage, settings.throughput_window_days),
        bottlenecks,
        craftsperson_workload: craftsperson_workload(work_orders),
        cycle_time_by_stage: cycle_time_by_stage(work_orders, stages),
    }
}

/// Mean of the summed closed-history hours of finished orders.
/// Orders with nothing recorded are left out of the mean.
pub fn average_cycle_time(work_orders: &[WorkOrder], terminal_stage: &str) -> f64 {
    let totals: Vec<f64> = work_orders
        .iter()
        .filter(|o| o.current_stage == terminal_stage)
        .map(|o| o.closed_history_hours())
        .filter(|hours| *hours > 0.0)
        .collect();
    if totals.is_empty() {
        return 0.0;
    }
    totals.iter().sum::<f64>() / totals.len() as f64
}

pub fn throughput(work_orders: &[WorkOrder], terminal_stage: &str, window_days: f64) -> f64 {
    if window_days <= 0.0 {
        return 0.0;
    }
    let finished = work_orders
        .iter()
        .filter(|o| o.current_stage == terminal_stage)
        .count();
    finished as f64 / window_days
}

/// Orders per assignee, busiest first
pub fn craftsperson_workload(work_orders: &[WorkOrder]) -> Vec<Workload> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for order in work_orders {
        *counts.entry(order.assignee_label()).or_insert(0) += 1;
    }
    let mut workload: Vec<Workload> = counts
        .into_iter()
        .map(|(name, count)| Workload { name: name.to_string(), count })
        .collect();
    workload.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    workload
}

pub fn cycle_time_by_stage(work_orders: &[WorkOrder], stages: &[Stage]) -> Vec<StageCycleTime> {
    stages
        .iter()
        .map(|stage| {
            let durations: Vec<f64> = work_orders
                .iter()
                .flat_map(|o| o.stage_history.iter())
                .filter(|entry| entry.stage == stage.id)
                .filter_map(|entry| entry.closed_hours())
                .collect();
            let average_hours = if durations.is_empty() {
                0.0
            } else {
                durations.iter().sum::<f64>() / durations.len() as f64
            };
            StageCycleTime {
                stage_id: stage.id.clone(),
                name: stage.name.clone(),
                average_hours,
                samples: durations.len(),
            }
        })
        .collect()
}
