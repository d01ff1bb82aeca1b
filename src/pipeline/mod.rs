//! Production kanban core
//!
//! - `registry`: ordered, customizable stages with WIP limits
//! - `engine`: moving work orders between stages
//! - `drag`: the two-phase drag/drop state
//! - `analyzer`: per-stage capacity and bottleneck flags
//! - `metrics`: cycle time, throughput and workload
//! - `board`: columns, filters and the drag protocol over one work-order set
//! - `calendar`: month-grid projection and export summary

pub mod analyzer;
pub mod board;
pub mod calendar;
pub mod drag;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod registry;

pub use analyzer::{analyze, CapacityReport, StageLoad, DEFAULT_BOTTLENECK_RATIO};
pub use board::{Board, Column};
pub use calendar::{export_summary, month_grid, stage_link, CalendarExport, CalendarFilters, DayCell, MonthCursor, MonthGrid, StageBadge};
pub use drag::DragState;
pub use engine::{move_work_order, MoveOutcome};
pub use error::BoardError;
pub use metrics::{compute_metrics, MetricsSettings, ProductionMetrics};
pub use registry::StageRegistry;
