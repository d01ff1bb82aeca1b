//! Work-order data sources
//!
//! The board consumes plain records. They come from a JSON file, or from the
//! sample generator when no file exists yet.

pub mod import;
pub mod sample;

pub use import::{load_work_orders, parse_work_orders, record_to_work_order, save_work_orders};
pub use sample::{generate_sample_orders, DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_SEED};

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::{Stage, WorkOrder};

/// Where the loaded orders came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOrigin {
    File,
    Sample,
}

/// Load orders from `path`, falling back to sample data when the file does not exist
pub fn load_or_sample(path: &Path, stages: &[Stage], now: DateTime<Utc>) -> Result<(Vec<WorkOrder>, OrderOrigin)> {
    if path.exists() {
        let orders = load_work_orders(path)?;
        log::debug!("Loaded {} work orders from {}", orders.len(), path.display());
        return Ok((orders, OrderOrigin::File));
    }
    log::warn!(
        "No work orders at {}; showing sample data",
        path.display()
    );
    Ok((
        generate_sample_orders(stages, DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_SEED, now),
        OrderOrigin::Sample,
    ))
}
