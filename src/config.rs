//! Configuration from `~/.benchboard/rc`
//!
//! The rc file holds `key=value` lines; `#` starts a comment. Relative paths are
//! resolved against the directory holding the rc file.
//!
//! ```text
//! data.location=pipeline.db
//! orders.location=/srv/workshop/orders.json
//! board.default_wip=5
//! board.terminal_stage=ready
//! board.bottleneck_ratio=0.8
//! board.urgent_days=3
//! board.link_base=/dashboard/production/kanban
//! metrics.throughput_window_days=5
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::filter::DEFAULT_URGENT_DAYS;
use crate::pipeline::calendar::DEFAULT_LINK_BASE;
use crate::pipeline::metrics::{MetricsSettings, DEFAULT_TERMINAL_STAGE, DEFAULT_THROUGHPUT_WINDOW_DAYS};
use crate::pipeline::registry::DEFAULT_CUSTOM_WIP_LIMIT;
use crate::pipeline::DEFAULT_BOTTLENECK_RATIO;

const CONFIG_DIR: &str = ".benchboard";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite ledger holding the pipeline customization
    pub data_location: PathBuf,
    /// JSON work-order source
    pub orders_location: PathBuf,
    pub default_wip: u32,
    pub terminal_stage: String,
    pub bottleneck_ratio: f64,
    pub urgent_days: i64,
    pub link_base: String,
    pub throughput_window_days: f64,
}

impl Config {
    /// Home directory; `HOME` wins so tests can relocate it
    pub fn home_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_dir() -> PathBuf {
        Self::home_dir().join(CONFIG_DIR)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("rc")
    }

    /// Defaults rooted at `base_dir`
    pub fn defaults(base_dir: &Path) -> Self {
        Self {
            data_location: base_dir.join("pipeline.db"),
            orders_location: base_dir.join("orders.json"),
            default_wip: DEFAULT_CUSTOM_WIP_LIMIT,
            terminal_stage: DEFAULT_TERMINAL_STAGE.to_string(),
            bottleneck_ratio: DEFAULT_BOTTLENECK_RATIO,
            urgent_days: DEFAULT_URGENT_DAYS,
            link_base: DEFAULT_LINK_BASE.to_string(),
            throughput_window_days: DEFAULT_THROUGHPUT_WINDOW_DAYS,
        }
    }

    /// Load the rc file if present, otherwise defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let base_dir = Self::config_dir();
        if !path.exists() {
            return Ok(Self::defaults(&base_dir));
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents, &base_dir).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse rc contents; paths resolve against `base_dir`
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut config = Self::defaults(base_dir);
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("line {}: expected key=value, got '{}'", lineno + 1, line);
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "data.location" => config.data_location = resolve_path(base_dir, value),
                "orders.location" => config.orders_location = resolve_path(base_dir, value),
                "board.default_wip" => {
                    config.default_wip = value
                        .parse::<u32>()
                        .ok()
                        .filter(|v| *v > 0)
                        .ok_or_else(|| anyhow::anyhow!("line {}: board.default_wip must be a positive integer", lineno + 1))?;
                }
                "board.terminal_stage" => config.terminal_stage = value.to_string(),
                "board.bottleneck_ratio" => {
                    config.bottleneck_ratio = value
                        .parse::<f64>()
                        .ok()
                        .filter(|v| *v > 0.0 && *v <= 1.0)
                        .ok_or_else(|| anyhow::anyhow!("line {}: board.bottleneck_ratio must be in (0, 1]", lineno + 1))?;
                }
                "board.urgent_days" => {
                    config.urgent_days = value
                        .parse::<i64>()
                        .ok()
                        .filter(|v| *v >= 0)
                        .ok_or_else(|| anyhow::anyhow!("line {}: board.urgent_days must be >= 0", lineno + 1))?;
                }
                "board.link_base" => config.link_base = value.to_string(),
                "metrics.throughput_window_days" => {
                    config.throughput_window_days = value
                        .parse::<f64>()
                        .ok()
                        .filter(|v| *v > 0.0)
                        .ok_or_else(|| anyhow::anyhow!("line {}: metrics.throughput_window_days must be positive", lineno + 1))?;
                }
                other => log::warn!("Ignoring unknown config key '{}'", other),
            }
        }
        Ok(config)
    }

    pub fn metrics_settings(&self) -> MetricsSettings {
        MetricsSettings {
            terminal_stage: self.terminal_stage.clone(),
            throughput_window_days: self.throughput_window_days,
            bottleneck_ratio: self.bottleneck_ratio,
        }
    }
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}
