//! Benchboard - production kanban for jewelry workshops
//!
//! This library provides the core functionality for Benchboard, including:
//! - Work-order and stage models
//! - The pipeline: stage registry, move engine, drag protocol, capacity analysis,
//!   production metrics, board columns and the due-date calendar
//! - Board filter expression parsing and evaluation
//! - Work-order sources (JSON files and seeded sample data)
//! - The SQLite ledger that persists stage customization
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use benchboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod repo;
pub mod source;
