// Error handling utilities for consistent error messages and exit codes

use std::process;

use crate::models::Priority;
use crate::pipeline::BoardError;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, unknown work orders or stages, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Report a rejected board operation. Every `BoardError` is caused by input.
pub fn board_error(err: &BoardError) -> ! {
    user_error(&err.to_string())
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate a stage position (non-negative integer below `len`)
pub fn validate_stage_index(index_str: &str, len: usize) -> Result<usize, String> {
    let idx = index_str
        .parse::<i64>()
        .map_err(|_| format!("Invalid stage position: '{}'. Position must be a number.", index_str))?;
    if idx < 0 {
        return Err(format!("Invalid stage position: {}. Position must be non-negative.", idx));
    }
    let idx = idx as usize;
    if idx >= len {
        return Err(format!(
            "Invalid stage position: {}. The board has {} stage(s) (positions 0..{}).",
            idx,
            len,
            len.saturating_sub(1)
        ));
    }
    Ok(idx)
}

/// Validate a WIP limit (positive integer)
pub fn validate_wip_limit(value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| format!("Invalid WIP limit: '{}'. Limit must be a positive number.", value))
}

/// Validate a priority name
pub fn validate_priority(value: &str) -> Result<Priority, String> {
    Priority::from_str(value)
        .ok_or_else(|| format!("Invalid priority: '{}'. Use high, medium or low.", value))
}
