use thiserror::Error;

/// Errors raised by the kanban core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Move target is not an active stage
    #[error("Invalid stage '{0}': not an active stage on this board")]
    InvalidStage(String),

    #[error("Work order '{0}' not found")]
    UnknownWorkOrder(String),

    #[error("Stage '{0}' not found")]
    UnknownStage(String),

    #[error("A stage named '{0}' already exists")]
    DuplicateStageName(String),

    #[error("Stage name cannot be empty")]
    EmptyStageName,

    #[error("Stage position {index} is out of range (board has {len} stages)")]
    InvalidIndex { index: usize, len: usize },

    #[error("WIP limit must be greater than 0")]
    InvalidWipLimit,

    #[error("Work order '{0}' is already being dragged")]
    DragInProgress(String),

    #[error("No drag in progress")]
    NoActiveDrag,
}
