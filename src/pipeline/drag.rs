//! Drag-and-drop protocol
//!
//! A drag is a two-phase interaction: `drag_start` records the item being
//! carried, `drag_end` resolves the drop target. The assignment engine is only
//! invoked from a completed drop onto a different stage.

/// Where the pointer interaction currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: String,
        from_stage: String,
    },
    Completed {
        item_id: String,
        from_stage: String,
        to_stage: String,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    /// Id of the carried item while a drag is active
    pub fn active_item(&self) -> Option<&str> {
        match self {
            DragState::Dragging { item_id, .. } => Some(item_id),
            _ => None,
        }
    }
}
