// Core data models for Benchboard
// These structs represent the domain entities

pub mod work_order;
pub mod stage;

pub use work_order::*;
pub use stage::*;
