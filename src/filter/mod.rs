pub mod parser;
pub mod evaluator;

pub use parser::{parse_filter, BoardFilter, FilterTerm, SortKey, SortSpec};
pub use evaluator::{filter_orders, sort_orders, FilterContext, DEFAULT_URGENT_DAYS};
