//! Filter parser for board columns
//!
//! Turns command-line tokens into a [`BoardFilter`]. All terms are combined with AND.
//!
//! # Terms
//!
//! ```text
//! +overdue / -overdue        due date before today (or not)
//! +urgent / -urgent          due within the urgent window (or not)
//! search=<text>              substring of order number, customer, item or assignee
//! <text>                     same as search=<text>
//! priority=high,medium       any of the listed priorities
//! assignee=<name>            exact assignee, case-insensitive ("unassigned" matches blanks)
//! customer=<text>            substring of the customer name
//! stage=<id>,<id>            any of the listed stage ids
//! sort=due|-due|priority|-priority|progress|-progress
//! ```
//!
//! # Example
//!
//! ```
//! use benchboard::filter::parse_filter;
//!
//! let filter = parse_filter(vec!["+urgent".to_string(), "sort=due".to_string()]).unwrap();
//! assert_eq!(filter.terms.len(), 1);
//! ```

use crate::models::Priority;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    Search(String),
    Overdue(bool),
    Urgent(bool),
    Priority(Vec<Priority>),
    Assignee(String),
    Customer(String),
    Stage(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Due,
    Priority,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub descending: bool,
}

/// Parsed per-column filter: a conjunction of terms plus an optional sort
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardFilter {
    pub terms: Vec<FilterTerm>,
    pub sort: Option<SortSpec>,
}

impl BoardFilter {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.sort.is_none()
    }
}

/// Known filter keys (exact match only)
const FILTER_KEYS: &[&str] = &["search", "priority", "assignee", "customer", "stage", "sort"];

/// Parse filter tokens into a BoardFilter
pub fn parse_filter(tokens: Vec<String>) -> Result<BoardFilter, String> {
    let mut filter = BoardFilter::default();
    let mut words: Vec<String> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Some(flag) = token.strip_prefix('+') {
            filter.terms.push(parse_flag(flag, true)?);
            continue;
        }
        if let Some(flag) = token.strip_prefix('-') {
            filter.terms.push(parse_flag(flag, false)?);
            continue;
        }

        if let Some((key, value)) = token.split_once('=') {
            let key_lower = key.trim().to_lowercase();
            if !FILTER_KEYS.contains(&key_lower.as_str()) {
                return Err(format!("Unknown filter field '{}'. Known fields: {}", key, FILTER_KEYS.join(", ")));
            }
            let value = value.trim();
            if value.is_empty() {
                return Err(format!("Filter '{}' needs a value", key_lower));
            }
            match key_lower.as_str() {
                "search" => filter.terms.push(FilterTerm::Search(value.to_string())),
                "priority" => {
                    let mut priorities = Vec::new();
                    for part in value.split(',') {
                        let priority = Priority::from_str(part)
                            .ok_or_else(|| format!("Invalid priority '{}'. Use high, medium or low.", part.trim()))?;
                        priorities.push(priority);
                    }
                    filter.terms.push(FilterTerm::Priority(priorities));
                }
                "assignee" => filter.terms.push(FilterTerm::Assignee(value.to_string())),
                "customer" => filter.terms.push(FilterTerm::Customer(value.to_string())),
                "stage" => {
                    let ids = value.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect();
                    filter.terms.push(FilterTerm::Stage(ids));
                }
                "sort" => filter.sort = Some(parse_sort(value)?),
                _ => unreachable!("key checked against FILTER_KEYS"),
            }
            continue;
        }

        words.push(token.to_string());
    }

    // Bare words form one search phrase
    if !words.is_empty() {
        filter.terms.push(FilterTerm::Search(words.join(" ")));
    }

    Ok(filter)
}

fn parse_flag(flag: &str, positive: bool) -> Result<FilterTerm, String> {
    match flag.to_lowercase().as_str() {
        "overdue" => Ok(FilterTerm::Overdue(positive)),
        "urgent" => Ok(FilterTerm::Urgent(positive)),
        other => Err(format!("Unknown toggle '{}'. Use +overdue or +urgent.", other)),
    }
}

fn parse_sort(value: &str) -> Result<SortSpec, String> {
    let (descending, name) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let key = match name.to_lowercase().as_str() {
        "due" | "due_date" | "duedate" => SortKey::Due,
        "priority" => SortKey::Priority,
        "progress" => SortKey::Progress,
        other => return Err(format!("Unknown sort key '{}'. Use due, priority or progress.", other)),
    };
    Ok(SortSpec { key, descending })
}
