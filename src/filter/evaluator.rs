//! Filter evaluator
//!
//! Applies a [`BoardFilter`] to a column's work orders. Filtering never mutates
//! the orders; it returns the visible subset in display order.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::filter::parser::{BoardFilter, FilterTerm, SortKey, SortSpec};
use crate::models::WorkOrder;

/// Default number of days ahead that counts as urgent
pub const DEFAULT_URGENT_DAYS: i64 = 3;

/// Evaluation context: the date filters are relative to
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub today: NaiveDate,
    pub urgent_days: i64,
}

impl FilterContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today, urgent_days: DEFAULT_URGENT_DAYS }
    }
}

impl FilterTerm {
    pub fn matches(&self, order: &WorkOrder, ctx: &FilterContext) -> bool {
        match self {
            FilterTerm::Search(text) => {
                let needle = text.to_lowercase();
                [
                    order.order_number.as_str(),
                    order.customer_name.as_str(),
                    order.item_description.as_str(),
                    order.assigned_to.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            FilterTerm::Overdue(positive) => order.is_overdue(ctx.today) == *positive,
            FilterTerm::Urgent(positive) => order.is_urgent(ctx.today, ctx.urgent_days) == *positive,
            FilterTerm::Priority(priorities) => priorities.contains(&order.priority),
            FilterTerm::Assignee(name) => order.assignee_label().eq_ignore_ascii_case(name.trim()),
            FilterTerm::Customer(text) => order
                .customer_name
                .to_lowercase()
                .contains(&text.to_lowercase()),
            FilterTerm::Stage(ids) => ids.iter().any(|id| id == &order.current_stage),
        }
    }
}

impl BoardFilter {
    pub fn matches(&self, order: &WorkOrder, ctx: &FilterContext) -> bool {
        self.terms.iter().all(|term| term.matches(order, ctx))
    }
}

/// Select the orders matching `filter`, sorted if the filter asks for it
pub fn filter_orders<'a>(orders: &[&'a WorkOrder], filter: &BoardFilter, ctx: &FilterContext) -> Vec<&'a WorkOrder> {
    let mut visible: Vec<&WorkOrder> = orders
        .iter()
        .copied()
        .filter(|o| filter.matches(o, ctx))
        .collect();
    if let Some(spec) = filter.sort {
        sort_orders(&mut visible, spec);
    }
    visible
}

/// Stable sort; missing due dates always go last
pub fn sort_orders(orders: &mut [&WorkOrder], spec: SortSpec) {
    orders.sort_by(|a, b| {
        let ordering = match spec.key {
            SortKey::Due => return compare_due(a, b, spec.descending),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Progress => a.progress.cmp(&b.progress),
        };
        if spec.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_due(a: &WorkOrder, b: &WorkOrder, descending: bool) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => {
            if descending {
                y.cmp(&x)
            } else {
                x.cmp(&y)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filter;
    use crate::models::Priority;
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn order(number: &str, due_offset: Option<i64>, priority: Priority) -> WorkOrder {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        let mut o = WorkOrder::new(number, "Helena Voss", "Sapphire halo ring", "design", now);
        o.due_date = due_offset.map(|d| today() + Duration::days(d));
        o.priority = priority;
        o
    }

    fn run(orders: &[WorkOrder], tokens: &[&str]) -> Vec<String> {
        let filter = parse_filter(tokens.iter().map(|s| s.to_string()).collect()).unwrap();
        let refs: Vec<&WorkOrder> = orders.iter().collect();
        filter_orders(&refs, &filter, &FilterContext::new(today()))
            .into_iter()
            .map(|o| o.order_number.clone())
            .collect()
    }

    #[test]
    fn test_overdue_and_urgent() {
        let orders = vec![
            order("A", Some(-2), Priority::Low),
            order("B", Some(1), Priority::Low),
            order("C", Some(10), Priority::Low),
            order("D", None, Priority::Low),
        ];
        assert_eq!(run(&orders, &["+overdue"]), vec!["A"]);
        assert_eq!(run(&orders, &["+urgent"]), vec!["B"]);
        assert_eq!(run(&orders, &["-overdue", "-urgent"]), vec!["C", "D"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut orders = vec![order("JW-001", None, Priority::Low), order("JW-002", None, Priority::Low)];
        orders[1].item_description = "Emerald pendant".to_string();
        orders[1].customer_name = "Rui".to_string();
        assert_eq!(run(&orders, &["EMERALD"]), vec!["JW-002"]);
        assert_eq!(run(&orders, &["search=jw-001"]), vec!["JW-001"]);
        assert!(run(&orders, &["platinum"]).is_empty());
    }

    #[test]
    fn test_sort_due_puts_missing_last() {
        let orders = vec![
            order("none", None, Priority::Low),
            order("late", Some(9), Priority::Low),
            order("soon", Some(1), Priority::Low),
        ];
        assert_eq!(run(&orders, &["sort=due"]), vec!["soon", "late", "none"]);
        assert_eq!(run(&orders, &["sort=-due"]), vec!["late", "soon", "none"]);
    }

    #[test]
    fn test_sort_priority() {
        let orders = vec![
            order("low", None, Priority::Low),
            order("high", None, Priority::High),
            order("med", None, Priority::Medium),
        ];
        assert_eq!(run(&orders, &["sort=priority"]), vec!["high", "med", "low"]);
        assert_eq!(run(&orders, &["priority=high,medium", "sort=-priority"]), vec!["med", "high"]);
    }

    #[test]
    fn test_assignee_unassigned() {
        let mut orders = vec![order("A", None, Priority::Low), order("B", None, Priority::Low)];
        orders[0].assigned_to = "Mara".to_string();
        assert_eq!(run(&orders, &["assignee=unassigned"]), vec!["B"]);
        assert_eq!(run(&orders, &["assignee=MARA"]), vec!["A"]);
    }

    #[test]
    fn test_filter_does_not_mutate() {
        let orders = vec![order("A", Some(-1), Priority::High)];
        let before = orders.clone();
        let _ = run(&orders, &["+overdue", "sort=due"]);
        assert_eq!(orders, before);
    }
}
