//! Sample work-order generator
//!
//! Produces a believable workshop load for demos and for the fallback when no
//! work-order file exists. A fixed seed always yields the same set.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Priority, Stage, StageHistoryEntry, WorkOrder};

pub const DEFAULT_SAMPLE_COUNT: usize = 24;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

const CUSTOMERS: &[&str] = &[
    "Helena Voss", "Amara Okafor", "Luis Ferreira", "Mei Tanaka", "Sofia Lindqvist",
    "Daniel Cohen", "Priya Raman", "Jonas Becker", "Chloe Martin", "Omar Haddad",
];

const ITEMS: &[&str] = &[
    "18k gold solitaire engagement ring",
    "Platinum wedding band, brushed finish",
    "Sapphire halo pendant",
    "Emerald drop earrings",
    "Sterling silver cuff bracelet",
    "Custom signet ring with family crest",
    "Pearl strand necklace restring",
    "Rose gold tennis bracelet",
    "Diamond stud earrings, 1ct total",
    "Vintage brooch restoration",
];

const CRAFTSPEOPLE: &[&str] = &["Mara Ilic", "Tomas Reyes", "Aiko Sato", "Ben Carter", "Lena Novak"];

const NOTES: &[&str] = &[
    "Customer wants a matte finish",
    "Stones supplied by customer",
    "Rush order for anniversary",
    "Engraving text confirmed by email",
];

/// Generate `count` orders spread over `stages`
pub fn generate_sample_orders(stages: &[Stage], count: usize, seed: u64, now: DateTime<Utc>) -> Vec<WorkOrder> {
    if stages.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let today = now.date_naive();
    let year = now.format("%Y").to_string();

    (0..count)
        .map(|n| {
            let stage_idx = rng.gen_range(0..stages.len());
            let stage = &stages[stage_idx];
            let time_in_stage = rng.gen_range(1..=72) as f64;

            // Closed entries for the stages before the current one, walking back in time
            let current_entered = now - Duration::hours(time_in_stage as i64);
            let mut history = vec![StageHistoryEntry::open(&stage.id, current_entered)];
            let mut cursor = current_entered;
            for previous in stages[..stage_idx].iter().rev() {
                let hours = rng.gen_range(4..=48);
                let entered = cursor - Duration::hours(hours);
                history.push(StageHistoryEntry {
                    stage: previous.id.clone(),
                    entered_at: entered,
                    exited_at: Some(cursor),
                });
                cursor = entered;
            }
            history.reverse();

            let priority = match rng.gen_range(0..10) {
                0..=2 => Priority::High,
                3..=7 => Priority::Medium,
                _ => Priority::Low,
            };
            let progress = ((stage_idx * 100) / stages.len()) as u8 + rng.gen_range(0..10u8);

            WorkOrder {
                id: format!("wo-{:04}", n + 1),
                order_number: format!("JW-{}-{:04}", year, n + 1),
                customer_name: pick(&mut rng, CUSTOMERS),
                item_description: pick(&mut rng, ITEMS),
                current_stage: stage.id.clone(),
                due_date: Some(today + Duration::days(rng.gen_range(-5..=30))),
                priority,
                assigned_to: pick(&mut rng, CRAFTSPEOPLE),
                time_in_stage,
                progress: progress.min(100),
                notes: if rng.gen_bool(0.3) { Some(pick(&mut rng, NOTES)) } else { None },
                stage_history: history,
            }
        })
        .collect()
}

fn pick(rng: &mut StdRng, items: &[&str]) -> String {
    items.choose(rng).copied().unwrap_or_default().to_string()
}
