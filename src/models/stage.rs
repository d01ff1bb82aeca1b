use serde::{Deserialize, Serialize};

/// A production pipeline stage.
///
/// `id` is fixed when the stage is created; `name` is the display label and may
/// be renamed freely. `original_name` remembers the label the stage was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub original_name: String,
    pub wip_limit: u32,
}

impl Stage {
    pub fn new(id: &str, name: &str, wip_limit: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            original_name: name.to_string(),
            wip_limit,
        }
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.original_name
    }

    /// Match by id or display name (case-insensitive)
    pub fn matches_ref(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.id.eq_ignore_ascii_case(reference) || self.name.eq_ignore_ascii_case(reference)
    }
}

/// Default workshop pipeline (id, name, WIP limit)
pub const DEFAULT_STAGES: &[(&str, &str, u32)] = &[
    ("design", "Design", 5),
    ("casting", "Casting", 4),
    ("setting", "Stone Setting", 3),
    ("polishing", "Polishing", 4),
    ("quality-check", "Quality Check", 3),
    ("ready", "Ready", 10),
];

/// Build the default stage list
pub fn default_stages() -> Vec<Stage> {
    DEFAULT_STAGES
        .iter()
        .map(|(id, name, limit)| Stage::new(id, name, *limit))
        .collect()
}

/// Turn a display name into an id slug ("Stone Setting" -> "stone-setting")
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "stage".to_string()
    } else {
        slug
    }
}
