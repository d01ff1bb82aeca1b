//! Stage registry and pipeline customizer
//!
//! The registry keeps two ordered lists: the active stages (board columns, left to
//! right) and the removed stages. Removing a stage keeps its id, name and WIP
//! limit so that restoring it brings back the same column.
//!
//! Stage identity never depends on the display name. Renaming only touches `name`,
//! so column ids and deep links keep resolving after a rename.

use std::collections::BTreeMap;

use crate::models::{default_stages, slugify, Stage};
use crate::pipeline::error::BoardError;

/// WIP limit given to custom stages when none is configured
pub const DEFAULT_CUSTOM_WIP_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct StageRegistry {
    active: Vec<Stage>,
    removed: Vec<Stage>,
    default_wip_limit: u32,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_CUSTOM_WIP_LIMIT)
    }
}

impl StageRegistry {
    /// Registry initialised from the fixed default pipeline
    pub fn with_defaults(default_wip_limit: u32) -> Self {
        Self {
            active: default_stages(),
            removed: Vec::new(),
            default_wip_limit: default_wip_limit.max(1),
        }
    }

    /// Registry from explicit lists (used when loading from the ledger)
    pub fn from_parts(active: Vec<Stage>, removed: Vec<Stage>, default_wip_limit: u32) -> Self {
        Self {
            active,
            removed,
            default_wip_limit: default_wip_limit.max(1),
        }
    }

    pub fn active(&self) -> &[Stage] {
        &self.active
    }

    pub fn removed(&self) -> &[Stage] {
        &self.removed
    }

    pub fn default_wip_limit(&self) -> u32 {
        self.default_wip_limit
    }

    /// Display names of the active stages, in board order
    pub fn visible_stage_names(&self) -> Vec<String> {
        self.active.iter().map(|s| s.name.clone()).collect()
    }

    pub fn contains_active(&self, stage_id: &str) -> bool {
        self.active.iter().any(|s| s.id == stage_id)
    }

    pub fn get(&self, stage_id: &str) -> Option<&Stage> {
        self.active.iter().find(|s| s.id == stage_id)
    }

    /// Position of an active stage in board order
    pub fn position(&self, stage_id: &str) -> Option<usize> {
        self.active.iter().position(|s| s.id == stage_id)
    }

    /// Find an active stage by id first, then by display name
    pub fn find(&self, reference: &str) -> Option<&Stage> {
        let reference = reference.trim();
        self.active
            .iter()
            .find(|s| s.id == reference)
            .or_else(|| self.active.iter().find(|s| s.matches_ref(reference)))
    }

    /// Like `find`, but also searches removed stages. Ids win over display names.
    pub fn lookup(&self, reference: &str) -> Option<&Stage> {
        let reference = reference.trim();
        let mut all = self.active.iter().chain(self.removed.iter());
        all.clone()
            .find(|s| s.id == reference)
            .or_else(|| all.find(|s| s.matches_ref(reference)))
    }

    fn find_removed_index(&self, reference: &str) -> Option<usize> {
        let reference = reference.trim();
        self.removed
            .iter()
            .position(|s| s.id == reference)
            .or_else(|| self.removed.iter().position(|s| s.matches_ref(reference)))
    }

    fn find_active_index(&self, reference: &str) -> Option<usize> {
        let reference = reference.trim();
        self.active
            .iter()
            .position(|s| s.id == reference)
            .or_else(|| self.active.iter().position(|s| s.matches_ref(reference)))
    }

    /// Original name -> current display name, for renamed stages only
    pub fn name_mapping(&self) -> BTreeMap<String, String> {
        self.active
            .iter()
            .chain(self.removed.iter())
            .filter(|s| s.is_renamed())
            .map(|s| (s.original_name.clone(), s.name.clone()))
            .collect()
    }

    /// Display label for a stage id, falling back to the id for unknown stages
    pub fn label_for<'a>(&'a self, stage_id: &'a str) -> &'a str {
        self.active
            .iter()
            .chain(self.removed.iter())
            .find(|s| s.id == stage_id)
            .map(|s| s.name.as_str())
            .unwrap_or(stage_id)
    }

    /// Rename a stage; the id stays the same
    pub fn rename(&mut self, reference: &str, new_name: &str) -> Result<&Stage, BoardError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BoardError::EmptyStageName);
        }
        let idx = self
            .find_active_index(reference)
            .ok_or_else(|| BoardError::UnknownStage(reference.to_string()))?;
        let clash = self
            .active
            .iter()
            .enumerate()
            .any(|(i, s)| i != idx && s.name.eq_ignore_ascii_case(new_name));
        if clash {
            return Err(BoardError::DuplicateStageName(new_name.to_string()));
        }
        log::debug!("Renaming stage '{}' to '{}'", self.active[idx].id, new_name);
        self.active[idx].name = new_name.to_string();
        Ok(&self.active[idx])
    }

    /// Move the stage at `from` so it ends up at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), BoardError> {
        let len = self.active.len();
        if from >= len {
            return Err(BoardError::InvalidIndex { index: from, len });
        }
        if to >= len {
            return Err(BoardError::InvalidIndex { index: to, len });
        }
        if from == to {
            return Ok(());
        }
        let stage = self.active.remove(from);
        self.active.insert(to, stage);
        Ok(())
    }

    /// Move a stage to the removed list. Returns false if it was already removed.
    pub fn remove(&mut self, reference: &str) -> Result<bool, BoardError> {
        if let Some(idx) = self.find_active_index(reference) {
            let stage = self.active.remove(idx);
            log::debug!("Removed stage '{}'", stage.id);
            self.removed.push(stage);
            return Ok(true);
        }
        if self.find_removed_index(reference).is_some() {
            return Ok(false);
        }
        Err(BoardError::UnknownStage(reference.to_string()))
    }

    /// Bring a removed stage back at the end of the board. Returns false if it was already active.
    /// Fails if an active stage has taken its display name in the meantime.
    pub fn restore(&mut self, reference: &str) -> Result<bool, BoardError> {
        if let Some(idx) = self.find_removed_index(reference) {
            let name = &self.removed[idx].name;
            if self.active.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
                return Err(BoardError::DuplicateStageName(name.clone()));
            }
            let stage = self.removed.remove(idx);
            log::debug!("Restored stage '{}'", stage.id);
            self.active.push(stage);
            return Ok(true);
        }
        if self.find_active_index(reference).is_some() {
            return Ok(false);
        }
        Err(BoardError::UnknownStage(reference.to_string()))
    }

    /// Append a custom stage with a freshly generated id and the default WIP limit
    pub fn add_custom(&mut self, name: &str) -> Result<&Stage, BoardError> {
        self.add_custom_with_limit(name, self.default_wip_limit)
    }

    pub fn add_custom_with_limit(&mut self, name: &str, wip_limit: u32) -> Result<&Stage, BoardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::EmptyStageName);
        }
        if wip_limit == 0 {
            return Err(BoardError::InvalidWipLimit);
        }
        if self.active.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            return Err(BoardError::DuplicateStageName(name.to_string()));
        }
        let id = self.generate_id(name);
        self.active.push(Stage::new(&id, name, wip_limit));
        let idx = self.active.len() - 1;
        Ok(&self.active[idx])
    }

    pub fn set_wip_limit(&mut self, reference: &str, wip_limit: u32) -> Result<&Stage, BoardError> {
        if wip_limit == 0 {
            return Err(BoardError::InvalidWipLimit);
        }
        let idx = self
            .find_active_index(reference)
            .ok_or_else(|| BoardError::UnknownStage(reference.to_string()))?;
        self.active[idx].wip_limit = wip_limit;
        Ok(&self.active[idx])
    }

    /// Discard all customization
    pub fn reset(&mut self) {
        self.active = default_stages();
        self.removed.clear();
    }

    /// Slug of the name, suffixed until it is unused by any active or removed stage
    fn generate_id(&self, name: &str) -> String {
        let base = slugify(name);
        let taken = |candidate: &str| {
            self.active
                .iter()
                .chain(self.removed.iter())
                .any(|s| s.id == candidate)
        };
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rename_keeps_id() {
        let mut registry = StageRegistry::default();
        let stage = registry.rename("Design", "Concept").unwrap();
        assert_eq!(stage.id, "design");
        assert_eq!(stage.name, "Concept");
        assert_eq!(registry.find("design").unwrap().name, "Concept");
        assert_eq!(registry.find("concept").unwrap().id, "design");
        assert_eq!(registry.label_for("design"), "Concept");
        assert_eq!(registry.name_mapping().get("Design"), Some(&"Concept".to_string()));
    }

    #[test]
    fn test_rename_rejects_duplicates_and_empty() {
        let mut registry = StageRegistry::default();
        assert_eq!(
            registry.rename("design", "casting"),
            Err(BoardError::DuplicateStageName("casting".to_string()))
        );
        assert_eq!(registry.rename("design", "  "), Err(BoardError::EmptyStageName));
        assert!(matches!(registry.rename("nope", "X"), Err(BoardError::UnknownStage(_))));
        // Renaming to the same name with different case is allowed
        assert!(registry.rename("design", "DESIGN").is_ok());
    }

    #[test]
    fn test_reorder() {
        let mut registry = StageRegistry::default();
        registry.reorder(0, 2).unwrap();
        let ids: Vec<&str> = registry.active().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids[..3], ["casting", "setting", "design"]);
        assert_eq!(
            registry.reorder(0, 99),
            Err(BoardError::InvalidIndex { index: 99, len: 6 })
        );
    }

    #[test]
    fn test_remove_restore_round_trip() {
        let mut registry = StageRegistry::default();
        let before: HashSet<String> = registry.visible_stage_names().into_iter().collect();

        assert_eq!(registry.remove("Polishing"), Ok(true));
        assert!(!registry.contains_active("polishing"));
        assert_eq!(registry.removed().len(), 1);

        assert_eq!(registry.restore("polishing"), Ok(true));
        let after: HashSet<String> = registry.visible_stage_names().into_iter().collect();
        assert_eq!(before, after);
        assert!(registry.removed().is_empty());
    }

    #[test]
    fn test_remove_and_restore_are_idempotent() {
        let mut registry = StageRegistry::default();
        assert_eq!(registry.remove("casting"), Ok(true));
        assert_eq!(registry.remove("casting"), Ok(false));
        assert_eq!(registry.removed().len(), 1);
        assert_eq!(registry.restore("casting"), Ok(true));
        assert_eq!(registry.restore("casting"), Ok(false));
        assert_eq!(registry.active().len(), 6);
        assert!(matches!(registry.remove("ghost"), Err(BoardError::UnknownStage(_))));
    }

    #[test]
    fn test_lookup_includes_removed() {
        let mut registry = StageRegistry::default();
        registry.remove("setting").unwrap();
        assert!(registry.find("Stone Setting").is_none());
        assert_eq!(registry.lookup("Stone Setting").map(|s| s.id.as_str()), Some("setting"));
        assert!(registry.lookup("ghost").is_none());

        // A removed stage's id beats an active stage's display name
        registry.add_custom("setting").unwrap();
        assert_eq!(registry.lookup("setting").map(|s| s.id.as_str()), Some("setting"));
        assert_eq!(registry.lookup("Stone Setting").map(|s| s.id.as_str()), Some("setting"));
    }

    #[test]
    fn test_add_custom_generates_unique_id() {
        let mut registry = StageRegistry::with_defaults(7);
        let stage = registry.add_custom("Engraving").unwrap().clone();
        assert_eq!(stage.id, "engraving");
        assert_eq!(stage.wip_limit, 7);

        // Remove it, then add another stage whose slug collides
        registry.remove("engraving").unwrap();
        let second = registry.add_custom("engraving").unwrap().clone();
        assert_eq!(second.id, "engraving-2");

        // Restoring the first keeps its original identity
        registry.rename("engraving-2", "Hand Engraving").unwrap();
        registry.restore("engraving").unwrap();
        assert!(registry.contains_active("engraving"));
        assert!(registry.contains_active("engraving-2"));
    }

    #[test]
    fn test_restore_rejects_name_taken_meanwhile() {
        let mut registry = StageRegistry::default();
        registry.add_custom("Engraving").unwrap();
        registry.remove("engraving").unwrap();
        registry.add_custom("Engraving").unwrap();

        assert_eq!(
            registry.restore("engraving"),
            Err(BoardError::DuplicateStageName("Engraving".to_string()))
        );
        let named = registry.active().iter().filter(|s| s.name == "Engraving").count();
        assert_eq!(named, 1);
        assert_eq!(registry.removed().len(), 1);
        assert_eq!(registry.find("Engraving").map(|s| s.id.as_str()), Some("engraving-2"));
    }

    #[test]
    fn test_add_custom_rejects_existing_name() {
        let mut registry = StageRegistry::default();
        assert!(matches!(
            registry.add_custom("Ready"),
            Err(BoardError::DuplicateStageName(_))
        ));
        assert!(matches!(registry.add_custom(""), Err(BoardError::EmptyStageName)));
    }

    #[test]
    fn test_set_wip_limit() {
        let mut registry = StageRegistry::default();
        assert_eq!(registry.set_wip_limit("setting", 6).unwrap().wip_limit, 6);
        assert_eq!(registry.set_wip_limit("setting", 0), Err(BoardError::InvalidWipLimit));
    }

    #[test]
    fn test_reset() {
        let mut registry = StageRegistry::default();
        registry.rename("design", "Concept").unwrap();
        registry.remove("ready").unwrap();
        registry.reset();
        assert_eq!(registry, StageRegistry::default());
    }
}
