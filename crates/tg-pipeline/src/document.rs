//! The edited document: relationship text plus its toggle registry.

use rustc_hash::FxHashSet;
use serde::Serialize;
use tg_core::{EntityId, RegistrySnapshot, ToggleRegistry};
use tg_parser::{DocumentScan, scan_document};
use tg_source::generate;
use tracing::{debug, trace};

/// One row of the entity checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistEntry {
    pub id: EntityId,
    pub enabled: bool,
    /// Whether the label still appears as an endpoint in the current text.
    pub in_text: bool,
}

/// Text and registry, mutated only by the interactive thread.
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    registry: ToggleRegistry,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut document = Self::new();
        document.set_text(text);
        document
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn registry(&self) -> &ToggleRegistry {
        &self.registry
    }

    /// Replace the text and register every endpoint in line order. Known
    /// labels keep their flag.
    pub fn set_text(&mut self, text: impl Into<String>) -> DocumentScan {
        self.text = text.into();
        let scan = scan_document(&self.text);
        let mut added = 0_usize;
        for id in scan.endpoints() {
            if self.registry.ensure(id) {
                trace!(id = id.as_str(), "registered entity");
                added += 1;
            }
        }
        debug!(
            candidates = scan.candidates.len(),
            skipped = scan.skipped.len(),
            added,
            "document text updated"
        );
        scan
    }

    /// Append `line` as a new last line.
    pub fn append_line(&mut self, line: &str) -> DocumentScan {
        let mut text = std::mem::take(&mut self.text);
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(line);
        self.set_text(text)
    }

    /// Remove the 1-based line `number` and return it.
    pub fn remove_line(&mut self, number: usize) -> Option<String> {
        let mut lines: Vec<&str> = self.text.lines().collect();
        if number == 0 || number > lines.len() {
            return None;
        }
        let removed = lines.remove(number - 1).to_string();
        let text = lines.join("\n");
        self.set_text(text);
        Some(removed)
    }

    /// Explicit user choice for `id`. Returns the previous flag.
    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Option<bool> {
        debug!(id = id.as_str(), enabled, "toggle set");
        self.registry.set(id, enabled)
    }

    /// Flip a known entity. Unknown labels are left alone.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let flipped = self.registry.toggle(label);
        debug!(label, enabled = ?flipped, "toggle flipped");
        flipped
    }

    /// Host reset: empty text and a fresh registry.
    pub fn reset(&mut self) {
        self.text.clear();
        self.registry.clear();
        debug!("document reset");
    }

    #[must_use]
    pub fn scan(&self) -> DocumentScan {
        scan_document(&self.text)
    }

    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Diagram description for the current text and toggles.
    #[must_use]
    pub fn source(&self) -> String {
        generate(&self.text, &self.snapshot())
    }

    /// Every registered entity in first-sight order.
    #[must_use]
    pub fn checklist(&self) -> Vec<ChecklistEntry> {
        let scan = self.scan();
        let present: FxHashSet<&str> = scan.endpoints().map(EntityId::as_str).collect();
        self.registry
            .iter()
            .map(|(id, enabled)| ChecklistEntry {
                id: id.clone(),
                enabled,
                in_text: present.contains(id.as_str()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(label: &str) -> EntityId {
        EntityId::new(label).unwrap()
    }

    fn labels(document: &Document) -> Vec<String> {
        document
            .checklist()
            .into_iter()
            .map(|entry| entry.id.to_string())
            .collect()
    }

    #[test]
    fn set_text_seeds_endpoints_in_line_order() {
        let document = Document::with_text("B -> A\nC -> B\nbogus\n-> D");
        assert_eq!(labels(&document), ["B", "A", "C"]);
        assert!(document.registry().is_enabled("A"));
        assert!(!document.registry().is_enabled("D"));
    }

    #[test]
    fn toggles_survive_unrelated_edits() {
        let mut document = Document::with_text("A -> B\nB -> C");
        document.set_enabled(id("B"), false);
        document.set_text("A -> B\nB -> C\nC -> D");
        assert!(!document.registry().is_enabled("B"));
        assert!(document.registry().is_enabled("D"));
        let source = document.source();
        assert!(!source.contains("A --> B"));
        assert!(!source.contains("B --> C"));
        assert!(source.contains("C --> D"));
    }

    #[test]
    fn entries_outlive_their_lines() {
        let mut document = Document::with_text("A -> B");
        document.toggle("B");
        document.set_text("A -> C");
        let checklist = document.checklist();
        let b = checklist.iter().find(|entry| entry.id.as_str() == "B").unwrap();
        assert!(!b.enabled);
        assert!(!b.in_text);
        document.set_text("A -> B");
        assert!(!document.registry().is_enabled("B"));
    }

    #[test]
    fn empty_text_does_not_reset_registry() {
        let mut document = Document::with_text("A -> B");
        document.set_enabled(id("A"), false);
        document.set_text("");
        assert_eq!(document.registry().len(), 2);
        assert_eq!(document.registry().get("A"), Some(false));
    }

    #[test]
    fn reset_reinitializes_registry() {
        let mut document = Document::with_text("A -> B");
        document.set_enabled(id("A"), false);
        document.reset();
        assert!(document.registry().is_empty());
        assert_eq!(document.text(), "");
        document.set_text("A -> B");
        assert!(document.registry().is_enabled("A"));
    }

    #[test]
    fn append_and_remove_lines() {
        let mut document = Document::new();
        document.append_line("A -> B");
        document.append_line("B -> C");
        assert_eq!(document.text(), "A -> B\nB -> C");
        assert_eq!(document.remove_line(1).as_deref(), Some("A -> B"));
        assert_eq!(document.text(), "B -> C");
        assert_eq!(document.remove_line(0), None);
        assert_eq!(document.remove_line(5), None);
        assert!(document.registry().is_enabled("A"));
    }

    #[test]
    fn toggle_unknown_label_is_ignored() {
        let mut document = Document::with_text("A -> B");
        assert_eq!(document.toggle("Z"), None);
        assert_eq!(document.registry().len(), 2);
    }

    #[test]
    fn set_enabled_registers_unseen_labels() {
        let mut document = Document::new();
        assert_eq!(document.set_enabled(id("Later"), false), None);
        document.set_text("Later -> Now");
        assert!(!document.registry().is_enabled("Later"));
        assert!(document.registry().is_enabled("Now"));
    }

    #[test]
    fn source_follows_toggles() {
        let mut document = Document::with_text("A -> B");
        let enabled = document.source();
        assert!(enabled.contains("A --> B"));
        document.toggle("A");
        assert_eq!(document.source(), "@startuml\nleft to right direction\n@enduml");
        document.toggle("A");
        assert_eq!(document.source(), enabled);
    }

    #[test]
    fn checklist_serializes_plainly() {
        let document = Document::with_text("A -> B");
        let json = serde_json::to_string(&document.checklist()).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"A","enabled":true,"in_text":true},{"id":"B","enabled":true,"in_text":true}]"#
        );
    }
}
