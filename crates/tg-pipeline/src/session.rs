//! A document wired to a render pipeline.

use std::sync::Arc;

use tg_core::{DiagramRenderer, EntityId, RasterImage, RenderState};
use tg_parser::DocumentScan;

use crate::document::{ChecklistEntry, Document};
use crate::pipeline::RenderPipeline;

/// Every mutation regenerates the description and forwards it to the
/// pipeline. Nothing here blocks except the explicit `wait_*` calls.
pub struct Session {
    document: Document,
    pipeline: RenderPipeline,
}

impl Session {
    #[must_use]
    pub fn new(renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            document: Document::new(),
            pipeline: RenderPipeline::new(renderer),
        }
    }

    /// Start a session over `text` and request its first render.
    #[must_use]
    pub fn with_text(renderer: Arc<dyn DiagramRenderer>, text: impl Into<String>) -> Self {
        let mut session = Self::new(renderer);
        session.set_text(text);
        session
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub const fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> DocumentScan {
        let scan = self.document.set_text(text);
        self.refresh();
        scan
    }

    pub fn append_line(&mut self, line: &str) -> DocumentScan {
        let scan = self.document.append_line(line);
        self.refresh();
        scan
    }

    pub fn remove_line(&mut self, number: usize) -> Option<String> {
        let removed = self.document.remove_line(number)?;
        self.refresh();
        Some(removed)
    }

    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Option<bool> {
        let previous = self.document.set_enabled(id, enabled);
        self.refresh();
        previous
    }

    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let flipped = self.document.toggle(label)?;
        self.refresh();
        Some(flipped)
    }

    pub fn reset(&mut self) {
        self.document.reset();
        self.refresh();
    }

    /// Regenerate and request a render. Returns whether a new generation
    /// started.
    pub fn refresh(&mut self) -> bool {
        let source = self.document.source();
        self.pipeline.request(&source)
    }

    pub fn poll(&mut self) -> bool {
        self.pipeline.poll()
    }

    pub fn wait_current(&mut self) -> &RenderState {
        self.pipeline.wait_current()
    }

    pub fn wait_all(&mut self) -> &RenderState {
        self.pipeline.wait_all()
    }

    #[must_use]
    pub const fn state(&self) -> &RenderState {
        self.pipeline.state()
    }

    #[must_use]
    pub fn last_image(&self) -> Option<&Arc<RasterImage>> {
        self.pipeline.last_image()
    }

    #[must_use]
    pub fn checklist(&self) -> Vec<ChecklistEntry> {
        self.document.checklist()
    }

    #[must_use]
    pub fn source(&self) -> String {
        self.document.source()
    }
}
