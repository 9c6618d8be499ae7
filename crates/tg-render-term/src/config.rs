//! Terminal renderer configuration.

use serde::{Deserialize, Serialize};

use crate::glyphs::GlyphMode;

/// Smallest column gap that still leaves room for a connector bend.
pub const MIN_COLUMN_GAP: usize = 4;

/// Configuration for terminal diagram rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermRenderConfig {
    /// Glyph mode (Unicode box drawing vs ASCII fallback).
    pub glyphs: GlyphMode,
    /// Maximum label characters before truncation.
    pub max_label_chars: usize,
    /// Blank cells between rank columns.
    pub column_gap: usize,
    /// Blank rows between nodes of one column.
    pub row_gap: usize,
    /// Padding around the diagram (in cells).
    pub padding: usize,
    /// Maximum width in terminal columns.
    pub max_width: usize,
    /// Maximum height in terminal rows.
    pub max_height: usize,
}

impl Default for TermRenderConfig {
    fn default() -> Self {
        Self {
            glyphs: GlyphMode::Unicode,
            max_label_chars: 24,
            column_gap: 6,
            row_gap: 1,
            padding: 1,
            max_width: 200,
            max_height: 80,
        }
    }
}

impl TermRenderConfig {
    /// Create a compact configuration for small terminals.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            max_label_chars: 12,
            column_gap: MIN_COLUMN_GAP,
            row_gap: 0,
            padding: 0,
            max_width: 120,
            max_height: 40,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_glyphs(mut self, glyphs: GlyphMode) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub(crate) fn label_limit(&self) -> usize {
        self.max_label_chars.max(1)
    }

    pub(crate) fn effective_column_gap(&self) -> usize {
        self.column_gap.max(MIN_COLUMN_GAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = TermRenderConfig::default();
        assert!(config.max_width >= 80);
        assert!(config.max_height >= 24);
        assert_eq!(config.glyphs, GlyphMode::Unicode);
    }

    #[test]
    fn compact_is_tighter_than_default() {
        let compact = TermRenderConfig::compact();
        let default = TermRenderConfig::default();
        assert!(compact.max_label_chars < default.max_label_chars);
        assert!(compact.column_gap <= default.column_gap);
        assert_eq!(compact.padding, 0);
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let config = TermRenderConfig {
            max_label_chars: 0,
            column_gap: 1,
            ..TermRenderConfig::default()
        };
        assert_eq!(config.label_limit(), 1);
        assert_eq!(config.effective_column_gap(), MIN_COLUMN_GAP);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: TermRenderConfig =
            serde_json::from_str(r#"{"glyphs":"ascii","padding":0}"#).unwrap();
        assert_eq!(config.glyphs, GlyphMode::Ascii);
        assert_eq!(config.padding, 0);
        assert_eq!(config.max_label_chars, 24);
    }
}
