#![forbid(unsafe_code)]

//! Terminal rendering of diagram descriptions.
//!
//! Nodes are laid out left to right by rank and drawn as rounded boxes on a
//! [`RasterImage`](tg_core::RasterImage) character grid.

pub mod config;
pub mod glyphs;
pub mod layout;
pub mod renderer;

pub use config::TermRenderConfig;
pub use glyphs::GlyphMode;
pub use renderer::{RenderStats, TermDiagramRenderer, TermRender};

/// Render `source` with `config`.
pub fn render_source(
    source: &str,
    config: TermRenderConfig,
) -> Result<TermRender, tg_core::RenderError> {
    TermDiagramRenderer::new(config).render_source(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tg_core::{RenderError, ToggleRegistry};
    use tg_parser::scan_document;
    use tg_source::generate;

    fn unbounded() -> TermRenderConfig {
        TermRenderConfig {
            max_width: usize::MAX,
            max_height: usize::MAX,
            ..TermRenderConfig::default()
        }
    }

    fn source_for(text: &str) -> String {
        let mut registry = ToggleRegistry::new();
        for id in scan_document(text).endpoints() {
            registry.ensure(id);
        }
        generate(text, &registry.snapshot())
    }

    #[test]
    fn renders_generated_description() {
        let render = render_source(&source_for("A -> B\nB -> C\nC -> A"), unbounded()).unwrap();
        let text = render.image.to_string();
        for label in ["A", "B", "C"] {
            assert!(text.contains(&format!("│ {label} │")), "{text}");
        }
        assert_eq!(render.stats.rank_count, 3);
        assert_eq!(render.stats.lane_count, 1);
    }

    #[test]
    fn default_limits_reject_huge_diagrams() {
        let text: String = (0..60).map(|i| format!("n{i} -> n{}\n", i + 1)).collect();
        let error = render_source(&source_for(&text), TermRenderConfig::default()).unwrap_err();
        assert!(matches!(error, RenderError::TooLarge { .. }));
    }

    fn document() -> impl Strategy<Value = String> {
        let label = "[A-Za-z][A-Za-z0-9_]{0,5}";
        prop::collection::vec((label, label), 0..10).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(left, right)| format!("{left} -> {right}"))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    proptest! {
        #[test]
        fn every_node_label_is_visible(text in document()) {
            let source = source_for(&text);
            let render = render_source(&source, unbounded()).unwrap();
            let drawn = render.image.to_string();
            for id in scan_document(&text).endpoints() {
                let boxed = format!("│ {} │", id.as_str());
                prop_assert!(drawn.contains(&boxed), "{}\n{}", boxed, drawn);
            }
        }

        #[test]
        fn rendering_is_deterministic(text in document()) {
            let source = source_for(&text);
            let first = render_source(&source, unbounded()).unwrap();
            let second = render_source(&source, unbounded()).unwrap();
            prop_assert_eq!(first.image, second.image);
            prop_assert_eq!(first.stats, second.stats);
        }
    }
}
