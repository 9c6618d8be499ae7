#![forbid(unsafe_code)]

//! Diagram-description generation from the edge list and a toggle snapshot.

use tg_core::RegistrySnapshot;
use tg_core::format::{END_MARKER, LAYOUT_DIRECTIVE, NODE_KEYWORD, RELATION_ARROW, START_MARKER};
use tg_parser::split_relation;
use tracing::{debug, trace};

/// Generate the description for `text` under `toggles`.
///
/// A line contributes a block only when it splits into exactly two parts and
/// both parts are registered and enabled. Output is a pure function of the
/// two inputs.
#[must_use]
pub fn generate(text: &str, toggles: &RegistrySnapshot) -> String {
    let mut body = String::new();
    let mut blocks = 0_usize;

    for (index, line) in text.lines().enumerate() {
        let Some((source, target)) = split_relation(line) else {
            continue;
        };
        if !toggles.is_enabled(source) || !toggles.is_enabled(target) {
            trace!(line = index + 1, source, target, "relation not emitted");
            continue;
        }
        push_block(&mut body, source, target);
        blocks += 1;
    }

    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(START_MARKER);
    out.push('\n');
    out.push_str(LAYOUT_DIRECTIVE);
    out.push('\n');
    out.push_str(&body);
    out.push_str(END_MARKER);

    debug!(blocks, bytes = out.len(), "generated diagram description");
    out.trim().to_string()
}

fn push_block(body: &mut String, source: &str, target: &str) {
    push_node(body, source);
    if source != target {
        push_node(body, target);
    }
    body.push_str(source);
    body.push(' ');
    body.push_str(RELATION_ARROW);
    body.push(' ');
    body.push_str(target);
    body.push_str("\n\n");
}

fn push_node(body: &mut String, label: &str) {
    body.push_str(NODE_KEYWORD);
    body.push(' ');
    body.push_str(label);
    body.push('\n');
}
