//! Reader for the generated diagram-description text.
//!
//! Document structure (markers, blank lines, the layout directive) is handled
//! by the line loop; node declarations and relations go through a chumsky
//! statement parser.

use chumsky::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tg_core::DescriptionError;
use tg_core::format::{END_MARKER, LAYOUT_DIRECTIVE, NODE_KEYWORD, RELATION_ARROW, START_MARKER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribedNode {
    pub label: String,
    /// Line of the first declaration.
    pub line: usize,
    /// How many times the node was declared.
    pub declarations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DescribedRelation {
    pub from: usize,
    pub to: usize,
    pub line: usize,
}

impl DescribedRelation {
    #[must_use]
    pub const fn is_self_relation(&self) -> bool {
        self.from == self.to
    }
}

/// Nodes in first-declaration order and relations in statement order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagramDescription {
    pub nodes: Vec<DescribedNode>,
    pub relations: Vec<DescribedRelation>,
}

impl DiagramDescription {
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|node| node.label.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relations.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Statement<'a> {
    Node(&'a str),
    Relation(&'a str, &'a str),
}

/// Parse a single trimmed statement line.
fn statement_parser<'a>() -> impl Parser<'a, &'a str, Statement<'a>, extra::Err<Rich<'a, char>>> {
    let ws_char = any().filter(|c: &char| *c == ' ' || *c == '\t');
    let required_ws = ws_char.repeated().at_least(1).to(());

    // A label runs until the relation arrow; labels never contain it.
    let label = any()
        .and_is(just(RELATION_ARROW).not())
        .repeated()
        .at_least(1)
        .to_slice();

    let relation = label
        .clone()
        .then_ignore(just(RELATION_ARROW))
        .then(label)
        .then_ignore(end())
        .map(|(from, to): (&str, &str)| Statement::Relation(from.trim(), to.trim()));

    let node = just(NODE_KEYWORD)
        .ignore_then(required_ws)
        .ignore_then(any().repeated().at_least(1).to_slice())
        .then_ignore(end())
        .map(|label: &str| Statement::Node(label.trim()));

    choice((relation, node))
}

fn is_directive(statement: &str) -> bool {
    statement.ends_with(" direction")
        && !statement.contains(RELATION_ARROW)
        && !statement
            .strip_prefix(NODE_KEYWORD)
            .is_some_and(|rest| rest.starts_with([' ', '\t']))
}

#[derive(Default)]
struct DescriptionBuilder {
    description: DiagramDescription,
    index_by_label: FxHashMap<String, usize>,
}

impl DescriptionBuilder {
    fn declare_node(&mut self, label: &str, line: usize) {
        if let Some(&index) = self.index_by_label.get(label) {
            self.description.nodes[index].declarations += 1;
            return;
        }
        let index = self.description.nodes.len();
        self.description.nodes.push(DescribedNode {
            label: label.to_string(),
            line,
            declarations: 1,
        });
        self.index_by_label.insert(label.to_string(), index);
    }

    fn push_relation(&mut self, from: &str, to: &str, line: usize) -> Result<(), DescriptionError> {
        let lookup = |label: &str| {
            self.index_by_label
                .get(label)
                .copied()
                .ok_or_else(|| DescriptionError::UndeclaredNode {
                    line,
                    label: label.to_string(),
                })
        };
        let from = lookup(from)?;
        let to = lookup(to)?;
        self.description
            .relations
            .push(DescribedRelation { from, to, line });
        Ok(())
    }

    fn finish(self) -> DiagramDescription {
        self.description
    }
}

/// Read a diagram description back into nodes and relations.
///
/// The text must open with `@startuml` and close with `@enduml`. Relations may
/// only name nodes declared on an earlier line.
pub fn parse_description(input: &str) -> Result<DiagramDescription, DescriptionError> {
    let mut builder = DescriptionBuilder::default();
    let mut started = false;
    let mut finished = false;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let statement = raw.trim();
        if statement.is_empty() {
            continue;
        }
        if finished {
            return Err(DescriptionError::TrailingContent { line });
        }
        if !started {
            if statement == START_MARKER {
                started = true;
                continue;
            }
            return Err(DescriptionError::MissingStart { line });
        }
        if statement == END_MARKER {
            finished = true;
            continue;
        }
        if is_directive(statement) {
            if statement == LAYOUT_DIRECTIVE {
                continue;
            }
            return Err(DescriptionError::UnsupportedDirective {
                line,
                directive: statement.to_string(),
            });
        }

        let (parsed, errors) = statement_parser().parse(statement).into_output_errors();
        match parsed {
            Some(Statement::Node(label)) if errors.is_empty() && !label.is_empty() => {
                builder.declare_node(label, line);
            }
            Some(Statement::Relation(from, to))
                if errors.is_empty() && !from.is_empty() && !to.is_empty() =>
            {
                builder.push_relation(from, to, line)?;
            }
            _ => {
                return Err(DescriptionError::UnknownStatement {
                    line,
                    statement: statement.to_string(),
                });
            }
        }
    }

    if !started {
        return Err(DescriptionError::MissingStart { line: 1 });
    }
    if !finished {
        return Err(DescriptionError::MissingEnd);
    }
    Ok(builder.finish())
}
