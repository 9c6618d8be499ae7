#![forbid(unsafe_code)]

//! Readers for the two text formats of togglegraph: the user's edge list
//! (`A -> B` per line) and the generated diagram description.

mod description;

use serde::Serialize;
use tg_core::{Edge, EntityId};
use tracing::trace;

pub use description::{DescribedNode, DescribedRelation, DiagramDescription, parse_description};

/// Delimiter between the two endpoints of a relationship line.
pub const RELATION_DELIMITER: &str = "->";

/// Why a non-blank line did not yield a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The delimiter does not appear at all.
    NoDelimiter,
    /// The delimiter appears more than once.
    TooManyDelimiters,
    /// One side of the delimiter is empty after trimming.
    EmptyOperand,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoDelimiter => "no `->` delimiter",
            Self::TooManyDelimiters => "more than one `->` delimiter",
            Self::EmptyOperand => "empty endpoint",
        }
    }
}

/// Split `line` on the delimiter and trim both sides.
///
/// Returns `None` unless the split yields exactly two parts. The parts may be
/// empty.
#[must_use]
pub fn split_relation(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(RELATION_DELIMITER);
    let left = parts.next()?;
    let right = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((left.trim(), right.trim()))
}

/// Classify one line as a relationship or say why it is not one.
pub fn classify_line(line: &str) -> Result<Edge, SkipReason> {
    let delimiters = line.matches(RELATION_DELIMITER).count();
    if delimiters == 0 {
        return Err(SkipReason::NoDelimiter);
    }
    let Some((left, right)) = split_relation(line) else {
        return Err(SkipReason::TooManyDelimiters);
    };
    match (EntityId::new(left), EntityId::new(right)) {
        (Some(source), Some(target)) => Ok(Edge::new(source, target)),
        _ => Err(SkipReason::EmptyOperand),
    }
}

/// Candidate relationship for one line, or `None` for any malformed shape.
#[must_use]
pub fn parse_candidate(line: &str) -> Option<Edge> {
    classify_line(line).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCandidate {
    /// 1-based line number.
    pub line: usize,
    pub edge: Edge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: SkipReason,
    pub text: String,
}

/// Result of scanning a whole document, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentScan {
    pub candidates: Vec<LineCandidate>,
    pub skipped: Vec<SkippedLine>,
}

impl DocumentScan {
    /// Every endpoint in line order, source before target.
    pub fn endpoints(&self) -> impl Iterator<Item = &EntityId> {
        self.candidates
            .iter()
            .flat_map(|candidate| [&candidate.edge.source, &candidate.edge.target])
    }
}

/// Run [`classify_line`] over every line of `text`. Blank lines are ignored.
#[must_use]
pub fn scan_document(text: &str) -> DocumentScan {
    let mut scan = DocumentScan::default();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }
        match classify_line(raw) {
            Ok(edge) => scan.candidates.push(LineCandidate { line, edge }),
            Err(reason) => {
                trace!(line, reason = reason.as_str(), "skipping line");
                scan.skipped.push(SkippedLine {
                    line,
                    reason,
                    text: raw.to_string(),
                });
            }
        }
    }
    scan
}
