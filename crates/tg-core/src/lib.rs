#![forbid(unsafe_code)]

pub mod format;
mod raster;
mod registry;

pub use raster::RasterImage;
pub use registry::{RegistrySnapshot, ToggleRegistry};

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Label of one entity in the relationship list.
///
/// Labels are trimmed on construction and never empty, so an empty operand
/// such as the right side of `"A ->"` can never be registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed relationship as typed on one line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: EntityId,
    pub target: EntityId,
}

impl Edge {
    #[must_use]
    pub const fn new(source: EntityId, target: EntityId) -> Self {
        Self { source, target }
    }

    #[must_use]
    pub fn is_self_relation(&self) -> bool {
        self.source == self.target
    }
}

/// Identity of one generated description. Results computed for any other key
/// are stale.
pub type GenerationKey = Arc<str>;

#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("line {line}: expected `@startuml` before any statement")]
    MissingStart { line: usize },
    #[error("description ended without `@enduml`")]
    MissingEnd,
    #[error("line {line}: unexpected content after `@enduml`")]
    TrailingContent { line: usize },
    #[error("line {line}: unsupported directive `{directive}`")]
    UnsupportedDirective { line: usize, directive: String },
    #[error("line {line}: unrecognized statement `{statement}`")]
    UnknownStatement { line: usize, statement: String },
    #[error("line {line}: relation refers to undeclared node `{label}`")]
    UndeclaredNode { line: usize, label: String },
}

impl DescriptionError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingStart { .. } => "description/missing-start",
            Self::MissingEnd => "description/missing-end",
            Self::TrailingContent { .. } => "description/trailing-content",
            Self::UnsupportedDirective { .. } => "description/unsupported-directive",
            Self::UnknownStatement { .. } => "description/unknown-statement",
            Self::UndeclaredNode { .. } => "description/undeclared-node",
        }
    }

    /// 1-based line the error points at, if it points at one.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::MissingEnd => None,
            Self::MissingStart { line }
            | Self::TrailingContent { line }
            | Self::UnsupportedDirective { line, .. }
            | Self::UnknownStatement { line, .. }
            | Self::UndeclaredNode { line, .. } => Some(*line),
        }
    }
}

#[derive(Debug, Clone, Serialize, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid diagram description: {0}")]
    Description(#[from] DescriptionError),
    #[error("diagram needs {width}x{height} cells, limit is {max_width}x{max_height}")]
    TooLarge {
        width: usize,
        height: usize,
        max_width: usize,
        max_height: usize,
    },
    #[error("renderer panicked: {0}")]
    Panicked(String),
    #[error("failed to start render worker: {0}")]
    Spawn(String),
    #[error("{0}")]
    Backend(String),
}

/// The rendering collaborator: description text in, raster image out.
///
/// Implementations run on background threads and must not rely on being
/// called from any particular thread.
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<RasterImage, RenderError>;

    /// Short name used in log output.
    fn name(&self) -> &'static str {
        "renderer"
    }
}

/// Visible state of the render pipeline.
#[derive(Debug, Clone, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering {
        key: GenerationKey,
    },
    Ready {
        key: GenerationKey,
        image: Arc<RasterImage>,
    },
    Failed {
        key: GenerationKey,
        error: RenderError,
    },
}

impl RenderState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rendering { .. } => "rendering",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Rendering { key } | Self::Ready { key, .. } | Self::Failed { key, .. } => {
                Some(key.as_ref())
            }
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Rendering { .. })
    }

    #[must_use]
    pub fn image(&self) -> Option<&RasterImage> {
        match self {
            Self::Ready { image, .. } => Some(image.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&RenderError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
