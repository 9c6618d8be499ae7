#![forbid(unsafe_code)]

//! The edit-to-diagram pipeline: document state, generation and
//! non-blocking rendering.

mod document;
mod pipeline;
mod session;

pub use document::{ChecklistEntry, Document};
pub use pipeline::RenderPipeline;
pub use session::Session;
pub use tg_core::RenderState;
