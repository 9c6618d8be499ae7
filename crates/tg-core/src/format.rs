//! Tokens of the diagram-description text shared by the generator and the
//! description reader.

pub const START_MARKER: &str = "@startuml";
pub const END_MARKER: &str = "@enduml";
pub const LAYOUT_DIRECTIVE: &str = "left to right direction";
pub const NODE_KEYWORD: &str = "circle";
pub const RELATION_ARROW: &str = "-->";
