//! Ruby parser for the foldcop linter.
//!
//! Produces an arena-allocated syntax tree. The grammar covers the subset
//! of Ruby a lint rule needs to see method calls, blocks, control flow and
//! string interpolation; unsupported syntax is reported as a diagnostic
//! and parsing resumes at the next statement.

pub mod base;
pub use base::{NodeIndex, NodeList};

pub mod node;
pub use node::{IfForm, Node, NodeData, ParameterKind};

pub mod arena;
pub use arena::{Children, NodeArena};

pub mod state;
pub use state::{ParsedFile, ParserState};

mod state_expressions;
mod state_statements;

/// Parse `source` as a complete file.
pub fn parse_source(file_name: &str, source: &str) -> ParsedFile {
    let mut parser = ParserState::new(file_name, source);
    let root = parser.parse_program();
    parser.into_parsed_file(root)
}
