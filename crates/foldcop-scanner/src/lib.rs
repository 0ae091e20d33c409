//! Ruby scanner/tokenizer for the foldcop linter.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine
//! - `Token` / `StringSegment` - Tokens with interpolation segments
//!
//! The scanner covers the subset of Ruby the parser understands. Context
//! sensitive tokens (heredoc vs `<<`, regex vs `/`, symbol vs `:`) are
//! resolved from the previous significant token and surrounding whitespace.

pub mod syntax_kind;
pub use syntax_kind::*;

pub mod scanner;
pub use scanner::{ScanDiagnostic, ScanOutput, ScannerState, StringSegment, Token, TokenFlags};
