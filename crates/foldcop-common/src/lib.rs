//! Common types and utilities for the foldcop Ruby linter.
//!
//! This crate provides foundational types used across all foldcop crates:
//! - Source ranges (`TextRange`)
//! - Line/column positions (`LineMap`, `Position`)
//! - Diagnostics and the message table
//! - Comment ranges collected by the scanner
//! - Centralized recursion limits

// Source location tracking (byte offsets)
pub mod span;
pub use span::TextRange;

// Line/column conversion for reporting
pub mod position;
pub use position::{LineMap, Position};

// Diagnostic types and message templates
pub mod diagnostics;
pub use diagnostics::{
    DIAGNOSTIC_MESSAGES, Diagnostic, DiagnosticCategory, DiagnosticMessage, diagnostic_codes,
    diagnostic_messages, format_message,
};

// Comments are trivia to the parser but carry lint directives
pub mod comments;
pub use comments::CommentRange;

// Centralized limits and thresholds
pub mod limits;
