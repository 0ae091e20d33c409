//! Diagnostic types and message lookup.
//!
//! Parser diagnostics use the `1xxx` range and lint offenses the `2xxx`
//! range. Message templates contain `{0}`, `{1}`, ... placeholders filled
//! in by [`format_message`].

use serde::{Deserialize, Serialize};

use crate::span::TextRange;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic severity. Ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Info,
    Warning,
    Error,
}

impl DiagnosticCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticCategory::Info => "info",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
        }
    }
}

/// A diagnostic attached to a range of a source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Name of the lint rule that produced this diagnostic, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            rule: None,
        }
    }

    /// Create a diagnostic from a message definition, filling its placeholders.
    #[must_use]
    pub fn from_message(
        file: impl Into<String>,
        range: TextRange,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: file.into(),
            start: range.pos,
            length: range.len(),
            message_text: format_message(message.message, args),
            category: message.category,
            code: message.code,
            rule: None,
        }
    }

    /// Tag this diagnostic with the rule that produced it.
    #[must_use]
    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Override the severity (e.g. from configuration).
    #[must_use]
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = category;
        self
    }

    pub const fn range(&self) -> TextRange {
        TextRange::new(self.start, self.start + self.length)
    }

    /// The user-facing code, e.g. `FC2001`.
    pub fn code_label(&self) -> String {
        format!("FC{}", self.code)
    }
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const UNEXPECTED_TOKEN: u32 = 1001;
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1002;
    pub const UNTERMINATED_HEREDOC: u32 = 1003;
    pub const END_EXPECTED: u32 = 1004;
    pub const EXPRESSION_EXPECTED: u32 = 1005;
    pub const TOKEN_EXPECTED: u32 = 1006;
    pub const NESTING_TOO_DEEP: u32 = 1007;
    pub const UNKNOWN_CHARACTER: u32 = 1008;

    pub const ACCUMULATOR_NOT_MODIFIED: u32 = 2001;
    pub const ACCUMULATOR_ELEMENT_RETURNED: u32 = 2002;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const UNEXPECTED_TOKEN: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNEXPECTED_TOKEN,
        category: DiagnosticCategory::Error,
        message: "Unexpected token '{0}'.",
    };
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNTERMINATED_STRING_LITERAL,
        category: DiagnosticCategory::Error,
        message: "Unterminated string literal.",
    };
    pub const UNTERMINATED_HEREDOC: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNTERMINATED_HEREDOC,
        category: DiagnosticCategory::Error,
        message: "Unterminated heredoc; '{0}' expected.",
    };
    pub const END_EXPECTED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::END_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "'end' expected to close '{0}'.",
    };
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::EXPRESSION_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "Expression expected.",
    };
    pub const TOKEN_EXPECTED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::TOKEN_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "'{0}' expected.",
    };
    pub const NESTING_TOO_DEEP: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::NESTING_TOO_DEEP,
        category: DiagnosticCategory::Error,
        message: "Expression is nested too deeply.",
    };
    pub const UNKNOWN_CHARACTER: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNKNOWN_CHARACTER,
        category: DiagnosticCategory::Error,
        message: "Invalid character '{0}'.",
    };

    pub const ACCUMULATOR_NOT_MODIFIED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::ACCUMULATOR_NOT_MODIFIED,
        category: DiagnosticCategory::Warning,
        message: "Ensure the accumulator `{0}` will be modified by `{1}`.",
    };
    pub const ACCUMULATOR_ELEMENT_RETURNED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::ACCUMULATOR_ELEMENT_RETURNED,
        category: DiagnosticCategory::Warning,
        message: "Do not return an element of the accumulator in `{0}`.",
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    diagnostic_messages::UNEXPECTED_TOKEN,
    diagnostic_messages::UNTERMINATED_STRING_LITERAL,
    diagnostic_messages::UNTERMINATED_HEREDOC,
    diagnostic_messages::END_EXPECTED,
    diagnostic_messages::EXPRESSION_EXPECTED,
    diagnostic_messages::TOKEN_EXPECTED,
    diagnostic_messages::NESTING_TOO_DEEP,
    diagnostic_messages::UNKNOWN_CHARACTER,
    diagnostic_messages::ACCUMULATOR_NOT_MODIFIED,
    diagnostic_messages::ACCUMULATOR_ELEMENT_RETURNED,
];

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_fills_placeholders_in_order() {
        let text = format_message(
            diagnostic_messages::ACCUMULATOR_NOT_MODIFIED.message,
            &["acc", "reduce"],
        );
        assert_eq!(text, "Ensure the accumulator `acc` will be modified by `reduce`.");
    }

    #[test]
    fn message_codes_are_unique() {
        for (i, a) in DIAGNOSTIC_MESSAGES.iter().enumerate() {
            for b in &DIAGNOSTIC_MESSAGES[i + 1..] {
                assert_ne!(a.code, b.code, "duplicate code {}", a.code);
            }
        }
    }

    #[test]
    fn from_message_uses_range_and_category() {
        let diag = Diagnostic::from_message(
            "a.rb",
            TextRange::new(10, 16),
            &diagnostic_messages::ACCUMULATOR_ELEMENT_RETURNED,
            &["inject"],
        );
        assert_eq!(diag.start, 10);
        assert_eq!(diag.length, 6);
        assert_eq!(diag.category, DiagnosticCategory::Warning);
        assert_eq!(diag.code_label(), "FC2002");
        assert_eq!(
            diag.message_text,
            "Do not return an element of the accumulator in `inject`."
        );
    }

    #[test]
    fn severity_ordering_and_serialization() {
        assert!(DiagnosticCategory::Info < DiagnosticCategory::Warning);
        assert!(DiagnosticCategory::Warning < DiagnosticCategory::Error);
        let json = serde_json::to_string(&DiagnosticCategory::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
