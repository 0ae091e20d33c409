//! Lint Context
//!
//! Options shared by every rule, and the per-file state a rule borrows while
//! it inspects nodes. Rules only read the tree; everything they produce goes
//! through [`RuleContext::report`].

use foldcop_common::{Diagnostic, DiagnosticCategory, DiagnosticMessage, TextRange};
use foldcop_parser::NodeArena;
use rustc_hash::{FxHashMap, FxHashSet};

/// Options for linting.
#[derive(Debug, Clone)]
pub struct LintOptions {
    /// When false, `reduce`/`inject` calls without an initial value are
    /// analyzed too.
    pub require_initial_value: bool,
    /// Rules switched off by name.
    pub disabled_rules: FxHashSet<String>,
    /// Per-rule severity replacing the message's default category.
    pub severity_overrides: FxHashMap<String, DiagnosticCategory>,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            require_initial_value: true,
            disabled_rules: FxHashSet::default(),
            severity_overrides: FxHashMap::default(),
        }
    }
}

impl LintOptions {
    pub fn is_rule_enabled(&self, rule: &str) -> bool {
        !self.disabled_rules.contains(rule)
    }

    pub fn severity_for(&self, rule: &str) -> Option<DiagnosticCategory> {
        self.severity_overrides.get(rule).copied()
    }

    #[must_use]
    pub fn with_require_initial_value(mut self, require: bool) -> Self {
        self.require_initial_value = require;
        self
    }

    #[must_use]
    pub fn with_rule_disabled(mut self, rule: impl Into<String>) -> Self {
        self.disabled_rules.insert(rule.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, rule: impl Into<String>, category: DiagnosticCategory) -> Self {
        self.severity_overrides.insert(rule.into(), category);
        self
    }
}

/// State for checking one parsed file.
pub struct RuleContext<'a> {
    pub file_name: &'a str,
    pub source: &'a str,
    pub arena: &'a NodeArena,
    pub options: &'a LintOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        file_name: &'a str,
        source: &'a str,
        arena: &'a NodeArena,
        options: &'a LintOptions,
    ) -> Self {
        RuleContext {
            file_name,
            source,
            arena,
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Record an offense of `rule` at `range`.
    pub fn report(
        &mut self,
        rule: &'static str,
        range: TextRange,
        message: &DiagnosticMessage,
        args: &[&str],
    ) {
        let mut diagnostic =
            Diagnostic::from_message(self.file_name, range, message, args).with_rule(rule);
        if let Some(category) = self.options.severity_for(rule) {
            diagnostic = diagnostic.with_category(category);
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
