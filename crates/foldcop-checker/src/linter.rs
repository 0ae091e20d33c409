//! The lint driver for a single file.

use foldcop_common::Diagnostic;
use foldcop_parser::{ParsedFile, parse_source};
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::context::{LintOptions, RuleContext};
use crate::directives::Directives;
use crate::rules::{Rule, all_rules};

/// Diagnostics for one file.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub file_name: String,
    pub diagnostics: Vec<Diagnostic>,
    /// The file did not parse; `diagnostics` holds only parse errors.
    pub parse_failed: bool,
}

pub struct Linter {
    options: LintOptions,
    rules: Vec<Box<dyn Rule>>,
}

impl Linter {
    pub fn new(options: LintOptions) -> Linter {
        let rules = all_rules()
            .into_iter()
            .filter(|rule| options.is_rule_enabled(rule.name()))
            .collect();
        Linter { options, rules }
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    /// The enabled rules.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn lint_source(&self, file_name: &str, source: &str) -> LintResult {
        let _span = debug_span!("lint_source", file = file_name).entered();
        let parsed = parse_source(file_name, source);

        if parsed.has_errors() {
            debug!(errors = parsed.diagnostics.len(), "parse failed; skipping rules");
            let mut diagnostics = parsed.diagnostics;
            sort_diagnostics(&mut diagnostics);
            return LintResult {
                file_name: file_name.to_string(),
                diagnostics,
                parse_failed: true,
            };
        }

        let diagnostics = self.lint_parsed(&parsed, source);
        LintResult {
            file_name: file_name.to_string(),
            diagnostics,
            parse_failed: false,
        }
    }

    /// Run the rules over an already parsed file.
    pub fn lint_parsed(&self, parsed: &ParsedFile, source: &str) -> Vec<Diagnostic> {
        let mut ctx = RuleContext::new(&parsed.file_name, source, &parsed.arena, &self.options);

        // Pre-order, children pushed in reverse so nodes are visited in
        // source order. Nested blocks are visited too.
        let mut stack = vec![parsed.root];
        while let Some(node) = stack.pop() {
            for rule in &self.rules {
                rule.check_node(&mut ctx, node);
            }
            stack.extend(parsed.arena.children(node).into_iter().rev());
        }

        let mut diagnostics = ctx.into_diagnostics();
        if !diagnostics.is_empty() {
            let directives = Directives::parse(source, &parsed.comments);
            if !directives.is_empty() {
                let before = diagnostics.len();
                diagnostics.retain(|diagnostic| !directives.suppresses(diagnostic));
                debug!(suppressed = before - diagnostics.len(), "applied directives");
            }
        }
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }
}

fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|diagnostic| (diagnostic.start, diagnostic.code));
}
