//! Lint rules for the foldcop Ruby linter.
//!
//! [`Linter`] parses a file, walks every node, and hands each one to the
//! enabled [`Rule`]s. The only rule is
//! [`UnmodifiedReduceAccumulator`](rules::UnmodifiedReduceAccumulator).

pub mod context;
pub use context::{LintOptions, RuleContext};

pub mod directives;
pub use directives::Directives;

pub mod linter;
pub use linter::{LintResult, Linter};

pub mod rules;
pub use rules::{Rule, all_rules};
