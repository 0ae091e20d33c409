//! Lint rules.
//!
//! A rule is called once for every node of a file, in source order, and
//! decides for itself which nodes it cares about.

use foldcop_parser::NodeIndex;

use crate::context::RuleContext;

pub mod unmodified_reduce_accumulator;
pub use unmodified_reduce_accumulator::UnmodifiedReduceAccumulator;

pub trait Rule: Send + Sync {
    /// Qualified name, e.g. `Lint/UnmodifiedReduceAccumulator`.
    fn name(&self) -> &'static str;

    /// One-line summary for `--list-rules`.
    fn description(&self) -> &'static str;

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: NodeIndex);
}

/// Every rule the linter knows about.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(UnmodifiedReduceAccumulator)]
}
