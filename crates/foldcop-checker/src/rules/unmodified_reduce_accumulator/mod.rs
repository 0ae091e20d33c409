//! `Lint/UnmodifiedReduceAccumulator`
//!
//! Flags `reduce`/`inject` blocks whose value is built from the element
//! instead of the accumulator:
//!
//! ```ruby
//! (1..4).reduce(0) do |acc, el|
//!   el * 2          # offense: the next iteration's `acc` is `el * 2`
//! end
//! ```
//!
//! If any exit of the block returns the accumulator itself, the block is
//! assumed to be written on purpose and nothing is reported.

mod call_matcher;
mod classify;
mod exits;

pub use call_matcher::{FoldCall, FoldMethod, match_fold_call};
pub use classify::{Classification, Dependence, FoldNames, classify_exit};
pub use exits::{ExitOrigin, ExitPoint, ExitPoints, collect_exit_points};

use foldcop_common::diagnostic_messages;
use foldcop_parser::NodeIndex;
use tracing::{debug, trace};

use crate::context::RuleContext;
use crate::rules::Rule;

pub struct UnmodifiedReduceAccumulator;

impl UnmodifiedReduceAccumulator {
    pub const NAME: &'static str = "Lint/UnmodifiedReduceAccumulator";
}

impl Rule for UnmodifiedReduceAccumulator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Checks for `reduce`/`inject` blocks that return the element instead of the accumulator."
    }

    fn check_node(&self, ctx: &mut RuleContext<'_>, node: NodeIndex) {
        let Some(fold) = match_fold_call(ctx.arena, node, ctx.options) else {
            return;
        };
        check_fold_call(ctx, &fold);
    }
}

/// Report the offending exits of one matched fold call.
pub fn check_fold_call(ctx: &mut RuleContext<'_>, fold: &FoldCall<'_>) {
    let arena = ctx.arena;
    let exits = collect_exit_points(arena, fold.body);
    debug!(
        call = fold.call.0,
        method = fold.method.as_str(),
        implicit_receiver = fold.receiver.is_none(),
        initial_value = fold.initial_value.map(|node| node.0),
        accumulator = fold.accumulator,
        element = fold.element,
        exits = exits.len(),
        "checking fold call"
    );

    if exits
        .iter()
        .any(|exit| arena.identifier_name(exit.value) == Some(fold.accumulator))
    {
        trace!("accumulator returned by an exit; skipping");
        return;
    }

    let names = FoldNames {
        accumulator: fold.accumulator,
        element: fold.element,
    };
    for exit in &exits {
        match classify_exit(arena, exit, names) {
            Classification::UnsafeElement => ctx.report(
                UnmodifiedReduceAccumulator::NAME,
                exit.highlight,
                &diagnostic_messages::ACCUMULATOR_NOT_MODIFIED,
                &[fold.accumulator, fold.method.as_str()],
            ),
            Classification::UnsafeIndexAssignment => ctx.report(
                UnmodifiedReduceAccumulator::NAME,
                exit.highlight,
                &diagnostic_messages::ACCUMULATOR_ELEMENT_RETURNED,
                &[fold.method.as_str()],
            ),
            Classification::Safe | Classification::Indeterminate => {}
        }
    }
}
