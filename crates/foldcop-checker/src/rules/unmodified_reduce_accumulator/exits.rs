//! Exit points of a block body.
//!
//! A block returns the value of its last statement, or the argument of a
//! `next`/`break` that belongs to the block itself. Jumps inside a nested
//! block, lambda or definition leave that inner scope instead and are not
//! collected.

use foldcop_common::TextRange;
use foldcop_parser::{NodeArena, NodeData, NodeIndex};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOrigin {
    ImplicitTrailing,
    NextArgument,
    BreakArgument,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitPoint {
    /// Expression producing the block's value.
    pub value: NodeIndex,
    /// Range an offense on this exit points at.
    pub highlight: TextRange,
    pub origin: ExitOrigin,
}

pub type ExitPoints = SmallVec<[ExitPoint; 4]>;

/// Collect the exit points of `body`, ordered by position.
pub fn collect_exit_points(arena: &NodeArena, body: NodeIndex) -> ExitPoints {
    let mut exits = ExitPoints::new();

    if let Some(trailing) = trailing_statement(arena, body) {
        push_exit(arena, &mut exits, trailing, ExitOrigin::ImplicitTrailing);
    }

    let mut stack: Vec<NodeIndex> = arena.children(body).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        let Some(data) = arena.data(node) else {
            continue;
        };
        if data.is_scope_boundary() {
            continue;
        }
        match data {
            NodeData::Next { arguments } => {
                if let Some(value) = arguments.first() {
                    push_exit(arena, &mut exits, value, ExitOrigin::NextArgument);
                }
            }
            NodeData::Break { arguments } => {
                if let Some(value) = arguments.first() {
                    push_exit(arena, &mut exits, value, ExitOrigin::BreakArgument);
                }
            }
            _ => {}
        }
        stack.extend(arena.children(node).into_iter().rev());
    }

    // The trailing statement was pushed first; a stable sort keeps it ahead
    // of a jump that starts at the same offset.
    exits.sort_by_key(|exit| exit.highlight.pos);
    exits
}

/// The statement whose value the block returns when control falls off the end.
fn trailing_statement(arena: &NodeArena, body: NodeIndex) -> Option<NodeIndex> {
    match arena.data(body)? {
        NodeData::Body { .. } => arena.last_statement(body),
        // `do ... rescue ... end`: the value is the else branch when present,
        // otherwise the main body.
        NodeData::Begin {
            body: main,
            else_branch,
            ..
        } => {
            if else_branch.is_some() {
                arena.last_statement(*else_branch)
            } else {
                arena.last_statement(*main)
            }
        }
        _ => None,
    }
}

fn push_exit(arena: &NodeArena, exits: &mut ExitPoints, value: NodeIndex, origin: ExitOrigin) {
    let Some(node) = arena.get(value) else {
        return;
    };
    exits.push(ExitPoint {
        value,
        highlight: node.range,
        origin,
    });
}
