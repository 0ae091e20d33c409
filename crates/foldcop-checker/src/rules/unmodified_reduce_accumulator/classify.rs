//! Exit classification.
//!
//! Each exit value is reduced to a [`Shape`], a closed view of the syntax
//! that matters here, and shapes are folded into a [`Dependence`]: what the
//! value is built from. Anything the shapes don't cover is `Unknown`, which
//! never produces an offense.

use foldcop_common::limits::MAX_CLASSIFY_DEPTH;
use foldcop_parser::{NodeArena, NodeData, NodeIndex};
use foldcop_scanner::SyntaxKind;
use smallvec::SmallVec;
use tracing::trace;

use super::exits::ExitPoint;

/// The two block parameter names.
#[derive(Clone, Copy, Debug)]
pub struct FoldNames<'a> {
    pub accumulator: &'a str,
    pub element: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Safe,
    /// The value is derived from the element alone.
    UnsafeElement,
    /// `acc[key] = value` returns `value`, not `acc`.
    UnsafeIndexAssignment,
    /// Depends on something we can't see through; treated as safe.
    Indeterminate,
}

/// What a value is built from. Ordered by priority: combining two
/// dependences keeps the greater one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dependence {
    Constant,
    Element,
    Unknown,
    Accumulator,
}

impl Dependence {
    #[must_use]
    pub fn combine(self, other: Dependence) -> Dependence {
        self.max(other)
    }
}

type Operands = SmallVec<[NodeIndex; 4]>;

/// Syntactic shape of an expression, as far as classification cares.
#[derive(Debug)]
enum Shape<'a> {
    /// Literal without interpolation.
    Literal,
    /// Local variable read.
    Local(&'a str),
    /// Instance, class and global variables, constants and `self`.
    Opaque,
    /// `target = value` and compound assignments.
    Assignment { target: NodeIndex },
    /// `receiver[...] = value`
    IndexAssignment { receiver: NodeIndex },
    /// `receiver << argument`
    Shovel { receiver: NodeIndex, argument: NodeIndex },
    /// Operators and composite literals, combined over their operands.
    Operator(Operands),
    /// Method calls, index reads, `yield` and `super`.
    Invocation { receiver: NodeIndex, arguments: Operands },
    /// String-like literal; operands are the `#{...}` bodies.
    Interpolated(Operands),
    /// `( ... )`
    Grouped(NodeIndex),
    Other,
}

fn shape_of(arena: &NodeArena, node: NodeIndex) -> Shape<'_> {
    let Some(data) = arena.data(node) else {
        return Shape::Other;
    };
    match data {
        NodeData::Integer
        | NodeData::Float
        | NodeData::Nil
        | NodeData::True
        | NodeData::False
        | NodeData::StringPart => Shape::Literal,
        NodeData::Str { parts }
        | NodeData::Heredoc { parts, .. }
        | NodeData::Symbol { parts, .. }
        | NodeData::Regex { parts } => {
            if arena.has_interpolation(parts) {
                Shape::Interpolated(interpolation_bodies(arena, parts.iter()))
            } else {
                Shape::Literal
            }
        }
        NodeData::Identifier { name } => Shape::Local(name),
        NodeData::InstanceVariable { .. }
        | NodeData::ClassVariable { .. }
        | NodeData::GlobalVariable { .. }
        | NodeData::Constant { .. }
        | NodeData::SelfRef => Shape::Opaque,
        NodeData::Assignment { target, .. } => Shape::Assignment { target: *target },
        NodeData::IndexAssignment { receiver, .. } => {
            Shape::IndexAssignment { receiver: *receiver }
        }
        NodeData::Binary {
            left,
            operator: SyntaxKind::LessThanLessThanToken,
            right,
        } => Shape::Shovel {
            receiver: *left,
            argument: *right,
        },
        NodeData::Binary { left, right, .. } | NodeData::Logical { left, right, .. } => {
            Shape::Operator(present([*left, *right]))
        }
        NodeData::Unary { operand, .. } => Shape::Operator(present([*operand])),
        NodeData::Array { elements } => Shape::Operator(elements.iter().collect()),
        NodeData::Hash { pairs, .. } => Shape::Operator(pairs.iter().collect()),
        NodeData::Pair { key, value } => Shape::Operator(present([*key, *value])),
        NodeData::Range { low, high, .. } => Shape::Operator(present([*low, *high])),
        NodeData::Splat { expression }
        | NodeData::DoubleSplat { expression }
        | NodeData::BlockPass { expression } => Shape::Operator(present([*expression])),
        NodeData::Call {
            receiver,
            arguments,
            ..
        }
        | NodeData::Index {
            receiver,
            arguments,
        } => Shape::Invocation {
            receiver: *receiver,
            arguments: arguments.iter().collect(),
        },
        NodeData::Yield { arguments } | NodeData::Super { arguments, .. } => Shape::Invocation {
            receiver: NodeIndex::NONE,
            arguments: arguments.iter().collect(),
        },
        NodeData::Parenthesized { body } => Shape::Grouped(*body),
        _ => Shape::Other,
    }
}

fn present<const N: usize>(nodes: [NodeIndex; N]) -> Operands {
    nodes.into_iter().filter(|node| node.is_some()).collect()
}

fn interpolation_bodies(arena: &NodeArena, parts: impl Iterator<Item = NodeIndex>) -> Operands {
    parts
        .filter_map(|part| match arena.data(part) {
            Some(NodeData::Interpolation { body }) => Some(*body),
            _ => None,
        })
        .collect()
}

/// Classify one exit of a fold block.
pub fn classify_exit(arena: &NodeArena, exit: &ExitPoint, names: FoldNames<'_>) -> Classification {
    if let Shape::IndexAssignment { receiver } = shape_of(arena, exit.value) {
        if arena.identifier_name(receiver) == Some(names.accumulator) {
            return Classification::UnsafeIndexAssignment;
        }
    }

    let dependence = dependence_of(arena, exit.value, names, 0);
    trace!(value = exit.value.0, ?dependence, "classified exit");
    match dependence {
        Dependence::Accumulator | Dependence::Constant => Classification::Safe,
        Dependence::Element => Classification::UnsafeElement,
        Dependence::Unknown => Classification::Indeterminate,
    }
}

/// What the value of `node` is built from.
pub fn dependence_of(
    arena: &NodeArena,
    node: NodeIndex,
    names: FoldNames<'_>,
    depth: u32,
) -> Dependence {
    if depth >= MAX_CLASSIFY_DEPTH {
        return Dependence::Unknown;
    }
    let depth = depth + 1;
    let mentions_accumulator =
        |node: NodeIndex| dependence_of(arena, node, names, depth) == Dependence::Accumulator;

    match shape_of(arena, node) {
        Shape::Literal => Dependence::Constant,
        Shape::Local(name) if name == names.accumulator => Dependence::Accumulator,
        Shape::Local(name) if name == names.element => Dependence::Element,
        Shape::Local(_) | Shape::Opaque => Dependence::Unknown,
        Shape::Assignment { target } => match arena.data(target) {
            Some(NodeData::Identifier { name }) if name == names.accumulator => {
                Dependence::Accumulator
            }
            // `acc.total = x` writes through the accumulator.
            Some(NodeData::Call { receiver, .. }) if mentions_accumulator(*receiver) => {
                Dependence::Accumulator
            }
            _ => Dependence::Unknown,
        },
        // Only reached below the exit itself: the write goes into `acc`.
        Shape::IndexAssignment { receiver } => {
            if mentions_accumulator(receiver) {
                Dependence::Accumulator
            } else {
                Dependence::Unknown
            }
        }
        Shape::Shovel { receiver, argument } => {
            if mentions_accumulator(receiver) || mentions_accumulator(argument) {
                Dependence::Accumulator
            } else {
                Dependence::Unknown
            }
        }
        Shape::Operator(operands) => operands
            .into_iter()
            .map(|operand| dependence_of(arena, operand, names, depth))
            .fold(Dependence::Constant, Dependence::combine),
        // Any statement of any interpolation may reference the accumulator;
        // otherwise each interpolation contributes its value.
        Shape::Interpolated(bodies) => bodies
            .into_iter()
            .map(|body| {
                let statements = arena.statements(body);
                if statements.iter().any(|&statement| mentions_accumulator(statement)) {
                    return Dependence::Accumulator;
                }
                match statements.last() {
                    Some(&last) => dependence_of(arena, last, names, depth),
                    None => Dependence::Constant,
                }
            })
            .fold(Dependence::Constant, Dependence::combine),
        Shape::Invocation {
            receiver,
            arguments,
        } => {
            let receiver_mentions = receiver.is_some() && mentions_accumulator(receiver);
            if receiver_mentions || arguments.into_iter().any(mentions_accumulator) {
                Dependence::Accumulator
            } else {
                Dependence::Unknown
            }
        }
        Shape::Grouped(body) => match arena.last_statement(body) {
            Some(last) => dependence_of(arena, last, names, depth),
            None => Dependence::Constant,
        },
        Shape::Other => Dependence::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::super::exits::{ExitOrigin, collect_exit_points};
    use super::*;
    use foldcop_parser::parse_source;

    const NAMES: FoldNames<'static> = FoldNames {
        accumulator: "acc",
        element: "el",
    };

    /// Classify the trailing value of a fold block whose body is `body`.
    fn classify_trailing(body: &str) -> Classification {
        let source = format!("values.reduce(0) do |acc, el|\n{body}\nend\n");
        let parsed = parse_source("test.rb", &source);
        assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.diagnostics);
        let arena = &parsed.arena;
        let block_body = (0..arena.len() as u32)
            .map(NodeIndex)
            .find_map(|idx| match arena.data(idx) {
                Some(NodeData::Block { body, .. }) => Some(*body),
                _ => None,
            })
            .expect("block body");
        let exits = collect_exit_points(arena, block_body);
        let trailing = exits
            .iter()
            .rev()
            .find(|exit| exit.origin == ExitOrigin::ImplicitTrailing)
            .expect("trailing exit");
        classify_exit(arena, trailing, NAMES)
    }

    #[test]
    fn combine_prefers_accumulator_then_unknown() {
        use Dependence::*;
        assert_eq!(Element.combine(Accumulator), Accumulator);
        assert_eq!(Element.combine(Unknown), Unknown);
        assert_eq!(Constant.combine(Element), Element);
        assert_eq!(Constant.combine(Constant), Constant);
    }

    #[test]
    fn literals_are_safe() {
        assert_eq!(classify_trailing("42"), Classification::Safe);
        assert_eq!(classify_trailing("nil"), Classification::Safe);
        assert_eq!(classify_trailing("'text'"), Classification::Safe);
    }

    #[test]
    fn element_derived_values_are_unsafe() {
        assert_eq!(classify_trailing("el"), Classification::UnsafeElement);
        assert_eq!(classify_trailing("el * 2"), Classification::UnsafeElement);
        assert_eq!(classify_trailing("-el"), Classification::UnsafeElement);
        assert_eq!(classify_trailing("[el, 1]"), Classification::UnsafeElement);
        assert_eq!(classify_trailing("(el + 1)"), Classification::UnsafeElement);
        assert_eq!(classify_trailing("\"#{el}!\""), Classification::UnsafeElement);
    }

    #[test]
    fn accumulator_mentions_are_safe() {
        assert_eq!(classify_trailing("acc + el"), Classification::Safe);
        assert_eq!(classify_trailing("acc += el"), Classification::Safe);
        assert_eq!(classify_trailing("acc << el"), Classification::Safe);
        assert_eq!(classify_trailing("el << acc"), Classification::Safe);
        assert_eq!(classify_trailing("acc.merge(el => 1)"), Classification::Safe);
        assert_eq!(classify_trailing("(acc[el] = 1) && el"), Classification::Safe);
    }

    #[test]
    fn accumulator_in_any_interpolated_statement_is_safe() {
        assert_eq!(classify_trailing("\"#{log(acc); el}\""), Classification::Safe);
        assert_eq!(classify_trailing("\"#{el}-#{acc.size; 1}\""), Classification::Safe);
        assert_eq!(
            classify_trailing("<<~TEXT\n  #{acc.clear; el}\nTEXT"),
            Classification::Safe
        );
        assert_eq!(classify_trailing("\"#{1; el}\""), Classification::UnsafeElement);
    }

    #[test]
    fn unknown_operands_are_indeterminate() {
        assert_eq!(classify_trailing("x + el"), Classification::Indeterminate);
        assert_eq!(classify_trailing("@total + el"), Classification::Indeterminate);
        assert_eq!(classify_trailing("el.to_s"), Classification::Indeterminate);
        assert_eq!(classify_trailing("other << el"), Classification::Indeterminate);
        assert_eq!(classify_trailing("begin\n el\nend"), Classification::Indeterminate);
    }

    #[test]
    fn index_assignment_on_accumulator_is_reported_separately() {
        assert_eq!(
            classify_trailing("acc[el] = true"),
            Classification::UnsafeIndexAssignment
        );
        assert_eq!(classify_trailing("acc[el] += 1"), Classification::Indeterminate);
    }

    #[test]
    fn deep_nesting_is_indeterminate() {
        let body = format!("{}el{}", "(".repeat(70), ")".repeat(70));
        assert_eq!(classify_trailing(&body), Classification::Indeterminate);
    }
}
