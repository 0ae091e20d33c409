//! Recognizes `reduce`/`inject` calls with a two-parameter block.

use foldcop_parser::{NodeArena, NodeData, NodeIndex, ParameterKind};

use crate::context::LintOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldMethod {
    Reduce,
    Inject,
}

impl FoldMethod {
    pub fn from_name(name: &str) -> Option<FoldMethod> {
        match name {
            "reduce" => Some(FoldMethod::Reduce),
            "inject" => Some(FoldMethod::Inject),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FoldMethod::Reduce => "reduce",
            FoldMethod::Inject => "inject",
        }
    }
}

/// A matched fold call. Names borrow from the arena.
#[derive(Clone, Debug)]
pub struct FoldCall<'a> {
    pub call: NodeIndex,
    /// `NodeIndex::NONE` for an implicit `self` receiver.
    pub receiver: NodeIndex,
    pub method: FoldMethod,
    /// `None` only when `require_initial_value` is off and the call has no arguments.
    pub initial_value: Option<NodeIndex>,
    pub accumulator: &'a str,
    pub element: &'a str,
    /// The block's `Body`; may be `NodeIndex::NONE` for an empty block.
    pub body: NodeIndex,
}

/// Match `node` against `receiver.reduce(init) { |acc, el| ... }`. The
/// receiver may be implicit and the call operator may be `.`, `&.` or `::`.
pub fn match_fold_call<'a>(
    arena: &'a NodeArena,
    node: NodeIndex,
    options: &LintOptions,
) -> Option<FoldCall<'a>> {
    let NodeData::Call {
        receiver,
        name,
        arguments,
        block,
        ..
    } = arena.data(node)?
    else {
        return None;
    };

    let method = FoldMethod::from_name(name)?;

    let initial_value = match arguments.first() {
        Some(first) => {
            if matches!(arena.data(first), Some(NodeData::BlockPass { .. })) {
                return None;
            }
            Some(first)
        }
        None if options.require_initial_value => return None,
        None => None,
    };

    let NodeData::Block {
        parameters, body, ..
    } = arena.data(*block)?
    else {
        return None;
    };

    let mut names = parameters.iter().filter_map(|param| match arena.data(param) {
        Some(NodeData::Parameter {
            kind: ParameterKind::BlockLocal,
            ..
        }) => None,
        other => Some(other),
    });
    let accumulator = required_parameter_name(names.next()?)?;
    let element = required_parameter_name(names.next()?)?;
    if names.next().is_some() {
        return None;
    }

    Some(FoldCall {
        call: node,
        receiver: *receiver,
        method,
        initial_value,
        accumulator,
        element,
        body: *body,
    })
}

fn required_parameter_name(data: Option<&NodeData>) -> Option<&str> {
    match data? {
        NodeData::Parameter {
            name,
            kind: ParameterKind::Required,
            ..
        } => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldcop_parser::parse_source;

    fn first_fold(source: &str, options: &LintOptions) -> Option<(NodeArena, NodeIndex)> {
        let parsed = parse_source("test.rb", source);
        assert!(!parsed.has_errors(), "parse errors: {:?}", parsed.diagnostics);
        let arena = parsed.arena;
        let node = (0..arena.len() as u32)
            .map(NodeIndex)
            .find(|&idx| match_fold_call(&arena, idx, options).is_some())?;
        Some((arena, node))
    }

    #[test]
    fn implicit_receiver_is_none() {
        let options = LintOptions::default();
        let (arena, node) = first_fold("inject(0) { |acc, el| el }\n", &options).expect("fold");
        let fold = match_fold_call(&arena, node, &options).expect("fold");
        assert_eq!(fold.call, node);
        assert!(fold.receiver.is_none());
        assert!(fold.initial_value.is_some());
        assert_eq!(fold.method, FoldMethod::Inject);
        assert_eq!((fold.accumulator, fold.element), ("acc", "el"));
    }

    #[test]
    fn scoped_receiver_is_kept() {
        let options = LintOptions::default();
        let (arena, node) = first_fold("Foo::reduce(0) { |a, b| b }\n", &options).expect("fold");
        let fold = match_fold_call(&arena, node, &options).expect("fold");
        assert!(matches!(
            arena.data(fold.receiver),
            Some(NodeData::Constant { .. })
        ));
    }

    #[test]
    fn missing_initial_value_depends_on_options() {
        let source = "values.reduce { |acc, el| el }\n";
        assert!(first_fold(source, &LintOptions::default()).is_none());

        let options = LintOptions::default().with_require_initial_value(false);
        let (arena, node) = first_fold(source, &options).expect("fold");
        let fold = match_fold_call(&arena, node, &options).expect("fold");
        assert_eq!(fold.initial_value, None);
    }
}
