//! Node arena for tree storage.

use serde::Serialize;
use smallvec::SmallVec;

use crate::base::{NodeIndex, NodeList};
use crate::node::{IfForm, Node, NodeData};

/// Child list returned by [`NodeArena::children`]. Most nodes have few children.
pub type Children = SmallVec<[NodeIndex; 4]>;

/// Arena-based storage for tree nodes.
/// Nodes are stored contiguously and referenced by index.
#[derive(Debug, Default, Serialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its index
    pub fn add(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Get a node by index
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Get a mutable node by index
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.get(index).map(|node| &node.data)
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Statements of a `Body` node; empty for `NONE` or any other node.
    pub fn statements(&self, body: NodeIndex) -> &[NodeIndex] {
        match self.data(body) {
            Some(NodeData::Body { statements }) => &statements.nodes,
            _ => &[],
        }
    }

    /// The last statement of a `Body`, which is its value.
    pub fn last_statement(&self, body: NodeIndex) -> Option<NodeIndex> {
        self.statements(body).last().copied()
    }

    /// Whether any part of a string-like node is an interpolation.
    pub fn has_interpolation(&self, parts: &NodeList) -> bool {
        parts
            .iter()
            .any(|part| matches!(self.data(part), Some(NodeData::Interpolation { .. })))
    }

    /// Name of a local variable read, if `index` is one.
    pub fn identifier_name(&self, index: NodeIndex) -> Option<&str> {
        match self.data(index)? {
            NodeData::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Children of a node in source order.
    pub fn children(&self, index: NodeIndex) -> Children {
        let mut children = Children::new();
        let Some(node) = self.get(index) else {
            return children;
        };

        let add_opt = |children: &mut Children, idx: NodeIndex| {
            if idx.is_some() {
                children.push(idx);
            }
        };
        let add_list = |children: &mut Children, list: &NodeList| {
            children.extend(list.nodes.iter().copied());
        };

        match &node.data {
            NodeData::Program { body } => add_opt(&mut children, *body),
            NodeData::Body { statements } => add_list(&mut children, statements),
            NodeData::Str { parts }
            | NodeData::Heredoc { parts, .. }
            | NodeData::Symbol { parts, .. }
            | NodeData::Regex { parts } => add_list(&mut children, parts),
            NodeData::Interpolation { body } => add_opt(&mut children, *body),
            NodeData::Array { elements } => add_list(&mut children, elements),
            NodeData::Hash { pairs, .. } => add_list(&mut children, pairs),
            NodeData::Pair { key, value } => {
                add_opt(&mut children, *key);
                add_opt(&mut children, *value);
            }
            NodeData::Range { low, high, .. } => {
                add_opt(&mut children, *low);
                add_opt(&mut children, *high);
            }
            NodeData::Splat { expression }
            | NodeData::DoubleSplat { expression }
            | NodeData::BlockPass { expression }
            | NodeData::Defined { expression } => add_opt(&mut children, *expression),
            NodeData::Constant { scope, .. } => add_opt(&mut children, *scope),
            NodeData::Assignment { target, value, .. } => {
                add_opt(&mut children, *target);
                add_opt(&mut children, *value);
            }
            NodeData::IndexAssignment {
                receiver,
                arguments,
                value,
            } => {
                add_opt(&mut children, *receiver);
                add_list(&mut children, arguments);
                add_opt(&mut children, *value);
            }
            NodeData::MultipleAssignment { targets, value } => {
                add_list(&mut children, targets);
                add_opt(&mut children, *value);
            }
            NodeData::Binary { left, right, .. } | NodeData::Logical { left, right, .. } => {
                add_opt(&mut children, *left);
                add_opt(&mut children, *right);
            }
            NodeData::Unary { operand, .. } => add_opt(&mut children, *operand),
            NodeData::Call {
                receiver,
                arguments,
                block,
                ..
            } => {
                add_opt(&mut children, *receiver);
                add_list(&mut children, arguments);
                add_opt(&mut children, *block);
            }
            NodeData::Index {
                receiver,
                arguments,
            } => {
                add_opt(&mut children, *receiver);
                add_list(&mut children, arguments);
            }
            NodeData::Yield { arguments }
            | NodeData::Next { arguments }
            | NodeData::Break { arguments }
            | NodeData::Return { arguments } => add_list(&mut children, arguments),
            NodeData::Super {
                arguments, block, ..
            } => {
                add_list(&mut children, arguments);
                add_opt(&mut children, *block);
            }
            NodeData::Block {
                parameters, body, ..
            }
            | NodeData::Lambda { parameters, body } => {
                add_list(&mut children, parameters);
                add_opt(&mut children, *body);
            }
            NodeData::Parameter { default, .. } => add_opt(&mut children, *default),
            NodeData::DestructuredParameter { parameters } => add_list(&mut children, parameters),
            NodeData::Parenthesized { body } => add_opt(&mut children, *body),
            NodeData::If {
                condition,
                then_branch,
                else_branch,
                form,
                ..
            } => {
                if *form == IfForm::Modifier {
                    add_opt(&mut children, *then_branch);
                    add_opt(&mut children, *condition);
                } else {
                    add_opt(&mut children, *condition);
                    add_opt(&mut children, *then_branch);
                    add_opt(&mut children, *else_branch);
                }
            }
            NodeData::While {
                condition,
                body,
                modifier,
                ..
            } => {
                if *modifier {
                    add_opt(&mut children, *body);
                    add_opt(&mut children, *condition);
                } else {
                    add_opt(&mut children, *condition);
                    add_opt(&mut children, *body);
                }
            }
            NodeData::For {
                variables,
                iterable,
                body,
            } => {
                add_list(&mut children, variables);
                add_opt(&mut children, *iterable);
                add_opt(&mut children, *body);
            }
            NodeData::Case {
                subject,
                whens,
                else_branch,
            } => {
                add_opt(&mut children, *subject);
                add_list(&mut children, whens);
                add_opt(&mut children, *else_branch);
            }
            NodeData::When { conditions, body } => {
                add_list(&mut children, conditions);
                add_opt(&mut children, *body);
            }
            NodeData::Begin {
                body,
                rescues,
                else_branch,
                ensure_branch,
            } => {
                add_opt(&mut children, *body);
                add_list(&mut children, rescues);
                add_opt(&mut children, *else_branch);
                add_opt(&mut children, *ensure_branch);
            }
            NodeData::Rescue {
                exceptions,
                variable,
                body,
            } => {
                add_list(&mut children, exceptions);
                add_opt(&mut children, *variable);
                add_opt(&mut children, *body);
            }
            NodeData::RescueModifier {
                expression,
                fallback,
            } => {
                add_opt(&mut children, *expression);
                add_opt(&mut children, *fallback);
            }
            NodeData::Def {
                singleton,
                parameters,
                body,
                ..
            } => {
                add_opt(&mut children, *singleton);
                add_list(&mut children, parameters);
                add_opt(&mut children, *body);
            }
            NodeData::Class {
                path,
                superclass,
                body,
            } => {
                add_opt(&mut children, *path);
                add_opt(&mut children, *superclass);
                add_opt(&mut children, *body);
            }
            NodeData::SingletonClass { target, body } => {
                add_opt(&mut children, *target);
                add_opt(&mut children, *body);
            }
            NodeData::Module { path, body } => {
                add_opt(&mut children, *path);
                add_opt(&mut children, *body);
            }
            NodeData::Alias { new_name, old_name } => {
                add_opt(&mut children, *new_name);
                add_opt(&mut children, *old_name);
            }
            NodeData::Undef { names } => add_list(&mut children, names),
            NodeData::Integer
            | NodeData::Float
            | NodeData::StringPart
            | NodeData::Nil
            | NodeData::True
            | NodeData::False
            | NodeData::SelfRef
            | NodeData::Identifier { .. }
            | NodeData::InstanceVariable { .. }
            | NodeData::ClassVariable { .. }
            | NodeData::GlobalVariable { .. }
            | NodeData::Redo
            | NodeData::Retry
            | NodeData::Missing => {}
        }
        children
    }
}
