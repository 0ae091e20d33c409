//! Syntax tree node definitions.
//!
//! Every node is a `TextRange` plus a `NodeData` payload. Children are
//! referenced by [`NodeIndex`]; optional children use `NodeIndex::NONE`.
//!
//! Local variable reads are `Identifier` nodes. A bare name that is not a
//! known local is a receiverless `Call` without arguments, the same split
//! Ruby itself makes.

use foldcop_common::TextRange;
use foldcop_scanner::SyntaxKind;
use serde::Serialize;

use crate::base::{NodeIndex, NodeList};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub range: TextRange,
    pub data: NodeData,
}

impl Node {
    pub const fn new(range: TextRange, data: NodeData) -> Self {
        Node { range, data }
    }

    pub const fn pos(&self) -> u32 {
        self.range.pos
    }

    pub const fn end(&self) -> u32 {
        self.range.end
    }

    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }
}

/// The three shapes of a conditional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IfForm {
    /// `if cond ... end`
    Statement,
    /// `expr if cond`
    Modifier,
    /// `cond ? a : b`
    Ternary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    /// `a`
    Required,
    /// `a = 1`
    Optional,
    /// `*a` or `*`
    Rest,
    /// `a:`
    RequiredKeyword,
    /// `a: 1`
    Keyword,
    /// `**a` or `**`
    KeywordRest,
    /// `&a` or `&`
    Block,
    /// `|a; b|`: `b` is block-local, not a parameter
    BlockLocal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NodeData {
    /// Root of a file.
    Program { body: NodeIndex },
    /// A sequence of statements.
    Body { statements: NodeList },

    // Literals
    Integer,
    Float,
    /// String or character literal. Plain strings have at most one `StringPart`.
    Str { parts: NodeList },
    /// A run of literal text inside a string-like node.
    StringPart,
    /// The node range is the `<<~ID` opener; the body follows on later lines.
    Heredoc { parts: NodeList, body_range: TextRange },
    /// `#{...}` inside a string-like node; `body` is a `Body`.
    Interpolation { body: NodeIndex },
    Symbol { name: String, parts: NodeList },
    Regex { parts: NodeList },
    Nil,
    True,
    False,
    SelfRef,
    Array { elements: NodeList },
    /// `braces` is false for trailing keyword arguments `foo(a: 1)`.
    Hash { pairs: NodeList, braces: bool },
    Pair { key: NodeIndex, value: NodeIndex },
    Range { low: NodeIndex, high: NodeIndex, exclusive: bool },
    Splat { expression: NodeIndex },
    DoubleSplat { expression: NodeIndex },
    /// `&blk`, `&:sym`, or an anonymous `&` (expression is `NONE`).
    BlockPass { expression: NodeIndex },

    // Variables
    /// A local variable read.
    Identifier { name: String },
    InstanceVariable { name: String },
    ClassVariable { name: String },
    GlobalVariable { name: String },
    /// `Foo` or `Scope::Foo`.
    Constant { scope: NodeIndex, name: String },

    // Assignment
    /// `target op value` where `operator` is `=` or a compound assignment token.
    Assignment { target: NodeIndex, operator: SyntaxKind, value: NodeIndex },
    /// `receiver[arguments] = value`
    IndexAssignment { receiver: NodeIndex, arguments: NodeList, value: NodeIndex },
    /// `a, b = value`
    MultipleAssignment { targets: NodeList, value: NodeIndex },

    // Operators
    Binary { left: NodeIndex, operator: SyntaxKind, right: NodeIndex },
    /// `&&`, `||`, `and`, `or`
    Logical { left: NodeIndex, operator: SyntaxKind, right: NodeIndex },
    /// `!`, `-`, `+`, `~`, `not`
    Unary { operator: SyntaxKind, operand: NodeIndex },
    Defined { expression: NodeIndex },

    // Calls
    /// `call_operator` is `.`, `&.`, `::` or `Unknown` for receiverless calls.
    Call {
        receiver: NodeIndex,
        call_operator: SyntaxKind,
        name: String,
        name_range: TextRange,
        arguments: NodeList,
        block: NodeIndex,
        has_parens: bool,
    },
    /// `receiver[arguments]`
    Index { receiver: NodeIndex, arguments: NodeList },
    Yield { arguments: NodeList },
    /// `zsuper` is a bare `super` forwarding the current arguments.
    Super { arguments: NodeList, block: NodeIndex, zsuper: bool },
    /// Block literal attached to a call.
    Block { parameters: NodeList, body: NodeIndex, brace: bool },
    /// `->(params) { body }`
    Lambda { parameters: NodeList, body: NodeIndex },
    /// `default` is the default value of optional and keyword parameters.
    Parameter { name: String, kind: ParameterKind, default: NodeIndex },
    /// `(a, b)` in a parameter list.
    DestructuredParameter { parameters: NodeList },
    /// `( statements )`
    Parenthesized { body: NodeIndex },

    // Control flow
    /// `negated` marks `unless`. `elsif` chains nest in `else_branch`.
    If {
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
        form: IfForm,
        negated: bool,
    },
    While { condition: NodeIndex, body: NodeIndex, until: bool, modifier: bool },
    For { variables: NodeList, iterable: NodeIndex, body: NodeIndex },
    Case { subject: NodeIndex, whens: NodeList, else_branch: NodeIndex },
    When { conditions: NodeList, body: NodeIndex },
    /// `begin ... rescue ... else ... ensure ... end`, or a body with rescue clauses.
    Begin { body: NodeIndex, rescues: NodeList, else_branch: NodeIndex, ensure_branch: NodeIndex },
    Rescue { exceptions: NodeList, variable: NodeIndex, body: NodeIndex },
    /// `expression rescue fallback`
    RescueModifier { expression: NodeIndex, fallback: NodeIndex },
    Next { arguments: NodeList },
    Break { arguments: NodeList },
    Return { arguments: NodeList },
    Redo,
    Retry,

    // Definitions
    Def { singleton: NodeIndex, name: String, parameters: NodeList, body: NodeIndex },
    Class { path: NodeIndex, superclass: NodeIndex, body: NodeIndex },
    SingletonClass { target: NodeIndex, body: NodeIndex },
    Module { path: NodeIndex, body: NodeIndex },
    Alias { new_name: NodeIndex, old_name: NodeIndex },
    Undef { names: NodeList },

    /// Placeholder produced during error recovery.
    Missing,
}

impl NodeData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Program { .. } => "Program",
            NodeData::Body { .. } => "Body",
            NodeData::Integer => "Integer",
            NodeData::Float => "Float",
            NodeData::Str { .. } => "Str",
            NodeData::StringPart => "StringPart",
            NodeData::Heredoc { .. } => "Heredoc",
            NodeData::Interpolation { .. } => "Interpolation",
            NodeData::Symbol { .. } => "Symbol",
            NodeData::Regex { .. } => "Regex",
            NodeData::Nil => "Nil",
            NodeData::True => "True",
            NodeData::False => "False",
            NodeData::SelfRef => "SelfRef",
            NodeData::Array { .. } => "Array",
            NodeData::Hash { .. } => "Hash",
            NodeData::Pair { .. } => "Pair",
            NodeData::Range { .. } => "Range",
            NodeData::Splat { .. } => "Splat",
            NodeData::DoubleSplat { .. } => "DoubleSplat",
            NodeData::BlockPass { .. } => "BlockPass",
            NodeData::Identifier { .. } => "Identifier",
            NodeData::InstanceVariable { .. } => "InstanceVariable",
            NodeData::ClassVariable { .. } => "ClassVariable",
            NodeData::GlobalVariable { .. } => "GlobalVariable",
            NodeData::Constant { .. } => "Constant",
            NodeData::Assignment { .. } => "Assignment",
            NodeData::IndexAssignment { .. } => "IndexAssignment",
            NodeData::MultipleAssignment { .. } => "MultipleAssignment",
            NodeData::Binary { .. } => "Binary",
            NodeData::Logical { .. } => "Logical",
            NodeData::Unary { .. } => "Unary",
            NodeData::Defined { .. } => "Defined",
            NodeData::Call { .. } => "Call",
            NodeData::Index { .. } => "Index",
            NodeData::Yield { .. } => "Yield",
            NodeData::Super { .. } => "Super",
            NodeData::Block { .. } => "Block",
            NodeData::Lambda { .. } => "Lambda",
            NodeData::Parameter { .. } => "Parameter",
            NodeData::DestructuredParameter { .. } => "DestructuredParameter",
            NodeData::Parenthesized { .. } => "Parenthesized",
            NodeData::If { .. } => "If",
            NodeData::While { .. } => "While",
            NodeData::For { .. } => "For",
            NodeData::Case { .. } => "Case",
            NodeData::When { .. } => "When",
            NodeData::Begin { .. } => "Begin",
            NodeData::Rescue { .. } => "Rescue",
            NodeData::RescueModifier { .. } => "RescueModifier",
            NodeData::Next { .. } => "Next",
            NodeData::Break { .. } => "Break",
            NodeData::Return { .. } => "Return",
            NodeData::Redo => "Redo",
            NodeData::Retry => "Retry",
            NodeData::Def { .. } => "Def",
            NodeData::Class { .. } => "Class",
            NodeData::SingletonClass { .. } => "SingletonClass",
            NodeData::Module { .. } => "Module",
            NodeData::Alias { .. } => "Alias",
            NodeData::Undef { .. } => "Undef",
            NodeData::Missing => "Missing",
        }
    }

    /// Nodes that open a new scope for `next`/`break` and local variables.
    pub const fn is_scope_boundary(&self) -> bool {
        matches!(
            self,
            NodeData::Block { .. }
                | NodeData::Lambda { .. }
                | NodeData::Def { .. }
                | NodeData::Class { .. }
                | NodeData::SingletonClass { .. }
                | NodeData::Module { .. }
        )
    }
}
