//! Expression parsing: operators, primaries, calls, arguments and literals.

use foldcop_common::{TextRange, diagnostic_messages};
use foldcop_scanner::{
    StringSegment, SyntaxKind, keyword_to_text, punctuation_to_text, token_is_assignment_operator,
};

use crate::base::{NodeIndex, NodeList};
use crate::node::{IfForm, NodeData};
use crate::state::ParserState;

/// Binding power of binary operators; 0 means "not a binary operator".
pub(crate) mod precedence {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const EQUALITY: u8 = 3;
    pub const COMPARISON: u8 = 4;
    pub const BITWISE_OR: u8 = 5;
    pub const BITWISE_AND: u8 = 6;
    pub const SHIFT: u8 = 7;
    pub const ADDITIVE: u8 = 8;
    pub const MULTIPLICATIVE: u8 = 9;
    pub const POWER: u8 = 11;
}

fn binary_precedence(kind: SyntaxKind) -> u8 {
    match kind {
        SyntaxKind::BarBarToken => precedence::OR,
        SyntaxKind::AmpersandAmpersandToken => precedence::AND,
        SyntaxKind::EqualsEqualsToken
        | SyntaxKind::ExclamationEqualsToken
        | SyntaxKind::EqualsEqualsEqualsToken
        | SyntaxKind::EqualsTildeToken
        | SyntaxKind::ExclamationTildeToken
        | SyntaxKind::LessThanEqualsGreaterThanToken => precedence::EQUALITY,
        SyntaxKind::LessThanToken
        | SyntaxKind::LessThanEqualsToken
        | SyntaxKind::GreaterThanToken
        | SyntaxKind::GreaterThanEqualsToken => precedence::COMPARISON,
        SyntaxKind::BarToken | SyntaxKind::CaretToken => precedence::BITWISE_OR,
        SyntaxKind::AmpersandToken => precedence::BITWISE_AND,
        SyntaxKind::LessThanLessThanToken | SyntaxKind::GreaterThanGreaterThanToken => {
            precedence::SHIFT
        }
        SyntaxKind::PlusToken | SyntaxKind::MinusToken => precedence::ADDITIVE,
        SyntaxKind::AsteriskToken | SyntaxKind::SlashToken | SyntaxKind::PercentToken => {
            precedence::MULTIPLICATIVE
        }
        SyntaxKind::AsteriskAsteriskToken => precedence::POWER,
        _ => 0,
    }
}

/// Tokens that end a `return`/`next`/`break` without arguments.
fn ends_jump_arguments(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::NewLineToken
            | SyntaxKind::SemicolonToken
            | SyntaxKind::EndOfFileToken
            | SyntaxKind::CloseBraceToken
            | SyntaxKind::CloseParenToken
            | SyntaxKind::CloseBracketToken
            | SyntaxKind::ColonToken
            | SyntaxKind::EndKeyword
            | SyntaxKind::IfKeyword
            | SyntaxKind::UnlessKeyword
            | SyntaxKind::WhileKeyword
            | SyntaxKind::UntilKeyword
            | SyntaxKind::RescueKeyword
            | SyntaxKind::AndKeyword
            | SyntaxKind::OrKeyword
            | SyntaxKind::ThenKeyword
            | SyntaxKind::DoKeyword
            | SyntaxKind::ElseKeyword
            | SyntaxKind::ElsifKeyword
            | SyntaxKind::WhenKeyword
            | SyntaxKind::EnsureKeyword
    )
}

impl ParserState<'_> {
    // =========================================================================
    // Operators
    // =========================================================================

    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            return NodeIndex::NONE;
        }
        let result = self.parse_ternary_expression();
        self.exit_recursion();
        result
    }

    pub(crate) fn parse_required_expression(&mut self) -> NodeIndex {
        let expr = self.parse_expression();
        if expr.is_none() {
            self.error_expression_expected();
            return self.missing_node();
        }
        expr
    }

    fn parse_ternary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let condition = self.parse_range_expression();
        if condition.is_none() || !self.is_token(SyntaxKind::QuestionToken) {
            return condition;
        }
        self.next_token();
        self.skip_newlines();
        let then_branch = self.parse_required_expression();
        self.skip_newlines();
        self.parse_expected(SyntaxKind::ColonToken);
        self.skip_newlines();
        let else_branch = self.parse_required_expression();
        self.add_node(
            start,
            NodeData::If {
                condition,
                then_branch,
                else_branch,
                form: IfForm::Ternary,
                negated: false,
            },
        )
    }

    fn parse_range_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let low = self.parse_binary_expression(precedence::OR);
        if low.is_none() {
            return low;
        }
        if !matches!(
            self.token(),
            SyntaxKind::DotDotToken | SyntaxKind::DotDotDotToken
        ) {
            return low;
        }
        let exclusive = self.is_token(SyntaxKind::DotDotDotToken);
        self.next_token();
        // `1..` is an endless range.
        let high = if ends_jump_arguments(self.token()) || self.is_token(SyntaxKind::CommaToken) {
            NodeIndex::NONE
        } else {
            self.parse_binary_expression(precedence::OR)
        };
        self.add_node(start, NodeData::Range { low, high, exclusive })
    }

    /// Precedence climbing over the binary operator table.
    pub(crate) fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        if !self.enter_recursion() {
            return NodeIndex::NONE;
        }
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        if left.is_none() {
            self.exit_recursion();
            return left;
        }

        loop {
            let operator = self.token();
            let precedence = binary_precedence(operator);
            if precedence == 0 || precedence < min_precedence {
                break;
            }
            self.next_token();
            self.skip_newlines();

            // `**` is right-associative.
            let next_min = if operator == SyntaxKind::AsteriskAsteriskToken {
                precedence
            } else {
                precedence + 1
            };
            let mut right = self.parse_binary_expression(next_min);
            if right.is_none() {
                self.error_expression_expected();
                right = self.missing_node();
            }

            let data = if matches!(
                operator,
                SyntaxKind::BarBarToken | SyntaxKind::AmpersandAmpersandToken
            ) {
                NodeData::Logical { left, operator, right }
            } else {
                NodeData::Binary { left, operator, right }
            };
            left = self.add_node(start, data);
        }

        self.exit_recursion();
        left
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            return NodeIndex::NONE;
        }
        let start = self.token_pos();
        let result = match self.token() {
            SyntaxKind::ExclamationToken | SyntaxKind::TildeToken => {
                let operator = self.token();
                self.next_token();
                let operand = self.parse_unary_operand(precedence::POWER + 1);
                self.add_node(start, NodeData::Unary { operator, operand })
            }
            SyntaxKind::MinusToken | SyntaxKind::PlusToken => {
                let operator = self.token();
                self.next_token();
                // `-2 ** 2` is `-(2 ** 2)`.
                let operand = self.parse_unary_operand(precedence::POWER);
                self.add_node(start, NodeData::Unary { operator, operand })
            }
            SyntaxKind::NotKeyword => self.parse_not_expression(),
            _ => {
                let primary = self.parse_primary_expression();
                if primary.is_none() {
                    NodeIndex::NONE
                } else {
                    let expr = self.parse_postfix_expression(primary, start);
                    self.parse_assignment_tail(expr, start)
                }
            }
        };
        self.exit_recursion();
        result
    }

    fn parse_unary_operand(&mut self, min_precedence: u8) -> NodeIndex {
        let operand = self.parse_binary_expression(min_precedence);
        if operand.is_none() {
            self.error_expression_expected();
            return self.missing_node();
        }
        operand
    }

    /// `target = value` and `target op= value` after a parsed expression.
    fn parse_assignment_tail(&mut self, expr: NodeIndex, start: u32) -> NodeIndex {
        let operator = self.token();
        if !token_is_assignment_operator(operator) {
            return expr;
        }
        let Some(data) = self.arena.data(expr).cloned() else {
            return expr;
        };

        match &data {
            NodeData::Call {
                receiver,
                name,
                arguments,
                block,
                has_parens,
                ..
            } if receiver.is_none() && arguments.is_empty() && block.is_none() && !*has_parens => {
                // A bare name being assigned becomes a local.
                let name = name.clone();
                self.declare_local(&name);
                if let Some(node) = self.arena.get_mut(expr) {
                    node.data = NodeData::Identifier { name };
                }
            }
            NodeData::Call {
                arguments,
                block,
                has_parens,
                ..
            } if arguments.is_empty() && block.is_none() && !*has_parens => {}
            NodeData::Identifier { .. }
            | NodeData::InstanceVariable { .. }
            | NodeData::ClassVariable { .. }
            | NodeData::GlobalVariable { .. }
            | NodeData::Constant { .. }
            | NodeData::Index { .. } => {}
            _ => return expr,
        }

        self.next_token();
        self.skip_newlines();
        let value = self.parse_assignment_value();

        if operator == SyntaxKind::EqualsToken {
            if let NodeData::Index { receiver, arguments } = data {
                return self.add_node(
                    start,
                    NodeData::IndexAssignment {
                        receiver,
                        arguments,
                        value,
                    },
                );
            }
        }
        self.add_node(
            start,
            NodeData::Assignment {
                target: expr,
                operator,
                value,
            },
        )
    }

    fn parse_assignment_value(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::AsteriskToken) {
            let start = self.token_pos();
            self.next_token();
            let expression = self.parse_required_expression();
            return self.add_node(start, NodeData::Splat { expression });
        }
        self.parse_required_expression()
    }

    // =========================================================================
    // Primary expressions
    // =========================================================================

    pub(crate) fn parse_primary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::IntegerLiteral | SyntaxKind::LineKeyword => {
                self.next_token();
                self.add_node(start, NodeData::Integer)
            }
            SyntaxKind::FloatLiteral => {
                self.next_token();
                self.add_node(start, NodeData::Float)
            }
            SyntaxKind::StringLiteral | SyntaxKind::CharacterLiteral => self.parse_string_literal(),
            SyntaxKind::FileKeyword => {
                self.next_token();
                self.add_node(start, NodeData::Str { parts: NodeList::new() })
            }
            SyntaxKind::HeredocLiteral => self.parse_heredoc_literal(),
            SyntaxKind::SymbolLiteral => {
                let name = self.take_value();
                let parts = self.parse_literal_parts();
                self.next_token();
                self.add_node(start, NodeData::Symbol { name, parts })
            }
            SyntaxKind::RegexLiteral => {
                let parts = self.parse_literal_parts();
                self.next_token();
                self.add_node(start, NodeData::Regex { parts })
            }
            SyntaxKind::WordsLiteral | SyntaxKind::SymbolsLiteral => self.parse_word_array(),
            SyntaxKind::Identifier => self.parse_identifier_expression(),
            SyntaxKind::ConstantIdentifier => self.parse_constant_expression(NodeIndex::NONE, start),
            SyntaxKind::InstanceVariable => {
                let name = self.take_value();
                self.next_token();
                self.add_node(start, NodeData::InstanceVariable { name })
            }
            SyntaxKind::ClassVariable => {
                let name = self.take_value();
                self.next_token();
                self.add_node(start, NodeData::ClassVariable { name })
            }
            SyntaxKind::GlobalVariable => {
                let name = self.take_value();
                self.next_token();
                self.add_node(start, NodeData::GlobalVariable { name })
            }
            SyntaxKind::NilKeyword => {
                self.next_token();
                self.add_node(start, NodeData::Nil)
            }
            SyntaxKind::TrueKeyword => {
                self.next_token();
                self.add_node(start, NodeData::True)
            }
            SyntaxKind::FalseKeyword => {
                self.next_token();
                self.add_node(start, NodeData::False)
            }
            SyntaxKind::SelfKeyword => {
                self.next_token();
                self.add_node(start, NodeData::SelfRef)
            }
            SyntaxKind::OpenParenToken => self.parse_parenthesized_expression(),
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_hash_literal(),
            SyntaxKind::MinusGreaterThanToken => self.parse_lambda_literal(),
            SyntaxKind::ColonColonToken => {
                // `::Foo`
                self.next_token();
                if self.is_token(SyntaxKind::ConstantIdentifier) {
                    let name = self.take_value();
                    self.next_token();
                    self.add_node(
                        start,
                        NodeData::Constant {
                            scope: NodeIndex::NONE,
                            name,
                        },
                    )
                } else {
                    self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["constant"]);
                    self.missing_node()
                }
            }
            SyntaxKind::DotDotToken | SyntaxKind::DotDotDotToken => {
                // `..5` is a beginless range.
                let exclusive = self.is_token(SyntaxKind::DotDotDotToken);
                self.next_token();
                let high = self.parse_unary_operand(precedence::OR);
                self.add_node(
                    start,
                    NodeData::Range {
                        low: NodeIndex::NONE,
                        high,
                        exclusive,
                    },
                )
            }
            SyntaxKind::DefinedKeyword => self.parse_defined_expression(),
            SyntaxKind::ReturnKeyword | SyntaxKind::NextKeyword | SyntaxKind::BreakKeyword => {
                self.parse_jump_expression()
            }
            SyntaxKind::RedoKeyword => {
                self.next_token();
                self.add_node(start, NodeData::Redo)
            }
            SyntaxKind::RetryKeyword => {
                self.next_token();
                self.add_node(start, NodeData::Retry)
            }
            SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => self.parse_if_expression(),
            SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => self.parse_while_expression(),
            SyntaxKind::ForKeyword => self.parse_for_expression(),
            SyntaxKind::CaseKeyword => self.parse_case_expression(),
            SyntaxKind::BeginKeyword => self.parse_begin_expression(),
            SyntaxKind::DefKeyword => self.parse_def_expression(),
            SyntaxKind::ClassKeyword => self.parse_class_expression(),
            SyntaxKind::ModuleKeyword => self.parse_module_expression(),
            SyntaxKind::YieldKeyword => self.parse_yield_expression(),
            SyntaxKind::SuperKeyword => self.parse_super_expression(),
            SyntaxKind::AliasKeyword => self.parse_alias_statement(),
            SyntaxKind::UndefKeyword => self.parse_undef_statement(),
            _ => NodeIndex::NONE,
        }
    }

    /// A bare name: local read, method call with arguments, or vcall.
    fn parse_identifier_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name_range = self.token_range();
        let name = self.take_value();
        self.next_token();

        if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
            let arguments = self.parse_paren_arguments();
            return self.finish_call(start, NodeIndex::NONE, SyntaxKind::Unknown, name, name_range, arguments, true);
        }
        if self.is_local(&name) {
            return self.add_node(start, NodeData::Identifier { name });
        }
        let arguments = if self.can_start_command_arguments() {
            self.parse_command_arguments()
        } else {
            NodeList::new()
        };
        self.finish_call(start, NodeIndex::NONE, SyntaxKind::Unknown, name, name_range, arguments, false)
    }

    /// `Foo`, `Foo::Bar`, or a constant-named method call `Foo(1)`.
    fn parse_constant_expression(&mut self, scope: NodeIndex, start: u32) -> NodeIndex {
        let name_range = self.token_range();
        let name = self.take_value();
        self.next_token();
        if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
            let arguments = self.parse_paren_arguments();
            let operator = if scope.is_some() {
                SyntaxKind::ColonColonToken
            } else {
                SyntaxKind::Unknown
            };
            return self.finish_call(start, scope, operator, name, name_range, arguments, true);
        }
        self.add_node(start, NodeData::Constant { scope, name })
    }

    /// Whether the current token begins arguments of a call without parens.
    pub(crate) fn can_start_command_arguments(&self) -> bool {
        let token = self.current();
        if !token.has_preceding_whitespace() {
            return false;
        }
        match token.kind {
            SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::HeredocLiteral
            | SyntaxKind::SymbolLiteral
            | SyntaxKind::CharacterLiteral
            | SyntaxKind::RegexLiteral
            | SyntaxKind::WordsLiteral
            | SyntaxKind::SymbolsLiteral
            | SyntaxKind::Identifier
            | SyntaxKind::ConstantIdentifier
            | SyntaxKind::InstanceVariable
            | SyntaxKind::ClassVariable
            | SyntaxKind::GlobalVariable
            | SyntaxKind::Label
            | SyntaxKind::NilKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::SelfKeyword
            | SyntaxKind::NotKeyword
            | SyntaxKind::DefinedKeyword
            | SyntaxKind::DefKeyword
            | SyntaxKind::FileKeyword
            | SyntaxKind::LineKeyword
            | SyntaxKind::MinusGreaterThanToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenParenToken
            | SyntaxKind::ExclamationToken => true,
            // `foo -1` and `foo *args` but not `foo - 1`.
            SyntaxKind::MinusToken
            | SyntaxKind::PlusToken
            | SyntaxKind::AsteriskToken
            | SyntaxKind::AsteriskAsteriskToken
            | SyntaxKind::AmpersandToken
            | SyntaxKind::ColonColonToken
            | SyntaxKind::TildeToken => {
                let next = self.peek(1);
                !next.has_preceding_whitespace()
                    && !matches!(
                        next.kind,
                        SyntaxKind::NewLineToken | SyntaxKind::EndOfFileToken
                    )
            }
            _ => false,
        }
    }

    fn parse_command_arguments(&mut self) -> NodeList {
        self.with_no_do(true, |p| p.parse_argument_list(None))
    }

    pub(crate) fn parse_paren_arguments(&mut self) -> NodeList {
        self.next_token();
        let arguments = self.with_no_do(false, |p| p.parse_argument_list(Some(SyntaxKind::CloseParenToken)));
        self.skip_newlines();
        self.parse_expected(SyntaxKind::CloseParenToken);
        arguments
    }

    /// Comma-separated arguments. Trailing `key: value` pairs are gathered
    /// into a brace-less `Hash`. `closing` is left unconsumed.
    pub(crate) fn parse_argument_list(&mut self, closing: Option<SyntaxKind>) -> NodeList {
        let mut arguments = Vec::new();
        let mut pairs: Vec<NodeIndex> = Vec::new();

        loop {
            if let Some(closing) = closing {
                self.skip_newlines();
                if self.is_token(closing) {
                    break;
                }
            }

            let start = self.token_pos();
            let argument = match self.token() {
                SyntaxKind::Label => Some(self.parse_label_pair()),
                SyntaxKind::AsteriskAsteriskToken => {
                    self.next_token();
                    let expression = self.parse_optional_operand();
                    Some(self.add_node(start, NodeData::DoubleSplat { expression }))
                }
                _ => None,
            };

            if let Some(pair) = argument {
                pairs.push(pair);
            } else {
                let argument = self.parse_argument();
                if argument.is_none() {
                    self.error_expression_expected();
                    break;
                }
                if self.is_token(SyntaxKind::EqualsGreaterThanToken) {
                    self.next_token();
                    self.skip_newlines();
                    let value = self.parse_required_expression();
                    let pair = self.add_node(start, NodeData::Pair { key: argument, value });
                    pairs.push(pair);
                } else {
                    self.flush_implicit_hash(&mut arguments, &mut pairs);
                    arguments.push(argument);
                }
            }

            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
            self.skip_newlines();
        }

        self.flush_implicit_hash(&mut arguments, &mut pairs);
        arguments.into()
    }

    fn flush_implicit_hash(&mut self, arguments: &mut Vec<NodeIndex>, pairs: &mut Vec<NodeIndex>) {
        let (Some(&first), Some(&last)) = (pairs.first(), pairs.last()) else {
            return;
        };
        let range = self.node_range(first).cover(self.node_range(last));
        let pairs = std::mem::take(pairs);
        let hash = self.add_node_range(
            range,
            NodeData::Hash {
                pairs: pairs.into(),
                braces: false,
            },
        );
        arguments.push(hash);
    }

    /// `key: value`, or the shorthand `key:` with no value.
    fn parse_label_pair(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name = self.take_value();
        self.next_token();
        let key = self.add_node(
            start,
            NodeData::Symbol {
                name,
                parts: NodeList::new(),
            },
        );
        let value = if matches!(
            self.token(),
            SyntaxKind::CommaToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::NewLineToken
                | SyntaxKind::EndOfFileToken
        ) {
            NodeIndex::NONE
        } else {
            self.parse_required_expression()
        };
        self.add_node(start, NodeData::Pair { key, value })
    }

    /// A single argument: splat, block pass, or expression.
    pub(crate) fn parse_argument(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::AsteriskToken => {
                self.next_token();
                let expression = self.parse_optional_operand();
                self.add_node(start, NodeData::Splat { expression })
            }
            SyntaxKind::AmpersandToken => {
                self.next_token();
                let expression = self.parse_optional_operand();
                self.add_node(start, NodeData::BlockPass { expression })
            }
            _ => self.parse_expression(),
        }
    }

    /// Operand of `*`, `**` or `&`, absent for anonymous forwarding.
    fn parse_optional_operand(&mut self) -> NodeIndex {
        if matches!(
            self.token(),
            SyntaxKind::CommaToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::NewLineToken
                | SyntaxKind::EndOfFileToken
        ) {
            return NodeIndex::NONE;
        }
        self.parse_required_expression()
    }

    /// Attach a block, if one follows, and build the `Call` node.
    pub(crate) fn finish_call(
        &mut self,
        start: u32,
        receiver: NodeIndex,
        call_operator: SyntaxKind,
        name: String,
        name_range: TextRange,
        arguments: NodeList,
        has_parens: bool,
    ) -> NodeIndex {
        let block = self.parse_block_if_present();
        self.add_node(
            start,
            NodeData::Call {
                receiver,
                call_operator,
                name,
                name_range,
                arguments,
                block,
                has_parens,
            },
        )
    }

    pub(crate) fn parse_block_if_present(&mut self) -> NodeIndex {
        match self.token() {
            SyntaxKind::OpenBraceToken => self.parse_brace_block(),
            SyntaxKind::DoKeyword if !self.no_do => self.parse_do_block(),
            _ => NodeIndex::NONE,
        }
    }

    // =========================================================================
    // Postfix
    // =========================================================================

    pub(crate) fn parse_postfix_expression(&mut self, mut expr: NodeIndex, start: u32) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::DotToken | SyntaxKind::AmpersandDotToken => {
                    expr = self.parse_method_call(expr, start);
                }
                SyntaxKind::ColonColonToken if !self.has_preceding_whitespace() => {
                    expr = self.parse_scoped_access(expr, start);
                }
                SyntaxKind::OpenBracketToken
                    if !self.has_preceding_whitespace()
                        || !matches!(self.arena.data(expr), Some(NodeData::Call { .. })) =>
                {
                    self.next_token();
                    let arguments = self.with_no_do(false, |p| {
                        p.parse_argument_list(Some(SyntaxKind::CloseBracketToken))
                    });
                    self.skip_newlines();
                    self.parse_expected(SyntaxKind::CloseBracketToken);
                    expr = self.add_node(start, NodeData::Index { receiver: expr, arguments });
                }
                // A method chain continued on the next line with a leading dot.
                SyntaxKind::NewLineToken
                    if self.next_significant_is(&[SyntaxKind::DotToken, SyntaxKind::AmpersandDotToken]) =>
                {
                    self.skip_newlines();
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_method_call(&mut self, receiver: NodeIndex, start: u32) -> NodeIndex {
        let call_operator = self.token();
        self.next_token();
        self.skip_newlines();

        let name_range = self.token_range();
        let name = match self.token() {
            SyntaxKind::Identifier | SyntaxKind::ConstantIdentifier => {
                let name = self.take_value();
                self.next_token();
                name
            }
            // `proc.(1)` calls `call`.
            SyntaxKind::OpenParenToken => "call".to_string(),
            kind => {
                let text = keyword_to_text(kind).or_else(|| punctuation_to_text(kind));
                match text {
                    Some(text) => {
                        self.next_token();
                        text.to_string()
                    }
                    None => {
                        self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["identifier"]);
                        return receiver;
                    }
                }
            }
        };

        let (arguments, has_parens) =
            if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
                (self.parse_paren_arguments(), true)
            } else if self.can_start_command_arguments() {
                (self.parse_command_arguments(), false)
            } else {
                (NodeList::new(), false)
            };
        self.finish_call(start, receiver, call_operator, name, name_range, arguments, has_parens)
    }

    /// `Scope::Name` or `Scope::method`.
    fn parse_scoped_access(&mut self, scope: NodeIndex, start: u32) -> NodeIndex {
        self.next_token();
        match self.token() {
            SyntaxKind::ConstantIdentifier => self.parse_constant_expression(scope, start),
            SyntaxKind::Identifier => {
                let name_range = self.token_range();
                let name = self.take_value();
                self.next_token();
                let (arguments, has_parens) =
                    if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
                        (self.parse_paren_arguments(), true)
                    } else {
                        (NodeList::new(), false)
                    };
                self.finish_call(start, scope, SyntaxKind::ColonColonToken, name, name_range, arguments, has_parens)
            }
            _ => {
                self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["constant"]);
                scope
            }
        }
    }

    // =========================================================================
    // Grouping and collections
    // =========================================================================

    fn parse_parenthesized_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let body = self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::CloseParenToken]));
        self.parse_expected(SyntaxKind::CloseParenToken);
        self.add_node(start, NodeData::Parenthesized { body })
    }

    fn parse_array_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let elements = self.with_no_do(false, |p| p.parse_argument_list(Some(SyntaxKind::CloseBracketToken)));
        self.skip_newlines();
        self.parse_expected(SyntaxKind::CloseBracketToken);
        self.add_node(start, NodeData::Array { elements })
    }

    fn parse_hash_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let pairs = self.with_no_do(false, |p| {
            let mut pairs = Vec::new();
            loop {
                p.skip_newlines();
                if p.is_token(SyntaxKind::CloseBraceToken) {
                    break;
                }
                let pair = p.parse_hash_entry();
                if pair.is_none() {
                    break;
                }
                pairs.push(pair);
                p.skip_newlines();
                if !p.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
            }
            pairs
        });
        self.skip_newlines();
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.add_node(
            start,
            NodeData::Hash {
                pairs: pairs.into(),
                braces: true,
            },
        )
    }

    fn parse_hash_entry(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::Label => self.parse_label_pair(),
            SyntaxKind::AsteriskAsteriskToken => {
                self.next_token();
                let expression = self.parse_required_expression();
                self.add_node(start, NodeData::DoubleSplat { expression })
            }
            _ => {
                let key = self.parse_expression();
                if key.is_none() {
                    self.error_expression_expected();
                    return NodeIndex::NONE;
                }
                // `"key": value`
                if !self.parse_optional(SyntaxKind::ColonToken) {
                    self.skip_newlines();
                    self.parse_expected(SyntaxKind::EqualsGreaterThanToken);
                }
                self.skip_newlines();
                let value = self.parse_required_expression();
                self.add_node(start, NodeData::Pair { key, value })
            }
        }
    }

    // =========================================================================
    // String-like literals
    // =========================================================================

    /// Build `StringPart`/`Interpolation` nodes for the current token.
    fn parse_literal_parts(&mut self) -> NodeList {
        let segments = self.current().segments.clone();
        let mut parts = Vec::with_capacity(segments.len());
        for segment in segments {
            let part = match segment {
                StringSegment::Text(range) => self.add_node_range(range, NodeData::StringPart),
                StringSegment::Interpolation(range) => self.parse_interpolation(range),
            };
            parts.push(part);
        }
        parts.into()
    }

    fn parse_interpolation(&mut self, code: TextRange) -> NodeIndex {
        let body = self.parse_embedded_statements(code);
        // Cover the `#{` and `}` delimiters.
        let end = if (code.end as usize) < self.source.len() {
            code.end + 1
        } else {
            code.end
        };
        let range = TextRange::new(code.pos.saturating_sub(2), end);
        self.add_node_range(range, NodeData::Interpolation { body })
    }

    fn parse_string_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut parts = self.parse_literal_parts().nodes;
        self.next_token();
        // Adjacent literals concatenate: `"a" "b"`.
        while self.is_token(SyntaxKind::StringLiteral)
            && !self.current().has_preceding_line_break()
        {
            parts.extend(self.parse_literal_parts().nodes);
            self.next_token();
        }
        self.add_node(start, NodeData::Str { parts: parts.into() })
    }

    fn parse_heredoc_literal(&mut self) -> NodeIndex {
        let range = self.token_range();
        let body_range = self.current().heredoc_body;
        let parts = self.parse_literal_parts();
        self.next_token();
        self.add_node_range(range, NodeData::Heredoc { parts, body_range })
    }

    /// `%w[a b]` and `%i[a b]` become arrays of strings or symbols.
    fn parse_word_array(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let symbols = self.is_token(SyntaxKind::SymbolsLiteral);
        let segments = self.current().segments.clone();
        let mut elements = Vec::with_capacity(segments.len());
        for segment in segments {
            let range = segment.range();
            let element = if symbols {
                let name = range.slice(self.source).to_string();
                self.add_node_range(
                    range,
                    NodeData::Symbol {
                        name,
                        parts: NodeList::new(),
                    },
                )
            } else {
                let part = self.add_node_range(range, NodeData::StringPart);
                self.add_node_range(range, NodeData::Str { parts: vec![part].into() })
            };
            elements.push(element);
        }
        self.next_token();
        self.add_node(start, NodeData::Array { elements: elements.into() })
    }

    // =========================================================================
    // Keyword expressions
    // =========================================================================

    fn parse_defined_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let expression = if self.is_token(SyntaxKind::OpenParenToken) {
            self.next_token();
            let expression = self.with_no_do(false, |p| p.parse_required_expression_statement());
            self.skip_newlines();
            self.parse_expected(SyntaxKind::CloseParenToken);
            expression
        } else {
            self.parse_unary_operand(precedence::POWER + 1)
        };
        self.add_node(start, NodeData::Defined { expression })
    }

    /// `return`, `next` and `break` with optional arguments.
    fn parse_jump_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let keyword = self.token();
        self.next_token();
        let arguments = if ends_jump_arguments(self.token()) {
            NodeList::new()
        } else {
            self.parse_argument_list(None)
        };
        let data = match keyword {
            SyntaxKind::NextKeyword => NodeData::Next { arguments },
            SyntaxKind::BreakKeyword => NodeData::Break { arguments },
            _ => NodeData::Return { arguments },
        };
        self.add_node(start, data)
    }

    fn parse_yield_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let arguments = if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
            self.parse_paren_arguments()
        } else if self.can_start_command_arguments() {
            self.parse_command_arguments()
        } else {
            NodeList::new()
        };
        self.add_node(start, NodeData::Yield { arguments })
    }

    fn parse_super_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let (arguments, zsuper) =
            if self.is_token(SyntaxKind::OpenParenToken) && !self.has_preceding_whitespace() {
                (self.parse_paren_arguments(), false)
            } else if self.can_start_command_arguments() {
                (self.parse_command_arguments(), false)
            } else {
                (NodeList::new(), true)
            };
        let block = self.parse_block_if_present();
        self.add_node(start, NodeData::Super { arguments, block, zsuper })
    }
}
