//! Keyword-introduced constructs, blocks and parameter lists.

use foldcop_common::diagnostic_messages;
use foldcop_scanner::{SyntaxKind, keyword_to_text, punctuation_to_text};

use crate::base::{NodeIndex, NodeList};
use crate::node::{IfForm, NodeData, ParameterKind};
use crate::state::ParserState;
use crate::state_expressions::precedence;

const BODY_CLAUSES: &[SyntaxKind] = &[
    SyntaxKind::RescueKeyword,
    SyntaxKind::ElseKeyword,
    SyntaxKind::EnsureKeyword,
    SyntaxKind::EndKeyword,
];

impl ParserState<'_> {
    // =========================================================================
    // Conditionals and loops
    // =========================================================================

    /// Accept `then`, a separator, or both.
    fn parse_then(&mut self) {
        let separated = self.skip_separators();
        if !self.parse_optional(SyntaxKind::ThenKeyword) && !separated {
            self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["then"]);
        }
    }

    /// Accept `do`, a separator, or both, after a loop header.
    fn parse_loop_separator(&mut self) {
        let separated = self.skip_separators();
        if !self.parse_optional(SyntaxKind::DoKeyword) && !separated {
            self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["do"]);
        }
    }

    pub(crate) fn parse_if_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let negated = self.is_token(SyntaxKind::UnlessKeyword);
        let keyword = if negated { "unless" } else { "if" };
        self.next_token();

        // `if` plus every `elsif`, folded into nested nodes once the chain ends.
        let mut clauses = Vec::new();
        loop {
            let clause_start = if clauses.is_empty() { start } else { self.token_pos() };
            if !clauses.is_empty() {
                self.next_token();
            }
            let condition = self.with_no_do(false, |p| p.parse_required_expression_statement());
            self.parse_then();
            let then_branch = self.parse_statements(&[
                SyntaxKind::ElsifKeyword,
                SyntaxKind::ElseKeyword,
                SyntaxKind::EndKeyword,
            ]);
            clauses.push((clause_start, condition, then_branch));
            if negated || !self.is_token(SyntaxKind::ElsifKeyword) {
                break;
            }
        }

        let mut else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statements(&[SyntaxKind::EndKeyword])
        } else {
            NodeIndex::NONE
        };
        self.parse_expected_end(keyword);

        let mut result = NodeIndex::NONE;
        for (index, (clause_start, condition, then_branch)) in clauses.into_iter().enumerate().rev() {
            result = self.add_node(
                clause_start,
                NodeData::If {
                    condition,
                    then_branch,
                    else_branch,
                    form: IfForm::Statement,
                    negated: negated && index == 0,
                },
            );
            else_branch = result;
        }
        result
    }

    pub(crate) fn parse_while_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let until = self.is_token(SyntaxKind::UntilKeyword);
        self.next_token();
        let condition = self.with_no_do(true, |p| p.parse_required_expression_statement());
        self.parse_loop_separator();
        let body = self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::EndKeyword]));
        self.parse_expected_end(if until { "until" } else { "while" });
        self.add_node(
            start,
            NodeData::While {
                condition,
                body,
                until,
                modifier: false,
            },
        )
    }

    pub(crate) fn parse_for_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut variables = Vec::new();
        loop {
            variables.push(self.parse_assignment_target());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::InKeyword);
        let iterable = self.with_no_do(true, |p| p.parse_required_expression_statement());
        self.parse_loop_separator();
        let body = self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::EndKeyword]));
        self.parse_expected_end("for");
        self.add_node(
            start,
            NodeData::For {
                variables: variables.into(),
                iterable,
                body,
            },
        )
    }

    pub(crate) fn parse_case_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let subject = if matches!(
            self.token(),
            SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken
        ) {
            NodeIndex::NONE
        } else {
            self.with_no_do(false, |p| p.parse_required_expression_statement())
        };
        self.skip_separators();

        let mut whens = Vec::new();
        while self.is_token(SyntaxKind::WhenKeyword) {
            let when_start = self.token_pos();
            self.next_token();
            let mut conditions = Vec::new();
            loop {
                let condition = self.parse_argument();
                if condition.is_none() {
                    self.error_expression_expected();
                    break;
                }
                conditions.push(condition);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
                self.skip_newlines();
            }
            self.parse_then();
            let body = self.parse_statements(&[
                SyntaxKind::WhenKeyword,
                SyntaxKind::ElseKeyword,
                SyntaxKind::EndKeyword,
            ]);
            whens.push(self.add_node(
                when_start,
                NodeData::When {
                    conditions: conditions.into(),
                    body,
                },
            ));
        }
        if whens.is_empty() {
            self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["when"]);
        }

        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_statements(&[SyntaxKind::EndKeyword])
        } else {
            NodeIndex::NONE
        };
        self.parse_expected_end("case");
        self.add_node(
            start,
            NodeData::Case {
                subject,
                whens: whens.into(),
                else_branch,
            },
        )
    }

    // =========================================================================
    // Bodies with rescue clauses
    // =========================================================================

    pub(crate) fn parse_begin_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let body = self.with_no_do(false, |p| p.parse_statements(BODY_CLAUSES));
        let (rescues, else_branch, ensure_branch) = self.parse_rescue_clauses();
        self.parse_expected_end("begin");
        self.add_node(
            start,
            NodeData::Begin {
                body,
                rescues,
                else_branch,
                ensure_branch,
            },
        )
    }

    /// Statements of a `def`, `do` block, `class` or `module` body, which may
    /// carry `rescue`/`else`/`ensure` clauses. The closing `end` is left for
    /// the caller.
    pub(crate) fn parse_body_with_clauses(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let body = self.with_no_do(false, |p| p.parse_statements(BODY_CLAUSES));
        if !matches!(
            self.token(),
            SyntaxKind::RescueKeyword | SyntaxKind::ElseKeyword | SyntaxKind::EnsureKeyword
        ) {
            return body;
        }
        let (rescues, else_branch, ensure_branch) = self.parse_rescue_clauses();
        self.add_node(
            start,
            NodeData::Begin {
                body,
                rescues,
                else_branch,
                ensure_branch,
            },
        )
    }

    fn parse_rescue_clauses(&mut self) -> (NodeList, NodeIndex, NodeIndex) {
        let mut rescues = Vec::new();
        while self.is_token(SyntaxKind::RescueKeyword) {
            let start = self.token_pos();
            self.next_token();

            let mut exceptions = Vec::new();
            while !matches!(
                self.token(),
                SyntaxKind::EqualsGreaterThanToken
                    | SyntaxKind::ThenKeyword
                    | SyntaxKind::NewLineToken
                    | SyntaxKind::SemicolonToken
                    | SyntaxKind::EndOfFileToken
            ) {
                let exception = self.parse_argument();
                if exception.is_none() {
                    self.error_expression_expected();
                    break;
                }
                exceptions.push(exception);
                if !self.parse_optional(SyntaxKind::CommaToken) {
                    break;
                }
                self.skip_newlines();
            }

            let variable = if self.parse_optional(SyntaxKind::EqualsGreaterThanToken) {
                self.parse_assignment_target()
            } else {
                NodeIndex::NONE
            };
            self.parse_then();
            let body = self.with_no_do(false, |p| p.parse_statements(BODY_CLAUSES));
            rescues.push(self.add_node(
                start,
                NodeData::Rescue {
                    exceptions: exceptions.into(),
                    variable,
                    body,
                },
            ));
        }

        let else_branch = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.with_no_do(false, |p| {
                p.parse_statements(&[SyntaxKind::EnsureKeyword, SyntaxKind::EndKeyword])
            })
        } else {
            NodeIndex::NONE
        };
        let ensure_branch = if self.parse_optional(SyntaxKind::EnsureKeyword) {
            self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::EndKeyword]))
        } else {
            NodeIndex::NONE
        };
        (rescues.into(), else_branch, ensure_branch)
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    pub(crate) fn parse_def_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();

        // `def self.name` / `def Const.name`
        let mut singleton = NodeIndex::NONE;
        if matches!(
            self.token(),
            SyntaxKind::SelfKeyword | SyntaxKind::ConstantIdentifier | SyntaxKind::Identifier
        ) && self.peek(1).kind == SyntaxKind::DotToken
        {
            let receiver_start = self.token_pos();
            let data = match self.token() {
                SyntaxKind::SelfKeyword => NodeData::SelfRef,
                SyntaxKind::ConstantIdentifier => NodeData::Constant {
                    scope: NodeIndex::NONE,
                    name: self.take_value(),
                },
                _ => NodeData::Identifier {
                    name: self.take_value(),
                },
            };
            self.next_token();
            singleton = self.add_node(receiver_start, data);
            self.next_token();
        }

        let Some(mut name) = self.parse_method_name() else {
            self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["method name"]);
            return self.missing_node();
        };
        // Setter: `def name=(value)`
        if self.is_token(SyntaxKind::EqualsToken)
            && !self.has_preceding_whitespace()
            && self.peek(1).kind == SyntaxKind::OpenParenToken
        {
            name.push('=');
            self.next_token();
        }

        self.push_scope(true);
        let parameters = if self.is_token(SyntaxKind::OpenParenToken) {
            self.next_token();
            let parameters = self.parse_parameter_list(&[SyntaxKind::CloseParenToken], false);
            self.parse_expected(SyntaxKind::CloseParenToken);
            parameters
        } else if matches!(
            self.token(),
            SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken | SyntaxKind::EqualsToken
        ) {
            NodeList::new()
        } else {
            self.parse_parameter_list(&[SyntaxKind::NewLineToken, SyntaxKind::SemicolonToken], false)
        };

        // Endless definition: `def name(args) = expr`
        if self.parse_optional(SyntaxKind::EqualsToken) {
            self.skip_newlines();
            let statement_start = self.token_pos();
            let statement = self.parse_statement();
            let statement = if statement.is_none() {
                self.error_expression_expected();
                self.missing_node()
            } else {
                statement
            };
            let body = self.add_node(statement_start, NodeData::Body { statements: vec![statement].into() });
            self.pop_scope();
            return self.add_node(
                start,
                NodeData::Def {
                    singleton,
                    name,
                    parameters,
                    body,
                },
            );
        }

        let body = self.parse_body_with_clauses();
        self.parse_expected_end("def");
        self.pop_scope();
        self.add_node(
            start,
            NodeData::Def {
                singleton,
                name,
                parameters,
                body,
            },
        )
    }

    /// A method name after `def`, `alias` or `undef`.
    fn parse_method_name(&mut self) -> Option<String> {
        let kind = self.token();
        let name = match kind {
            SyntaxKind::Identifier | SyntaxKind::ConstantIdentifier => self.take_value(),
            SyntaxKind::OpenBracketToken if self.peek(1).kind == SyntaxKind::CloseBracketToken => {
                self.next_token();
                if self.peek(1).kind == SyntaxKind::EqualsToken && !self.peek(1).has_preceding_whitespace() {
                    self.next_token();
                    "[]=".to_string()
                } else {
                    "[]".to_string()
                }
            }
            _ => keyword_to_text(kind).or_else(|| punctuation_to_text(kind))?.to_string(),
        };
        self.next_token();
        Some(name)
    }

    pub(crate) fn parse_class_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();

        if self.parse_optional(SyntaxKind::LessThanLessThanToken) {
            let target = self.parse_required_expression();
            self.skip_separators();
            self.push_scope(true);
            let body = self.parse_body_with_clauses();
            self.parse_expected_end("class");
            self.pop_scope();
            return self.add_node(start, NodeData::SingletonClass { target, body });
        }

        let path = self.parse_constant_path();
        let superclass = if self.parse_optional(SyntaxKind::LessThanToken) {
            self.parse_required_expression()
        } else {
            NodeIndex::NONE
        };
        self.push_scope(true);
        let body = self.parse_body_with_clauses();
        self.parse_expected_end("class");
        self.pop_scope();
        self.add_node(start, NodeData::Class { path, superclass, body })
    }

    pub(crate) fn parse_module_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let path = self.parse_constant_path();
        self.push_scope(true);
        let body = self.parse_body_with_clauses();
        self.parse_expected_end("module");
        self.pop_scope();
        self.add_node(start, NodeData::Module { path, body })
    }

    /// `Name`, `::Name` or `A::B::Name`.
    fn parse_constant_path(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut scope = NodeIndex::NONE;
        self.parse_optional(SyntaxKind::ColonColonToken);
        loop {
            if !self.is_token(SyntaxKind::ConstantIdentifier) {
                self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["constant"]);
                return if scope.is_some() { scope } else { self.missing_node() };
            }
            let name = self.take_value();
            self.next_token();
            scope = self.add_node(start, NodeData::Constant { scope, name });
            if !self.parse_optional(SyntaxKind::ColonColonToken) {
                return scope;
            }
        }
    }

    pub(crate) fn parse_alias_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let new_name = self.parse_alias_name();
        let old_name = self.parse_alias_name();
        self.add_node(start, NodeData::Alias { new_name, old_name })
    }

    pub(crate) fn parse_undef_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut names = vec![self.parse_alias_name()];
        while self.parse_optional(SyntaxKind::CommaToken) {
            names.push(self.parse_alias_name());
        }
        self.add_node(start, NodeData::Undef { names: names.into() })
    }

    /// `:sym`, a bare method name, or a global variable.
    fn parse_alias_name(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::SymbolLiteral => {
                let name = self.take_value();
                self.next_token();
                self.add_node(start, NodeData::Symbol { name, parts: NodeList::new() })
            }
            SyntaxKind::GlobalVariable => {
                let name = self.take_value();
                self.next_token();
                self.add_node(start, NodeData::GlobalVariable { name })
            }
            _ => match self.parse_method_name() {
                Some(name) => self.add_node(start, NodeData::Symbol { name, parts: NodeList::new() }),
                None => {
                    self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["method name"]);
                    self.missing_node()
                }
            },
        }
    }

    // =========================================================================
    // Blocks and lambdas
    // =========================================================================

    pub(crate) fn parse_brace_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        self.push_scope(false);
        let parameters = self.parse_block_parameters();
        let body = self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::CloseBraceToken]));
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.pop_scope();
        self.add_node(
            start,
            NodeData::Block {
                parameters,
                body,
                brace: true,
            },
        )
    }

    pub(crate) fn parse_do_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        self.push_scope(false);
        let parameters = self.parse_block_parameters();
        let body = self.parse_body_with_clauses();
        self.parse_expected_end("do");
        self.pop_scope();
        self.add_node(
            start,
            NodeData::Block {
                parameters,
                body,
                brace: false,
            },
        )
    }

    /// `|a, (b, c); d|` at the start of a block.
    fn parse_block_parameters(&mut self) -> NodeList {
        self.skip_newlines();
        if self.parse_optional(SyntaxKind::BarBarToken) {
            return NodeList::new();
        }
        if !self.parse_optional(SyntaxKind::BarToken) {
            return NodeList::new();
        }
        let parameters = self.parse_parameter_list(&[SyntaxKind::BarToken], true);
        self.parse_expected(SyntaxKind::BarToken);
        parameters
    }

    pub(crate) fn parse_lambda_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        self.push_scope(false);
        let parameters = if self.parse_optional(SyntaxKind::OpenParenToken) {
            let parameters = self.parse_parameter_list(&[SyntaxKind::CloseParenToken], true);
            self.parse_expected(SyntaxKind::CloseParenToken);
            parameters
        } else {
            self.parse_parameter_list(&[SyntaxKind::OpenBraceToken, SyntaxKind::DoKeyword], false)
        };

        let body = if self.parse_optional(SyntaxKind::OpenBraceToken) {
            let body = self.with_no_do(false, |p| p.parse_statements(&[SyntaxKind::CloseBraceToken]));
            self.parse_expected(SyntaxKind::CloseBraceToken);
            body
        } else if self.parse_optional(SyntaxKind::DoKeyword) {
            let body = self.parse_body_with_clauses();
            self.parse_expected_end("do");
            body
        } else {
            self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["{"]);
            self.missing_node()
        };
        self.pop_scope();
        self.add_node(start, NodeData::Lambda { parameters, body })
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Parameters up to (not including) one of `closers`. With
    /// `block_locals`, `; a, b` declares block-local variables.
    fn parse_parameter_list(&mut self, closers: &[SyntaxKind], block_locals: bool) -> NodeList {
        let multiline = closers.contains(&SyntaxKind::CloseParenToken)
            || closers.contains(&SyntaxKind::BarToken);
        let mut parameters = Vec::new();
        loop {
            if multiline {
                self.skip_newlines();
            }
            if closers.contains(&self.token()) || self.is_token(SyntaxKind::EndOfFileToken) {
                break;
            }
            if block_locals && self.parse_optional(SyntaxKind::SemicolonToken) {
                self.parse_block_locals(&mut parameters);
                break;
            }
            let parameter = self.parse_parameter(closers);
            if parameter.is_none() {
                self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["parameter"]);
                break;
            }
            parameters.push(parameter);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                if multiline {
                    self.skip_newlines();
                }
                if block_locals && self.is_token(SyntaxKind::SemicolonToken) {
                    continue;
                }
                break;
            }
        }
        parameters.into()
    }

    fn parse_block_locals(&mut self, parameters: &mut Vec<NodeIndex>) {
        loop {
            self.skip_newlines();
            if !self.is_token(SyntaxKind::Identifier) {
                break;
            }
            let start = self.token_pos();
            let name = self.take_value();
            self.declare_local(&name);
            self.next_token();
            parameters.push(self.add_node(
                start,
                NodeData::Parameter {
                    name,
                    kind: ParameterKind::BlockLocal,
                    default: NodeIndex::NONE,
                },
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
    }

    fn parse_parameter(&mut self, closers: &[SyntaxKind]) -> NodeIndex {
        let start = self.token_pos();
        let in_bars = closers.contains(&SyntaxKind::BarToken);
        let (name, kind, default) = match self.token() {
            SyntaxKind::Identifier => {
                let name = self.take_value();
                self.declare_local(&name);
                self.next_token();
                if self.parse_optional(SyntaxKind::EqualsToken) {
                    (name, ParameterKind::Optional, self.parse_default_value(in_bars))
                } else {
                    (name, ParameterKind::Required, NodeIndex::NONE)
                }
            }
            SyntaxKind::Label => {
                let name = self.take_value();
                self.declare_local(&name);
                self.next_token();
                if self.is_token(SyntaxKind::CommaToken)
                    || self.is_token(SyntaxKind::NewLineToken)
                    || closers.contains(&self.token())
                {
                    (name, ParameterKind::RequiredKeyword, NodeIndex::NONE)
                } else {
                    (name, ParameterKind::Keyword, self.parse_default_value(in_bars))
                }
            }
            SyntaxKind::AsteriskToken => {
                self.next_token();
                (self.parse_optional_parameter_name(), ParameterKind::Rest, NodeIndex::NONE)
            }
            SyntaxKind::AsteriskAsteriskToken => {
                self.next_token();
                let name = if self.parse_optional(SyntaxKind::NilKeyword) {
                    "nil".to_string()
                } else {
                    self.parse_optional_parameter_name()
                };
                (name, ParameterKind::KeywordRest, NodeIndex::NONE)
            }
            SyntaxKind::AmpersandToken => {
                self.next_token();
                (self.parse_optional_parameter_name(), ParameterKind::Block, NodeIndex::NONE)
            }
            SyntaxKind::DotDotDotToken => {
                self.next_token();
                ("...".to_string(), ParameterKind::Rest, NodeIndex::NONE)
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let parameters = self.parse_parameter_list(&[SyntaxKind::CloseParenToken], false);
                self.parse_expected(SyntaxKind::CloseParenToken);
                return self.add_node(start, NodeData::DestructuredParameter { parameters });
            }
            _ => return NodeIndex::NONE,
        };
        self.add_node(start, NodeData::Parameter { name, kind, default })
    }

    fn parse_optional_parameter_name(&mut self) -> String {
        if self.is_token(SyntaxKind::Identifier) {
            let name = self.take_value();
            self.declare_local(&name);
            self.next_token();
            name
        } else {
            String::new()
        }
    }

    /// Inside `|...|` a default stops before `|`.
    fn parse_default_value(&mut self, in_bars: bool) -> NodeIndex {
        if in_bars {
            let value = self.parse_binary_expression(precedence::BITWISE_AND);
            if value.is_none() {
                self.error_expression_expected();
                return self.missing_node();
            }
            value
        } else {
            self.parse_required_expression()
        }
    }
}
