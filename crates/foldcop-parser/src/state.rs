//! Parser state: token plumbing, diagnostics, scopes and statement lists.
//!
//! The source is tokenized up front; the parser walks the token vector with
//! a cursor. Expression parsing lives in `state_expressions.rs` and
//! keyword-introduced constructs in `state_statements.rs`.

use foldcop_common::{
    CommentRange, Diagnostic, DiagnosticMessage, TextRange, diagnostic_messages,
    limits::MAX_PARSE_DEPTH,
};
use foldcop_scanner::{ScanDiagnostic, ScannerState, SyntaxKind, Token, token_to_text};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::arena::NodeArena;
use crate::base::NodeIndex;
use crate::node::{Node, NodeData};

/// A lexical scope for local variables.
///
/// `def`, `class` and `module` open hard scopes that hide outer locals;
/// blocks and lambdas open soft scopes that see them.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    locals: FxHashSet<String>,
    hard: bool,
}

/// Output of parsing one file.
#[derive(Debug)]
pub struct ParsedFile {
    pub file_name: String,
    pub arena: NodeArena,
    pub root: NodeIndex,
    pub diagnostics: Vec<Diagnostic>,
    pub comments: Vec<CommentRange>,
}

impl ParsedFile {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

pub struct ParserState<'a> {
    pub(crate) file_name: String,
    pub(crate) source: &'a str,
    pub(crate) tokens: Vec<Token>,
    pub(crate) cursor: usize,
    pub arena: NodeArena,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) comments: Vec<CommentRange>,
    pub(crate) scopes: Vec<Scope>,
    /// Set while parsing command arguments and loop conditions, where
    /// `do` belongs to an outer construct.
    pub(crate) no_do: bool,
    pub(crate) depth: u32,
    /// End offset of the last consumed token.
    pub(crate) prev_end: u32,
    last_error_pos: Option<u32>,
}

impl<'a> ParserState<'a> {
    pub fn new(file_name: impl Into<String>, source: &'a str) -> Self {
        let output = ScannerState::new(source).tokenize();
        let mut parser = ParserState {
            file_name: file_name.into(),
            source,
            tokens: output.tokens,
            cursor: 0,
            arena: NodeArena::with_capacity(source.len() / 8 + 1),
            diagnostics: Vec::new(),
            comments: output.comments,
            scopes: vec![Scope {
                locals: FxHashSet::default(),
                hard: true,
            }],
            no_do: false,
            depth: 0,
            prev_end: 0,
            last_error_pos: None,
        };
        parser.add_scan_diagnostics(output.diagnostics);
        parser
    }

    /// Parse the whole file and return the `Program` node.
    pub fn parse_program(&mut self) -> NodeIndex {
        debug!(file = %self.file_name, tokens = self.tokens.len(), "parsing file");
        let body = self.parse_statements(&[]);
        let root = self.arena.add(Node::new(
            TextRange::from_offsets(0, self.source.len()),
            NodeData::Program { body },
        ));
        debug!(
            file = %self.file_name,
            nodes = self.arena.len(),
            errors = self.diagnostics.len(),
            "parsed file"
        );
        root
    }

    pub fn get_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn get_arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn into_parsed_file(self, root: NodeIndex) -> ParsedFile {
        ParsedFile {
            file_name: self.file_name,
            arena: self.arena,
            root,
            diagnostics: self.diagnostics,
            comments: self.comments,
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    #[inline]
    pub(crate) fn current(&self) -> &Token {
        // The token vector always ends with EndOfFileToken and the cursor
        // never moves past it.
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        let index = (self.cursor + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn token_pos(&self) -> u32 {
        self.current().range.pos
    }

    pub(crate) fn token_range(&self) -> TextRange {
        self.current().range
    }

    pub(crate) fn take_value(&self) -> String {
        self.current().value.clone()
    }

    pub(crate) fn has_preceding_whitespace(&self) -> bool {
        self.current().has_preceding_whitespace()
    }

    pub(crate) fn next_token(&mut self) {
        if self.token() != SyntaxKind::EndOfFileToken {
            self.prev_end = self.current().range.end;
            self.cursor += 1;
        }
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or report `'kind' expected.`
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &[token_to_text(kind)]);
        false
    }

    /// Consume the `end` closing the construct opened by `opener`.
    pub(crate) fn parse_expected_end(&mut self, opener: &str) -> bool {
        if self.parse_optional(SyntaxKind::EndKeyword) {
            return true;
        }
        self.error_at_current(diagnostic_messages::END_EXPECTED, &[opener]);
        false
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.is_token(SyntaxKind::NewLineToken) {
            self.next_token();
        }
    }

    pub(crate) fn skip_separators(&mut self) -> bool {
        let mut skipped = false;
        while matches!(
            self.token(),
            SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken
        ) {
            self.next_token();
            skipped = true;
        }
        skipped
    }

    /// Whether the next token after any newlines is `kind`.
    pub(crate) fn next_significant_is(&self, kinds: &[SyntaxKind]) -> bool {
        let mut offset = 0;
        while self.peek(offset).kind == SyntaxKind::NewLineToken {
            offset += 1;
        }
        kinds.contains(&self.peek(offset).kind)
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Add a node spanning from `start` to the end of the last consumed token.
    pub(crate) fn add_node(&mut self, start: u32, data: NodeData) -> NodeIndex {
        let end = self.prev_end.max(start);
        self.arena.add(Node::new(TextRange::new(start, end), data))
    }

    pub(crate) fn add_node_range(&mut self, range: TextRange, data: NodeData) -> NodeIndex {
        self.arena.add(Node::new(range, data))
    }

    pub(crate) fn node_range(&self, index: NodeIndex) -> TextRange {
        self.arena
            .get(index)
            .map_or(TextRange::empty(self.prev_end), |node| node.range)
    }

    pub(crate) fn missing_node(&mut self) -> NodeIndex {
        let pos = self.token_pos();
        self.add_node_range(TextRange::empty(pos), NodeData::Missing)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at(&mut self, range: TextRange, message: DiagnosticMessage, args: &[&str]) {
        // One error per position keeps recovery from cascading.
        if self.last_error_pos == Some(range.pos) {
            return;
        }
        self.last_error_pos = Some(range.pos);
        self.diagnostics.push(Diagnostic::from_message(
            self.file_name.clone(),
            range,
            &message,
            args,
        ));
    }

    pub(crate) fn error_at_current(&mut self, message: DiagnosticMessage, args: &[&str]) {
        let range = self.token_range();
        self.error_at(range, message, args);
    }

    pub(crate) fn error_expression_expected(&mut self) {
        self.error_at_current(diagnostic_messages::EXPRESSION_EXPECTED, &[]);
    }

    pub(crate) fn error_unexpected_token(&mut self) {
        let token = self.current();
        let text = match token.kind {
            SyntaxKind::EndOfFileToken | SyntaxKind::NewLineToken => {
                token_to_text(token.kind).to_string()
            }
            _ => token.range.slice(self.source).to_string(),
        };
        self.error_at_current(diagnostic_messages::UNEXPECTED_TOKEN, &[&text]);
    }

    fn add_scan_diagnostics(&mut self, diagnostics: Vec<ScanDiagnostic>) {
        for diag in diagnostics {
            let args: Vec<&str> = diag.args.iter().map(String::as_str).collect();
            self.diagnostics.push(Diagnostic::from_message(
                self.file_name.clone(),
                diag.range,
                &diag.message,
                &args,
            ));
        }
    }

    /// Scan `range` as code (an interpolation) and parse it with the
    /// current scopes. Returns the `Body` of its statements.
    pub(crate) fn parse_embedded_statements(&mut self, range: TextRange) -> NodeIndex {
        let output =
            ScannerState::with_range(self.source, range.pos as usize, range.end as usize).tokenize();
        self.add_scan_diagnostics(output.diagnostics);

        let saved_tokens = std::mem::replace(&mut self.tokens, output.tokens);
        let saved_cursor = std::mem::replace(&mut self.cursor, 0);
        let saved_prev_end = std::mem::replace(&mut self.prev_end, range.pos);
        let saved_no_do = std::mem::replace(&mut self.no_do, false);

        let body = self.parse_statements(&[]);

        self.tokens = saved_tokens;
        self.cursor = saved_cursor;
        self.prev_end = saved_prev_end;
        self.no_do = saved_no_do;
        body
    }

    // =========================================================================
    // Recursion and context
    // =========================================================================

    /// Enter one level of nesting. On overflow, reports once, skips the
    /// current token so callers make progress, and returns false.
    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.depth >= MAX_PARSE_DEPTH {
            self.error_at_current(diagnostic_messages::NESTING_TOO_DEEP, &[]);
            self.next_token();
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn with_no_do<T>(&mut self, no_do: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.no_do, no_do);
        let result = f(self);
        self.no_do = saved;
        result
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn push_scope(&mut self, hard: bool) {
        self.scopes.push(Scope {
            locals: FxHashSet::default(),
            hard,
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            if !scope.locals.contains(name) {
                scope.locals.insert(name.to_string());
            }
        }
    }

    pub(crate) fn is_local(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.locals.contains(name) {
                return true;
            }
            if scope.hard {
                break;
            }
        }
        false
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse statements until end of input or one of `terminators`, which
    /// is left unconsumed. Returns a `Body` node.
    pub(crate) fn parse_statements(&mut self, terminators: &[SyntaxKind]) -> NodeIndex {
        let start = self.token_pos();
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            let kind = self.token();
            if kind == SyntaxKind::EndOfFileToken || terminators.contains(&kind) {
                break;
            }

            let before = self.cursor;
            let statement = self.parse_statement();
            if statement.is_none() {
                self.error_unexpected_token();
                if self.cursor == before {
                    self.next_token();
                }
                self.recover_to_statement_boundary(terminators);
                continue;
            }
            statements.push(statement);
            if self.cursor == before {
                self.next_token();
            }

            match self.token() {
                SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken | SyntaxKind::EndOfFileToken => {}
                kind if terminators.contains(&kind) => {}
                _ => {
                    self.error_unexpected_token();
                    self.recover_to_statement_boundary(terminators);
                }
            }
        }

        let range = match (statements.first(), statements.last()) {
            (Some(&first), Some(&last)) => self.node_range(first).cover(self.node_range(last)),
            _ => TextRange::empty(start),
        };
        self.add_node_range(range, NodeData::Body { statements: statements.into() })
    }

    fn recover_to_statement_boundary(&mut self, terminators: &[SyntaxKind]) {
        loop {
            let kind = self.token();
            if matches!(
                kind,
                SyntaxKind::NewLineToken | SyntaxKind::SemicolonToken | SyntaxKind::EndOfFileToken
            ) || terminators.contains(&kind)
            {
                return;
            }
            self.next_token();
        }
    }

    /// A statement: an expression followed by any number of modifiers.
    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut expr = if self.looks_like_multiple_assignment() {
            self.parse_multiple_assignment()
        } else {
            self.parse_expression_statement()
        };
        if expr.is_none() {
            return expr;
        }

        loop {
            match self.token() {
                SyntaxKind::IfKeyword | SyntaxKind::UnlessKeyword => {
                    let negated = self.is_token(SyntaxKind::UnlessKeyword);
                    self.next_token();
                    let condition = self.parse_required_expression_statement();
                    expr = self.add_node(
                        start,
                        NodeData::If {
                            condition,
                            then_branch: expr,
                            else_branch: NodeIndex::NONE,
                            form: crate::node::IfForm::Modifier,
                            negated,
                        },
                    );
                }
                SyntaxKind::WhileKeyword | SyntaxKind::UntilKeyword => {
                    let until = self.is_token(SyntaxKind::UntilKeyword);
                    self.next_token();
                    let condition = self.parse_required_expression_statement();
                    expr = self.add_node(
                        start,
                        NodeData::While {
                            condition,
                            body: expr,
                            until,
                            modifier: true,
                        },
                    );
                }
                SyntaxKind::RescueKeyword => {
                    self.next_token();
                    let fallback = self.parse_required_expression_statement();
                    expr = self.add_node(
                        start,
                        NodeData::RescueModifier {
                            expression: expr,
                            fallback,
                        },
                    );
                }
                _ => break,
            }
        }
        expr
    }

    pub(crate) fn parse_required_expression_statement(&mut self) -> NodeIndex {
        let expr = self.parse_expression_statement();
        if expr.is_none() {
            self.error_expression_expected();
            return self.missing_node();
        }
        expr
    }

    /// Expression with the low-precedence `and`/`or`/`not` operators.
    pub(crate) fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_not_expression();
        if left.is_none() {
            return left;
        }
        while matches!(self.token(), SyntaxKind::AndKeyword | SyntaxKind::OrKeyword) {
            let operator = self.token();
            self.next_token();
            self.skip_newlines();
            let mut right = self.parse_not_expression();
            if right.is_none() {
                self.error_expression_expected();
                right = self.missing_node();
            }
            left = self.add_node(start, NodeData::Logical { left, operator, right });
        }
        left
    }

    pub(crate) fn parse_not_expression(&mut self) -> NodeIndex {
        if !self.is_token(SyntaxKind::NotKeyword) {
            return self.parse_expression();
        }
        if !self.enter_recursion() {
            return NodeIndex::NONE;
        }
        let start = self.token_pos();
        self.next_token();
        let mut operand = self.parse_not_expression();
        if operand.is_none() {
            self.error_expression_expected();
            operand = self.missing_node();
        }
        self.exit_recursion();
        self.add_node(
            start,
            NodeData::Unary {
                operator: SyntaxKind::NotKeyword,
                operand,
            },
        )
    }

    /// `a, b = ...` and `*a, b = ...` at statement start.
    fn looks_like_multiple_assignment(&self) -> bool {
        let mut offset = 0;
        let mut saw_comma = false;
        loop {
            if self.peek(offset).kind == SyntaxKind::AsteriskToken {
                offset += 1;
            }
            match self.peek(offset).kind {
                SyntaxKind::Identifier
                | SyntaxKind::InstanceVariable
                | SyntaxKind::ClassVariable
                | SyntaxKind::GlobalVariable
                | SyntaxKind::ConstantIdentifier => offset += 1,
                _ => return false,
            }
            match self.peek(offset).kind {
                SyntaxKind::CommaToken => {
                    saw_comma = true;
                    offset += 1;
                }
                SyntaxKind::EqualsToken => return saw_comma,
                _ => return false,
            }
        }
    }

    fn parse_multiple_assignment(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut targets = Vec::new();
        while !self.is_token(SyntaxKind::EqualsToken) {
            let target_start = self.token_pos();
            let splat = self.parse_optional(SyntaxKind::AsteriskToken);
            let target = self.parse_assignment_target();
            let target = if splat {
                self.add_node(target_start, NodeData::Splat { expression: target })
            } else {
                target
            };
            targets.push(target);
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::EqualsToken);
        self.skip_newlines();

        let value_start = self.token_pos();
        let mut values = vec![self.parse_argument()];
        while self.parse_optional(SyntaxKind::CommaToken) {
            self.skip_newlines();
            values.push(self.parse_argument());
        }
        let value = if values.len() == 1 {
            values[0]
        } else {
            self.add_node(value_start, NodeData::Array { elements: values.into() })
        };
        self.add_node(
            start,
            NodeData::MultipleAssignment {
                targets: targets.into(),
                value,
            },
        )
    }

    /// A simple variable target; locals are declared.
    pub(crate) fn parse_assignment_target(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name = self.take_value();
        let data = match self.token() {
            SyntaxKind::Identifier => {
                self.declare_local(&name);
                NodeData::Identifier { name }
            }
            SyntaxKind::InstanceVariable => NodeData::InstanceVariable { name },
            SyntaxKind::ClassVariable => NodeData::ClassVariable { name },
            SyntaxKind::GlobalVariable => NodeData::GlobalVariable { name },
            SyntaxKind::ConstantIdentifier => NodeData::Constant {
                scope: NodeIndex::NONE,
                name,
            },
            _ => {
                self.error_at_current(diagnostic_messages::TOKEN_EXPECTED, &["identifier"]);
                return self.missing_node();
            }
        };
        self.next_token();
        self.add_node(start, data)
    }
}
