//! Scanner implementation.
//!
//! `ScannerState` walks the source bytes and produces one `Token` per call
//! to [`ScannerState::scan`]. Newlines are tokens: the parser decides where
//! they terminate a statement. Comments are collected on the side.
//!
//! Heredoc bodies are consumed eagerly when their opener is scanned. The
//! scanner then records a resume point and jumps over the body the next
//! time it crosses a line break, so the tokens of the opener line keep
//! their source order.

use bitflags::bitflags;
use foldcop_common::{
    CommentRange, DiagnosticMessage, TextRange, diagnostic_messages, limits,
};

use crate::syntax_kind::{SyntaxKind, keyword_is_value, text_to_keyword, token_is_keyword};

bitflags! {
    /// Per-token flags describing the trivia before it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        const PRECEDING_LINE_BREAK = 1 << 0;
        const PRECEDING_WHITESPACE = 1 << 1;
        const UNTERMINATED = 1 << 2;
    }
}

/// A piece of a string-like literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StringSegment {
    /// Literal text, as a raw source range (escapes not processed).
    Text(TextRange),
    /// The code between `#{` and `}`.
    Interpolation(TextRange),
}

impl StringSegment {
    pub const fn range(self) -> TextRange {
        match self {
            StringSegment::Text(range) | StringSegment::Interpolation(range) => range,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub flags: TokenFlags,
    /// Identifier/label/symbol name, processed string text, heredoc
    /// identifier, or the raw text of numbers.
    pub value: String,
    /// Text and interpolation pieces of string-like literals.
    pub segments: Vec<StringSegment>,
    /// For heredocs, the body lines between the opener line and the terminator.
    pub heredoc_body: TextRange,
}

impl Token {
    fn new(kind: SyntaxKind, range: TextRange, flags: TokenFlags) -> Self {
        Token {
            kind,
            range,
            flags,
            value: String::new(),
            segments: Vec::new(),
            heredoc_body: TextRange::default(),
        }
    }

    pub fn has_preceding_whitespace(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_WHITESPACE)
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    pub fn is_unterminated(&self) -> bool {
        self.flags.contains(TokenFlags::UNTERMINATED)
    }

    pub fn has_interpolation(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, StringSegment::Interpolation(_)))
    }
}

/// A problem found while scanning. The parser attaches the file name.
#[derive(Clone, Debug)]
pub struct ScanDiagnostic {
    pub range: TextRange,
    pub message: DiagnosticMessage,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentRange>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

/// Result of scanning the inside of a delimited literal.
struct LiteralBody {
    segments: Vec<StringSegment>,
    value: String,
    terminated: bool,
}

const OPERATOR_SYMBOLS: &[&str] = &[
    "[]=", "[]", "<=>", "===", "==", "=~", "!=", "!~", "**", "+@", "-@", "<<", ">>", "<=", ">=",
    "+", "-", "*", "/", "%", "<", ">", "!", "&", "|", "^", "~",
];

pub struct ScannerState<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    /// Kind of the last token returned (comments excluded).
    prev_kind: SyntaxKind,
    /// Where to continue after the next line break, past pending heredoc bodies.
    heredoc_resume: Option<usize>,
    comments: Vec<CommentRange>,
    diagnostics: Vec<ScanDiagnostic>,
}

impl<'a> ScannerState<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut state = Self::with_range(source, 0, source.len());
        if source.starts_with('\u{FEFF}') {
            state.pos = 3;
        }
        state
    }

    /// Scan only `[start, end)` of `source`. Token ranges stay absolute,
    /// which is how interpolated code is re-scanned.
    pub fn with_range(source: &'a str, start: usize, end: usize) -> Self {
        let end = end.min(source.len());
        ScannerState {
            source,
            bytes: source.as_bytes(),
            pos: start.min(end),
            end,
            prev_kind: SyntaxKind::Unknown,
            heredoc_resume: None,
            comments: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Scan the whole range into tokens, ending with `EndOfFileToken`.
    pub fn tokenize(mut self) -> ScanOutput {
        let mut tokens =
            Vec::with_capacity((self.end - self.pos) / limits::TOKENS_PER_SOURCE_BYTE_DIVISOR + 1);
        loop {
            let token = self.scan();
            let done = token.kind == SyntaxKind::EndOfFileToken;
            tokens.push(token);
            if done {
                break;
            }
        }
        ScanOutput {
            tokens,
            comments: self.comments,
            diagnostics: self.diagnostics,
        }
    }

    pub fn comments(&self) -> &[CommentRange] {
        &self.comments
    }

    pub fn diagnostics(&self) -> &[ScanDiagnostic] {
        &self.diagnostics
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        let mut flags = self.skip_trivia();
        if self.prev_kind == SyntaxKind::NewLineToken {
            flags |= TokenFlags::PRECEDING_LINE_BREAK;
        }
        let token = self.scan_token(flags);
        self.prev_kind = token.kind;
        token
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    fn skip_trivia(&mut self) -> TokenFlags {
        let mut flags = TokenFlags::empty();
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | 0x0c | 0x0b => {
                    self.pos += 1;
                    flags |= TokenFlags::PRECEDING_WHITESPACE;
                }
                b'\\' if self.peek(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.resume_after_line_break();
                    flags |= TokenFlags::PRECEDING_WHITESPACE;
                }
                b'\\' if self.peek(1) == Some(b'\r') && self.peek(2) == Some(b'\n') => {
                    self.pos += 3;
                    self.resume_after_line_break();
                    flags |= TokenFlags::PRECEDING_WHITESPACE;
                }
                b'#' => {
                    let start = self.pos;
                    let line_end = self.line_end(start);
                    let own_line = self.only_whitespace_before(start);
                    self.comments.push(CommentRange::new(
                        start as u32,
                        line_end as u32,
                        false,
                        own_line,
                    ));
                    self.pos = line_end;
                    flags |= TokenFlags::PRECEDING_WHITESPACE;
                }
                b'=' if self.at_line_start(self.pos) && self.starts_with_word(self.pos, "=begin") => {
                    self.skip_block_comment();
                    flags |= TokenFlags::PRECEDING_WHITESPACE;
                }
                b'_' if self.at_line_start(self.pos) && self.is_end_marker(self.pos) => {
                    self.pos = self.end;
                }
                _ => break,
            }
        }
        flags
    }

    fn skip_block_comment(&mut self) {
        let start = self.pos;
        let mut line_start = start;
        loop {
            let line_end = self.line_end(line_start);
            if line_start != start && self.starts_with_word(line_start, "=end") {
                self.pos = line_end;
                break;
            }
            if line_end >= self.end {
                self.pos = self.end;
                break;
            }
            line_start = line_end + 1;
        }
        self.comments
            .push(CommentRange::new(start as u32, self.pos as u32, true, true));
    }

    /// `__END__` alone on a line stops scanning.
    fn is_end_marker(&self, pos: usize) -> bool {
        let rest = &self.bytes[pos..self.end];
        rest.starts_with(b"__END__")
            && matches!(rest.get(7), None | Some(b'\n') | Some(b'\r'))
    }

    fn resume_after_line_break(&mut self) {
        if let Some(resume) = self.heredoc_resume.take() {
            self.pos = resume.max(self.pos).min(self.end);
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn scan_token(&mut self, flags: TokenFlags) -> Token {
        let start = self.pos;
        if start >= self.end {
            return Token::new(SyntaxKind::EndOfFileToken, TextRange::empty(self.end as u32), flags);
        }
        let had_ws = flags.contains(TokenFlags::PRECEDING_WHITESPACE);
        let ch = self.bytes[start];

        match ch {
            b'\n' => {
                self.pos += 1;
                self.resume_after_line_break();
                Token::new(SyntaxKind::NewLineToken, TextRange::from_offsets(start, start + 1), flags)
            }
            b';' => self.simple(SyntaxKind::SemicolonToken, start, 1, flags),
            b'(' => self.simple(SyntaxKind::OpenParenToken, start, 1, flags),
            b')' => self.simple(SyntaxKind::CloseParenToken, start, 1, flags),
            b'[' => self.simple(SyntaxKind::OpenBracketToken, start, 1, flags),
            b']' => self.simple(SyntaxKind::CloseBracketToken, start, 1, flags),
            b'{' => self.simple(SyntaxKind::OpenBraceToken, start, 1, flags),
            b'}' => self.simple(SyntaxKind::CloseBraceToken, start, 1, flags),
            b',' => self.simple(SyntaxKind::CommaToken, start, 1, flags),
            b'~' => self.simple(SyntaxKind::TildeToken, start, 1, flags),
            b'.' => {
                if self.peek(1) == Some(b'.') {
                    if self.peek(2) == Some(b'.') {
                        self.simple(SyntaxKind::DotDotDotToken, start, 3, flags)
                    } else {
                        self.simple(SyntaxKind::DotDotToken, start, 2, flags)
                    }
                } else {
                    self.simple(SyntaxKind::DotToken, start, 1, flags)
                }
            }
            b':' => {
                if self.peek(1) == Some(b':') {
                    self.simple(SyntaxKind::ColonColonToken, start, 2, flags)
                } else if let Some(token) = self.try_scan_symbol(start, flags) {
                    token
                } else {
                    self.simple(SyntaxKind::ColonToken, start, 1, flags)
                }
            }
            b'?' => {
                if let Some(token) = self.try_scan_character(start, flags, had_ws) {
                    token
                } else {
                    self.simple(SyntaxKind::QuestionToken, start, 1, flags)
                }
            }
            b'"' | b'`' => {
                self.pos = start + 1;
                self.scan_quoted(start, ch, true, flags)
            }
            b'\'' => {
                self.pos = start + 1;
                self.scan_quoted(start, ch, false, flags)
            }
            b'@' => self.scan_instance_or_class_variable(start, flags),
            b'$' => self.scan_global_variable(start, flags),
            b'%' => {
                if self.percent_literal_allowed(start, had_ws) {
                    if let Some(token) = self.try_scan_percent_literal(start, flags) {
                        return token;
                    }
                }
                if self.peek(1) == Some(b'=') {
                    self.simple(SyntaxKind::PercentEqualsToken, start, 2, flags)
                } else {
                    self.simple(SyntaxKind::PercentToken, start, 1, flags)
                }
            }
            b'/' => {
                if self.value_expected() || self.command_arg_position(start, had_ws) {
                    self.pos = start + 1;
                    self.scan_regex(start, b'/', None, flags)
                } else if self.peek(1) == Some(b'=') {
                    self.simple(SyntaxKind::SlashEqualsToken, start, 2, flags)
                } else {
                    self.simple(SyntaxKind::SlashToken, start, 1, flags)
                }
            }
            b'<' => {
                if self.peek(1) == Some(b'<') {
                    if let Some(token) = self.try_scan_heredoc(start, flags, had_ws) {
                        return token;
                    }
                    if self.peek(2) == Some(b'=') {
                        self.simple(SyntaxKind::LessThanLessThanEqualsToken, start, 3, flags)
                    } else {
                        self.simple(SyntaxKind::LessThanLessThanToken, start, 2, flags)
                    }
                } else if self.peek(1) == Some(b'=') {
                    if self.peek(2) == Some(b'>') {
                        self.simple(SyntaxKind::LessThanEqualsGreaterThanToken, start, 3, flags)
                    } else {
                        self.simple(SyntaxKind::LessThanEqualsToken, start, 2, flags)
                    }
                } else {
                    self.simple(SyntaxKind::LessThanToken, start, 1, flags)
                }
            }
            b'>' => match (self.peek(1), self.peek(2)) {
                (Some(b'>'), Some(b'=')) => self.simple(SyntaxKind::GreaterThanGreaterThanEqualsToken, start, 3, flags),
                (Some(b'>'), _) => self.simple(SyntaxKind::GreaterThanGreaterThanToken, start, 2, flags),
                (Some(b'='), _) => self.simple(SyntaxKind::GreaterThanEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::GreaterThanToken, start, 1, flags),
            },
            b'=' => match (self.peek(1), self.peek(2)) {
                (Some(b'='), Some(b'=')) => self.simple(SyntaxKind::EqualsEqualsEqualsToken, start, 3, flags),
                (Some(b'='), _) => self.simple(SyntaxKind::EqualsEqualsToken, start, 2, flags),
                (Some(b'~'), _) => self.simple(SyntaxKind::EqualsTildeToken, start, 2, flags),
                (Some(b'>'), _) => self.simple(SyntaxKind::EqualsGreaterThanToken, start, 2, flags),
                _ => self.simple(SyntaxKind::EqualsToken, start, 1, flags),
            },
            b'!' => match self.peek(1) {
                Some(b'=') => self.simple(SyntaxKind::ExclamationEqualsToken, start, 2, flags),
                Some(b'~') => self.simple(SyntaxKind::ExclamationTildeToken, start, 2, flags),
                _ => self.simple(SyntaxKind::ExclamationToken, start, 1, flags),
            },
            b'&' => match (self.peek(1), self.peek(2)) {
                (Some(b'&'), Some(b'=')) => self.simple(SyntaxKind::AmpersandAmpersandEqualsToken, start, 3, flags),
                (Some(b'&'), _) => self.simple(SyntaxKind::AmpersandAmpersandToken, start, 2, flags),
                (Some(b'.'), _) => self.simple(SyntaxKind::AmpersandDotToken, start, 2, flags),
                (Some(b'='), _) => self.simple(SyntaxKind::AmpersandEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::AmpersandToken, start, 1, flags),
            },
            b'|' => match (self.peek(1), self.peek(2)) {
                (Some(b'|'), Some(b'=')) => self.simple(SyntaxKind::BarBarEqualsToken, start, 3, flags),
                (Some(b'|'), _) => self.simple(SyntaxKind::BarBarToken, start, 2, flags),
                (Some(b'='), _) => self.simple(SyntaxKind::BarEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::BarToken, start, 1, flags),
            },
            b'+' => match self.peek(1) {
                Some(b'=') => self.simple(SyntaxKind::PlusEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::PlusToken, start, 1, flags),
            },
            b'-' => match self.peek(1) {
                Some(b'>') => self.simple(SyntaxKind::MinusGreaterThanToken, start, 2, flags),
                Some(b'=') => self.simple(SyntaxKind::MinusEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::MinusToken, start, 1, flags),
            },
            b'*' => match (self.peek(1), self.peek(2)) {
                (Some(b'*'), Some(b'=')) => self.simple(SyntaxKind::AsteriskAsteriskEqualsToken, start, 3, flags),
                (Some(b'*'), _) => self.simple(SyntaxKind::AsteriskAsteriskToken, start, 2, flags),
                (Some(b'='), _) => self.simple(SyntaxKind::AsteriskEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::AsteriskToken, start, 1, flags),
            },
            b'^' => match self.peek(1) {
                Some(b'=') => self.simple(SyntaxKind::CaretEqualsToken, start, 2, flags),
                _ => self.simple(SyntaxKind::CaretToken, start, 1, flags),
            },
            b'0'..=b'9' => self.scan_number(start, flags),
            _ if is_identifier_start(ch) => self.scan_identifier(start, flags),
            _ => {
                let ch = self.char_at(start);
                let len = ch.map_or(1, char::len_utf8);
                self.pos = start + len;
                let range = TextRange::from_offsets(start, start + len);
                self.error(
                    range,
                    diagnostic_messages::UNKNOWN_CHARACTER,
                    vec![ch.map(String::from).unwrap_or_default()],
                );
                Token::new(SyntaxKind::Unknown, range, flags)
            }
        }
    }

    fn simple(&mut self, kind: SyntaxKind, start: usize, len: usize, flags: TokenFlags) -> Token {
        self.pos = start + len;
        Token::new(kind, TextRange::from_offsets(start, start + len), flags)
    }

    fn scan_identifier(&mut self, start: usize, flags: TokenFlags) -> Token {
        let mut pos = start;
        while pos < self.end && is_identifier_part(self.bytes[pos]) {
            pos += 1;
        }
        let constant = self.bytes[start].is_ascii_uppercase();
        if !constant && pos < self.end && matches!(self.bytes[pos], b'?' | b'!') {
            let next = self.bytes.get(pos + 1).copied();
            if next != Some(b'=') || self.bytes.get(pos + 2) == Some(&b'=') {
                pos += 1;
            }
        }

        let text = &self.source[start..pos];
        let after_dot = matches!(
            self.prev_kind,
            SyntaxKind::DotToken | SyntaxKind::AmpersandDotToken
        );
        let is_label = !after_dot
            && self.prev_kind != SyntaxKind::QuestionToken
            && pos < self.end
            && self.bytes[pos] == b':'
            && self.bytes.get(pos + 1) != Some(&b':');

        if is_label {
            self.pos = pos + 1;
            let mut token = Token::new(SyntaxKind::Label, TextRange::from_offsets(start, pos + 1), flags);
            token.value = text.to_string();
            return token;
        }

        let kind = if after_dot {
            SyntaxKind::Identifier
        } else if let Some(keyword) = text_to_keyword(text) {
            keyword
        } else if constant {
            SyntaxKind::ConstantIdentifier
        } else {
            SyntaxKind::Identifier
        };
        self.pos = pos;
        let mut token = Token::new(kind, TextRange::from_offsets(start, pos), flags);
        token.value = text.to_string();
        token
    }

    fn scan_number(&mut self, start: usize, flags: TokenFlags) -> Token {
        let mut pos = start;
        let mut kind = SyntaxKind::IntegerLiteral;
        let radix_prefix = self.bytes[start] == b'0'
            && matches!(
                self.bytes.get(start + 1),
                Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O' | b'd' | b'D')
            );
        if radix_prefix {
            pos += 2;
            while pos < self.end && (self.bytes[pos].is_ascii_hexdigit() || self.bytes[pos] == b'_') {
                pos += 1;
            }
        } else {
            pos = self.skip_digits(pos);
            if self.bytes.get(pos) == Some(&b'.')
                && self.bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
            {
                kind = SyntaxKind::FloatLiteral;
                pos = self.skip_digits(pos + 1);
            }
            if matches!(self.bytes.get(pos), Some(b'e' | b'E')) {
                let mut exp = pos + 1;
                if matches!(self.bytes.get(exp), Some(b'+' | b'-')) {
                    exp += 1;
                }
                if self.bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                    kind = SyntaxKind::FloatLiteral;
                    pos = self.skip_digits(exp);
                }
            }
        }
        // Rational and imaginary suffixes
        while matches!(self.bytes.get(pos), Some(b'r' | b'i'))
            && !self.bytes.get(pos + 1).is_some_and(|&b| is_identifier_part(b))
        {
            pos += 1;
        }
        self.pos = pos;
        let mut token = Token::new(kind, TextRange::from_offsets(start, pos), flags);
        token.value = self.source[start..pos].to_string();
        token
    }

    fn skip_digits(&self, mut pos: usize) -> usize {
        while pos < self.end && (self.bytes[pos].is_ascii_digit() || self.bytes[pos] == b'_') {
            pos += 1;
        }
        pos
    }

    fn scan_instance_or_class_variable(&mut self, start: usize, flags: TokenFlags) -> Token {
        let (kind, name_start) = if self.peek(1) == Some(b'@') {
            (SyntaxKind::ClassVariable, start + 2)
        } else {
            (SyntaxKind::InstanceVariable, start + 1)
        };
        let mut pos = name_start;
        if pos < self.end && is_identifier_start(self.bytes[pos]) {
            while pos < self.end && is_identifier_part(self.bytes[pos]) {
                pos += 1;
            }
        }
        self.pos = pos;
        let range = TextRange::from_offsets(start, pos);
        if pos == name_start {
            self.error(range, diagnostic_messages::UNKNOWN_CHARACTER, vec!["@".to_string()]);
            return Token::new(SyntaxKind::Unknown, range, flags);
        }
        let mut token = Token::new(kind, range, flags);
        token.value = self.source[start..pos].to_string();
        token
    }

    fn scan_global_variable(&mut self, start: usize, flags: TokenFlags) -> Token {
        let mut pos = start + 1;
        match self.bytes.get(pos) {
            Some(&b) if is_identifier_start(b) => {
                while pos < self.end && is_identifier_part(self.bytes[pos]) {
                    pos += 1;
                }
            }
            Some(b'0'..=b'9') => pos = self.skip_digits(pos),
            Some(
                b'!' | b'@' | b'~' | b';' | b',' | b'/' | b'\\' | b'*' | b'$' | b'?' | b':' | b'"'
                | b'<' | b'>' | b'.' | b'&' | b'`' | b'\'' | b'+' | b'_',
            ) => pos += 1,
            _ => {}
        }
        self.pos = pos;
        let range = TextRange::from_offsets(start, pos);
        if pos == start + 1 {
            self.error(range, diagnostic_messages::UNKNOWN_CHARACTER, vec!["$".to_string()]);
            return Token::new(SyntaxKind::Unknown, range, flags);
        }
        let mut token = Token::new(SyntaxKind::GlobalVariable, range, flags);
        token.value = self.source[start..pos].to_string();
        token
    }

    fn try_scan_symbol(&mut self, start: usize, flags: TokenFlags) -> Option<Token> {
        let next = self.peek(1)?;
        if next == b'"' || next == b'\'' {
            self.pos = start + 2;
            let body = self.scan_literal_body(None, next, next == b'"');
            return Some(self.finish_literal(SyntaxKind::SymbolLiteral, start, body, flags));
        }

        let name_start = start + 1;
        let mut pos = name_start;
        if is_identifier_start(next) || next == b'@' || next == b'$' {
            while pos < self.end && matches!(self.bytes[pos], b'@' | b'$') && pos < name_start + 2 {
                pos += 1;
            }
            if !self.bytes.get(pos).is_some_and(|&b| is_identifier_start(b)) {
                return None;
            }
            while pos < self.end && is_identifier_part(self.bytes[pos]) {
                pos += 1;
            }
            match self.bytes.get(pos) {
                Some(b'?' | b'!') if self.bytes.get(pos + 1) != Some(&b'=') => pos += 1,
                Some(b'=')
                    if !matches!(self.bytes.get(pos + 1), Some(b'=' | b'~' | b'>')) =>
                {
                    pos += 1;
                }
                _ => {}
            }
        } else {
            // Operator symbols only where a value can start: `reduce(:+)`.
            if !self.value_expected() && self.prev_kind != SyntaxKind::Identifier {
                return None;
            }
            let rest = &self.source[name_start..self.end];
            let op = OPERATOR_SYMBOLS.iter().find(|op| rest.starts_with(**op))?;
            pos = name_start + op.len();
        }

        self.pos = pos;
        let mut token = Token::new(SyntaxKind::SymbolLiteral, TextRange::from_offsets(start, pos), flags);
        token.value = self.source[name_start..pos].to_string();
        Some(token)
    }

    fn try_scan_character(&mut self, start: usize, flags: TokenFlags, had_ws: bool) -> Option<Token> {
        if !self.value_expected() && !self.command_arg_position(start, had_ws) {
            return None;
        }
        let ch = self.char_at(start + 1)?;
        if ch.is_whitespace() {
            return None;
        }
        let (end, value) = if ch == '\\' {
            let escaped = self.char_at(start + 2)?;
            (start + 2 + escaped.len_utf8(), cook_escape(escaped).to_string())
        } else {
            (start + 1 + ch.len_utf8(), ch.to_string())
        };
        if ch != '\\' && self.bytes.get(end).is_some_and(|&b| is_identifier_part(b)) {
            return None;
        }
        self.pos = end;
        let mut token = Token::new(SyntaxKind::CharacterLiteral, TextRange::from_offsets(start, end), flags);
        token.value = value;
        Some(token)
    }

    fn scan_quoted(&mut self, start: usize, quote: u8, interpolating: bool, flags: TokenFlags) -> Token {
        let body = self.scan_literal_body(None, quote, interpolating);
        self.finish_literal(SyntaxKind::StringLiteral, start, body, flags)
    }

    fn scan_regex(&mut self, start: usize, close: u8, open: Option<u8>, flags: TokenFlags) -> Token {
        let body = self.scan_literal_body(open, close, true);
        if body.terminated {
            while self.pos < self.end && matches!(self.bytes[self.pos], b'i' | b'm' | b'x' | b'o' | b'u' | b'n' | b'e' | b's') {
                self.pos += 1;
            }
        }
        self.finish_literal(SyntaxKind::RegexLiteral, start, body, flags)
    }

    fn finish_literal(&mut self, kind: SyntaxKind, start: usize, body: LiteralBody, mut flags: TokenFlags) -> Token {
        let range = TextRange::from_offsets(start, self.pos);
        if !body.terminated {
            flags |= TokenFlags::UNTERMINATED;
            self.error(range, diagnostic_messages::UNTERMINATED_STRING_LITERAL, Vec::new());
        }
        let mut token = Token::new(kind, range, flags);
        token.value = body.value;
        token.segments = body.segments;
        token
    }

    /// `%w[...]`, `%i(...)`, `%q{...}`, `%(...)` and friends.
    fn try_scan_percent_literal(&mut self, start: usize, flags: TokenFlags) -> Option<Token> {
        let (type_char, delim_pos) = match self.peek(1)? {
            c @ (b'w' | b'W' | b'i' | b'I' | b'q' | b'Q' | b'r' | b's') => (Some(c), start + 2),
            _ => (None, start + 1),
        };
        let open = *self.bytes.get(delim_pos)?;
        if open.is_ascii_alphanumeric() || open.is_ascii_whitespace() || open >= 0x80 {
            return None;
        }
        let close = closing_delimiter(open);
        let nest = (close != open).then_some(open);
        self.pos = delim_pos + 1;

        match type_char {
            Some(b'w' | b'W' | b'i' | b'I') => {
                let body_start = self.pos;
                let body = self.scan_literal_body(nest, close, false);
                let body_end = if body.terminated { self.pos - 1 } else { self.pos };
                let kind = if matches!(type_char, Some(b'w' | b'W')) {
                    SyntaxKind::WordsLiteral
                } else {
                    SyntaxKind::SymbolsLiteral
                };
                let mut token = self.finish_literal(kind, start, body, flags);
                token.segments = self.split_words(body_start, body_end);
                Some(token)
            }
            Some(b'q') => {
                let body = self.scan_literal_body(nest, close, false);
                Some(self.finish_literal(SyntaxKind::StringLiteral, start, body, flags))
            }
            Some(b's') => {
                let body = self.scan_literal_body(nest, close, false);
                Some(self.finish_literal(SyntaxKind::SymbolLiteral, start, body, flags))
            }
            Some(b'r') => Some(self.scan_regex(start, close, nest, flags)),
            _ => {
                let body = self.scan_literal_body(nest, close, true);
                Some(self.finish_literal(SyntaxKind::StringLiteral, start, body, flags))
            }
        }
    }

    fn split_words(&self, start: usize, end: usize) -> Vec<StringSegment> {
        let mut words = Vec::new();
        let mut pos = start;
        while pos < end {
            while pos < end && self.bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            let word_start = pos;
            while pos < end && !self.bytes[pos].is_ascii_whitespace() {
                pos += if self.bytes[pos] == b'\\' { 2 } else { 1 };
            }
            let word_end = pos.min(end);
            if word_end > word_start {
                words.push(StringSegment::Text(TextRange::from_offsets(word_start, word_end)));
            }
        }
        words
    }

    // =========================================================================
    // Literal bodies
    // =========================================================================

    /// Scan from `self.pos` up to the closing delimiter, which is consumed.
    /// `open` enables nesting for bracket pairs like `%w(a (b) c)`.
    fn scan_literal_body(&mut self, open: Option<u8>, close: u8, interpolating: bool) -> LiteralBody {
        let mut segments = Vec::new();
        let mut value = String::new();
        let mut text_start = self.pos;
        let mut depth = 0usize;

        while self.pos < self.end {
            let b = self.bytes[self.pos];
            if b == b'\\' {
                let Some(escaped) = self.char_at(self.pos + 1) else {
                    self.pos += 1;
                    break;
                };
                if interpolating {
                    value.push(cook_escape(escaped));
                } else if escaped == '\\' || escaped as u32 == u32::from(close) || open.is_some_and(|o| escaped as u32 == u32::from(o)) {
                    value.push(escaped);
                } else {
                    value.push('\\');
                    value.push(escaped);
                }
                self.pos += 1 + escaped.len_utf8();
                continue;
            }
            if Some(b) == open {
                depth += 1;
            } else if b == close {
                if depth == 0 {
                    push_text(&mut segments, text_start, self.pos);
                    self.pos += 1;
                    return LiteralBody { segments, value, terminated: true };
                }
                depth -= 1;
            } else if interpolating && b == b'#' && self.peek(1) == Some(b'{') {
                push_text(&mut segments, text_start, self.pos);
                let code_start = self.pos + 2;
                let code_end = self.find_interpolation_end(code_start, self.end);
                segments.push(StringSegment::Interpolation(TextRange::from_offsets(code_start, code_end)));
                self.pos = (code_end + 1).min(self.end);
                text_start = self.pos;
                continue;
            }
            match self.char_at(self.pos) {
                Some(ch) => {
                    value.push(ch);
                    self.pos += ch.len_utf8();
                }
                None => self.pos += 1,
            }
        }

        push_text(&mut segments, text_start, self.pos);
        LiteralBody { segments, value, terminated: false }
    }

    /// Find the `}` closing an interpolation that starts at `pos`.
    /// Returns `limit` when the interpolation is not closed.
    fn find_interpolation_end(&self, mut pos: usize, limit: usize) -> usize {
        let mut depth = 0usize;
        while pos < limit {
            match self.bytes[pos] {
                b'{' => depth += 1,
                b'}' => {
                    if depth == 0 {
                        return pos;
                    }
                    depth -= 1;
                }
                quote @ (b'"' | b'\'' | b'`') => {
                    pos = self.skip_nested_string(pos + 1, quote, limit);
                    continue;
                }
                b'\\' => pos += 1,
                _ => {}
            }
            pos += 1;
        }
        limit
    }

    /// Skip a quoted string inside interpolated code; returns the offset
    /// after its closing quote.
    fn skip_nested_string(&self, mut pos: usize, quote: u8, limit: usize) -> usize {
        while pos < limit {
            match self.bytes[pos] {
                b'\\' => pos += 2,
                b if b == quote => return pos + 1,
                b'#' if quote != b'\'' && self.bytes.get(pos + 1) == Some(&b'{') => {
                    pos = self.find_interpolation_end(pos + 2, limit) + 1;
                }
                _ => pos += 1,
            }
        }
        limit
    }

    /// Split an already-delimited range into text and interpolation segments.
    fn scan_segments(&self, start: usize, end: usize, interpolating: bool) -> Vec<StringSegment> {
        let mut segments = Vec::new();
        if !interpolating {
            push_text(&mut segments, start, end);
            return segments;
        }
        let mut text_start = start;
        let mut pos = start;
        while pos < end {
            match self.bytes[pos] {
                b'\\' => pos += 2,
                b'#' if self.bytes.get(pos + 1) == Some(&b'{') => {
                    push_text(&mut segments, text_start, pos);
                    let code_start = pos + 2;
                    let code_end = self.find_interpolation_end(code_start, end);
                    segments.push(StringSegment::Interpolation(TextRange::from_offsets(code_start, code_end)));
                    pos = (code_end + 1).min(end);
                    text_start = pos;
                }
                _ => pos += 1,
            }
        }
        push_text(&mut segments, text_start, end.min(pos));
        segments
    }

    // =========================================================================
    // Heredocs
    // =========================================================================

    fn try_scan_heredoc(&mut self, start: usize, flags: TokenFlags, had_ws: bool) -> Option<Token> {
        let source = self.source;
        let mut pos = start + 2;
        let mut indented = false;
        if matches!(self.bytes.get(pos), Some(b'~' | b'-')) {
            indented = true;
            pos += 1;
        }

        let (id, interpolating, opener_end) = match *self.bytes.get(pos)? {
            quote @ (b'"' | b'\'' | b'`') => {
                let id_start = pos + 1;
                let line_end = self.line_end(id_start);
                let close = memchr::memchr(quote, &self.bytes[id_start..line_end])? + id_start;
                (&source[id_start..close], quote != b'\'', close + 1)
            }
            b if is_identifier_start(b) => {
                let id_start = pos;
                while pos < self.end && is_identifier_part(self.bytes[pos]) {
                    pos += 1;
                }
                (&source[id_start..pos], true, pos)
            }
            _ => return None,
        };

        let value_position = self.value_expected();
        if !value_position && !self.command_arg_position(start, had_ws) {
            return None;
        }

        let body_start = self
            .heredoc_resume
            .unwrap_or_else(|| (self.line_end(opener_end) + 1).min(self.end));
        let mut line_start = body_start;
        let mut terminator = None;
        while line_start < self.end {
            let line_end = self.line_end(line_start);
            let mut line = source[line_start..line_end].trim_end_matches('\r');
            if indented {
                line = line.trim_start_matches([' ', '\t']);
            }
            if line == id {
                terminator = Some((line_start, (line_end + 1).min(self.end)));
                break;
            }
            line_start = line_end + 1;
        }

        let mut flags = flags;
        let (body_end, resume) = match terminator {
            Some(found) => found,
            // In command position `foo <<bar` is more likely a shovel.
            None if !value_position => return None,
            None => {
                flags |= TokenFlags::UNTERMINATED;
                self.error(
                    TextRange::from_offsets(start, opener_end),
                    diagnostic_messages::UNTERMINATED_HEREDOC,
                    vec![id.to_string()],
                );
                (self.end, self.end)
            }
        };

        let id = id.to_string();
        self.heredoc_resume = Some(resume);
        self.pos = opener_end;

        let mut token = Token::new(SyntaxKind::HeredocLiteral, TextRange::from_offsets(start, opener_end), flags);
        token.segments = self.scan_segments(body_start, body_end, interpolating);
        token.heredoc_body = TextRange::from_offsets(body_start, body_end);
        token.value = id;
        Some(token)
    }

    // =========================================================================
    // Context
    // =========================================================================

    /// Whether the previous token leaves us where an expression can start.
    fn value_expected(&self) -> bool {
        let prev = self.prev_kind;
        match prev {
            SyntaxKind::Identifier
            | SyntaxKind::ConstantIdentifier
            | SyntaxKind::InstanceVariable
            | SyntaxKind::ClassVariable
            | SyntaxKind::GlobalVariable
            | SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::HeredocLiteral
            | SyntaxKind::SymbolLiteral
            | SyntaxKind::CharacterLiteral
            | SyntaxKind::RegexLiteral
            | SyntaxKind::WordsLiteral
            | SyntaxKind::SymbolsLiteral
            | SyntaxKind::CloseParenToken
            | SyntaxKind::CloseBracketToken
            | SyntaxKind::CloseBraceToken
            | SyntaxKind::DotToken
            | SyntaxKind::AmpersandDotToken
            | SyntaxKind::ColonColonToken => false,
            _ if token_is_keyword(prev) => !keyword_is_value(prev),
            _ => true,
        }
    }

    /// `puts /re/`, `foo ?a`, `foo <<~EOS`: an identifier followed by
    /// whitespace, with the operator glued to what follows.
    fn command_arg_position(&self, start: usize, had_ws: bool) -> bool {
        self.prev_kind == SyntaxKind::Identifier
            && had_ws
            && self
                .bytes
                .get(start + 1)
                .is_some_and(|&b| !b.is_ascii_whitespace() && b != b'=')
    }

    fn percent_literal_allowed(&self, start: usize, had_ws: bool) -> bool {
        self.value_expected() || self.command_arg_position(start, had_ws)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn peek(&self, offset: usize) -> Option<u8> {
        let pos = self.pos + offset;
        if pos < self.end { Some(self.bytes[pos]) } else { None }
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        if pos >= self.end {
            return None;
        }
        self.source.get(pos..self.end)?.chars().next()
    }

    /// Offset of the next `\n` at or after `pos` (or the end of input).
    fn line_end(&self, pos: usize) -> usize {
        let pos = pos.min(self.end);
        memchr::memchr(b'\n', &self.bytes[pos..self.end]).map_or(self.end, |i| pos + i)
    }

    fn at_line_start(&self, pos: usize) -> bool {
        pos == 0 || self.bytes[pos - 1] == b'\n'
    }

    fn only_whitespace_before(&self, pos: usize) -> bool {
        self.bytes[..pos]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .all(|&b| b == b' ' || b == b'\t')
    }

    fn starts_with_word(&self, pos: usize, word: &str) -> bool {
        let rest = &self.bytes[pos..self.end];
        rest.starts_with(word.as_bytes())
            && rest
                .get(word.len())
                .is_none_or(|b| b.is_ascii_whitespace())
    }

    fn error(&mut self, range: TextRange, message: DiagnosticMessage, args: Vec<String>) {
        self.diagnostics.push(ScanDiagnostic { range, message, args });
    }
}

fn push_text(segments: &mut Vec<StringSegment>, start: usize, end: usize) {
    if end > start {
        segments.push(StringSegment::Text(TextRange::from_offsets(start, end)));
    }
}

const fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

const fn is_identifier_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

const fn closing_delimiter(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        b'<' => b'>',
        other => other,
    }
}

fn cook_escape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        's' => ' ',
        '0' => '\0',
        'e' => '\u{1b}',
        'a' => '\u{7}',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        other => other,
    }
}
