//! Token kinds and keyword tables.

use serde::Serialize;

/// The kind of a scanned token.
///
/// Keywords occupy a contiguous block between `FIRST_KEYWORD` and
/// `LAST_KEYWORD`; compound assignment operators between
/// `FIRST_COMPOUND_ASSIGNMENT` and `LAST_COMPOUND_ASSIGNMENT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u16)]
pub enum SyntaxKind {
    Unknown = 0,
    EndOfFileToken,
    NewLineToken,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    HeredocLiteral,
    SymbolLiteral,
    CharacterLiteral,
    RegexLiteral,
    WordsLiteral,
    SymbolsLiteral,

    // Names
    Identifier,
    ConstantIdentifier,
    InstanceVariable,
    ClassVariable,
    GlobalVariable,
    Label,

    // Punctuation
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    OpenBraceToken,
    CloseBraceToken,
    CommaToken,
    SemicolonToken,
    DotToken,
    AmpersandDotToken,
    ColonColonToken,
    ColonToken,
    QuestionToken,
    DotDotToken,
    DotDotDotToken,
    EqualsGreaterThanToken,
    MinusGreaterThanToken,

    // Operators
    PlusToken,
    MinusToken,
    AsteriskToken,
    AsteriskAsteriskToken,
    SlashToken,
    PercentToken,
    EqualsToken,
    EqualsEqualsToken,
    EqualsEqualsEqualsToken,
    ExclamationEqualsToken,
    EqualsTildeToken,
    ExclamationTildeToken,
    LessThanToken,
    LessThanEqualsToken,
    GreaterThanToken,
    GreaterThanEqualsToken,
    LessThanEqualsGreaterThanToken,
    LessThanLessThanToken,
    GreaterThanGreaterThanToken,
    AmpersandToken,
    AmpersandAmpersandToken,
    BarToken,
    BarBarToken,
    CaretToken,
    TildeToken,
    ExclamationToken,

    // Compound assignments
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    AsteriskAsteriskEqualsToken,
    SlashEqualsToken,
    PercentEqualsToken,
    LessThanLessThanEqualsToken,
    GreaterThanGreaterThanEqualsToken,
    AmpersandEqualsToken,
    BarEqualsToken,
    CaretEqualsToken,
    AmpersandAmpersandEqualsToken,
    BarBarEqualsToken,

    // Keywords
    AliasKeyword,
    AndKeyword,
    BeginKeyword,
    BreakKeyword,
    CaseKeyword,
    ClassKeyword,
    DefKeyword,
    DefinedKeyword,
    DoKeyword,
    ElseKeyword,
    ElsifKeyword,
    EndKeyword,
    EnsureKeyword,
    FalseKeyword,
    ForKeyword,
    IfKeyword,
    InKeyword,
    ModuleKeyword,
    NextKeyword,
    NilKeyword,
    NotKeyword,
    OrKeyword,
    RedoKeyword,
    RescueKeyword,
    RetryKeyword,
    ReturnKeyword,
    SelfKeyword,
    SuperKeyword,
    ThenKeyword,
    TrueKeyword,
    UndefKeyword,
    UnlessKeyword,
    UntilKeyword,
    WhenKeyword,
    WhileKeyword,
    YieldKeyword,
    FileKeyword,
    LineKeyword,
}

impl SyntaxKind {
    pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::AliasKeyword;
    pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::LineKeyword;
    pub const FIRST_COMPOUND_ASSIGNMENT: SyntaxKind = SyntaxKind::PlusEqualsToken;
    pub const LAST_COMPOUND_ASSIGNMENT: SyntaxKind = SyntaxKind::BarBarEqualsToken;
}

/// Look up the keyword for an identifier's text.
pub fn text_to_keyword(text: &str) -> Option<SyntaxKind> {
    Some(match text {
        "alias" => SyntaxKind::AliasKeyword,
        "and" => SyntaxKind::AndKeyword,
        "begin" => SyntaxKind::BeginKeyword,
        "break" => SyntaxKind::BreakKeyword,
        "case" => SyntaxKind::CaseKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "def" => SyntaxKind::DefKeyword,
        "defined?" => SyntaxKind::DefinedKeyword,
        "do" => SyntaxKind::DoKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "elsif" => SyntaxKind::ElsifKeyword,
        "end" => SyntaxKind::EndKeyword,
        "ensure" => SyntaxKind::EnsureKeyword,
        "false" => SyntaxKind::FalseKeyword,
        "for" => SyntaxKind::ForKeyword,
        "if" => SyntaxKind::IfKeyword,
        "in" => SyntaxKind::InKeyword,
        "module" => SyntaxKind::ModuleKeyword,
        "next" => SyntaxKind::NextKeyword,
        "nil" => SyntaxKind::NilKeyword,
        "not" => SyntaxKind::NotKeyword,
        "or" => SyntaxKind::OrKeyword,
        "redo" => SyntaxKind::RedoKeyword,
        "rescue" => SyntaxKind::RescueKeyword,
        "retry" => SyntaxKind::RetryKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "self" => SyntaxKind::SelfKeyword,
        "super" => SyntaxKind::SuperKeyword,
        "then" => SyntaxKind::ThenKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "undef" => SyntaxKind::UndefKeyword,
        "unless" => SyntaxKind::UnlessKeyword,
        "until" => SyntaxKind::UntilKeyword,
        "when" => SyntaxKind::WhenKeyword,
        "while" => SyntaxKind::WhileKeyword,
        "yield" => SyntaxKind::YieldKeyword,
        "__FILE__" => SyntaxKind::FileKeyword,
        "__LINE__" => SyntaxKind::LineKeyword,
        _ => return None,
    })
}

pub fn keyword_to_text(kind: SyntaxKind) -> Option<&'static str> {
    Some(match kind {
        SyntaxKind::AliasKeyword => "alias",
        SyntaxKind::AndKeyword => "and",
        SyntaxKind::BeginKeyword => "begin",
        SyntaxKind::BreakKeyword => "break",
        SyntaxKind::CaseKeyword => "case",
        SyntaxKind::ClassKeyword => "class",
        SyntaxKind::DefKeyword => "def",
        SyntaxKind::DefinedKeyword => "defined?",
        SyntaxKind::DoKeyword => "do",
        SyntaxKind::ElseKeyword => "else",
        SyntaxKind::ElsifKeyword => "elsif",
        SyntaxKind::EndKeyword => "end",
        SyntaxKind::EnsureKeyword => "ensure",
        SyntaxKind::FalseKeyword => "false",
        SyntaxKind::ForKeyword => "for",
        SyntaxKind::IfKeyword => "if",
        SyntaxKind::InKeyword => "in",
        SyntaxKind::ModuleKeyword => "module",
        SyntaxKind::NextKeyword => "next",
        SyntaxKind::NilKeyword => "nil",
        SyntaxKind::NotKeyword => "not",
        SyntaxKind::OrKeyword => "or",
        SyntaxKind::RedoKeyword => "redo",
        SyntaxKind::RescueKeyword => "rescue",
        SyntaxKind::RetryKeyword => "retry",
        SyntaxKind::ReturnKeyword => "return",
        SyntaxKind::SelfKeyword => "self",
        SyntaxKind::SuperKeyword => "super",
        SyntaxKind::ThenKeyword => "then",
        SyntaxKind::TrueKeyword => "true",
        SyntaxKind::UndefKeyword => "undef",
        SyntaxKind::UnlessKeyword => "unless",
        SyntaxKind::UntilKeyword => "until",
        SyntaxKind::WhenKeyword => "when",
        SyntaxKind::WhileKeyword => "while",
        SyntaxKind::YieldKeyword => "yield",
        SyntaxKind::FileKeyword => "__FILE__",
        SyntaxKind::LineKeyword => "__LINE__",
        _ => return None,
    })
}

pub fn punctuation_to_text(kind: SyntaxKind) -> Option<&'static str> {
    Some(match kind {
        SyntaxKind::OpenParenToken => "(",
        SyntaxKind::CloseParenToken => ")",
        SyntaxKind::OpenBracketToken => "[",
        SyntaxKind::CloseBracketToken => "]",
        SyntaxKind::OpenBraceToken => "{",
        SyntaxKind::CloseBraceToken => "}",
        SyntaxKind::CommaToken => ",",
        SyntaxKind::SemicolonToken => ";",
        SyntaxKind::DotToken => ".",
        SyntaxKind::AmpersandDotToken => "&.",
        SyntaxKind::ColonColonToken => "::",
        SyntaxKind::ColonToken => ":",
        SyntaxKind::QuestionToken => "?",
        SyntaxKind::DotDotToken => "..",
        SyntaxKind::DotDotDotToken => "...",
        SyntaxKind::EqualsGreaterThanToken => "=>",
        SyntaxKind::MinusGreaterThanToken => "->",
        SyntaxKind::PlusToken => "+",
        SyntaxKind::MinusToken => "-",
        SyntaxKind::AsteriskToken => "*",
        SyntaxKind::AsteriskAsteriskToken => "**",
        SyntaxKind::SlashToken => "/",
        SyntaxKind::PercentToken => "%",
        SyntaxKind::EqualsToken => "=",
        SyntaxKind::EqualsEqualsToken => "==",
        SyntaxKind::EqualsEqualsEqualsToken => "===",
        SyntaxKind::ExclamationEqualsToken => "!=",
        SyntaxKind::EqualsTildeToken => "=~",
        SyntaxKind::ExclamationTildeToken => "!~",
        SyntaxKind::LessThanToken => "<",
        SyntaxKind::LessThanEqualsToken => "<=",
        SyntaxKind::GreaterThanToken => ">",
        SyntaxKind::GreaterThanEqualsToken => ">=",
        SyntaxKind::LessThanEqualsGreaterThanToken => "<=>",
        SyntaxKind::LessThanLessThanToken => "<<",
        SyntaxKind::GreaterThanGreaterThanToken => ">>",
        SyntaxKind::AmpersandToken => "&",
        SyntaxKind::AmpersandAmpersandToken => "&&",
        SyntaxKind::BarToken => "|",
        SyntaxKind::BarBarToken => "||",
        SyntaxKind::CaretToken => "^",
        SyntaxKind::TildeToken => "~",
        SyntaxKind::ExclamationToken => "!",
        SyntaxKind::PlusEqualsToken => "+=",
        SyntaxKind::MinusEqualsToken => "-=",
        SyntaxKind::AsteriskEqualsToken => "*=",
        SyntaxKind::AsteriskAsteriskEqualsToken => "**=",
        SyntaxKind::SlashEqualsToken => "/=",
        SyntaxKind::PercentEqualsToken => "%=",
        SyntaxKind::LessThanLessThanEqualsToken => "<<=",
        SyntaxKind::GreaterThanGreaterThanEqualsToken => ">>=",
        SyntaxKind::AmpersandEqualsToken => "&=",
        SyntaxKind::BarEqualsToken => "|=",
        SyntaxKind::CaretEqualsToken => "^=",
        SyntaxKind::AmpersandAmpersandEqualsToken => "&&=",
        SyntaxKind::BarBarEqualsToken => "||=",
        _ => return None,
    })
}

/// Text used for a token kind in diagnostics, e.g. `'end' expected.`
pub fn token_to_text(kind: SyntaxKind) -> &'static str {
    if let Some(text) = keyword_to_text(kind).or_else(|| punctuation_to_text(kind)) {
        return text;
    }
    match kind {
        SyntaxKind::EndOfFileToken => "end of file",
        SyntaxKind::NewLineToken => "newline",
        SyntaxKind::Identifier | SyntaxKind::ConstantIdentifier => "identifier",
        SyntaxKind::Label => "label",
        SyntaxKind::InstanceVariable => "instance variable",
        SyntaxKind::ClassVariable => "class variable",
        SyntaxKind::GlobalVariable => "global variable",
        SyntaxKind::StringLiteral | SyntaxKind::HeredocLiteral => "string literal",
        SyntaxKind::SymbolLiteral => "symbol literal",
        _ => "token",
    }
}

pub fn token_is_keyword(kind: SyntaxKind) -> bool {
    kind >= SyntaxKind::FIRST_KEYWORD && kind <= SyntaxKind::LAST_KEYWORD
}

pub fn token_is_compound_assignment(kind: SyntaxKind) -> bool {
    kind >= SyntaxKind::FIRST_COMPOUND_ASSIGNMENT && kind <= SyntaxKind::LAST_COMPOUND_ASSIGNMENT
}

pub fn token_is_assignment_operator(kind: SyntaxKind) -> bool {
    kind == SyntaxKind::EqualsToken || token_is_compound_assignment(kind)
}

/// The binary operator a compound assignment applies: `+=` -> `+`.
pub fn compound_assignment_base(kind: SyntaxKind) -> Option<SyntaxKind> {
    Some(match kind {
        SyntaxKind::PlusEqualsToken => SyntaxKind::PlusToken,
        SyntaxKind::MinusEqualsToken => SyntaxKind::MinusToken,
        SyntaxKind::AsteriskEqualsToken => SyntaxKind::AsteriskToken,
        SyntaxKind::AsteriskAsteriskEqualsToken => SyntaxKind::AsteriskAsteriskToken,
        SyntaxKind::SlashEqualsToken => SyntaxKind::SlashToken,
        SyntaxKind::PercentEqualsToken => SyntaxKind::PercentToken,
        SyntaxKind::LessThanLessThanEqualsToken => SyntaxKind::LessThanLessThanToken,
        SyntaxKind::GreaterThanGreaterThanEqualsToken => SyntaxKind::GreaterThanGreaterThanToken,
        SyntaxKind::AmpersandEqualsToken => SyntaxKind::AmpersandToken,
        SyntaxKind::BarEqualsToken => SyntaxKind::BarToken,
        SyntaxKind::CaretEqualsToken => SyntaxKind::CaretToken,
        SyntaxKind::AmpersandAmpersandEqualsToken => SyntaxKind::AmpersandAmpersandToken,
        SyntaxKind::BarBarEqualsToken => SyntaxKind::BarBarToken,
        _ => return None,
    })
}

/// Literal tokens that form a complete primary expression.
pub fn token_is_literal(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IntegerLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::HeredocLiteral
            | SyntaxKind::SymbolLiteral
            | SyntaxKind::CharacterLiteral
            | SyntaxKind::RegexLiteral
            | SyntaxKind::WordsLiteral
            | SyntaxKind::SymbolsLiteral
    )
}

/// Keywords that end an expression the way a value does (`x = nil / 2`).
pub fn keyword_is_value(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::EndKeyword
            | SyntaxKind::SelfKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NilKeyword
            | SyntaxKind::FileKeyword
            | SyntaxKind::LineKeyword
            | SyntaxKind::RedoKeyword
            | SyntaxKind::RetryKeyword
    )
}
