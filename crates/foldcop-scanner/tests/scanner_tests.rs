//! Tests for the Ruby scanner.

use foldcop_common::TextRange;
use foldcop_scanner::*;

fn kinds(source: &str) -> Vec<SyntaxKind> {
    ScannerState::new(source)
        .tokenize()
        .tokens
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn tokens(source: &str) -> Vec<Token> {
    ScannerState::new(source).tokenize().tokens
}

#[test]
fn test_token_is_keyword() {
    assert!(token_is_keyword(SyntaxKind::NextKeyword));
    assert!(token_is_keyword(SyntaxKind::EndKeyword));
    assert!(token_is_keyword(SyntaxKind::LineKeyword));
    assert!(!token_is_keyword(SyntaxKind::Identifier));
    assert!(!token_is_keyword(SyntaxKind::OpenBraceToken));
}

#[test]
fn test_token_is_assignment_operator() {
    assert!(token_is_assignment_operator(SyntaxKind::EqualsToken));
    assert!(token_is_assignment_operator(SyntaxKind::PlusEqualsToken));
    assert!(token_is_assignment_operator(SyntaxKind::BarBarEqualsToken));
    assert!(!token_is_assignment_operator(SyntaxKind::PlusToken));
    assert!(!token_is_assignment_operator(SyntaxKind::EqualsEqualsToken));
}

#[test]
fn test_compound_assignment_base() {
    assert_eq!(
        compound_assignment_base(SyntaxKind::PlusEqualsToken),
        Some(SyntaxKind::PlusToken)
    );
    assert_eq!(
        compound_assignment_base(SyntaxKind::AmpersandAmpersandEqualsToken),
        Some(SyntaxKind::AmpersandAmpersandToken)
    );
    assert_eq!(compound_assignment_base(SyntaxKind::EqualsToken), None);
}

#[test]
fn test_keyword_round_trip() {
    for text in ["next", "break", "defined?", "__FILE__", "unless", "elsif"] {
        let kind = text_to_keyword(text).unwrap();
        assert_eq!(keyword_to_text(kind), Some(text));
    }
    assert_eq!(text_to_keyword("reduce"), None);
}

#[test]
fn test_punctuation_to_text() {
    assert_eq!(punctuation_to_text(SyntaxKind::AmpersandDotToken), Some("&."));
    assert_eq!(punctuation_to_text(SyntaxKind::LessThanLessThanToken), Some("<<"));
    assert_eq!(punctuation_to_text(SyntaxKind::Identifier), None);
    assert_eq!(token_to_text(SyntaxKind::EndKeyword), "end");
}

#[test]
fn test_simple_reduce_call() {
    assert_eq!(
        kinds("(1..4).reduce(0) { |acc, el| el }"),
        vec![
            SyntaxKind::OpenParenToken,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::DotDotToken,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::CloseParenToken,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::OpenParenToken,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::CloseParenToken,
            SyntaxKind::OpenBraceToken,
            SyntaxKind::BarToken,
            SyntaxKind::Identifier,
            SyntaxKind::CommaToken,
            SyntaxKind::Identifier,
            SyntaxKind::BarToken,
            SyntaxKind::Identifier,
            SyntaxKind::CloseBraceToken,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_shovel_between_identifiers() {
    assert_eq!(
        kinds("acc << el"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::LessThanLessThanToken,
            SyntaxKind::Identifier,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_shovel_without_space_is_not_heredoc() {
    let toks = tokens("acc <<el");
    assert_eq!(toks[1].kind, SyntaxKind::LessThanLessThanToken);
    assert_eq!(toks[2].kind, SyntaxKind::Identifier);
}

#[test]
fn test_newlines_are_tokens() {
    let toks = tokens("a\nb");
    assert_eq!(toks[1].kind, SyntaxKind::NewLineToken);
    assert!(toks[2].has_preceding_line_break());
    assert!(!toks[0].has_preceding_line_break());
}

#[test]
fn test_identifiers_with_predicate_suffix() {
    let toks = tokens("el.nil? && acc.frozen! != x");
    assert_eq!(toks[2].value, "nil?");
    assert_eq!(toks[6].value, "frozen!");
    assert_eq!(toks[7].kind, SyntaxKind::ExclamationEqualsToken);
}

#[test]
fn test_keyword_after_dot_is_identifier() {
    let toks = tokens("el.class.then");
    assert_eq!(toks[2].kind, SyntaxKind::Identifier);
    assert_eq!(toks[4].kind, SyntaxKind::Identifier);
    assert_eq!(toks[4].value, "then");
}

#[test]
fn test_defined_keyword() {
    assert_eq!(kinds("defined?(x)")[0], SyntaxKind::DefinedKeyword);
}

#[test]
fn test_labels() {
    let toks = tokens("foo(key: 1, if: 2)");
    assert_eq!(toks[2].kind, SyntaxKind::Label);
    assert_eq!(toks[2].value, "key");
    assert_eq!(toks[5].kind, SyntaxKind::Label);
    assert_eq!(toks[5].value, "if");
}

#[test]
fn test_colon_colon_is_not_label() {
    assert_eq!(
        kinds("Foo::Bar"),
        vec![
            SyntaxKind::ConstantIdentifier,
            SyntaxKind::ColonColonToken,
            SyntaxKind::ConstantIdentifier,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_variables() {
    let toks = tokens("@x @@y $z $0");
    assert_eq!(toks[0].kind, SyntaxKind::InstanceVariable);
    assert_eq!(toks[0].value, "@x");
    assert_eq!(toks[1].kind, SyntaxKind::ClassVariable);
    assert_eq!(toks[2].kind, SyntaxKind::GlobalVariable);
    assert_eq!(toks[3].kind, SyntaxKind::GlobalVariable);
}

#[test]
fn test_numbers() {
    let toks = tokens("1_000 2.5 3e4 0xff 1.times");
    assert_eq!(toks[0].kind, SyntaxKind::IntegerLiteral);
    assert_eq!(toks[0].value, "1_000");
    assert_eq!(toks[1].kind, SyntaxKind::FloatLiteral);
    assert_eq!(toks[2].kind, SyntaxKind::FloatLiteral);
    assert_eq!(toks[3].kind, SyntaxKind::IntegerLiteral);
    assert_eq!(toks[4].kind, SyntaxKind::IntegerLiteral);
    assert_eq!(toks[5].kind, SyntaxKind::DotToken);
}

#[test]
fn test_symbols() {
    let toks = tokens("[:foo, :bar?, :+, :\"quoted\", :[]]");
    assert_eq!(toks[1].kind, SyntaxKind::SymbolLiteral);
    assert_eq!(toks[1].value, "foo");
    assert_eq!(toks[3].value, "bar?");
    assert_eq!(toks[5].value, "+");
    assert_eq!(toks[7].value, "quoted");
    assert_eq!(toks[9].value, "[]");
}

#[test]
fn test_ternary_colon_is_not_symbol() {
    let k = kinds("a ? b : c");
    assert_eq!(k[1], SyntaxKind::QuestionToken);
    assert_eq!(k[3], SyntaxKind::ColonToken);
}

#[test]
fn test_character_literal() {
    let toks = tokens("x = ?a");
    assert_eq!(toks[2].kind, SyntaxKind::CharacterLiteral);
    assert_eq!(toks[2].value, "a");
}

#[test]
fn test_single_quoted_string() {
    let toks = tokens(r"'it\'s #{not} code'");
    assert_eq!(toks[0].kind, SyntaxKind::StringLiteral);
    assert_eq!(toks[0].value, "it's #{not} code");
    assert!(!toks[0].has_interpolation());
}

#[test]
fn test_double_quoted_interpolation_segments() {
    let source = r##""#{acc}-#{el}""##;
    let toks = tokens(source);
    let string = &toks[0];
    assert_eq!(string.kind, SyntaxKind::StringLiteral);
    assert_eq!(string.range, TextRange::new(0, source.len() as u32));
    assert_eq!(
        string.segments,
        vec![
            StringSegment::Interpolation(TextRange::new(3, 6)),
            StringSegment::Text(TextRange::new(7, 8)),
            StringSegment::Interpolation(TextRange::new(10, 12)),
        ]
    );
    assert_eq!(string.segments[0].range().slice(source), "acc");
    assert_eq!(string.segments[2].range().slice(source), "el");
}

#[test]
fn test_nested_braces_and_strings_in_interpolation() {
    let source = r##""#{h.map { |k| "#{k}}" }.join}""##;
    let toks = tokens(source);
    assert_eq!(toks.len(), 2);
    let StringSegment::Interpolation(code) = toks[0].segments[0] else {
        panic!("expected interpolation");
    };
    assert_eq!(code.slice(source), r##"h.map { |k| "#{k}}" }.join"##);
}

#[test]
fn test_unterminated_string_reports_error() {
    let output = ScannerState::new("\"abc").tokenize();
    assert!(output.tokens[0].is_unterminated());
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].message.code, 1002);
}

#[test]
fn test_heredoc_body_is_skipped() {
    let source = "x = <<~EOS\n  #{el}\n  text\nEOS\ny\n";
    let toks = tokens(source);
    let k: Vec<_> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        k,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::EqualsToken,
            SyntaxKind::HeredocLiteral,
            SyntaxKind::NewLineToken,
            SyntaxKind::Identifier,
            SyntaxKind::NewLineToken,
            SyntaxKind::EndOfFileToken,
        ]
    );
    let heredoc = &toks[2];
    assert_eq!(heredoc.range.slice(source), "<<~EOS");
    assert_eq!(heredoc.value, "EOS");
    assert_eq!(heredoc.heredoc_body.slice(source), "  #{el}\n  text\n");
    assert_eq!(toks[4].value, "y");
    let interpolations: Vec<_> = heredoc
        .segments
        .iter()
        .filter_map(|s| match s {
            StringSegment::Interpolation(r) => Some(r.slice(source)),
            StringSegment::Text(_) => None,
        })
        .collect();
    assert_eq!(interpolations, vec!["el"]);
}

#[test]
fn test_heredoc_with_method_call_on_opener_line() {
    let source = "foo(<<~A.strip, 1)\nbody\nA\n";
    let k = kinds(source);
    assert_eq!(
        k,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::OpenParenToken,
            SyntaxKind::HeredocLiteral,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::CommaToken,
            SyntaxKind::IntegerLiteral,
            SyntaxKind::CloseParenToken,
            SyntaxKind::NewLineToken,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_two_heredocs_on_one_line() {
    let source = "[<<~A, <<~B]\none\nA\ntwo\nB\nz";
    let toks = tokens(source);
    let heredocs: Vec<_> = toks
        .iter()
        .filter(|t| t.kind == SyntaxKind::HeredocLiteral)
        .collect();
    assert_eq!(heredocs.len(), 2);
    assert_eq!(heredocs[0].heredoc_body.slice(source), "one\n");
    assert_eq!(heredocs[1].heredoc_body.slice(source), "two\n");
    assert_eq!(toks[toks.len() - 2].value, "z");
}

#[test]
fn test_single_quoted_heredoc_has_no_interpolation() {
    let source = "<<-'EOS'\n#{el}\n  EOS\n";
    let toks = tokens(source);
    assert_eq!(toks[0].kind, SyntaxKind::HeredocLiteral);
    assert!(!toks[0].has_interpolation());
}

#[test]
fn test_unterminated_heredoc() {
    let output = ScannerState::new("x = <<~EOS\nbody\n").tokenize();
    assert!(output.tokens[2].is_unterminated());
    assert_eq!(output.diagnostics[0].message.code, 1003);
}

#[test]
fn test_word_arrays() {
    let source = "%w[a b  c]\n%i(x y)";
    let toks = tokens(source);
    assert_eq!(toks[0].kind, SyntaxKind::WordsLiteral);
    let words: Vec<_> = toks[0].segments.iter().map(|s| s.range().slice(source)).collect();
    assert_eq!(words, vec!["a", "b", "c"]);
    assert_eq!(toks[2].kind, SyntaxKind::SymbolsLiteral);
}

#[test]
fn test_percent_is_modulo_after_value() {
    assert_eq!(kinds("x % 2")[1], SyntaxKind::PercentToken);
    assert_eq!(kinds("x %= 2")[1], SyntaxKind::PercentEqualsToken);
}

#[test]
fn test_regex_vs_division() {
    assert_eq!(kinds("a / b")[1], SyntaxKind::SlashToken);
    assert_eq!(kinds("x = /ab+c/i")[2], SyntaxKind::RegexLiteral);
    assert_eq!(kinds("el =~ /x/")[2], SyntaxKind::RegexLiteral);
}

#[test]
fn test_comments_are_collected() {
    let source = "# leading\nx = 1 # trailing\n=begin\nblock\n=end\ny";
    let output = ScannerState::new(source).tokenize();
    assert_eq!(output.comments.len(), 3);
    assert!(output.comments[0].own_line);
    assert_eq!(output.comments[1].get_text(source), "# trailing");
    assert!(!output.comments[1].own_line);
    assert!(output.comments[2].is_block);
    let last = &output.tokens[output.tokens.len() - 2];
    assert_eq!(last.value, "y");
}

#[test]
fn test_end_marker_stops_scanning() {
    let k = kinds("a\n__END__\nnot ruby {");
    assert_eq!(
        k,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::NewLineToken,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_line_continuation() {
    let k = kinds("a + \\\n  b");
    assert_eq!(
        k,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::PlusToken,
            SyntaxKind::Identifier,
            SyntaxKind::EndOfFileToken,
        ]
    );
}

#[test]
fn test_compound_operators() {
    let k = kinds("a ||= b &&= c <=> d ** e &. f");
    assert!(k.contains(&SyntaxKind::BarBarEqualsToken));
    assert!(k.contains(&SyntaxKind::AmpersandAmpersandEqualsToken));
    assert!(k.contains(&SyntaxKind::LessThanEqualsGreaterThanToken));
    assert!(k.contains(&SyntaxKind::AsteriskAsteriskToken));
    assert!(k.contains(&SyntaxKind::AmpersandDotToken));
}

#[test]
fn test_with_range_keeps_absolute_offsets() {
    let source = "\"#{acc + el}\"";
    let output = ScannerState::with_range(source, 3, 11).tokenize();
    let k: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        k,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::PlusToken,
            SyntaxKind::Identifier,
            SyntaxKind::EndOfFileToken,
        ]
    );
    assert_eq!(output.tokens[0].range, TextRange::new(3, 6));
    assert_eq!(output.tokens[3].range, TextRange::empty(11));
}

#[test]
fn test_unknown_character() {
    let output = ScannerState::new("a \u{0001} b").tokenize();
    assert_eq!(output.tokens[1].kind, SyntaxKind::Unknown);
    assert_eq!(output.diagnostics[0].message.code, 1008);
}
