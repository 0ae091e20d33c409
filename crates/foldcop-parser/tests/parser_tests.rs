//! Tests for the Ruby parser.
use foldcop_common::{TextRange, diagnostic_codes};
use foldcop_parser::{IfForm, NodeData, NodeIndex, ParameterKind, ParsedFile, parse_source};
use foldcop_scanner::SyntaxKind;

fn parse(source: &str) -> ParsedFile {
    parse_source("test.rb", source)
}

fn parse_clean(source: &str) -> ParsedFile {
    let file = parse(source);
    assert!(
        file.diagnostics.is_empty(),
        "unexpected diagnostics for {source:?}: {:?}",
        file.diagnostics
    );
    file
}

/// Indices of every node matching `pred`, in creation order.
fn find_all(file: &ParsedFile, pred: impl Fn(&NodeData) -> bool) -> Vec<NodeIndex> {
    file.arena
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| pred(&node.data))
        .map(|(index, _)| NodeIndex(index as u32))
        .collect()
}

fn find_call(file: &ParsedFile, method: &str) -> NodeIndex {
    let calls = find_all(file, |data| matches!(data, NodeData::Call { name, .. } if name == method));
    assert_eq!(calls.len(), 1, "expected exactly one call to {method}");
    calls[0]
}

fn text<'a>(file: &ParsedFile, source: &'a str, index: NodeIndex) -> &'a str {
    file.arena.get(index).expect("node").range.slice(source)
}

fn top_statements(file: &ParsedFile) -> Vec<NodeIndex> {
    let Some(NodeData::Program { body }) = file.arena.data(file.root) else {
        panic!("root is not a program");
    };
    file.arena.statements(*body).to_vec()
}

fn block_of(file: &ParsedFile, call: NodeIndex) -> (Vec<NodeIndex>, NodeIndex) {
    let Some(NodeData::Call { block, .. }) = file.arena.data(call) else {
        panic!("not a call");
    };
    let Some(NodeData::Block { parameters, body, .. }) = file.arena.data(*block) else {
        panic!("call has no block");
    };
    (parameters.nodes.clone(), *body)
}

// =============================================================================
// Calls and blocks
// =============================================================================

#[test]
fn parse_reduce_with_do_block() {
    let source = "(1..4).reduce(0) do |acc, el|\n  acc + el\nend\n";
    let file = parse_clean(source);
    let call = find_call(&file, "reduce");
    let Some(NodeData::Call {
        receiver,
        call_operator,
        arguments,
        has_parens,
        ..
    }) = file.arena.data(call)
    else {
        panic!("not a call");
    };
    assert_eq!(*call_operator, SyntaxKind::DotToken);
    assert!(*has_parens);
    assert_eq!(text(&file, source, *receiver), "(1..4)");
    assert_eq!(arguments.len(), 1);

    let (parameters, body) = block_of(&file, call);
    let names: Vec<_> = parameters
        .iter()
        .map(|&p| match file.arena.data(p) {
            Some(NodeData::Parameter { name, kind, .. }) => {
                assert_eq!(*kind, ParameterKind::Required);
                name.clone()
            }
            other => panic!("unexpected parameter {other:?}"),
        })
        .collect();
    assert_eq!(names, ["acc", "el"]);

    let last = file.arena.last_statement(body).expect("statement");
    let Some(NodeData::Binary { left, operator, right }) = file.arena.data(last) else {
        panic!("expected binary");
    };
    assert_eq!(*operator, SyntaxKind::PlusToken);
    assert_eq!(file.arena.identifier_name(*left), Some("acc"));
    assert_eq!(file.arena.identifier_name(*right), Some("el"));
}

#[test]
fn parse_symbol_argument_without_block() {
    let file = parse_clean("values.reduce(:+)");
    let call = find_call(&file, "reduce");
    let Some(NodeData::Call { arguments, block, .. }) = file.arena.data(call) else {
        panic!("not a call");
    };
    assert!(block.is_none());
    let first = arguments.first().expect("argument");
    assert!(matches!(
        file.arena.data(first),
        Some(NodeData::Symbol { name, .. }) if name == "+"
    ));
}

#[test]
fn parse_safe_navigation_call() {
    let file = parse_clean("values&.inject(0) { |a, b| a + b }");
    let call = find_call(&file, "inject");
    assert!(matches!(
        file.arena.data(call),
        Some(NodeData::Call { call_operator: SyntaxKind::AmpersandDotToken, .. })
    ));
}

#[test]
fn parse_command_call_arguments() {
    let file = parse_clean("puts x, y");
    let call = find_call(&file, "puts");
    let Some(NodeData::Call { arguments, has_parens, .. }) = file.arena.data(call) else {
        panic!("not a call");
    };
    assert!(!*has_parens);
    assert_eq!(arguments.len(), 2);
}

#[test]
fn parse_binary_minus_is_not_a_command_argument() {
    let file = parse_clean("x - 1");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[0]),
        Some(NodeData::Binary { operator: SyntaxKind::MinusToken, .. })
    ));
}

#[test]
fn parse_do_block_binds_to_command_call() {
    let file = parse_clean("foo.bar baz do |x|\n  x\nend");
    let bar = find_call(&file, "bar");
    let baz = find_call(&file, "baz");
    assert!(matches!(
        file.arena.data(bar),
        Some(NodeData::Call { block, .. }) if block.is_some()
    ));
    assert!(matches!(
        file.arena.data(baz),
        Some(NodeData::Call { block, .. }) if block.is_none()
    ));
}

#[test]
fn parse_brace_block_binds_to_nearest_call() {
    let file = parse_clean("foo bar { |x| x }");
    let foo = find_call(&file, "foo");
    let bar = find_call(&file, "bar");
    assert!(matches!(
        file.arena.data(foo),
        Some(NodeData::Call { block, .. }) if block.is_none()
    ));
    assert!(matches!(
        file.arena.data(bar),
        Some(NodeData::Call { block, .. }) if block.is_some()
    ));
}

#[test]
fn parse_keyword_arguments_as_implicit_hash() {
    let file = parse_clean("foo(1, a: 2, b: 3)");
    let call = find_call(&file, "foo");
    let Some(NodeData::Call { arguments, .. }) = file.arena.data(call) else {
        panic!("not a call");
    };
    assert_eq!(arguments.len(), 2);
    let hash = arguments.last().expect("hash");
    assert!(matches!(
        file.arena.data(hash),
        Some(NodeData::Hash { pairs, braces: false }) if pairs.len() == 2
    ));
}

#[test]
fn parse_leading_dot_method_chain() {
    let file = parse_clean("values\n  .map { |v| v * 2 }\n  .reduce(0) { |a, b| a + b }");
    let reduce = find_call(&file, "reduce");
    let map = find_call(&file, "map");
    assert!(matches!(
        file.arena.data(reduce),
        Some(NodeData::Call { receiver, .. }) if *receiver == map
    ));
    assert_eq!(top_statements(&file).len(), 1);
}

#[test]
fn parse_block_parameter_shapes() {
    let file = parse_clean("pairs.each { |(k, v), *rest, key:, &blk; tmp| k }");
    let call = find_call(&file, "each");
    let (parameters, _) = block_of(&file, call);
    let kinds: Vec<_> = parameters
        .iter()
        .map(|&p| file.arena.get(p).expect("param").kind_name())
        .collect();
    assert_eq!(
        kinds,
        ["DestructuredParameter", "Parameter", "Parameter", "Parameter", "Parameter"]
    );
    assert!(matches!(
        file.arena.data(parameters[4]),
        Some(NodeData::Parameter { kind: ParameterKind::BlockLocal, .. })
    ));
}

// =============================================================================
// Locals
// =============================================================================

#[test]
fn parse_assigned_names_become_locals() {
    let file = parse_clean("x = 1\nx\ny");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[1]),
        Some(NodeData::Identifier { name }) if name == "x"
    ));
    assert!(matches!(
        file.arena.data(statements[2]),
        Some(NodeData::Call { name, .. }) if name == "y"
    ));
}

#[test]
fn parse_block_parameters_are_local_to_the_block() {
    let file = parse_clean("[1].each { |a| a }\na");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[1]),
        Some(NodeData::Call { name, .. }) if name == "a"
    ));
    assert_eq!(find_all(&file, |d| matches!(d, NodeData::Identifier { name } if name == "a")).len(), 1);
}

#[test]
fn parse_def_hides_outer_locals() {
    let file = parse_clean("x = 1\ndef foo\n  x\nend\n");
    let calls = find_all(&file, |d| matches!(d, NodeData::Call { name, .. } if name == "x"));
    assert_eq!(calls.len(), 1);
}

// =============================================================================
// Statements and control flow
// =============================================================================

#[test]
fn parse_modifier_next_with_argument() {
    let source = "values.reduce(0) do |acc, el|\n  next el if el.even?\n  acc\nend";
    let file = parse_clean(source);
    let (_, body) = block_of(&file, find_call(&file, "reduce"));
    let first = file.arena.statements(body)[0];
    let Some(NodeData::If {
        condition,
        then_branch,
        form,
        ..
    }) = file.arena.data(first)
    else {
        panic!("expected modifier if");
    };
    assert_eq!(*form, IfForm::Modifier);
    assert_eq!(text(&file, source, *condition), "el.even?");
    let Some(NodeData::Next { arguments }) = file.arena.data(*then_branch) else {
        panic!("expected next");
    };
    assert_eq!(text(&file, source, arguments.nodes[0]), "el");

    // Children come back in source order: the body before the condition.
    let children = file.arena.children(first);
    assert_eq!(children.as_slice(), &[*then_branch, *condition]);
}

#[test]
fn parse_break_without_argument() {
    let file = parse_clean("loop do\n  break if done?\nend");
    let breaks = find_all(&file, |d| matches!(d, NodeData::Break { .. }));
    assert!(matches!(
        file.arena.data(breaks[0]),
        Some(NodeData::Break { arguments }) if arguments.is_empty()
    ));
}

#[test]
fn parse_elsif_chain_nests_in_else_branch() {
    let file = parse_clean("if a\n  1\nelsif b\n  2\nelse\n  3\nend");
    let statements = top_statements(&file);
    let Some(NodeData::If { else_branch, form, .. }) = file.arena.data(statements[0]) else {
        panic!("expected if");
    };
    assert_eq!(*form, IfForm::Statement);
    assert!(matches!(
        file.arena.data(*else_branch),
        Some(NodeData::If { else_branch, .. }) if else_branch.is_some()
    ));
}

#[test]
fn parse_ternary() {
    let file = parse_clean("x = a ? b : c");
    assert_eq!(
        find_all(&file, |d| matches!(d, NodeData::If { form: IfForm::Ternary, .. })).len(),
        1
    );
}

#[test]
fn parse_case_when_else() {
    let file = parse_clean("case x\nwhen 1, 2 then :a\nwhen 3\n  :b\nelse\n  :c\nend");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[0]),
        Some(NodeData::Case { whens, else_branch, .. }) if whens.len() == 2 && else_branch.is_some()
    ));
}

#[test]
fn parse_begin_rescue_ensure() {
    let file = parse_clean("begin\n  work\nrescue ArgumentError, TypeError => e\n  e\nelse\n  1\nensure\n  done\nend");
    let statements = top_statements(&file);
    let Some(NodeData::Begin {
        rescues,
        else_branch,
        ensure_branch,
        ..
    }) = file.arena.data(statements[0])
    else {
        panic!("expected begin");
    };
    assert_eq!(rescues.len(), 1);
    assert!(else_branch.is_some());
    assert!(ensure_branch.is_some());
    assert!(matches!(
        file.arena.data(rescues.nodes[0]),
        Some(NodeData::Rescue { exceptions, variable, .. }) if exceptions.len() == 2 && variable.is_some()
    ));
}

#[test]
fn parse_def_with_rescue_body() {
    let file = parse_clean("def call(x, y = 2, *rest, key: 1, **opts, &blk)\n  x\nrescue\n  nil\nend");
    let defs = find_all(&file, |d| matches!(d, NodeData::Def { .. }));
    let Some(NodeData::Def { name, parameters, body, .. }) = file.arena.data(defs[0]) else {
        panic!("expected def");
    };
    assert_eq!(name, "call");
    assert_eq!(parameters.len(), 6);
    assert!(matches!(file.arena.data(*body), Some(NodeData::Begin { .. })));
}

#[test]
fn parse_class_module_and_endless_def() {
    let file = parse_clean(
        "module Lint\n  class Foo < Base\n    def self.build = new\n    def ==(other)\n      true\n    end\n  end\nend",
    );
    assert_eq!(find_all(&file, |d| matches!(d, NodeData::Module { .. })).len(), 1);
    assert_eq!(find_all(&file, |d| matches!(d, NodeData::Class { .. })).len(), 1);
    let defs = find_all(&file, |d| matches!(d, NodeData::Def { .. }));
    assert_eq!(defs.len(), 2);
    assert!(matches!(
        file.arena.data(defs[0]),
        Some(NodeData::Def { singleton, name, .. }) if singleton.is_some() && name == "build"
    ));
}

#[test]
fn parse_multiple_assignment() {
    let file = parse_clean("a, *b = 1, 2, 3\nb");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[0]),
        Some(NodeData::MultipleAssignment { targets, .. }) if targets.len() == 2
    ));
    assert!(matches!(file.arena.data(statements[1]), Some(NodeData::Identifier { .. })));
}

// =============================================================================
// Assignment forms
// =============================================================================

#[test]
fn parse_index_assignment_spans_whole_expression() {
    let source = "%w(a b c).reduce({}) do |acc, letter|\n  acc[letter] = true\nend";
    let file = parse_clean(source);
    let assignments = find_all(&file, |d| matches!(d, NodeData::IndexAssignment { .. }));
    assert_eq!(assignments.len(), 1);
    assert_eq!(text(&file, source, assignments[0]), "acc[letter] = true");
    let Some(NodeData::IndexAssignment { receiver, arguments, .. }) = file.arena.data(assignments[0]) else {
        unreachable!();
    };
    assert_eq!(file.arena.identifier_name(*receiver), Some("acc"));
    assert_eq!(arguments.len(), 1);
}

#[test]
fn parse_compound_assignments() {
    let file = parse_clean("acc = 0\nacc += 1\nacc ||= 2\nacc &&= 3\nh = {}\nh[:k] += 1\nobj.attr = 4");
    let operators: Vec<_> = find_all(&file, |d| matches!(d, NodeData::Assignment { .. }))
        .into_iter()
        .map(|i| match file.arena.data(i) {
            Some(NodeData::Assignment { operator, .. }) => *operator,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        operators,
        [
            SyntaxKind::EqualsToken,
            SyntaxKind::PlusEqualsToken,
            SyntaxKind::BarBarEqualsToken,
            SyntaxKind::AmpersandAmpersandEqualsToken,
            SyntaxKind::EqualsToken,
            SyntaxKind::PlusEqualsToken,
            SyntaxKind::EqualsToken,
        ]
    );
}

#[test]
fn parse_shovel_is_binary() {
    let file = parse_clean("acc = []\nacc << el");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[1]),
        Some(NodeData::Binary { operator: SyntaxKind::LessThanLessThanToken, .. })
    ));
}

#[test]
fn parse_operator_precedence() {
    let file = parse_clean("a = 1 + 2 * 3 ** 2 ** 1");
    let statements = top_statements(&file);
    let Some(NodeData::Assignment { value, .. }) = file.arena.data(statements[0]) else {
        panic!("expected assignment");
    };
    let Some(NodeData::Binary { operator, right, .. }) = file.arena.data(*value) else {
        panic!("expected binary");
    };
    assert_eq!(*operator, SyntaxKind::PlusToken);
    assert!(matches!(
        file.arena.data(*right),
        Some(NodeData::Binary { operator: SyntaxKind::AsteriskToken, .. })
    ));
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn parse_string_interpolation_parts() {
    let source = r##"values.reduce("") { |acc, el| "#{acc}#{el}" }"##;
    let file = parse_clean(source);
    let strings = find_all(&file, |d| matches!(d, NodeData::Str { parts } if !parts.is_empty()));
    let interpolated = strings
        .iter()
        .copied()
        .find(|&s| matches!(file.arena.data(s), Some(NodeData::Str { parts }) if file.arena.has_interpolation(parts)))
        .expect("interpolated string");
    assert_eq!(text(&file, source, interpolated), r##""#{acc}#{el}""##);

    let Some(NodeData::Str { parts }) = file.arena.data(interpolated) else {
        unreachable!();
    };
    assert_eq!(parts.len(), 2);
    assert_eq!(text(&file, source, parts.nodes[0]), "#{acc}");
    let Some(NodeData::Interpolation { body }) = file.arena.data(parts.nodes[1]) else {
        panic!("expected interpolation");
    };
    let last = file.arena.last_statement(*body).expect("statement");
    assert_eq!(file.arena.identifier_name(last), Some("el"));
}

#[test]
fn parse_heredoc_range_is_the_opener() {
    let source = "values.reduce(\"\") do |acc, el|\n  <<~RESULT\n    #{acc}#{el}\n  RESULT\nend\n";
    let file = parse_clean(source);
    let heredocs = find_all(&file, |d| matches!(d, NodeData::Heredoc { .. }));
    assert_eq!(heredocs.len(), 1);
    assert_eq!(text(&file, source, heredocs[0]), "<<~RESULT");
    let Some(NodeData::Heredoc { parts, body_range }) = file.arena.data(heredocs[0]) else {
        unreachable!();
    };
    assert!(body_range.slice(source).contains("#{acc}#{el}"));
    let interpolations = parts
        .iter()
        .filter(|&p| matches!(file.arena.data(p), Some(NodeData::Interpolation { .. })))
        .count();
    assert_eq!(interpolations, 2);
    let identifiers = find_all(&file, |d| matches!(d, NodeData::Identifier { .. }));
    assert_eq!(identifiers.len(), 2);
}

#[test]
fn parse_word_arrays() {
    let file = parse_clean("%w(a b c)\n%i(x y)");
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(statements[0]),
        Some(NodeData::Array { elements }) if elements.len() == 3
    ));
    assert!(matches!(
        file.arena.data(statements[1]),
        Some(NodeData::Array { elements }) if elements.len() == 2
    ));
}

// =============================================================================
// Errors and recovery
// =============================================================================

#[test]
fn parse_missing_end_reports_opener() {
    let file = parse("def foo\n  1\n");
    assert!(file.has_errors());
    let diag = &file.diagnostics[0];
    assert_eq!(diag.code, diagnostic_codes::END_EXPECTED);
    assert!(diag.message_text.contains("def"), "{}", diag.message_text);
}

#[test]
fn parse_missing_expression_recovers() {
    let file = parse("x = ;\ny = 2");
    let codes: Vec<u32> = file.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&diagnostic_codes::EXPRESSION_EXPECTED), "{codes:?}");
    assert_eq!(top_statements(&file).len(), 2);
}

#[test]
fn parse_unexpected_token_skips_to_next_statement() {
    let file = parse(") + 1\nok = 1");
    assert!(file.diagnostics.iter().any(|d| d.code == diagnostic_codes::UNEXPECTED_TOKEN));
    let statements = top_statements(&file);
    assert!(matches!(
        file.arena.data(*statements.last().expect("statement")),
        Some(NodeData::Assignment { .. })
    ));
}

#[test]
fn parse_unterminated_string_is_reported() {
    let file = parse("x = \"abc");
    assert!(file
        .diagnostics
        .iter()
        .any(|d| d.code == diagnostic_codes::UNTERMINATED_STRING_LITERAL));
}

#[test]
fn parse_deep_nesting_is_bounded() {
    let source = format!("{}x", "!".repeat(400));
    let file = parse(&source);
    assert!(file.diagnostics.iter().any(|d| d.code == diagnostic_codes::NESTING_TOO_DEEP));
}

#[test]
fn parse_empty_source() {
    let file = parse_clean("");
    assert!(top_statements(&file).is_empty());
    assert_eq!(file.arena.get(file.root).expect("root").range, TextRange::new(0, 0));
}

#[test]
fn parse_comments_are_collected() {
    let file = parse_clean("# foldcop:disable all\nx = 1 # trailing\n");
    assert_eq!(file.comments.len(), 2);
    assert!(file.comments[0].own_line);
    assert!(!file.comments[1].own_line);
}

#[test]
fn arena_serializes_to_json() {
    let file = parse_clean("acc + el");
    let json = serde_json::to_value(&file.arena).expect("serialize");
    let nodes = json["nodes"].as_array().expect("nodes");
    assert_eq!(nodes.len(), file.arena.len());
    assert!(json.to_string().contains("Binary"));
}
