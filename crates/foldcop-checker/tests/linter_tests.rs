//! Tests for the lint driver: walking, directives, options and parse errors.

mod support;

use foldcop_checker::rules::UnmodifiedReduceAccumulator;
use foldcop_checker::{LintOptions, Linter};
use foldcop_common::{DiagnosticCategory, diagnostic_codes};
use support::{expect_no_offenses, expect_offense, lint_offenses};

const OFFENDING: &str = "(1..4).reduce(0) do |acc, el|\n  el\nend\n";

#[test]
fn test_reports_rule_name_code_and_category() {
    let result = Linter::new(LintOptions::default()).lint_source("sum.rb", OFFENDING);
    assert!(!result.parse_failed);
    assert_eq!(result.file_name, "sum.rb");
    assert_eq!(result.diagnostics.len(), 1);

    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.file, "sum.rb");
    assert_eq!(diagnostic.code, diagnostic_codes::ACCUMULATOR_NOT_MODIFIED);
    assert_eq!(diagnostic.code_label(), "FC2001");
    assert_eq!(diagnostic.category, DiagnosticCategory::Warning);
    assert_eq!(diagnostic.rule, Some(UnmodifiedReduceAccumulator::NAME));
    assert_eq!(diagnostic.start, 32);
    assert_eq!(diagnostic.length, 2);
}

#[test]
fn test_parse_errors_skip_rules() {
    let source = "(1..4).reduce(0) do |acc, el|\n  el\n";
    let result = Linter::new(LintOptions::default()).lint_source("broken.rb", source);
    assert!(result.parse_failed);
    assert!(!result.diagnostics.is_empty());
    assert!(
        result
            .diagnostics
            .iter()
            .all(|diagnostic| diagnostic.rule.is_none()
                && diagnostic.category == DiagnosticCategory::Error)
    );
}

#[test]
fn test_diagnostics_are_sorted_by_position() {
    let source = r#"a.reduce(0) { |acc, el| el }
b.inject(0) do |memo, item|
  next item if item.nil?
  item * 2
end
"#;
    let result = Linter::new(LintOptions::default()).lint_source("many.rb", source);
    let starts: Vec<u32> = result.diagnostics.iter().map(|d| d.start).collect();
    assert_eq!(starts.len(), 3);
    assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_folds_inside_definitions_are_found() {
    expect_offense(
        r#"module Stats
  class Sum
    def total(values)
      values.reduce(0) do |acc, el|
        el
        ^^ Ensure the accumulator `acc` will be modified by `reduce`.
      end
    end
  end
end
"#,
    );
}

#[test]
fn test_linting_twice_gives_the_same_result() {
    let linter = Linter::new(LintOptions::default());
    let first = linter.lint_source("a.rb", OFFENDING);
    let second = linter.lint_source("a.rb", OFFENDING);
    assert_eq!(first.diagnostics, second.diagnostics);
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_disabled_rule_is_not_run() {
    let options = LintOptions::default().with_rule_disabled(UnmodifiedReduceAccumulator::NAME);
    assert_eq!(Linter::new(options.clone()).rules().count(), 0);
    assert!(lint_offenses(OFFENDING, options).is_empty());
}

#[test]
fn test_severity_override_applies() {
    let options = LintOptions::default()
        .with_severity(UnmodifiedReduceAccumulator::NAME, DiagnosticCategory::Error);
    let result = Linter::new(options).lint_source("a.rb", OFFENDING);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].category, DiagnosticCategory::Error);
}

// =============================================================================
// Directive comments
// =============================================================================

#[test]
fn test_trailing_directive_disables_its_line() {
    expect_no_offenses(
        "values.reduce(0) { |acc, el| el } # foldcop:disable Lint/UnmodifiedReduceAccumulator\n",
    );
    expect_no_offenses("values.reduce(0) { |acc, el| el } # rubocop:disable all\n");
}

#[test]
fn test_trailing_directive_does_not_leak_to_next_line() {
    expect_offense(
        r#"a.reduce(0) { |acc, el| el } # rubocop:disable Lint/UnmodifiedReduceAccumulator
b.reduce(0) { |acc, el| el }
                        ^^ Ensure the accumulator `acc` will be modified by `reduce`.
"#,
    );
}

#[test]
fn test_own_line_directive_disables_until_enable() {
    expect_offense(
        r#"# foldcop:disable Lint
a.reduce(0) do |acc, el|
  el
end
# foldcop:enable Lint
b.reduce(0) do |acc, el|
  el
  ^^ Ensure the accumulator `acc` will be modified by `reduce`.
end
"#,
    );
}

#[test]
fn test_unclosed_directive_runs_to_end_of_file() {
    expect_no_offenses(
        r#"x = 1
# rubocop:disable Lint/UnmodifiedReduceAccumulator -- legacy
a.reduce(0) do |acc, el|
  el
end
"#,
    );
}

#[test]
fn test_directive_for_other_rule_does_not_suppress() {
    expect_offense(
        r#"a.reduce(0) { |acc, el| el } # rubocop:disable Style/Foo
                        ^^ Ensure the accumulator `acc` will be modified by `reduce`.
"#,
    );
}
