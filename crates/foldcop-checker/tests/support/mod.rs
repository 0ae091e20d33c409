//! Annotated-source helpers.
//!
//! Expected offenses are written under the line they point at:
//!
//! ```text
//! values.reduce(0) { |acc, el| el }
//!                              ^^ Ensure the accumulator `acc` will be modified by `reduce`.
//! ```
//!
//! `{method}` in the source is replaced by the method under test, and
//! `^{method}` by a marker as wide as its name.

#![allow(dead_code)]

use foldcop_checker::{LintOptions, Linter};

pub const METHODS: [&str; 2] = ["reduce", "inject"];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Offense {
    pub start: u32,
    pub length: u32,
    pub message: String,
}

pub fn expand(template: &str, method: &str) -> String {
    template
        .replace("^{method}", &"^".repeat(method.len()))
        .replace("{method}", method)
}

/// Split annotated source into plain source and the offenses it expects.
pub fn parse_annotated(annotated: &str) -> (String, Vec<Offense>) {
    let mut source = String::new();
    let mut expected = Vec::new();
    let mut previous_line_start: Option<usize> = None;

    for line in annotated.split_inclusive('\n') {
        let content = line.trim_end_matches('\n');
        let indent = content.len() - content.trim_start().len();
        if content.trim_start().starts_with('^') {
            let line_start = previous_line_start.expect("marker line before any source line");
            let marker = &content[indent..];
            let width = marker.chars().take_while(|&c| c == '^').count();
            let message = marker[width..].trim().to_string();
            expected.push(Offense {
                start: (line_start + indent) as u32,
                length: width as u32,
                message,
            });
            continue;
        }
        previous_line_start = Some(source.len());
        source.push_str(line);
    }
    expected.sort();
    (source, expected)
}

pub fn lint_offenses(source: &str, options: LintOptions) -> Vec<Offense> {
    let result = Linter::new(options).lint_source("test.rb", source);
    assert!(
        !result.parse_failed,
        "source did not parse: {:?}\n{source}",
        result.diagnostics
    );
    let mut offenses: Vec<Offense> = result
        .diagnostics
        .into_iter()
        .map(|diagnostic| Offense {
            start: diagnostic.start,
            length: diagnostic.length,
            message: diagnostic.message_text,
        })
        .collect();
    offenses.sort();
    offenses
}

#[track_caller]
pub fn expect_offense_with(options: LintOptions, annotated: &str) {
    let (source, expected) = parse_annotated(annotated);
    assert!(!expected.is_empty(), "no offense markers in:\n{annotated}");
    let actual = lint_offenses(&source, options);
    assert_eq!(actual, expected, "offenses differ for:\n{source}");
}

#[track_caller]
pub fn expect_offense(annotated: &str) {
    expect_offense_with(LintOptions::default(), annotated);
}

#[track_caller]
pub fn expect_no_offenses_with(options: LintOptions, source: &str) {
    let actual = lint_offenses(source, options);
    assert!(actual.is_empty(), "unexpected offenses {actual:?} in:\n{source}");
}

#[track_caller]
pub fn expect_no_offenses(source: &str) {
    expect_no_offenses_with(LintOptions::default(), source);
}

/// Run `check` once per fold method with `{method}` expanded.
pub fn for_each_method(template: &str, check: impl Fn(&str)) {
    for method in METHODS {
        check(&expand(template, method));
    }
}
