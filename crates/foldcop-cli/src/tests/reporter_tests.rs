use foldcop_checker::{LintOptions, Linter};

use crate::driver::FileReport;
use crate::reporter::{JsonReport, Reporter};

fn report_for(path: &str, source: &str) -> FileReport {
    let result = Linter::new(LintOptions::default()).lint_source(path, source);
    FileReport {
        path: path.to_string(),
        source: source.to_string(),
        result,
    }
}

#[test]
fn formats_location_code_rule_and_snippet() {
    let report = report_for("sum.rb", "(1..4).reduce(0) do |acc, el|\n  el * 2\nend\n");
    let mut reporter = Reporter::new(false);
    reporter.add_source(&report.path, &report.source);

    let rendered = reporter.render(&report.result.diagnostics);
    let expected = "sum.rb:2:3 - warning FC2001 Lint/UnmodifiedReduceAccumulator: \
                    Ensure the accumulator `acc` will be modified by `reduce`.\n    \
                    2     el * 2\n          ~~~~~~";
    assert_eq!(rendered, expected);
}

#[test]
fn underline_expands_tabs() {
    let report = report_for("tab.rb", "(1..4).inject(0) do |acc, el|\n\tel\nend\n");
    let mut reporter = Reporter::new(false);
    reporter.add_source(&report.path, &report.source);

    let rendered = reporter.render(&report.result.diagnostics);
    assert!(rendered.ends_with("\n    2       el\n            ~~"));
}

#[test]
fn heredoc_offense_underlines_the_opener() {
    let source = "(1..4).reduce('') do |acc, el|\n  <<~OUT\n    #{el}\n  OUT\nend\n";
    let report = report_for("doc.rb", source);
    let mut reporter = Reporter::new(false);
    reporter.add_source(&report.path, &report.source);

    let rendered = reporter.render(&report.result.diagnostics);
    assert!(rendered.starts_with("doc.rb:2:3 - warning FC2001"));
    assert!(rendered.ends_with("<<~OUT\n          ~~~~~~"));
}

#[test]
fn summary_counts_files_and_offenses() {
    let reports = vec![
        report_for("a.rb", "x.reduce(0) { |acc, el| el }\n"),
        report_for("b.rb", "x.reduce(0) { |acc, el| acc }\n"),
    ];
    let reporter = Reporter::new(false);
    assert_eq!(
        reporter.summary(&reports),
        "\n2 files inspected, 1 offense detected"
    );
}

#[test]
fn json_report_lists_every_file() {
    let reports = vec![
        report_for("a.rb", "x.reduce({}) { |acc, k| acc[k] = 1 }\n"),
        report_for("broken.rb", "x.reduce(0) do |acc, el|\n"),
    ];
    let json = serde_json::to_value(JsonReport::build(&reports)).expect("serializable");

    let first = &json["files"][0];
    assert_eq!(first["path"], "a.rb");
    assert_eq!(first["parseFailed"], false);
    assert_eq!(first["diagnostics"][0]["code"], "FC2002");
    assert_eq!(
        first["diagnostics"][0]["message"],
        "Do not return an element of the accumulator in `reduce`."
    );
    assert_eq!(first["diagnostics"][0]["column"], 25);

    let broken = &json["files"][1];
    assert_eq!(broken["parseFailed"], true);
    assert_eq!(broken["diagnostics"][0]["severity"], "error");
    assert!(broken["diagnostics"][0].get("rule").is_none());
    assert!(json["summary"]["errorCount"].as_u64() >= Some(1));
}
