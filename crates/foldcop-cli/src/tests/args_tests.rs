use clap::Parser;
use std::path::PathBuf;

use crate::args::{CliArgs, FailLevel, OutputFormat};

#[test]
fn parses_defaults() {
    let args = CliArgs::try_parse_from(["foldcop"]).expect("default args should parse");

    assert_eq!(args.paths, vec![PathBuf::from(".")]);
    assert_eq!(args.format, OutputFormat::Text);
    assert_eq!(args.fail_level, FailLevel::Warning);
    assert!(args.config.is_none());
    assert!(args.require_initial_value.is_none());
    assert!(!args.no_color);
    assert!(!args.list_rules);
    assert!(!args.show_config);
}

#[test]
fn parses_common_flags() {
    let args = CliArgs::try_parse_from([
        "foldcop",
        "--format",
        "json",
        "--config",
        "ci/.foldcop.json",
        "--no-color",
        "--require-initial-value",
        "false",
        "--fail-level",
        "error",
        "app",
        "lib/report.rb",
    ])
    .expect("flagged args should parse");

    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(args.config, Some(PathBuf::from("ci/.foldcop.json")));
    assert!(args.no_color);
    assert_eq!(args.require_initial_value, Some(false));
    assert_eq!(args.fail_level, FailLevel::Error);
    assert_eq!(
        args.paths,
        vec![PathBuf::from("app"), PathBuf::from("lib/report.rb")]
    );
}

#[test]
fn rejects_unknown_format() {
    assert!(CliArgs::try_parse_from(["foldcop", "--format", "xml"]).is_err());
}
