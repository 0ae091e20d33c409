use foldcop_checker::rules::UnmodifiedReduceAccumulator;
use foldcop_common::DiagnosticCategory;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{
    CONFIG_FILE_NAME, find_config, load_config, parse_config, resolve_config,
};

fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create test dir");
    }
    std::fs::write(&path, contents).expect("failed to write test file");
}

#[test]
fn parses_json_with_comments_and_trailing_commas() {
    let input = r#"
{
  // analyze calls without an initial value too
  "requireInitialValue": false,
  /* vendored code */
  "exclude": ["vendor/**", "tmp/**",],
}
"#;
    let config = parse_config(input).expect("config should parse");
    assert_eq!(config.require_initial_value, Some(false));
    assert_eq!(
        config.exclude,
        Some(vec!["vendor/**".to_string(), "tmp/**".to_string()])
    );
}

#[test]
fn keeps_comment_markers_inside_strings() {
    let config = parse_config(r#"{ "include": ["http://x/*.rb"] }"#).expect("config should parse");
    assert_eq!(config.include, Some(vec!["http://x/*.rb".to_string()]));
}

#[test]
fn accepts_booleans_given_as_strings() {
    let config = parse_config(
        r#"{
  "requireInitialValue": "no",
  "rules": { "Lint/UnmodifiedReduceAccumulator": { "enabled": "off" } }
}"#,
    )
    .expect("config should parse");
    assert_eq!(config.require_initial_value, Some(false));
    let rules = config.rules.expect("rules");
    assert_eq!(rules[UnmodifiedReduceAccumulator::NAME].enabled, Some(false));
}

#[test]
fn rejects_invalid_boolean_strings() {
    let err = parse_config(r#"{ "requireInitialValue": "maybe" }"#).unwrap_err();
    assert!(format!("{err:#}").contains("invalid boolean value"));
}

#[test]
fn resolves_rule_settings_into_lint_options() {
    let config = parse_config(
        r#"{
  "include": ["**/*.rake"],
  "rules": {
    "Lint/UnmodifiedReduceAccumulator": { "enabled": true, "severity": "error" }
  }
}"#,
    )
    .expect("config should parse");
    let resolved = resolve_config(&config).expect("config should resolve");

    assert!(resolved.lint.require_initial_value);
    assert!(resolved.lint.is_rule_enabled(UnmodifiedReduceAccumulator::NAME));
    assert_eq!(
        resolved.lint.severity_for(UnmodifiedReduceAccumulator::NAME),
        Some(DiagnosticCategory::Error)
    );
    assert_eq!(resolved.driver.include, vec!["**/*.rb", "**/*.rake"]);
}

#[test]
fn rejects_unknown_rules() {
    let config = parse_config(r#"{ "rules": { "Lint/Nope": { "enabled": false } } }"#)
        .expect("config should parse");
    let err = resolve_config(&config).unwrap_err();
    assert!(err.to_string().contains("Lint/Nope"));
}

#[test]
fn finds_config_in_ancestor_directory() {
    let temp = TempDir::new().expect("temp dir");
    write_file(temp.path(), CONFIG_FILE_NAME, "{}");
    let nested = temp.path().join("app/models");
    std::fs::create_dir_all(&nested).expect("nested dir");

    let found = find_config(&nested).expect("config should be found");
    assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
}

#[test]
fn load_config_reports_the_path_on_error() {
    let temp = TempDir::new().expect("temp dir");
    write_file(temp.path(), CONFIG_FILE_NAME, "{ not json");
    let err = load_config(&temp.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(format!("{err:#}").contains(CONFIG_FILE_NAME));
}
