//! `.foldcop.json` loading and resolution.
//!
//! ```json
//! {
//!   "requireInitialValue": true,
//!   "include": ["**/*.rake"],
//!   "exclude": ["vendor/**"],
//!   "rules": {
//!     "Lint/UnmodifiedReduceAccumulator": { "enabled": true, "severity": "error" }
//!   }
//! }
//! ```
//!
//! Comments and trailing commas are accepted.

use anyhow::{Context, Result, bail};
use foldcop_checker::{LintOptions, all_rules};
use foldcop_common::DiagnosticCategory;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".foldcop.json";

/// Files linted when a directory is given.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.rb"];

/// Accepts `true`, `"true"`, `"yes"`, `"1"`, ... for boolean options.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FoldcopConfig {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub require_initial_value: Option<bool>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Option<BTreeMap<String, RuleConfig>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub severity: Option<DiagnosticCategory>,
}

/// Which files to visit.
#[derive(Debug, Clone, Serialize)]
pub struct DriverOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            include: DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
        }
    }
}

/// Configuration after merging the file with defaults and CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub lint: LintOptions,
    pub driver: DriverOptions,
    /// The file the configuration came from, if any.
    pub source: Option<PathBuf>,
}

pub fn parse_config(source: &str) -> Result<FoldcopConfig> {
    let normalized = strip_comments_and_trailing_commas(source);
    let config = serde_json::from_str(&normalized).context("failed to parse config JSON")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<FoldcopConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// The nearest `.foldcop.json` in `start` or one of its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

pub fn resolve_config(config: &FoldcopConfig) -> Result<ResolvedConfig> {
    let mut lint = LintOptions::default();
    if let Some(require) = config.require_initial_value {
        lint.require_initial_value = require;
    }

    if let Some(rules) = &config.rules {
        let known: Vec<&'static str> = all_rules().iter().map(|rule| rule.name()).collect();
        for (name, rule) in rules {
            if !known.contains(&name.as_str()) {
                bail!("unknown rule '{name}' in config");
            }
            if rule.enabled == Some(false) {
                lint.disabled_rules.insert(name.clone());
            }
            if let Some(severity) = rule.severity {
                lint.severity_overrides.insert(name.clone(), severity);
            }
        }
    }

    let mut driver = DriverOptions::default();
    if let Some(include) = &config.include {
        driver
            .include
            .extend(include.iter().map(|pattern| normalize_pattern(pattern)));
    }
    if let Some(exclude) = &config.exclude {
        driver.exclude = exclude.iter().map(|pattern| normalize_pattern(pattern)).collect();
    }

    Ok(ResolvedConfig {
        lint,
        driver,
        source: None,
    })
}

fn normalize_pattern(value: &str) -> String {
    value.trim().replace('\\', "/")
}

/// Drop `//` and `/* */` comments and commas before `}` or `]`, leaving
/// string contents alone.
fn strip_comments_and_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            ']' | '}' => {
                let trimmed = out.trim_end().len();
                if out[..trimmed].ends_with(',') {
                    out.truncate(trimmed - 1);
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}
