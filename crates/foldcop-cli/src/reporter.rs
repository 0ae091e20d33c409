//! Text and JSON output.

use colored::Colorize;
use foldcop_common::{Diagnostic, DiagnosticCategory, LineMap};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::Path;

use crate::config::{DriverOptions, ResolvedConfig};
use crate::driver::FileReport;

pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, String>,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: FxHashMap::default(),
            line_maps: FxHashMap::default(),
        }
    }

    /// Register the text of `file` so it is not read from disk again.
    pub fn add_source(&mut self, file: &str, source: &str) {
        self.sources.insert(file.to_string(), source.to_string());
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    /// `path:line:col - warning FC2001 Rule/Name: message` plus a snippet.
    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let mut output = match self.format_location(&diagnostic.file, diagnostic.start) {
            Some(location) => location,
            None if !diagnostic.file.is_empty() => diagnostic.file.clone(),
            None => "<unknown>".to_string(),
        };

        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic));
        if let Some(rule) = diagnostic.rule {
            output.push(' ');
            output.push_str(rule);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }
        output
    }

    /// The offending line with a `~` underline:
    ///
    /// ```text
    ///     2     el * 2
    ///           ~~~~~~
    /// ```
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }

        let (line_num, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?;
        let line_text = self.line_maps.get(file)?.line_text((line_num - 1) as usize, source)?;

        // Underline spans only the first line of a multi-line range.
        let first = column - 1;
        let last = first + length;
        let mut underline = String::new();
        for (i, ch) in line_text.chars().enumerate() {
            let i = i as u32;
            if i >= last {
                break;
            }
            let (pad, mark) = if ch == '\t' { ("    ", "~~~~") } else { (" ", "~") };
            underline.push_str(if i < first { pad } else { mark });
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        let line_text = line_text.replace('\t', "    ");
        Some(format!("\n  {line_num:>3}   {line_text}\n        {underline}"))
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }
        let (line, column) = self.position_for(file, offset)?;
        let location = format!("{file}:{line}:{column}");
        Some(if self.color {
            location.cyan().to_string()
        } else {
            location
        })
    }

    /// 1-based line and column.
    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        self.ensure_source(file)?;
        let source = self.sources.get(file)?;
        let line_map = self
            .line_maps
            .entry(file.to_string())
            .or_insert_with(|| LineMap::build(source));
        let position = line_map.offset_to_position(offset, source);
        Some((position.line + 1, position.character + 1))
    }

    fn ensure_source(&mut self, file: &str) -> Option<()> {
        if !self.sources.contains_key(file) {
            let contents = std::fs::read_to_string(Path::new(file)).ok()?;
            self.sources.insert(file.to_string(), contents);
        }
        Some(())
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.as_str();
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Info => label.blue().bold().to_string(),
        }
    }

    fn format_code(&self, diagnostic: &Diagnostic) -> String {
        let label = diagnostic.code_label();
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }

    /// `3 files inspected, 2 offenses detected`
    pub fn summary(&self, reports: &[FileReport]) -> String {
        let offenses: usize = reports.iter().map(|r| r.result.diagnostics.len()).sum();
        let files = plural(reports.len(), "file");
        let line = match offenses {
            0 => format!("\n{files} inspected, no offenses detected"),
            n => format!("\n{files} inspected, {} detected", plural(n, "offense")),
        };
        if !self.color {
            return line;
        }
        if offenses == 0 {
            line.green().to_string()
        } else {
            line.red().to_string()
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// =============================================================================
// JSON
// =============================================================================

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub files: Vec<JsonFile>,
    pub summary: JsonSummary,
}

#[derive(Debug, Serialize)]
pub struct JsonFile {
    pub path: String,
    #[serde(rename = "parseFailed")]
    pub parse_failed: bool,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
    pub severity: DiagnosticCategory,
    pub message: String,
    pub start: u32,
    pub length: u32,
    /// 1-based.
    pub line: u32,
    /// 1-based, in characters.
    pub column: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    pub inspected_files: usize,
    pub offense_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl JsonReport {
    pub fn build(reports: &[FileReport]) -> JsonReport {
        let mut summary = JsonSummary {
            inspected_files: reports.len(),
            offense_count: 0,
            error_count: 0,
            warning_count: 0,
        };

        let files = reports
            .iter()
            .map(|report| {
                let line_map = LineMap::build(&report.source);
                let diagnostics = report
                    .result
                    .diagnostics
                    .iter()
                    .map(|diagnostic| {
                        summary.offense_count += 1;
                        match diagnostic.category {
                            DiagnosticCategory::Error => summary.error_count += 1,
                            DiagnosticCategory::Warning => summary.warning_count += 1,
                            DiagnosticCategory::Info => {}
                        }
                        let position = line_map.offset_to_position(diagnostic.start, &report.source);
                        JsonDiagnostic {
                            code: diagnostic.code_label(),
                            rule: diagnostic.rule,
                            severity: diagnostic.category,
                            message: diagnostic.message_text.clone(),
                            start: diagnostic.start,
                            length: diagnostic.length,
                            line: position.line + 1,
                            column: position.character + 1,
                        }
                    })
                    .collect();
                JsonFile {
                    path: report.path.clone(),
                    parse_failed: report.result.parse_failed,
                    diagnostics,
                }
            })
            .collect();

        JsonReport { files, summary }
    }
}

/// What `--show-config` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShownConfig {
    pub config_file: Option<String>,
    pub require_initial_value: bool,
    pub rules: Vec<ShownRule>,
    #[serde(flatten)]
    pub files: DriverOptions,
}

#[derive(Debug, Serialize)]
pub struct ShownRule {
    pub name: &'static str,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<DiagnosticCategory>,
}

pub fn show_config(resolved: &ResolvedConfig) -> ShownConfig {
    let rules = foldcop_checker::all_rules()
        .iter()
        .map(|rule| ShownRule {
            name: rule.name(),
            enabled: resolved.lint.is_rule_enabled(rule.name()),
            severity: resolved.lint.severity_for(rule.name()),
        })
        .collect();
    ShownConfig {
        config_file: resolved
            .source
            .as_ref()
            .map(|path| path.display().to_string()),
        require_initial_value: resolved.lint.require_initial_value,
        rules,
        files: resolved.driver.clone(),
    }
}
