//! File discovery, parallel linting and the top-level run loop.

use anyhow::{Context, Result, bail};
use foldcop_checker::{LintResult, Linter};
use foldcop_common::DiagnosticCategory;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info_span, trace};
use walkdir::{DirEntry, WalkDir};

use crate::args::{CliArgs, FailLevel, OutputFormat};
use crate::config::{DriverOptions, ResolvedConfig, find_config, load_config, resolve_config};
use crate::reporter::{JsonReport, Reporter};

/// No offenses at or above the fail level.
pub const EXIT_SUCCESS: i32 = 0;
/// Offenses at or above the fail level.
pub const EXIT_OFFENSES: i32 = 1;
/// Bad configuration, unreadable path, or another fatal error.
pub const EXIT_FATAL: i32 = 2;

/// One linted file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: String,
    pub source: String,
    pub result: LintResult,
}

/// Load the config named on the command line, or the nearest one to `cwd`,
/// and apply CLI overrides.
pub fn resolve_run_config(args: &CliArgs, cwd: &Path) -> Result<ResolvedConfig> {
    let config_path = match &args.config {
        Some(path) => Some(cwd.join(path)),
        None => find_config(cwd),
    };
    let mut resolved = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let config = load_config(path)?;
            resolve_config(&config)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => ResolvedConfig::default(),
    };
    resolved.source = config_path;

    if let Some(require) = args.require_initial_value {
        resolved.lint.require_initial_value = require;
    }
    Ok(resolved)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob: Glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build glob set")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Path relative to `root` with `/` separators, for glob matching.
fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Expand `paths` into the sorted list of files to lint.
///
/// Files named directly are always linted. Directories are walked for files
/// matching `include` and not matching `exclude`; hidden directories are
/// skipped.
pub fn discover_files(paths: &[PathBuf], options: &DriverOptions) -> Result<Vec<PathBuf>> {
    let include = build_glob_set(&options.include)?;
    let exclude = build_glob_set(&options.exclude)?;
    let mut files = Vec::new();

    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("path does not exist: {}", root.display());
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry =
                entry.with_context(|| format!("failed to read directory {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_path(entry.path(), root);
            if exclude.is_match(&relative) {
                trace!(path = %relative, "excluded");
                continue;
            }
            if include.is_match(&relative) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// How a file is named in the report: relative to `base` when inside it.
fn display_path(path: &Path, base: &Path) -> String {
    let text = relative_path(path, base);
    match text.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Lint `files` in parallel. Reports come back in the order of `files`.
pub fn lint_files(linter: &Linter, files: &[PathBuf], base: &Path) -> Result<Vec<FileReport>> {
    let _span = info_span!("lint_files", count = files.len()).entered();
    files
        .par_iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let source = String::from_utf8_lossy(&bytes).into_owned();
            let display = display_path(path, base);
            let result = linter.lint_source(&display, &source);
            Ok(FileReport {
                path: display,
                source,
                result,
            })
        })
        .collect()
}

fn fail_threshold(level: FailLevel) -> DiagnosticCategory {
    match level {
        FailLevel::Info => DiagnosticCategory::Info,
        FailLevel::Warning => DiagnosticCategory::Warning,
        FailLevel::Error => DiagnosticCategory::Error,
    }
}

/// Exit status for a finished run.
pub fn exit_code(reports: &[FileReport], level: FailLevel) -> i32 {
    let threshold = fail_threshold(level);
    let failed = reports
        .iter()
        .flat_map(|report| &report.result.diagnostics)
        .any(|diagnostic| diagnostic.category >= threshold);
    if failed { EXIT_OFFENSES } else { EXIT_SUCCESS }
}

/// Run the linter as the binary would, writing the report to `out`.
pub fn run(args: &CliArgs, cwd: &Path, out: &mut impl Write, color: bool) -> Result<i32> {
    let resolved = resolve_run_config(args, cwd)?;

    if args.list_rules {
        for rule in foldcop_checker::all_rules() {
            let state = if resolved.lint.is_rule_enabled(rule.name()) {
                "enabled"
            } else {
                "disabled"
            };
            writeln!(out, "{} ({state}): {}", rule.name(), rule.description())?;
        }
        return Ok(EXIT_SUCCESS);
    }

    if args.show_config {
        let shown = crate::reporter::show_config(&resolved);
        writeln!(out, "{}", serde_json::to_string_pretty(&shown)?)?;
        return Ok(EXIT_SUCCESS);
    }

    let roots: Vec<PathBuf> = args.paths.iter().map(|path| cwd.join(path)).collect();
    let files = discover_files(&roots, &resolved.driver)?;
    debug!(files = files.len(), "discovered files");

    let linter = Linter::new(resolved.lint);
    let reports = lint_files(&linter, &files, cwd)?;

    match args.format {
        OutputFormat::Text => {
            let mut reporter = Reporter::new(color);
            for report in &reports {
                reporter.add_source(&report.result.file_name, &report.source);
            }
            let diagnostics: Vec<_> = reports
                .iter()
                .flat_map(|report| report.result.diagnostics.iter().cloned())
                .collect();
            let rendered = reporter.render(&diagnostics);
            if !rendered.is_empty() {
                writeln!(out, "{rendered}")?;
            }
            writeln!(out, "{}", reporter.summary(&reports))?;
        }
        OutputFormat::Json => {
            let report = JsonReport::build(&reports);
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }

    Ok(exit_code(&reports, args.fail_level))
}
