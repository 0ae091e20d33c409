//! Directive comments.
//!
//! ```ruby
//! # foldcop:disable Lint/UnmodifiedReduceAccumulator
//! ...
//! # foldcop:enable Lint/UnmodifiedReduceAccumulator
//!
//! values.reduce(0) { |acc, el| el } # rubocop:disable all
//! ```
//!
//! A directive on its own line opens a region that runs until the matching
//! `enable` or the end of the file. A trailing directive covers its own line.
//! A name without `/` selects a whole department (`Lint`).

use foldcop_common::{CommentRange, Diagnostic, LineMap};
use rustc_hash::FxHashMap;
use tracing::trace;

const PREFIXES: [&str; 2] = ["foldcop:", "rubocop:"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Disable,
    Enable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct DisabledRegion {
    /// A rule name, a department, or `all`.
    selector: String,
    start_line: u32,
    /// Inclusive.
    end_line: u32,
}

impl DisabledRegion {
    fn covers(&self, rule: &str, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line && selector_matches(&self.selector, rule)
    }
}

fn selector_matches(selector: &str, rule: &str) -> bool {
    if selector == "all" || selector == rule {
        return true;
    }
    !selector.contains('/')
        && rule
            .strip_prefix(selector)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parsed directive comments of one file.
#[derive(Debug)]
pub struct Directives {
    line_map: LineMap,
    regions: Vec<DisabledRegion>,
}

impl Directives {
    pub fn parse(source: &str, comments: &[CommentRange]) -> Directives {
        let line_map = LineMap::build(source);
        let mut regions = Vec::new();
        let mut open: FxHashMap<String, u32> = FxHashMap::default();

        for comment in comments.iter().filter(|comment| !comment.is_block) {
            let Some((action, selectors)) = parse_directive(comment.body(source)) else {
                continue;
            };
            let line = line_map.line_of(comment.pos);
            trace!(line, ?action, ?selectors, "directive comment");

            match action {
                Action::Disable if comment.own_line => {
                    for selector in selectors {
                        open.entry(selector.to_string()).or_insert(line);
                    }
                }
                Action::Disable => {
                    regions.extend(selectors.into_iter().map(|selector| DisabledRegion {
                        selector: selector.to_string(),
                        start_line: line,
                        end_line: line,
                    }));
                }
                Action::Enable => {
                    for selector in selectors {
                        if selector == "all" {
                            regions.extend(open.drain().map(|(selector, start_line)| {
                                DisabledRegion {
                                    selector,
                                    start_line,
                                    end_line: line,
                                }
                            }));
                        } else if let Some(start_line) = open.remove(selector) {
                            regions.push(DisabledRegion {
                                selector: selector.to_string(),
                                start_line,
                                end_line: line,
                            });
                        }
                    }
                }
            }
        }

        regions.extend(open.into_iter().map(|(selector, start_line)| DisabledRegion {
            selector,
            start_line,
            end_line: u32::MAX,
        }));

        Directives { line_map, regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether a directive turns `diagnostic` off. Parse errors carry no
    /// rule and are never suppressed.
    pub fn suppresses(&self, diagnostic: &Diagnostic) -> bool {
        let Some(rule) = diagnostic.rule else {
            return false;
        };
        let line = self.line_map.line_of(diagnostic.start);
        self.regions.iter().any(|region| region.covers(rule, line))
    }
}

/// `foldcop:disable A, B -- reason` → `(Disable, ["A", "B"])`
fn parse_directive(body: &str) -> Option<(Action, Vec<&str>)> {
    let rest = PREFIXES
        .iter()
        .find_map(|prefix| body.strip_prefix(prefix))?;
    let (keyword, rest) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let action = match keyword {
        "disable" | "todo" => Action::Disable,
        "enable" => Action::Enable,
        _ => return None,
    };
    let rest = rest.split_once("--").map_or(rest, |(names, _)| names);
    let selectors: Vec<&str> = rest
        .split(',')
        .filter_map(|name| name.split_whitespace().next())
        .collect();
    if selectors.is_empty() {
        return None;
    }
    Some((action, selectors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_lists_and_reasons() {
        assert_eq!(
            parse_directive("foldcop:disable Lint/A, Lint/B -- legacy code"),
            Some((Action::Disable, vec!["Lint/A", "Lint/B"]))
        );
        assert_eq!(
            parse_directive("rubocop:enable all"),
            Some((Action::Enable, vec!["all"]))
        );
        assert_eq!(
            parse_directive("rubocop:todo Lint"),
            Some((Action::Disable, vec!["Lint"]))
        );
        assert_eq!(parse_directive("foldcop:disable"), None);
        assert_eq!(parse_directive("frozen_string_literal: true"), None);
    }

    #[test]
    fn department_selectors_match_their_rules() {
        assert!(selector_matches("Lint", "Lint/UnmodifiedReduceAccumulator"));
        assert!(selector_matches("all", "Lint/UnmodifiedReduceAccumulator"));
        assert!(!selector_matches("Li", "Lint/UnmodifiedReduceAccumulator"));
        assert!(!selector_matches("Style/Foo", "Lint/UnmodifiedReduceAccumulator"));
    }

    #[test]
    fn own_line_directive_opens_region_until_enable() {
        let source = "# foldcop:disable all\nx\n# foldcop:enable all\ny\n";
        let comments = vec![
            CommentRange::new(0, 21, false, true),
            CommentRange::new(24, 44, false, true),
        ];
        let directives = Directives::parse(source, &comments);
        assert_eq!(
            directives.regions,
            vec![DisabledRegion {
                selector: "all".to_string(),
                start_line: 0,
                end_line: 2,
            }]
        );
    }
}
