//! Comment ranges.
//!
//! Comments are not part of the tree. The scanner records every `#` comment
//! and `=begin`/`=end` block so that later passes (directive comments in the
//! linter) can read them back from the source text.

use serde::Serialize;

/// A range representing a comment in the source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommentRange {
    /// Start position (byte offset of the `#` or `=begin`)
    pub pos: u32,
    /// End position (byte offset, exclusive, before the line terminator)
    pub end: u32,
    /// Whether this is an `=begin`/`=end` block comment
    pub is_block: bool,
    /// Whether only whitespace precedes the comment on its line
    pub own_line: bool,
}

impl CommentRange {
    /// Create a new comment range.
    pub const fn new(pos: u32, end: u32, is_block: bool, own_line: bool) -> Self {
        CommentRange {
            pos,
            end,
            is_block,
            own_line,
        }
    }

    /// Get the comment text from source, including the leading `#`.
    pub fn get_text<'a>(&self, source: &'a str) -> &'a str {
        let start = self.pos as usize;
        let end = self.end as usize;
        if end <= source.len() && start < end {
            &source[start..end]
        } else {
            ""
        }
    }

    /// The comment body with the `#` marker and surrounding whitespace removed.
    pub fn body<'a>(&self, source: &'a str) -> &'a str {
        let text = self.get_text(source);
        if self.is_block {
            return text.trim();
        }
        text.strip_prefix('#').unwrap_or(text).trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_strips_marker() {
        let source = "x = 1 # foldcop:disable all\n";
        let comment = CommentRange::new(6, 27, false, false);
        assert_eq!(comment.get_text(source), "# foldcop:disable all");
        assert_eq!(comment.body(source), "foldcop:disable all");
    }

    #[test]
    fn out_of_bounds_text_is_empty() {
        let comment = CommentRange::new(4, 40, false, true);
        assert_eq!(comment.get_text("# a"), "");
    }
}
