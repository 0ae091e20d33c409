//! Byte-offset ranges into a source file.

use serde::Serialize;

/// A half-open byte range `[pos, end)` into the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextRange {
    pub pos: u32,
    pub end: u32,
}

impl TextRange {
    #[must_use]
    pub const fn new(pos: u32, end: u32) -> Self {
        TextRange { pos, end }
    }

    /// An empty range located at `pos`.
    #[must_use]
    pub const fn empty(pos: u32) -> Self {
        TextRange { pos, end: pos }
    }

    /// Build a range from `usize` offsets produced while scanning.
    #[must_use]
    pub fn from_offsets(pos: usize, end: usize) -> Self {
        TextRange {
            pos: pos as u32,
            end: end as u32,
        }
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.pos)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end <= self.pos
    }

    #[must_use]
    pub const fn contains(self, offset: u32) -> bool {
        offset >= self.pos && offset < self.end
    }

    /// The smallest range covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange {
            pos: self.pos.min(other.pos),
            end: self.end.max(other.end),
        }
    }

    /// The text covered by this range, or `""` when out of bounds.
    #[must_use]
    pub fn slice(self, source: &str) -> &str {
        source.get(self.pos as usize..self.end as usize).unwrap_or("")
    }
}
