//! Centralized limits and thresholds.
//!
//! The parser, linter and classifier are recursive over the tree. These
//! constants bound that recursion so that adversarial input (thousands of
//! nested parentheses, very long operator chains) degrades into a
//! diagnostic or an "indeterminate" answer instead of a stack overflow.

/// Maximum nesting of expressions the parser will descend into.
///
/// Expression, binary and unary parsing each count one level, so a
/// parenthesized or block nesting level costs about three. The limit stays
/// well below what a 2 MiB worker-thread stack can hold. When it is
/// exceeded the parser emits `FC1007` and skips the offending token.
///
/// ```ruby
/// ((((((((((((((((((((((((((1))))))))))))))))))))))))))  # ... hundreds of levels
/// ```
pub const MAX_PARSE_DEPTH: u32 = 256;

/// Maximum expression depth the exit classifier inspects.
///
/// Deeper sub-expressions are treated as indeterminate, which the rule
/// maps to "no offense". Long left-leaning operator chains
/// (`el + 1 + 1 + ...`) hit this limit rather than recursing per operand.
pub const MAX_CLASSIFY_DEPTH: u32 = 64;

/// Initial capacity for the token buffer, per byte of source.
///
/// Ruby averages roughly one token per four bytes of source.
pub const TOKENS_PER_SOURCE_BYTE_DIVISOR: usize = 4;
