//! Error type shared by the grammar engine and the table-level entry points.

use core::fmt;

/// Errors produced while decoding AML.
///
/// Inside the grammar only [`AmlError::NoMatch`] is ever produced: it means
/// "the bytes at the current position do not match this rule" and is always
/// recovered from by the nearest choice point. The remaining variants are
/// reported by the table-level entry points and are fatal for that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlError {
    /// The bytes at the cursor do not match the grammar rule being tried.
    NoMatch,
    /// The term list stopped before the end of the table body.
    Unparsed {
        /// Offset into the AML body of the first byte that could not be parsed.
        offset: usize,
    },
    /// The table signature is not `DSDT` or `SSDT`.
    InvalidSignature,
    /// The table bytes do not sum to zero.
    InvalidChecksum,
    /// The table is shorter than its header claims (or than a header).
    TruncatedData,
}

impl fmt::Display for AmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => f.write_str("bytes do not match any AML grammar rule"),
            Self::Unparsed { offset } => {
                write!(f, "unparseable AML term at body offset {offset:#x}")
            }
            Self::InvalidSignature => f.write_str("not a DSDT or SSDT signature"),
            Self::InvalidChecksum => f.write_str("table checksum does not sum to zero"),
            Self::TruncatedData => f.write_str("table is truncated"),
        }
    }
}

impl core::error::Error for AmlError {}

/// Result of a single grammar rule.
pub type ParseResult<'a> = Result<crate::node::AmlNode<'a>, AmlError>;
