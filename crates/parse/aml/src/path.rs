//! AML name segments, encoded names and resolved paths.
//!
//! ACPI names are composed of 4-byte segments. An encoded [`AmlName`] may be
//! rooted or carry parent prefixes; resolving it against the enclosing
//! scope yields an absolute [`AmlPath`] with an inline capacity of 16
//! segments.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::opcode::{DUAL_NAME_PREFIX, MULTI_NAME_PREFIX, PARENT_PREFIX_CHAR, ROOT_CHAR};

/// A 4-byte AML name segment (e.g., `_SB_`, `PCI0`, `_HID`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// Creates a `NameSeg` from the first four bytes of `bytes`.
    ///
    /// Returns `None` if the slice is too short or the bytes are not a
    /// lead character followed by three name characters.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let seg: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        let valid = is_lead_name_char(seg[0]) && seg[1..].iter().all(|&c| is_name_char(c));
        valid.then_some(Self(seg))
    }

    /// Returns the name as a string slice (ACPI names are always ASCII).
    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("")
    }
}

/// `LeadNameChar`: `A`-`Z` or `_`.
pub(crate) fn is_lead_name_char(byte: u8) -> bool {
    byte.is_ascii_uppercase() || byte == b'_'
}

/// `NameChar`: a lead character or a digit.
pub(crate) fn is_name_char(byte: u8) -> bool {
    is_lead_name_char(byte) || byte.is_ascii_digit()
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameSeg(\"{}\")", self.as_str())
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded `NameString`, not yet resolved against a scope.
#[derive(Clone, PartialEq, Eq)]
pub struct AmlName {
    /// Starts with `\`.
    pub rooted: bool,
    /// Number of leading `^` prefixes.
    pub parents: usize,
    /// Name segments in order; empty for a prefixed `NullName`.
    pub segments: Vec<NameSeg>,
}

impl AmlName {
    /// Decodes the `NameString` at the start of `bytes`.
    ///
    /// Returns the name and the number of bytes it occupies, or `None` if
    /// `bytes` does not start with a well-formed name. A bare `NullName`
    /// (a single `0x00` with no prefix) is accepted here and reported as
    /// an empty, unrooted name of length 1.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        let mut pos = 0;
        let mut rooted = false;
        let mut parents = 0;
        if bytes.first() == Some(&ROOT_CHAR) {
            rooted = true;
            pos = 1;
        } else {
            while bytes.get(pos) == Some(&PARENT_PREFIX_CHAR) {
                parents += 1;
                pos += 1;
            }
        }

        let count = match *bytes.get(pos)? {
            0x00 => {
                pos += 1;
                0
            }
            DUAL_NAME_PREFIX => {
                pos += 1;
                2
            }
            MULTI_NAME_PREFIX => {
                let count = usize::from(*bytes.get(pos + 1)?);
                if count == 0 {
                    return None;
                }
                pos += 2;
                count
            }
            _ => 1,
        };

        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            segments.push(NameSeg::from_bytes(bytes.get(pos..)?)?);
            pos += 4;
        }
        Some((
            Self {
                rooted,
                parents,
                segments,
            },
            pos,
        ))
    }

    /// Returns `true` for a `NullName` with no prefix.
    #[must_use]
    pub fn is_null(&self) -> bool {
        !self.rooted && self.parents == 0 && self.segments.is_empty()
    }

    /// Returns the final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<NameSeg> {
        self.segments.last().copied()
    }
}

impl fmt::Debug for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rooted {
            f.write_str("\\")?;
        }
        for _ in 0..self.parents {
            f.write_str("^")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// Maximum number of segments in an inline AML path.
const MAX_PATH_DEPTH: usize = 16;

/// A fixed-capacity absolute AML namespace path.
///
/// Paths compare by their segments; a parent orders before its children.
#[derive(Clone, Copy)]
pub struct AmlPath {
    segments: [NameSeg; MAX_PATH_DEPTH],
    len: u8,
}

impl AmlPath {
    /// The root path (`\`).
    pub const ROOT: Self = Self {
        segments: [NameSeg(*b"____"); MAX_PATH_DEPTH],
        len: 0,
    };

    /// Creates the root path.
    #[must_use]
    pub const fn new() -> Self {
        Self::ROOT
    }

    /// Appends a name segment to the path.
    ///
    /// Returns `false` if the path is already at maximum capacity.
    pub fn push(&mut self, seg: NameSeg) -> bool {
        if (self.len as usize) >= MAX_PATH_DEPTH {
            return false;
        }
        self.segments[self.len as usize] = seg;
        self.len += 1;
        true
    }

    /// Removes and returns the last name segment from the path.
    pub fn pop(&mut self) -> Option<NameSeg> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.segments[self.len as usize])
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[NameSeg] {
        &self.segments[..self.len as usize]
    }

    /// Returns the number of segments (depth) in this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.len as usize
    }

    /// Resolves `name` relative to this scope.
    ///
    /// Returns `None` if a parent prefix climbs above the root or the
    /// result does not fit.
    #[must_use]
    pub fn resolve(&self, name: &AmlName) -> Option<Self> {
        let mut path = if name.rooted { Self::ROOT } else { *self };
        for _ in 0..name.parents {
            path.pop()?;
        }
        for &seg in &name.segments {
            if !path.push(seg) {
                return None;
            }
        }
        Some(path)
    }
}

impl PartialEq for AmlPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for AmlPath {}

impl PartialOrd for AmlPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AmlPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl Hash for AmlPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl Default for AmlPath {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Debug for AmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for AmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\")?;
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}
