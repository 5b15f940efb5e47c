//! Constant values read back out of syntax tree nodes.

use crate::node::{AmlNode, NodeKind};

/// A compressed EISA/PnP device identifier.
///
/// EISA IDs are stored as 32-bit compressed values in AML bytecode
/// (via the `EisaId()` macro in ASL). The 3-letter manufacturer code
/// is packed into the upper 16 bits and the product ID into the lower 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EisaId {
    /// The raw 32-bit value as read little endian from the stream.
    pub raw: u32,
}

impl EisaId {
    /// Decodes the EISA ID into a 7-character ASCII string (e.g., `"PNP0A03"`).
    #[must_use]
    pub fn decode(&self) -> [u8; 7] {
        // After byte-swapping:
        //   Bits 30-26: first char - 'A' + 1
        //   Bits 25-21: second char - 'A' + 1
        //   Bits 20-16: third char - 'A' + 1
        //   Bits 15-0:  product ID as 4 hex digits
        let swapped = self.raw.swap_bytes();
        let letter = |shift: u32| ((swapped >> shift) & 0x1F) as u8 + b'@';
        let hex_digit = |shift: u32| {
            let nibble = ((swapped >> shift) & 0xF) as u8;
            if nibble < 10 {
                b'0' + nibble
            } else {
                b'A' + nibble - 10
            }
        };

        [
            letter(26),
            letter(21),
            letter(16),
            hex_digit(12),
            hex_digit(8),
            hex_digit(4),
            hex_digit(0),
        ]
    }

    /// Returns the ID if `value` looks like a compressed EISA ID: a 32-bit
    /// value whose three letters are all in `A`-`Z`.
    #[must_use]
    pub fn from_integer(value: u64) -> Option<Self> {
        let raw = u32::try_from(value).ok()?;
        let id = Self { raw };
        id.decode()[..3]
            .iter()
            .all(u8::is_ascii_uppercase)
            .then_some(id)
    }
}

impl core::fmt::Display for EisaId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = self.decode();
        f.write_str(core::str::from_utf8(&text).unwrap_or("???????"))
    }
}

/// A constant AML data object.
///
/// Only literals are resolved; anything computed at run time, packages
/// and method calls are [`AmlValue::Unresolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlValue<'a> {
    /// `Zero`, `One`, `Ones` or a byte/word/dword/qword constant.
    Integer(u64),
    /// A string constant, without prefix and terminator.
    String(&'a str),
    /// The initializer bytes of a buffer.
    Buffer(&'a [u8]),
    /// Not a literal.
    Unresolved,
}

impl<'a> AmlValue<'a> {
    /// Reads the literal under `node`, looking through wrapper nodes.
    #[must_use]
    pub fn from_node(node: &AmlNode<'a>) -> Self {
        let node = node.peel();
        match node.kind() {
            NodeKind::ByteData | NodeKind::WordData | NodeKind::DWordData | NodeKind::QWordData => {
                Self::Integer(read_le(node.span()))
            }
            NodeKind::ZeroOp => Self::Integer(0),
            NodeKind::OneOp => Self::Integer(1),
            NodeKind::OnesOp => Self::Integer(u64::MAX),
            NodeKind::String => node
                .span()
                .get(1..node.span().len().saturating_sub(1))
                .and_then(|text| core::str::from_utf8(text).ok())
                .map_or(Self::Unresolved, Self::String),
            NodeKind::DefBuffer => node
                .child(2)
                .map_or(Self::Unresolved, |bytes| Self::Buffer(bytes.span())),
            _ => Self::Unresolved,
        }
    }
}

/// Returns the value of an integer literal under `node`.
#[must_use]
pub fn integer_value(node: &AmlNode<'_>) -> Option<u64> {
    match AmlValue::from_node(node) {
        AmlValue::Integer(value) => Some(value),
        _ => None,
    }
}

fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0, |value, &byte| (value << 8) | u64::from(byte))
}
