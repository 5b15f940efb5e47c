//! Opcode descriptors, rule shapes and table dispatch.
//!
//! Each grammar class owns a static [`OpcodeTable`]. A table is an ordered
//! list of [`OpcodeDescriptor`]s plus an index keyed by `(extension, opcode)`
//! that is computed at compile time; a duplicate pair in a table is a build
//! error.

use alloc::vec;
use alloc::vec::Vec;

use crate::combinator::{ParseFn, bounded, sequence};
use crate::cursor::Cursor;
use crate::error::{AmlError, ParseResult};
use crate::node::{AmlNode, NodeKind};

pub(crate) const ZERO_OP: u8 = 0x00;
pub(crate) const ONE_OP: u8 = 0x01;
pub(crate) const ALIAS_OP: u8 = 0x06;
pub(crate) const NAME_OP: u8 = 0x08;
pub(crate) const BYTE_PREFIX: u8 = 0x0A;
pub(crate) const WORD_PREFIX: u8 = 0x0B;
pub(crate) const DWORD_PREFIX: u8 = 0x0C;
pub(crate) const STRING_PREFIX: u8 = 0x0D;
pub(crate) const QWORD_PREFIX: u8 = 0x0E;
pub(crate) const SCOPE_OP: u8 = 0x10;
pub(crate) const BUFFER_OP: u8 = 0x11;
pub(crate) const PACKAGE_OP: u8 = 0x12;
pub(crate) const VAR_PACKAGE_OP: u8 = 0x13;
pub(crate) const METHOD_OP: u8 = 0x14;
pub(crate) const EXTERNAL_OP: u8 = 0x15;
pub(crate) const DUAL_NAME_PREFIX: u8 = 0x2E;
pub(crate) const MULTI_NAME_PREFIX: u8 = 0x2F;
pub(crate) const EXT_OP_PREFIX: u8 = 0x5B;
pub(crate) const ROOT_CHAR: u8 = 0x5C;
pub(crate) const PARENT_PREFIX_CHAR: u8 = 0x5E;
pub(crate) const LOCAL0_OP: u8 = 0x60;
pub(crate) const LOCAL7_OP: u8 = 0x67;
pub(crate) const ARG0_OP: u8 = 0x68;
pub(crate) const ARG6_OP: u8 = 0x6E;
pub(crate) const STORE_OP: u8 = 0x70;
pub(crate) const REF_OF_OP: u8 = 0x71;
pub(crate) const ADD_OP: u8 = 0x72;
pub(crate) const CONCAT_OP: u8 = 0x73;
pub(crate) const SUBTRACT_OP: u8 = 0x74;
pub(crate) const INCREMENT_OP: u8 = 0x75;
pub(crate) const DECREMENT_OP: u8 = 0x76;
pub(crate) const MULTIPLY_OP: u8 = 0x77;
pub(crate) const DIVIDE_OP: u8 = 0x78;
pub(crate) const SHIFT_LEFT_OP: u8 = 0x79;
pub(crate) const SHIFT_RIGHT_OP: u8 = 0x7A;
pub(crate) const AND_OP: u8 = 0x7B;
pub(crate) const NAND_OP: u8 = 0x7C;
pub(crate) const OR_OP: u8 = 0x7D;
pub(crate) const NOR_OP: u8 = 0x7E;
pub(crate) const XOR_OP: u8 = 0x7F;
pub(crate) const NOT_OP: u8 = 0x80;
pub(crate) const FIND_SET_LEFT_BIT_OP: u8 = 0x81;
pub(crate) const FIND_SET_RIGHT_BIT_OP: u8 = 0x82;
pub(crate) const DEREF_OF_OP: u8 = 0x83;
pub(crate) const CONCAT_RES_OP: u8 = 0x84;
pub(crate) const MOD_OP: u8 = 0x85;
pub(crate) const NOTIFY_OP: u8 = 0x86;
pub(crate) const SIZE_OF_OP: u8 = 0x87;
pub(crate) const INDEX_OP: u8 = 0x88;
pub(crate) const MATCH_OP: u8 = 0x89;
pub(crate) const CREATE_DWORD_FIELD_OP: u8 = 0x8A;
pub(crate) const CREATE_WORD_FIELD_OP: u8 = 0x8B;
pub(crate) const CREATE_BYTE_FIELD_OP: u8 = 0x8C;
pub(crate) const CREATE_BIT_FIELD_OP: u8 = 0x8D;
pub(crate) const OBJECT_TYPE_OP: u8 = 0x8E;
pub(crate) const CREATE_QWORD_FIELD_OP: u8 = 0x8F;
pub(crate) const L_AND_OP: u8 = 0x90;
pub(crate) const L_OR_OP: u8 = 0x91;
pub(crate) const L_NOT_OP: u8 = 0x92;
pub(crate) const L_EQUAL_OP: u8 = 0x93;
pub(crate) const L_GREATER_OP: u8 = 0x94;
pub(crate) const L_LESS_OP: u8 = 0x95;
pub(crate) const TO_BUFFER_OP: u8 = 0x96;
pub(crate) const TO_DECIMAL_STRING_OP: u8 = 0x97;
pub(crate) const TO_HEX_STRING_OP: u8 = 0x98;
pub(crate) const TO_INTEGER_OP: u8 = 0x99;
pub(crate) const TO_STRING_OP: u8 = 0x9C;
pub(crate) const COPY_OBJECT_OP: u8 = 0x9D;
pub(crate) const MID_OP: u8 = 0x9E;
pub(crate) const CONTINUE_OP: u8 = 0x9F;
pub(crate) const IF_OP: u8 = 0xA0;
pub(crate) const ELSE_OP: u8 = 0xA1;
pub(crate) const WHILE_OP: u8 = 0xA2;
pub(crate) const NOOP_OP: u8 = 0xA3;
pub(crate) const RETURN_OP: u8 = 0xA4;
pub(crate) const BREAK_OP: u8 = 0xA5;
pub(crate) const BREAKPOINT_OP: u8 = 0xCC;
pub(crate) const ONES_OP: u8 = 0xFF;

// Second byte of `ExtOpPrefix` opcodes.
pub(crate) const MUTEX_OP: u8 = 0x01;
pub(crate) const EVENT_OP: u8 = 0x02;
pub(crate) const COND_REF_OF_OP: u8 = 0x12;
pub(crate) const CREATE_FIELD_OP: u8 = 0x13;
pub(crate) const LOAD_TABLE_OP: u8 = 0x1F;
pub(crate) const LOAD_OP: u8 = 0x20;
pub(crate) const STALL_OP: u8 = 0x21;
pub(crate) const SLEEP_OP: u8 = 0x22;
pub(crate) const ACQUIRE_OP: u8 = 0x23;
pub(crate) const SIGNAL_OP: u8 = 0x24;
pub(crate) const WAIT_OP: u8 = 0x25;
pub(crate) const RESET_OP: u8 = 0x26;
pub(crate) const RELEASE_OP: u8 = 0x27;
pub(crate) const FROM_BCD_OP: u8 = 0x28;
pub(crate) const TO_BCD_OP: u8 = 0x29;
pub(crate) const REVISION_OP: u8 = 0x30;
pub(crate) const DEBUG_OP: u8 = 0x31;
pub(crate) const FATAL_OP: u8 = 0x32;
pub(crate) const TIMER_OP: u8 = 0x33;
pub(crate) const OP_REGION_OP: u8 = 0x80;
pub(crate) const FIELD_OP: u8 = 0x81;
pub(crate) const DEVICE_OP: u8 = 0x82;
pub(crate) const PROCESSOR_OP: u8 = 0x83;
pub(crate) const POWER_RES_OP: u8 = 0x84;
pub(crate) const THERMAL_ZONE_OP: u8 = 0x85;
pub(crate) const INDEX_FIELD_OP: u8 = 0x86;
pub(crate) const BANK_FIELD_OP: u8 = 0x87;
pub(crate) const DATA_REGION_OP: u8 = 0x88;

/// A one-byte opcode, or the second byte of an `ExtOpPrefix` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// A plain opcode byte.
    Plain(u8),
    /// An opcode reached through the `0x5B` extension prefix.
    Extended(u8),
}

impl Opcode {
    /// Number of bytes the opcode occupies in the stream.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::Plain(_) => 1,
            Self::Extended(_) => 2,
        }
    }

    /// Index slot in an [`OpcodeTable`]: plain opcodes first, then extended.
    const fn key(self) -> usize {
        match self {
            Self::Plain(byte) => byte as usize,
            Self::Extended(byte) => 0x100 + byte as usize,
        }
    }
}

/// How the operands of an opcode are recognised once the opcode matched.
#[derive(Clone, Copy)]
pub enum OpcodeRule {
    /// The opcode alone; produces a childless node.
    Empty,
    /// A fixed operand sequence.
    Implicit(&'static [ParseFn]),
    /// A PkgLength-bounded operand sequence; the first parser reads the length.
    Explicit(&'static [ParseFn]),
    /// Not supported by this engine; always a mismatch.
    Unimplemented,
    /// Hand-written rule that parses the whole construct, opcode included.
    Custom(ParseFn),
}

/// One entry of an opcode table.
#[derive(Clone, Copy)]
pub struct OpcodeDescriptor {
    /// The opcode recognised by this entry.
    pub opcode: Opcode,
    /// Kind of the node produced on a match.
    pub kind: NodeKind,
    /// Operand shape.
    pub rule: OpcodeRule,
}

impl OpcodeDescriptor {
    /// Creates a descriptor for a plain opcode.
    #[must_use]
    pub const fn plain(opcode: u8, kind: NodeKind, rule: OpcodeRule) -> Self {
        Self {
            opcode: Opcode::Plain(opcode),
            kind,
            rule,
        }
    }

    /// Creates a descriptor for an `ExtOpPrefix` opcode.
    #[must_use]
    pub const fn extended(opcode: u8, kind: NodeKind, rule: OpcodeRule) -> Self {
        Self {
            opcode: Opcode::Extended(opcode),
            kind,
            rule,
        }
    }

    /// Parses this opcode and its operands at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::NoMatch`], with the cursor untouched, if the
    /// opcode or any operand does not match.
    pub fn parse<'a>(&self, cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        match self.rule {
            OpcodeRule::Custom(parse) => return parse(cursor),
            OpcodeRule::Unimplemented => return Err(AmlError::NoMatch),
            OpcodeRule::Empty | OpcodeRule::Implicit(_) | OpcodeRule::Explicit(_) => {}
        }

        let start = cursor.checkpoint();
        if !cursor.expect_opcode(self.opcode) {
            return Err(AmlError::NoMatch);
        }
        let children = match self.rule {
            OpcodeRule::Implicit(parsers) => sequence(cursor, parsers),
            OpcodeRule::Explicit(parsers) => bounded(cursor, parsers),
            _ => Ok(Vec::new()),
        };
        match children {
            Ok(children) => Ok(AmlNode::new(self.kind, cursor.since(start), children)),
            Err(err) => {
                cursor.restore(start);
                Err(err)
            }
        }
    }
}

/// Slots in a table index: every plain and every extended opcode.
const INDEX_SLOTS: usize = 0x200;
/// Index value for "no descriptor".
const NO_ENTRY: u8 = u8::MAX;

/// Immutable opcode table for one grammar class.
pub struct OpcodeTable {
    class: NodeKind,
    descriptors: &'static [OpcodeDescriptor],
    index: [u8; INDEX_SLOTS],
}

impl OpcodeTable {
    /// Builds a table, indexing `descriptors` by opcode.
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `static`) if two descriptors
    /// share an opcode or the table has more than 254 entries.
    #[must_use]
    pub const fn new(class: NodeKind, descriptors: &'static [OpcodeDescriptor]) -> Self {
        assert!(descriptors.len() < NO_ENTRY as usize, "opcode table too large");
        let mut index = [NO_ENTRY; INDEX_SLOTS];
        let mut i = 0;
        while i < descriptors.len() {
            let key = descriptors[i].opcode.key();
            assert!(index[key] == NO_ENTRY, "duplicate opcode in table");
            index[key] = i as u8;
            i += 1;
        }
        Self {
            class,
            descriptors,
            index,
        }
    }

    /// Returns the node kind wrapping every match of this table.
    #[must_use]
    pub fn class(&self) -> NodeKind {
        self.class
    }

    /// Returns the descriptors in table order.
    #[must_use]
    pub fn descriptors(&self) -> &'static [OpcodeDescriptor] {
        self.descriptors
    }

    /// Looks up the descriptor for `opcode`.
    #[must_use]
    pub fn lookup(&self, opcode: Opcode) -> Option<&'static OpcodeDescriptor> {
        match self.index[opcode.key()] {
            NO_ENTRY => None,
            slot => self.descriptors.get(usize::from(slot)),
        }
    }

    /// Dispatches on the next opcode and wraps the result in a class node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::NoMatch`], with the cursor untouched, if no
    /// descriptor matches or the matching descriptor's operands fail.
    pub fn parse<'a>(&self, cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        let descriptor = cursor
            .peek_opcode()
            .and_then(|opcode| self.lookup(opcode))
            .ok_or(AmlError::NoMatch)?;

        let start = cursor.checkpoint();
        match descriptor.parse(cursor) {
            Ok(node) => {
                log::trace!("{:?} at {:#x}", descriptor.kind, start.position());
                Ok(AmlNode::new(self.class, cursor.since(start), vec![node]))
            }
            Err(err) => {
                log::trace!("{:?} rejected at {:#x}", descriptor.kind, start.position());
                cursor.restore(start);
                Err(err)
            }
        }
    }
}
