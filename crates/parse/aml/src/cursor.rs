//! Byte cursor over an AML body.
//!
//! A [`Cursor`] is a small `Copy` value: a borrowed body, a position, the
//! current upper bound, the enclosing namespace scope and the method
//! signature table used to size method invocations. Saving a [`Checkpoint`]
//! and restoring it is O(1) and never copies body bytes, which is what
//! every backtracking rule relies on.

use crate::method::{EMPTY_METHODS, MethodTable};
use crate::opcode::{EXT_OP_PREFIX, Opcode};
use crate::path::AmlPath;

/// Read position inside an AML body.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Exclusive upper bound; narrowed while parsing a PkgLength-bounded body.
    end: usize,
    /// Namespace scope of the construct being parsed.
    scope: AmlPath,
    methods: &'a MethodTable,
}

/// Saved cursor state, restored with [`Cursor::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    end: usize,
    scope: AmlPath,
}

/// Outer bound and scope saved by [`Cursor::narrow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    end: usize,
    scope: AmlPath,
}

impl Checkpoint {
    /// Body offset at which the checkpoint was taken.
    #[must_use]
    pub fn position(self) -> usize {
        self.pos
    }
}

impl<'a> Cursor<'a> {
    /// Creates a cursor over `data` with no known methods.
    ///
    /// Every name met in expression position is then treated as a
    /// zero-argument invocation.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_methods(data, &EMPTY_METHODS)
    }

    /// Creates a cursor over `data` that sizes method invocations from `methods`.
    #[must_use]
    pub fn with_methods(data: &'a [u8], methods: &'a MethodTable) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
            scope: AmlPath::ROOT,
            methods,
        }
    }

    /// Returns the current offset from the start of the body.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the current exclusive upper bound.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns `true` when no byte is left before the current bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    /// Returns the bytes left before the current bound.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..self.end]
    }

    /// Returns the scope that relative names are resolved against.
    #[must_use]
    pub fn scope(&self) -> &AmlPath {
        &self.scope
    }

    /// Enters `scope`. The previous scope comes back on [`Cursor::restore`]
    /// or [`Cursor::widen`].
    pub fn set_scope(&mut self, scope: AmlPath) {
        self.scope = scope;
    }

    /// Returns the method signatures used for invocation arity.
    #[must_use]
    pub fn methods(&self) -> &'a MethodTable {
        self.methods
    }

    /// Peeks at the next byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Peeks `offset` bytes ahead without consuming anything.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        let at = self.pos.checked_add(offset)?;
        if at < self.end { Some(self.data[at]) } else { None }
    }

    /// Peeks at the next opcode, looking through the extension prefix.
    ///
    /// Returns `None` at the end of input, or when the prefix is the last
    /// byte before the bound.
    #[must_use]
    pub fn peek_opcode(&self) -> Option<Opcode> {
        match self.peek()? {
            EXT_OP_PREFIX => self.peek_at(1).map(Opcode::Extended),
            byte => Some(Opcode::Plain(byte)),
        }
    }

    /// Consumes `opcode` if it is next; otherwise leaves the cursor untouched.
    pub fn expect_opcode(&mut self, opcode: Opcode) -> bool {
        if self.peek_opcode() == Some(opcode) {
            self.pos += opcode.encoded_len();
            true
        } else {
            false
        }
    }

    /// Consumes `bytes` if they are next; otherwise leaves the cursor untouched.
    pub fn expect_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.remaining().starts_with(bytes) {
            self.pos += bytes.len();
            true
        } else {
            false
        }
    }

    /// Consumes and returns the next byte.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes exactly `len` bytes, or nothing if fewer are available.
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let stop = self.pos.checked_add(len)?;
        if stop > self.end {
            return None;
        }
        let bytes = &self.data[self.pos..stop];
        self.pos = stop;
        Some(bytes)
    }

    /// Saves the current position, bound and scope.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            end: self.end,
            scope: self.scope,
        }
    }

    /// Rewinds to a previously saved checkpoint.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.end = checkpoint.end;
        self.scope = checkpoint.scope;
    }

    /// Returns the bytes consumed since `checkpoint`.
    #[must_use]
    pub fn since(&self, checkpoint: Checkpoint) -> &'a [u8] {
        &self.data[checkpoint.pos..self.pos]
    }

    /// Returns a zero-length span at the current position.
    #[must_use]
    pub fn empty_span(&self) -> &'a [u8] {
        &self.data[self.pos..self.pos]
    }

    /// Narrows the bound to `end`, returning the previous bound and scope.
    ///
    /// Fails when `end` lies before the current position or past the
    /// current bound: a nested construct can never reach outside its parent.
    pub fn narrow(&mut self, end: usize) -> Option<Bound> {
        if end < self.pos || end > self.end {
            return None;
        }
        let outer = Bound {
            end: self.end,
            scope: self.scope,
        };
        self.end = end;
        Some(outer)
    }

    /// Leaves a bounded body, restoring what [`Cursor::narrow`] returned.
    pub fn widen(&mut self, outer: Bound) {
        debug_assert!(outer.end >= self.end);
        self.end = outer.end;
        self.scope = outer.scope;
    }
}

impl core::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("end", &self.end)
            .field("scope", &self.scope)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NameSeg;

    #[test]
    fn checkpoint_restore_is_exact() {
        let data = [1, 2, 3, 4];
        let mut cursor = Cursor::new(&data);
        let start = cursor.checkpoint();
        assert_eq!(cursor.take(3), Some(&data[..3]));
        assert_eq!(cursor.position(), 3);
        cursor.restore(start);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.remaining(), &data);
    }

    #[test]
    fn take_past_end_consumes_nothing() {
        let data = [1, 2];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.take(3), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn peek_opcode_through_prefix() {
        let data = [EXT_OP_PREFIX, 0x23];
        let cursor = Cursor::new(&data);
        assert_eq!(cursor.peek_opcode(), Some(Opcode::Extended(0x23)));

        let data = [0xA5];
        let cursor = Cursor::new(&data);
        assert_eq!(cursor.peek_opcode(), Some(Opcode::Plain(0xA5)));
    }

    #[test]
    fn lone_prefix_is_not_an_opcode() {
        let data = [EXT_OP_PREFIX];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.peek_opcode(), None);
        assert!(!cursor.expect_opcode(Opcode::Extended(0x23)));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn narrow_hides_bytes_until_widened() {
        let data = [1, 2, 3, 4];
        let mut cursor = Cursor::new(&data);
        let outer = cursor.narrow(2).unwrap();
        assert_eq!(cursor.remaining(), &[1, 2]);
        assert_eq!(cursor.take(3), None);
        assert!(cursor.narrow(3).is_none());
        cursor.widen(outer);
        assert_eq!(cursor.remaining(), &data);
    }

    #[test]
    fn restore_undoes_narrowing() {
        let data = [1, 2, 3, 4];
        let mut cursor = Cursor::new(&data);
        let start = cursor.checkpoint();
        cursor.narrow(1).unwrap();
        cursor.restore(start);
        assert_eq!(cursor.end(), 4);
    }

    #[test]
    fn scope_is_left_with_the_bound() {
        let data = [1, 2, 3, 4];
        let mut cursor = Cursor::new(&data);
        let mut device = AmlPath::ROOT;
        device.push(NameSeg(*b"DEV0"));

        let outer = cursor.narrow(3).unwrap();
        cursor.set_scope(device);
        assert_eq!(cursor.scope(), &device);
        let inside = cursor.checkpoint();
        cursor.set_scope(AmlPath::ROOT);
        cursor.restore(inside);
        assert_eq!(cursor.scope(), &device);

        cursor.widen(outer);
        assert_eq!(cursor.scope(), &AmlPath::ROOT);
        assert_eq!(cursor.end(), 4);
    }
}
