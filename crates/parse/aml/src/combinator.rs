//! Backtracking combinators.
//!
//! Every combinator upholds the same contract: on success the cursor has
//! advanced by exactly the bytes its sub-parsers consumed, in order; on
//! failure the cursor is back at the entry checkpoint and every node the
//! combinator built has been dropped.

use alloc::vec;
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::{AmlError, ParseResult};
use crate::node::{AmlNode, NodeKind};

/// A grammar rule: parses one production at the cursor.
pub type ParseFn = for<'a> fn(&mut Cursor<'a>) -> ParseResult<'a>;

/// Runs `parsers` in order and returns their nodes.
///
/// On failure the cursor is restored and the nodes built so far are dropped.
pub fn sequence<'a>(
    cursor: &mut Cursor<'a>,
    parsers: &[ParseFn],
) -> Result<Vec<AmlNode<'a>>, AmlError> {
    let start = cursor.checkpoint();
    let mut children = Vec::with_capacity(parsers.len());
    for parser in parsers {
        match parser(cursor) {
            Ok(child) => children.push(child),
            Err(err) => {
                cursor.restore(start);
                return Err(err);
            }
        }
    }
    Ok(children)
}

/// Runs `parsers` inside the bound declared by a leading PkgLength.
///
/// `parsers[0]` must produce a [`NodeKind::PkgLength`] node. The decoded
/// length counts from the first byte of the length field, so the length
/// field and every following sub-parser must end exactly on that bound.
pub fn bounded<'a>(
    cursor: &mut Cursor<'a>,
    parsers: &[ParseFn],
) -> Result<Vec<AmlNode<'a>>, AmlError> {
    let Some((&length_parser, body)) = parsers.split_first() else {
        return Err(AmlError::NoMatch);
    };
    let start = cursor.checkpoint();
    let result = bounded_inner(cursor, length_parser, body);
    if result.is_err() {
        cursor.restore(start);
    }
    result
}

fn bounded_inner<'a>(
    cursor: &mut Cursor<'a>,
    length_parser: ParseFn,
    body: &[ParseFn],
) -> Result<Vec<AmlNode<'a>>, AmlError> {
    let origin = cursor.position();
    let length = length_parser(cursor)?;
    let declared = length.pkg_length().ok_or(AmlError::NoMatch)?;
    let end = origin.checked_add(declared).ok_or(AmlError::NoMatch)?;
    let outer = cursor.narrow(end).ok_or_else(|| {
        log::trace!("package bound {end:#x} outside {:#x}", cursor.end());
        AmlError::NoMatch
    })?;

    let mut children = Vec::with_capacity(body.len() + 1);
    children.push(length);
    children.extend(sequence(cursor, body)?);
    if cursor.position() != end {
        log::trace!("package stopped at {:#x}, declared end {end:#x}", cursor.position());
        return Err(AmlError::NoMatch);
    }
    cursor.widen(outer);
    Ok(children)
}

/// Sequence: wraps the nodes of `parsers` under one `kind` node.
pub fn node<'a>(kind: NodeKind, cursor: &mut Cursor<'a>, parsers: &[ParseFn]) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    let children = sequence(cursor, parsers)?;
    Ok(AmlNode::new(kind, cursor.since(start), children))
}

/// Alternation: wraps the first successful parser's node under `kind`.
pub fn either<'a>(kind: NodeKind, cursor: &mut Cursor<'a>, parsers: &[ParseFn]) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    for parser in parsers {
        if let Ok(child) = parser(cursor) {
            return Ok(AmlNode::new(kind, cursor.since(start), vec![child]));
        }
        cursor.restore(start);
    }
    Err(AmlError::NoMatch)
}

/// Repetition: collects successes of `parser` until it fails, the input
/// runs out, or it succeeds without consuming anything.
///
/// Never fails; zero repetitions yield an empty `kind` node.
pub fn list<'a>(kind: NodeKind, cursor: &mut Cursor<'a>, parser: ParseFn) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    let mut children = Vec::new();
    while !cursor.is_empty() {
        let before = cursor.position();
        let Ok(child) = parser(cursor) else {
            break;
        };
        if cursor.position() == before {
            break;
        }
        children.push(child);
    }
    Ok(AmlNode::new(kind, cursor.since(start), children))
}

/// Length-bounded sequence, see [`bounded`].
pub fn explicit<'a>(
    kind: NodeKind,
    cursor: &mut Cursor<'a>,
    parsers: &[ParseFn],
) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    let children = bounded(cursor, parsers)?;
    Ok(AmlNode::new(kind, cursor.since(start), children))
}

/// Matches the literal `prefix` bytes, then runs `parsers` as a sequence.
pub fn prefixed<'a>(
    kind: NodeKind,
    cursor: &mut Cursor<'a>,
    prefix: &[u8],
    parsers: &[ParseFn],
) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    if !cursor.expect_bytes(prefix) {
        return Err(AmlError::NoMatch);
    }
    match sequence(cursor, parsers) {
        Ok(children) => Ok(AmlNode::new(kind, cursor.since(start), children)),
        Err(err) => {
            cursor.restore(start);
            Err(err)
        }
    }
}

/// Declares rule functions that wrap a fixed sequence of parsers in one node.
///
/// ```ignore
/// production! {
///     /// `Operand := TermArg`.
///     pub fn operand => Operand(term_arg);
/// }
/// ```
macro_rules! production {
    ($($(#[$meta:meta])* $vis:vis fn $name:ident => $kind:ident($($parser:expr),+ $(,)?);)+) => {
        $(
            $(#[$meta])*
            $vis fn $name<'a>(
                cursor: &mut $crate::cursor::Cursor<'a>,
            ) -> $crate::error::ParseResult<'a> {
                $crate::combinator::node($crate::node::NodeKind::$kind, cursor, &[$($parser),+])
            }
        )+
    };
}

pub(crate) use production;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{byte_data, pkg_length, word_data};
    use proptest::prelude::*;

    fn two_bytes<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        node(NodeKind::Operand, cursor, &[byte_data, byte_data])
    }

    fn never<'a>(_cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        Err(AmlError::NoMatch)
    }

    fn nothing<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        Ok(AmlNode::leaf(NodeKind::NullName, cursor.empty_span()))
    }

    fn zero_byte<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        prefixed(NodeKind::ZeroOp, cursor, &[0x00], &[])
    }

    fn bounded_word<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
        explicit(NodeKind::DefBuffer, cursor, &[pkg_length, word_data])
    }

    #[test]
    fn node_consumes_sum_of_children() {
        let data = [1, 2, 3];
        let mut cursor = Cursor::new(&data);
        let n = node(NodeKind::Operand, &mut cursor, &[byte_data, word_data]).unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(n.span(), &data);
        assert_eq!(n.children().len(), 2);
    }

    #[test]
    fn node_failure_restores() {
        let data = [1, 2];
        let mut cursor = Cursor::new(&data);
        assert!(node(NodeKind::Operand, &mut cursor, &[byte_data, word_data]).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn either_takes_first_success() {
        let data = [1, 2];
        let mut cursor = Cursor::new(&data);
        let n = either(NodeKind::TermArg, &mut cursor, &[never, word_data, byte_data]).unwrap();
        assert_eq!(n.children()[0].kind(), NodeKind::WordData);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn either_all_fail_restores() {
        let data = [1];
        let mut cursor = Cursor::new(&data);
        assert!(either(NodeKind::TermArg, &mut cursor, &[never, word_data]).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn list_of_nothing_is_empty_success() {
        let data: [u8; 0] = [];
        let mut cursor = Cursor::new(&data);
        let n = list(NodeKind::TermList, &mut cursor, byte_data).unwrap();
        assert!(n.is_leaf());
    }

    #[test]
    fn list_stops_at_first_failure() {
        let data = [0, 0, 7, 0];
        let mut cursor = Cursor::new(&data);
        let n = list(NodeKind::TermList, &mut cursor, zero_byte).unwrap();
        assert_eq!(n.children().len(), 2);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn list_stops_on_empty_success() {
        let data = [1];
        let mut cursor = Cursor::new(&data);
        let n = list(NodeKind::TermList, &mut cursor, nothing).unwrap();
        assert!(n.is_leaf());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn explicit_accepts_exact_length() {
        // PkgLength 3 covers itself and the word.
        let data = [0x03, 0xAA, 0xBB, 0xFF];
        let mut cursor = Cursor::new(&data);
        let n = bounded_word(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(n.children()[0].pkg_length(), Some(3));
        assert_eq!(cursor.end(), 4);
    }

    #[test]
    fn explicit_rejects_overrun() {
        // Declared length 2 leaves one byte for a two-byte word.
        let data = [0x02, 0xAA, 0xBB];
        let mut cursor = Cursor::new(&data);
        assert!(bounded_word(&mut cursor).is_err());
        assert_eq!(cursor.checkpoint(), Cursor::new(&data).checkpoint());
    }

    #[test]
    fn explicit_rejects_short_body() {
        // Declared length 5 but the body ends after the word.
        let data = [0x05, 0xAA, 0xBB, 0x00, 0x00];
        let mut cursor = Cursor::new(&data);
        assert!(bounded_word(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn explicit_rejects_bound_past_input() {
        let data = [0x09, 0xAA, 0xBB];
        let mut cursor = Cursor::new(&data);
        assert!(bounded_word(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.end(), 3);
    }

    proptest! {
        #[test]
        fn failed_combinators_leave_cursor_untouched(data in proptest::collection::vec(any::<u8>(), 0..24)) {
            let parsers: [ParseFn; 3] = [two_bytes, bounded_word, byte_data];
            for parser in parsers {
                let mut cursor = Cursor::new(&data);
                let before = cursor.checkpoint();
                let seq = node(NodeKind::Operand, &mut cursor, &[parser, bounded_word, parser]);
                if seq.is_err() {
                    prop_assert_eq!(cursor.checkpoint(), before);
                }
                let mut cursor = Cursor::new(&data);
                if either(NodeKind::TermArg, &mut cursor, &[bounded_word, parser]).is_err() {
                    prop_assert_eq!(cursor.checkpoint(), before);
                }
            }
        }

        #[test]
        fn successful_sequence_span_is_consumed_bytes(data in proptest::collection::vec(any::<u8>(), 0..24)) {
            let mut cursor = Cursor::new(&data);
            if let Ok(n) = node(NodeKind::Operand, &mut cursor, &[two_bytes, bounded_word]) {
                let consumed: usize = n.children().iter().map(|c| c.span().len()).sum();
                prop_assert_eq!(consumed, cursor.position());
                prop_assert_eq!(n.span().len(), cursor.position());
                let declared = n.children()[1].children()[0].pkg_length().unwrap();
                prop_assert_eq!(n.children()[1].span().len(), declared);
            }
        }
    }
}
