//! Term-level productions tying the opcode classes together.

use crate::combinator::{either, list, production};
use crate::cursor::Cursor;
use crate::data::{arg_obj, data_object, local_obj};
use crate::error::ParseResult;
use crate::node::NodeKind;
use crate::object::object;
use crate::type1::type1_opcode;
use crate::type2::type2_opcode;

/// `TermArg := Type2Opcode | DataObject | ArgObj | LocalObj`.
pub fn term_arg<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(
        NodeKind::TermArg,
        cursor,
        &[type2_opcode, data_object, arg_obj, local_obj],
    )
}

/// `TermObj := Object | Type1Opcode | Type2Opcode`.
pub fn term_obj<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::TermObj, cursor, &[object, type1_opcode, type2_opcode])
}

/// `TermList := Nothing | TermObj TermList`.
///
/// Stops at the first byte that does not start a term; the caller decides
/// whether leftover bytes are an error.
pub fn term_list<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    list(NodeKind::TermList, cursor, term_obj)
}

production! {
    /// `Operand := TermArg`.
    pub fn operand => Operand(term_arg);
    /// `Predicate := TermArg`.
    pub fn predicate => Predicate(term_arg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_is_a_term_arg() {
        let data = [0x62];
        let mut cursor = Cursor::new(&data);
        let node = term_arg(&mut cursor).unwrap();
        assert_eq!(node.children()[0].kind(), NodeKind::LocalObj);
    }

    #[test]
    fn zero_is_data_not_invocation() {
        let data = [0x00];
        let mut cursor = Cursor::new(&data);
        let node = term_arg(&mut cursor).unwrap();
        assert_eq!(node.children()[0].kind(), NodeKind::DataObject);
        assert_eq!(node.peel().kind(), NodeKind::ZeroOp);
    }

    #[test]
    fn term_list_stops_at_garbage() {
        // Noop, Noop, then a byte that starts no term.
        let data = [0xA3, 0xA3, 0x2A];
        let mut cursor = Cursor::new(&data);
        let node = term_list(&mut cursor).unwrap();
        assert_eq!(node.children().len(), 2);
        assert_eq!(cursor.position(), 2);
    }
}
