//! Expression opcodes (`Type2Opcode`) and reference opcodes (`Type6Opcode`).

use crate::combinator::{bounded, either, list, prefixed, production};
use crate::cursor::Cursor;
use crate::data::{byte_data, byte_list, data_ref_object, pkg_length, string, word_data};
use crate::error::{AmlError, ParseResult};
use crate::method::method_invocation;
use crate::name::{name_string, simple_name, super_name, target};
use crate::node::{AmlNode, NodeKind};
use crate::opcode::{
    ACQUIRE_OP, ADD_OP, AND_OP, BUFFER_OP, CONCAT_OP, CONCAT_RES_OP, COND_REF_OF_OP,
    COPY_OBJECT_OP, DECREMENT_OP, DEREF_OF_OP, DIVIDE_OP, FIND_SET_LEFT_BIT_OP,
    FIND_SET_RIGHT_BIT_OP, FROM_BCD_OP, INCREMENT_OP, INDEX_OP, L_AND_OP, L_EQUAL_OP,
    L_GREATER_OP, L_LESS_OP, L_NOT_OP, L_OR_OP, LOAD_TABLE_OP, MATCH_OP, MID_OP, MOD_OP,
    MULTIPLY_OP, NAND_OP, NOR_OP, NOT_OP, OBJECT_TYPE_OP, OR_OP, Opcode, OpcodeDescriptor,
    OpcodeRule, OpcodeTable, PACKAGE_OP, REF_OF_OP, SHIFT_LEFT_OP, SHIFT_RIGHT_OP, SIZE_OF_OP,
    STORE_OP, SUBTRACT_OP, TIMER_OP, TO_BCD_OP, TO_BUFFER_OP, TO_DECIMAL_STRING_OP,
    TO_HEX_STRING_OP, TO_INTEGER_OP, TO_STRING_OP, VAR_PACKAGE_OP, WAIT_OP, XOR_OP,
};
use crate::term::{operand, term_arg};
use crate::type1::{event_object, mutex_object};
use crate::value::integer_value;

production! {
    fn timeout => Timeout(word_data);
    fn buffer_size => BufferSize(term_arg);
    fn buff_pkg_str_obj => BuffPkgStrObj(term_arg);
    fn index_value => IndexValue(term_arg);
    fn num_elements => NumElements(byte_data);
    fn var_num_elements => VarNumElements(term_arg);
    fn shift_count => ShiftCount(term_arg);
    fn dividend => Dividend(term_arg);
    fn divisor => Divisor(term_arg);
    fn remainder => Remainder(target);
    fn quotient => Quotient(target);
    fn buf_data => BufData(term_arg);
    fn mid_obj => MidObj(term_arg);
    fn length_arg => LengthArg(term_arg);
    fn search_pkg => SearchPkg(term_arg);
    fn match_opcode => MatchOpcode(byte_data);
    fn start_index => StartIndex(term_arg);
    fn bcd_value => BcdValue(term_arg);
}

/// `ObjReference := TermArg | String`.
fn obj_reference<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::ObjReference, cursor, &[term_arg, string])
}

/// `PackageElement := DataRefObject | NameString`.
fn package_element<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::PackageElement, cursor, &[data_ref_object, name_string])
}

fn package_element_list<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    list(NodeKind::PackageElementList, cursor, package_element)
}

const OPERAND_OPERAND_TARGET: OpcodeRule = OpcodeRule::Implicit(&[operand, operand, target]);
const OPERAND_OPERAND: OpcodeRule = OpcodeRule::Implicit(&[operand, operand]);
const OPERAND_TARGET: OpcodeRule = OpcodeRule::Implicit(&[operand, target]);
const SUPER_NAME: OpcodeRule = OpcodeRule::Implicit(&[super_name]);

const DEREF_OF: OpcodeDescriptor = OpcodeDescriptor::plain(
    DEREF_OF_OP,
    NodeKind::DefDerefOf,
    OpcodeRule::Implicit(&[obj_reference]),
);
const INDEX: OpcodeDescriptor = OpcodeDescriptor::plain(
    INDEX_OP,
    NodeKind::DefIndex,
    OpcodeRule::Implicit(&[buff_pkg_str_obj, index_value, target]),
);
const PACKAGE: OpcodeDescriptor = OpcodeDescriptor::plain(
    PACKAGE_OP,
    NodeKind::DefPackage,
    OpcodeRule::Explicit(&[pkg_length, num_elements, package_element_list]),
);
const REF_OF: OpcodeDescriptor = OpcodeDescriptor::plain(REF_OF_OP, NodeKind::DefRefOf, SUPER_NAME);
const VAR_PACKAGE: OpcodeDescriptor = OpcodeDescriptor::plain(
    VAR_PACKAGE_OP,
    NodeKind::DefVarPackage,
    OpcodeRule::Explicit(&[pkg_length, var_num_elements, package_element_list]),
);

static TYPE2_DESCRIPTORS: [OpcodeDescriptor; 49] = [
    OpcodeDescriptor::extended(
        ACQUIRE_OP,
        NodeKind::DefAcquire,
        OpcodeRule::Implicit(&[mutex_object, timeout]),
    ),
    OpcodeDescriptor::plain(ADD_OP, NodeKind::DefAdd, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(AND_OP, NodeKind::DefAnd, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(BUFFER_OP, NodeKind::DefBuffer, OpcodeRule::Custom(def_buffer)),
    OpcodeDescriptor::plain(
        CONCAT_OP,
        NodeKind::DefConcat,
        OpcodeRule::Implicit(&[term_arg, term_arg, target]),
    ),
    OpcodeDescriptor::plain(
        CONCAT_RES_OP,
        NodeKind::DefConcatRes,
        OpcodeRule::Implicit(&[buf_data, buf_data, target]),
    ),
    OpcodeDescriptor::extended(
        COND_REF_OF_OP,
        NodeKind::DefCondRefOf,
        OpcodeRule::Implicit(&[super_name, target]),
    ),
    OpcodeDescriptor::plain(
        COPY_OBJECT_OP,
        NodeKind::DefCopyObject,
        OpcodeRule::Implicit(&[term_arg, simple_name]),
    ),
    OpcodeDescriptor::plain(DECREMENT_OP, NodeKind::DefDecrement, SUPER_NAME),
    DEREF_OF,
    OpcodeDescriptor::plain(
        DIVIDE_OP,
        NodeKind::DefDivide,
        OpcodeRule::Implicit(&[dividend, divisor, remainder, quotient]),
    ),
    OpcodeDescriptor::plain(FIND_SET_LEFT_BIT_OP, NodeKind::DefFindSetLeftBit, OPERAND_TARGET),
    OpcodeDescriptor::plain(FIND_SET_RIGHT_BIT_OP, NodeKind::DefFindSetRightBit, OPERAND_TARGET),
    OpcodeDescriptor::extended(
        FROM_BCD_OP,
        NodeKind::DefFromBcd,
        OpcodeRule::Implicit(&[bcd_value, target]),
    ),
    OpcodeDescriptor::plain(INCREMENT_OP, NodeKind::DefIncrement, SUPER_NAME),
    INDEX,
    OpcodeDescriptor::plain(L_AND_OP, NodeKind::DefLAnd, OPERAND_OPERAND),
    OpcodeDescriptor::plain(L_EQUAL_OP, NodeKind::DefLEqual, OPERAND_OPERAND),
    OpcodeDescriptor::plain(L_GREATER_OP, NodeKind::DefLGreater, OPERAND_OPERAND),
    OpcodeDescriptor::plain(L_LESS_OP, NodeKind::DefLLess, OPERAND_OPERAND),
    OpcodeDescriptor::plain(L_NOT_OP, NodeKind::DefLNot, OpcodeRule::Custom(def_l_not)),
    OpcodeDescriptor::extended(LOAD_TABLE_OP, NodeKind::DefLoadTable, OpcodeRule::Unimplemented),
    OpcodeDescriptor::plain(L_OR_OP, NodeKind::DefLOr, OPERAND_OPERAND),
    OpcodeDescriptor::plain(
        MATCH_OP,
        NodeKind::DefMatch,
        OpcodeRule::Implicit(&[search_pkg, match_opcode, operand, match_opcode, operand, start_index]),
    ),
    OpcodeDescriptor::plain(
        MID_OP,
        NodeKind::DefMid,
        OpcodeRule::Implicit(&[mid_obj, term_arg, term_arg, target]),
    ),
    OpcodeDescriptor::plain(MOD_OP, NodeKind::DefMod, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(MULTIPLY_OP, NodeKind::DefMultiply, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(NAND_OP, NodeKind::DefNAnd, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(NOR_OP, NodeKind::DefNOr, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::plain(NOT_OP, NodeKind::DefNot, OPERAND_TARGET),
    OpcodeDescriptor::plain(OBJECT_TYPE_OP, NodeKind::DefObjectType, SUPER_NAME),
    OpcodeDescriptor::plain(OR_OP, NodeKind::DefOr, OPERAND_OPERAND_TARGET),
    PACKAGE,
    VAR_PACKAGE,
    REF_OF,
    OpcodeDescriptor::plain(
        SHIFT_LEFT_OP,
        NodeKind::DefShiftLeft,
        OpcodeRule::Implicit(&[operand, shift_count, target]),
    ),
    OpcodeDescriptor::plain(
        SHIFT_RIGHT_OP,
        NodeKind::DefShiftRight,
        OpcodeRule::Implicit(&[operand, shift_count, target]),
    ),
    OpcodeDescriptor::plain(SIZE_OF_OP, NodeKind::DefSizeOf, SUPER_NAME),
    OpcodeDescriptor::plain(
        STORE_OP,
        NodeKind::DefStore,
        OpcodeRule::Implicit(&[term_arg, super_name]),
    ),
    OpcodeDescriptor::plain(SUBTRACT_OP, NodeKind::DefSubtract, OPERAND_OPERAND_TARGET),
    OpcodeDescriptor::extended(TIMER_OP, NodeKind::DefTimer, OpcodeRule::Empty),
    OpcodeDescriptor::extended(TO_BCD_OP, NodeKind::DefToBcd, OPERAND_TARGET),
    OpcodeDescriptor::plain(TO_BUFFER_OP, NodeKind::DefToBuffer, OPERAND_TARGET),
    OpcodeDescriptor::plain(TO_DECIMAL_STRING_OP, NodeKind::DefToDecimalString, OPERAND_TARGET),
    OpcodeDescriptor::plain(TO_HEX_STRING_OP, NodeKind::DefToHexString, OPERAND_TARGET),
    OpcodeDescriptor::plain(TO_INTEGER_OP, NodeKind::DefToInteger, OPERAND_TARGET),
    OpcodeDescriptor::plain(
        TO_STRING_OP,
        NodeKind::DefToString,
        OpcodeRule::Implicit(&[term_arg, length_arg, target]),
    ),
    OpcodeDescriptor::extended(
        WAIT_OP,
        NodeKind::DefWait,
        OpcodeRule::Implicit(&[event_object, operand]),
    ),
    OpcodeDescriptor::plain(XOR_OP, NodeKind::DefXor, OPERAND_OPERAND_TARGET),
];

/// Expression opcodes.
pub static TYPE2: OpcodeTable = OpcodeTable::new(NodeKind::Type2Opcode, &TYPE2_DESCRIPTORS);

static TYPE6_DESCRIPTORS: [OpcodeDescriptor; 3] = [REF_OF, DEREF_OF, INDEX];

/// Reference opcodes.
pub static TYPE6: OpcodeTable = OpcodeTable::new(NodeKind::Type6Opcode, &TYPE6_DESCRIPTORS);

/// `Type2Opcode`: dispatches on [`TYPE2`], falling back to a method invocation.
///
/// Any name in expression position may be a call to a method defined by
/// the firmware, so a name that matches no built-in opcode is tried as one.
pub fn type2_opcode<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    match TYPE2.parse(cursor) {
        Ok(node) => Ok(node),
        Err(_) => {
            let start = cursor.checkpoint();
            let call = method_invocation(cursor)?;
            Ok(AmlNode::new(
                NodeKind::Type2Opcode,
                cursor.since(start),
                alloc::vec![call],
            ))
        }
    }
}

/// `Type6Opcode`: dispatches on [`TYPE6`].
pub fn type6_opcode<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    TYPE6.parse(cursor)
}

/// `DefPackage := PackageOp PkgLength NumElements PackageElementList`.
pub fn def_package<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    PACKAGE.parse(cursor)
}

/// `DefVarPackage := VarPackageOp PkgLength VarNumElements PackageElementList`.
pub fn def_var_package<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    VAR_PACKAGE.parse(cursor)
}

/// `DefBuffer := BufferOp PkgLength BufferSize ByteList`.
///
/// The byte list is the rest of the package: how many bytes it consumes is
/// set by the PkgLength bound, never by `BufferSize`. When the size is a
/// literal integer the initializer may not be longer than it; a computed
/// size is taken as encoded.
pub fn def_buffer<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    if !cursor.expect_opcode(Opcode::Plain(BUFFER_OP)) {
        return Err(AmlError::NoMatch);
    }
    let children = match bounded(cursor, &[pkg_length, buffer_size, byte_list]) {
        Ok(children) => children,
        Err(err) => {
            cursor.restore(start);
            return Err(err);
        }
    };

    let initializer = children[2].span().len() as u64;
    let size = integer_value(&children[1]);
    if size.is_some_and(|size| initializer > size) {
        log::trace!(
            "buffer at {:#x}: {initializer} initializer bytes exceed size {size:?}",
            start.position(),
        );
        cursor.restore(start);
        return Err(AmlError::NoMatch);
    }
    Ok(AmlNode::new(NodeKind::DefBuffer, cursor.since(start), children))
}

/// `LNot`, including the two-byte `LNotEqual`, `LLessEqual` and
/// `LGreaterEqual` encodings that start with the same opcode.
///
/// A derived prefix commits to the derived form: `LNot (LEqual (a, b))`
/// has the same bytes as `LNotEqual (a, b)`, so if one fails so does the
/// other.
fn def_l_not<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let derived = match cursor.remaining() {
        [L_NOT_OP, L_EQUAL_OP, ..] => Some((L_EQUAL_OP, NodeKind::DefLNotEqual)),
        [L_NOT_OP, L_GREATER_OP, ..] => Some((L_GREATER_OP, NodeKind::DefLLessEqual)),
        [L_NOT_OP, L_LESS_OP, ..] => Some((L_LESS_OP, NodeKind::DefLGreaterEqual)),
        _ => None,
    };
    match derived {
        Some((second, kind)) => prefixed(kind, cursor, &[L_NOT_OP, second], &[operand, operand]),
        None => prefixed(NodeKind::DefLNot, cursor, &[L_NOT_OP], &[operand]),
    }
}
