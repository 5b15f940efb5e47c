//! Terminal data productions: fixed-width integers, PkgLength, strings,
//! constants and the data-object alternations built from them.

use crate::combinator::{either, prefixed};
use crate::cursor::Cursor;
use crate::error::{AmlError, ParseResult};
use crate::node::{AmlNode, NodeKind};
use crate::opcode::{
    ARG0_OP, ARG6_OP, BYTE_PREFIX, DEBUG_OP, DWORD_PREFIX, EXT_OP_PREFIX, LOCAL0_OP, LOCAL7_OP,
    ONE_OP, ONES_OP, QWORD_PREFIX, REVISION_OP, STRING_PREFIX, WORD_PREFIX, ZERO_OP,
};
use crate::type2::{def_buffer, def_package, def_var_package};

fn fixed<'a>(kind: NodeKind, cursor: &mut Cursor<'a>, len: usize) -> ParseResult<'a> {
    let bytes = cursor.take(len).ok_or(AmlError::NoMatch)?;
    Ok(AmlNode::leaf(kind, bytes))
}

/// `ByteData`: one raw byte.
pub fn byte_data<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    fixed(NodeKind::ByteData, cursor, 1)
}

/// `WordData`: two raw bytes, little endian.
pub fn word_data<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    fixed(NodeKind::WordData, cursor, 2)
}

/// `DWordData`: four raw bytes, little endian.
pub fn dword_data<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    fixed(NodeKind::DWordData, cursor, 4)
}

/// `QWordData`: eight raw bytes, little endian.
pub fn qword_data<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    fixed(NodeKind::QWordData, cursor, 8)
}

/// `ByteList`: every byte left before the current bound.
pub fn byte_list<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let len = cursor.remaining().len();
    fixed(NodeKind::ByteList, cursor, len)
}

/// `PkgLength`: a 1–4 byte length encoding.
///
/// Bits 7:6 of the lead byte give the number of following bytes. With no
/// following bytes, bits 5:0 are the length; otherwise bits 5:4 must be
/// zero, bits 3:0 are the low nibble and each following byte adds eight
/// higher bits.
pub fn pkg_length<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let lead = cursor.peek().ok_or(AmlError::NoMatch)?;
    let follow = usize::from(lead >> 6);
    if follow != 0 && lead & 0x30 != 0 {
        return Err(AmlError::NoMatch);
    }
    fixed(NodeKind::PkgLength, cursor, 1 + follow)
}

/// Decodes the bytes of a `PkgLength` field.
///
/// Returns `None` if `bytes` is not exactly one well-formed encoding.
#[must_use]
pub fn decode_pkg_length(bytes: &[u8]) -> Option<usize> {
    let (&lead, rest) = bytes.split_first()?;
    let follow = usize::from(lead >> 6);
    if rest.len() != follow {
        return None;
    }
    if follow == 0 {
        return Some(usize::from(lead & 0x3F));
    }

    let mut length = usize::from(lead & 0x0F);
    for (i, &byte) in rest.iter().enumerate() {
        length |= usize::from(byte) << (4 + i * 8);
    }
    Some(length)
}

/// `String`: `StringPrefix AsciiCharList NullChar`.
pub fn string<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let body = cursor.remaining();
    if body.first() != Some(&STRING_PREFIX) {
        return Err(AmlError::NoMatch);
    }
    let nul = body[1..]
        .iter()
        .position(|&byte| !(0x01..=0x7F).contains(&byte))
        .ok_or(AmlError::NoMatch)?;
    if body[1 + nul] != 0 {
        return Err(AmlError::NoMatch);
    }
    fixed(NodeKind::String, cursor, nul + 2)
}

fn single<'a>(
    kind: NodeKind,
    cursor: &mut Cursor<'a>,
    accept: impl Fn(u8) -> bool,
) -> ParseResult<'a> {
    match cursor.peek() {
        Some(byte) if accept(byte) => fixed(kind, cursor, 1),
        _ => Err(AmlError::NoMatch),
    }
}

/// `ZeroOp`.
pub fn zero_op<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    single(NodeKind::ZeroOp, cursor, |byte| byte == ZERO_OP)
}

/// `OneOp`.
pub fn one_op<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    single(NodeKind::OneOp, cursor, |byte| byte == ONE_OP)
}

/// `OnesOp`.
pub fn ones_op<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    single(NodeKind::OnesOp, cursor, |byte| byte == ONES_OP)
}

/// `ArgObj`: `Arg0Op` to `Arg6Op`.
pub fn arg_obj<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    single(NodeKind::ArgObj, cursor, |byte| (ARG0_OP..=ARG6_OP).contains(&byte))
}

/// `LocalObj`: `Local0Op` to `Local7Op`.
pub fn local_obj<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    single(NodeKind::LocalObj, cursor, |byte| (LOCAL0_OP..=LOCAL7_OP).contains(&byte))
}

/// `DebugObj`.
pub fn debug_obj<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::DebugObj, cursor, &[EXT_OP_PREFIX, DEBUG_OP], &[])
}

/// `RevisionOp`.
pub fn revision<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::Revision, cursor, &[EXT_OP_PREFIX, REVISION_OP], &[])
}

/// `ByteConst`.
pub fn byte_const<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::ByteConst, cursor, &[BYTE_PREFIX], &[byte_data])
}

/// `WordConst`.
pub fn word_const<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::WordConst, cursor, &[WORD_PREFIX], &[word_data])
}

/// `DWordConst`.
pub fn dword_const<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::DWordConst, cursor, &[DWORD_PREFIX], &[dword_data])
}

/// `QWordConst`.
pub fn qword_const<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::QWordConst, cursor, &[QWORD_PREFIX], &[qword_data])
}

/// `ComputationalData`: integer and string constants, `Revision`, and buffers.
pub fn computational_data<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(
        NodeKind::ComputationalData,
        cursor,
        &[
            byte_const,
            word_const,
            dword_const,
            qword_const,
            string,
            zero_op,
            one_op,
            ones_op,
            revision,
            def_buffer,
        ],
    )
}

/// `DataObject`: computational data or a package.
pub fn data_object<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(
        NodeKind::DataObject,
        cursor,
        &[computational_data, def_package, def_var_package],
    )
}

/// `DataRefObject`.
///
/// Object references only exist at run time, so in a table this is always
/// a data object.
pub fn data_ref_object<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::DataRefObject, cursor, &[data_object])
}
