//! Name productions: `NameSeg`, `NameString`, `NullName` and the
//! `SimpleName`/`SuperName`/`Target` alternations.

use crate::combinator::either;
use crate::cursor::Cursor;
use crate::data::{arg_obj, debug_obj, local_obj};
use crate::error::{AmlError, ParseResult};
use crate::node::{AmlNode, NodeKind};
use crate::path::{AmlName, NameSeg};
use crate::type2::type6_opcode;

/// `NameSeg`: a lead character followed by three name characters.
pub fn name_seg<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    NameSeg::from_bytes(cursor.remaining()).ok_or(AmlError::NoMatch)?;
    let bytes = cursor.take(4).ok_or(AmlError::NoMatch)?;
    Ok(AmlNode::leaf(NodeKind::NameSeg, bytes))
}

/// `NameString`: an optionally prefixed name path.
///
/// A bare `NullName` is not a name string here; it only appears through
/// [`null_name`], so a lone `0x00` in operand position stays `ZeroOp`.
pub fn name_string<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let (name, len) = AmlName::decode(cursor.remaining()).ok_or(AmlError::NoMatch)?;
    if name.is_null() {
        return Err(AmlError::NoMatch);
    }
    let bytes = cursor.take(len).ok_or(AmlError::NoMatch)?;
    Ok(AmlNode::leaf(NodeKind::NameString, bytes))
}

/// `NullName`: a single `0x00`.
pub fn null_name<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    if cursor.peek() != Some(0x00) {
        return Err(AmlError::NoMatch);
    }
    let bytes = cursor.take(1).ok_or(AmlError::NoMatch)?;
    Ok(AmlNode::leaf(NodeKind::NullName, bytes))
}

/// `SimpleName := NameString | ArgObj | LocalObj`.
pub fn simple_name<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::SimpleName, cursor, &[name_string, arg_obj, local_obj])
}

/// `SuperName := SimpleName | DebugObj | Type6Opcode`.
pub fn super_name<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::SuperName, cursor, &[simple_name, debug_obj, type6_opcode])
}

/// `Target := SuperName | NullName`.
pub fn target<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(NodeKind::Target, cursor, &[super_name, null_name])
}

/// Decodes the name held by a `NameString` node.
#[must_use]
pub fn decode_name(node: &AmlNode<'_>) -> Option<AmlName> {
    let node = node.find(NodeKind::NameString)?;
    AmlName::decode(node.span()).map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_string_stops_after_segment() {
        let data = *b"FOO_BAR_";
        let mut cursor = Cursor::new(&data);
        let node = name_string(&mut cursor).unwrap();
        assert_eq!(node.span(), b"FOO_");
        assert_eq!(decode_name(&node).unwrap().to_string(), "FOO_");
    }

    #[test]
    fn bare_null_is_not_a_name_string() {
        let data = [0x00];
        let mut cursor = Cursor::new(&data);
        assert!(name_string(&mut cursor).is_err());
        assert_eq!(null_name(&mut cursor).unwrap().kind(), NodeKind::NullName);
    }

    #[test]
    fn target_prefers_names_over_null() {
        let data = [0x61, 0x00];
        let mut cursor = Cursor::new(&data);
        let local = target(&mut cursor).unwrap();
        assert_eq!(local.peel().kind(), NodeKind::LocalObj);
        let null = target(&mut cursor).unwrap();
        assert_eq!(null.peel().kind(), NodeKind::NullName);
        assert!(cursor.is_empty());
    }

    #[test]
    fn debug_is_a_super_name() {
        let data = [0x5B, 0x31];
        let mut cursor = Cursor::new(&data);
        let node = super_name(&mut cursor).unwrap();
        assert_eq!(node.peel().kind(), NodeKind::DebugObj);
    }
}
