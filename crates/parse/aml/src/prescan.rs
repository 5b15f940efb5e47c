//! Method signature pre-pass.
//!
//! A single forward walk over an AML body that records every `Method`
//! definition and every `External` method declaration with its absolute
//! path and argument count. It descends into scopes, devices, processors,
//! power resources and thermal zones and skips everything else as cheaply
//! as it can. It never fails: a construct it cannot make sense of ends the
//! walk of the enclosing scope.

use crate::cursor::Cursor;
use crate::data::pkg_length;
use crate::method::{MethodFlags, MethodSignature, MethodTable};
use crate::opcode::{
    BANK_FIELD_OP, BUFFER_OP, BYTE_PREFIX, DEVICE_OP, DWORD_PREFIX, ELSE_OP, EXT_OP_PREFIX,
    EXTERNAL_OP, FIELD_OP, IF_OP, INDEX_FIELD_OP, METHOD_OP, PACKAGE_OP, POWER_RES_OP,
    PROCESSOR_OP, QWORD_PREFIX, SCOPE_OP, STRING_PREFIX, THERMAL_ZONE_OP, VAR_PACKAGE_OP,
    WHILE_OP, WORD_PREFIX,
};
use crate::path::{AmlName, AmlPath};

/// `ObjectType` of a method in an `External` declaration.
const METHOD_OBJECT_TYPE: u8 = 8;

/// Walks `data` and collects method signatures.
pub(crate) fn scan(data: &[u8]) -> MethodTable {
    let mut methods = MethodTable::new();
    scan_term_list(data, &AmlPath::ROOT, &mut methods);
    log::debug!("prescan: {} method signatures", methods.len());
    methods
}

/// Walks a term list whose names resolve against `scope`.
fn scan_term_list(data: &[u8], scope: &AmlPath, methods: &mut MethodTable) {
    let mut reader = Cursor::new(data);

    while !reader.is_empty() {
        if scan_term_obj(&mut reader, scope, methods).is_none() {
            // Skip the rest of this scope rather than abandoning the walk.
            log::trace!("prescan: giving up on {scope} at {:#x}", reader.position());
            break;
        }
    }
}

/// Consumes a single term, recording what it declares.
fn scan_term_obj(
    reader: &mut Cursor<'_>,
    scope: &AmlPath,
    methods: &mut MethodTable,
) -> Option<()> {
    match reader.next_byte()? {
        SCOPE_OP => scan_scope(reader, scope, methods, 0),
        METHOD_OP => scan_method(reader, scope, methods),
        EXTERNAL_OP => scan_external(reader, scope, methods),

        EXT_OP_PREFIX => match reader.next_byte()? {
            DEVICE_OP | THERMAL_ZONE_OP => scan_scope(reader, scope, methods, 0),
            // ProcId, PblkAddr and PblkLen precede the body.
            PROCESSOR_OP => scan_scope(reader, scope, methods, 6),
            // SystemLevel and ResourceOrder precede the body.
            POWER_RES_OP => scan_scope(reader, scope, methods, 3),
            FIELD_OP | INDEX_FIELD_OP | BANK_FIELD_OP => skip_block(reader),
            _ => Some(()),
        },

        BYTE_PREFIX => skip(reader, 1),
        WORD_PREFIX => skip(reader, 2),
        DWORD_PREFIX => skip(reader, 4),
        QWORD_PREFIX => skip(reader, 8),
        STRING_PREFIX => skip_string(reader),
        BUFFER_OP | PACKAGE_OP | VAR_PACKAGE_OP => skip_block(reader),

        // If, Else and While bodies are not searched.
        IF_OP | ELSE_OP | WHILE_OP => skip_block(reader),

        // Other opcodes and names: advance a byte and resynchronize.
        _ => Some(()),
    }
}

/// Descends into a PkgLength-bounded named scope. `header` is the number
/// of fixed bytes between the name and the body.
fn scan_scope(
    reader: &mut Cursor<'_>,
    scope: &AmlPath,
    methods: &mut MethodTable,
    header: usize,
) -> Option<()> {
    let end = block_end(reader)?;
    let name = read_name(reader)?;
    reader.take(header)?;

    let body = reader.take(end.checked_sub(reader.position())?)?;
    match scope.resolve(&name) {
        Some(inner) => scan_term_list(body, &inner, methods),
        None => log::trace!("prescan: cannot resolve {name} in {scope}"),
    }
    Some(())
}

/// `DefMethod := MethodOp PkgLength NameString MethodFlags TermList`.
fn scan_method(
    reader: &mut Cursor<'_>,
    scope: &AmlPath,
    methods: &mut MethodTable,
) -> Option<()> {
    let end = block_end(reader)?;
    let name = read_name(reader)?;
    let flags = MethodFlags::from_bits_retain(reader.next_byte()?);

    if let Some(path) = scope.resolve(&name) {
        methods.insert(
            MethodSignature {
                path,
                arg_count: flags.arg_count(),
                serialized: flags.contains(MethodFlags::SERIALIZED),
            },
            false,
        );
    }

    reader.take(end.checked_sub(reader.position())?)?;
    Some(())
}

/// `DefExternal := ExternalOp NameString ObjectType ArgumentCount`.
fn scan_external(
    reader: &mut Cursor<'_>,
    scope: &AmlPath,
    methods: &mut MethodTable,
) -> Option<()> {
    let name = read_name(reader)?;
    let object_type = reader.next_byte()?;
    let arg_count = reader.next_byte()?;

    if object_type != METHOD_OBJECT_TYPE {
        return Some(());
    }
    if let Some(path) = scope.resolve(&name) {
        methods.insert(
            MethodSignature {
                path,
                arg_count: arg_count & MethodFlags::ARG_COUNT.bits(),
                serialized: false,
            },
            true,
        );
    }
    Some(())
}

/// Reads a PkgLength and returns the body offset where its package ends.
fn block_end(reader: &mut Cursor<'_>) -> Option<usize> {
    let origin = reader.position();
    let length = pkg_length(reader).ok()?.pkg_length()?;
    let end = origin.checked_add(length)?;
    (end <= reader.end()).then_some(end)
}

/// Reads a NameString.
fn read_name(reader: &mut Cursor<'_>) -> Option<AmlName> {
    let (name, len) = AmlName::decode(reader.remaining())?;
    reader.take(len)?;
    Some(name)
}

fn skip(reader: &mut Cursor<'_>, len: usize) -> Option<()> {
    reader.take(len).map(|_| ())
}

/// Skips a PkgLength-bounded block whose opcode was already consumed.
fn skip_block(reader: &mut Cursor<'_>) -> Option<()> {
    let end = block_end(reader)?;
    skip(reader, end.checked_sub(reader.position())?)
}

/// Skips a null-terminated string.
fn skip_string(reader: &mut Cursor<'_>) -> Option<()> {
    let nul = reader.remaining().iter().position(|&byte| byte == 0)?;
    skip(reader, nul + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    fn names(methods: &MethodTable) -> Vec<(alloc::string::String, u8)> {
        methods
            .iter()
            .map(|m| (m.path.to_string(), m.arg_count))
            .collect()
    }

    #[test]
    fn methods_in_nested_scopes() {
        let aml = b"\x10\x18\\_SB_\
            \x5B\x82\x10PCI0\
                \x14\x0A_DSM\x04\xA4\x00\x00\x00\
            \x14\x06FOO_\x01";
        let methods = MethodTable::scan(aml);
        assert_eq!(
            names(&methods),
            [
                ("\\FOO_".to_string(), 1),
                ("\\_SB_.PCI0._DSM".to_string(), 4),
            ]
        );
    }

    #[test]
    fn external_methods_only() {
        let aml = b"\x15\\._SB_EXT0\x08\x03\x15\\._SB_DEV0\x06\x00";
        let methods = MethodTable::scan(aml);
        assert_eq!(names(&methods), [("\\_SB_.EXT0".to_string(), 3)]);
    }

    #[test]
    fn truncated_method_stops_quietly() {
        let aml = b"\x14\x2A_STA\x00";
        assert!(MethodTable::scan(aml).is_empty());
    }

    #[test]
    fn data_is_skipped() {
        // Name (BUF0, Buffer () { 0x14, 0x05 }) hides method-like bytes.
        let aml = b"\x08BUF0\x11\x05\x0A\x02\x14\x05\x14\x06BAR_\x02";
        let methods = MethodTable::scan(aml);
        assert_eq!(names(&methods), [("\\BAR_".to_string(), 2)]);
    }
}
