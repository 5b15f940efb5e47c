//! Namespace modifiers and named objects (`Object`).

use crate::combinator::{either, list, prefixed, production};
use crate::cursor::Cursor;
use crate::data::{byte_data, data_ref_object, dword_data, pkg_length, word_data};
use crate::error::ParseResult;
use crate::name::{name_seg, name_string};
use crate::node::NodeKind;
use crate::opcode::{
    ALIAS_OP, BANK_FIELD_OP, CREATE_BIT_FIELD_OP, CREATE_BYTE_FIELD_OP, CREATE_DWORD_FIELD_OP,
    CREATE_FIELD_OP, CREATE_QWORD_FIELD_OP, CREATE_WORD_FIELD_OP, DATA_REGION_OP, DEVICE_OP,
    EVENT_OP, EXTERNAL_OP, FIELD_OP, INDEX_FIELD_OP, METHOD_OP, MUTEX_OP, NAME_OP, OP_REGION_OP,
    OpcodeDescriptor, OpcodeRule, OpcodeTable, POWER_RES_OP, PROCESSOR_OP, SCOPE_OP,
    THERMAL_ZONE_OP,
};
use crate::path::AmlName;
use crate::term::{term_arg, term_list};
use crate::type2::def_buffer;

production! {
    fn method_flags => MethodFlags(byte_data);
    fn object_type => ObjectType(byte_data);
    fn argument_count => ArgumentCount(byte_data);
    fn source_buff => SourceBuff(term_arg);
    fn bit_index => BitIndex(term_arg);
    fn byte_index => ByteIndex(term_arg);
    fn num_bits => NumBits(term_arg);
    fn sync_flags => SyncFlags(byte_data);
    fn region_space => RegionSpace(byte_data);
    fn region_offset => RegionOffset(term_arg);
    fn region_len => RegionLen(term_arg);
    fn bank_value => BankValue(term_arg);
    fn field_flags => FieldFlags(byte_data);
    fn proc_id => ProcId(byte_data);
    fn pblk_addr => PblkAddr(dword_data);
    fn pblk_len => PblkLen(byte_data);
    fn system_level => SystemLevel(byte_data);
    fn resource_order => ResourceOrder(word_data);
    /// `NamedField := NameSeg PkgLength`; the length is in bits.
    fn named_field => NamedField(name_seg, pkg_length);
}

const RESERVED_FIELD: u8 = 0x00;
const ACCESS_FIELD: u8 = 0x01;
const CONNECT_FIELD: u8 = 0x02;
const EXTENDED_ACCESS_FIELD: u8 = 0x03;

fn reserved_field<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::ReservedField, cursor, &[RESERVED_FIELD], &[pkg_length])
}

/// `AccessField := 0x01 AccessType AccessAttrib`.
fn access_field<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(NodeKind::AccessField, cursor, &[ACCESS_FIELD], &[byte_data, byte_data])
}

/// `ConnectField := 0x02 NameString | 0x02 BufferData`.
fn connect_field<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let by_name = prefixed(NodeKind::ConnectField, cursor, &[CONNECT_FIELD], &[name_string]);
    by_name.or_else(|_| prefixed(NodeKind::ConnectField, cursor, &[CONNECT_FIELD], &[def_buffer]))
}

/// `ExtendedAccessField := 0x03 AccessType ExtendedAccessAttrib AccessLength`.
fn extended_access_field<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    prefixed(
        NodeKind::ExtendedAccessField,
        cursor,
        &[EXTENDED_ACCESS_FIELD],
        &[byte_data, byte_data, byte_data],
    )
}

fn field_element<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    either(
        NodeKind::FieldElement,
        cursor,
        &[
            named_field,
            reserved_field,
            access_field,
            connect_field,
            extended_access_field,
        ],
    )
}

fn field_list<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    list(NodeKind::FieldList, cursor, field_element)
}

/// The `NameString` of a scope-opening object. Names in the rest of the
/// package body resolve against it; the enclosing scope comes back when
/// the bound is left.
fn scope_name<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let start = cursor.position();
    let name = name_string(cursor)?;
    let inner = AmlName::decode(name.span())
        .and_then(|(decoded, _)| cursor.scope().resolve(&decoded));
    match inner {
        Some(scope) => cursor.set_scope(scope),
        None => log::trace!("cannot resolve scope name at {start:#x} in {}", cursor.scope()),
    }
    Ok(name)
}

const SCOPED: OpcodeRule = OpcodeRule::Explicit(&[pkg_length, scope_name, term_list]);
const BYTE_FIELD: OpcodeRule = OpcodeRule::Implicit(&[source_buff, byte_index, name_string]);

static OBJECT_DESCRIPTORS: [OpcodeDescriptor; 22] = [
    OpcodeDescriptor::plain(
        ALIAS_OP,
        NodeKind::DefAlias,
        OpcodeRule::Implicit(&[name_string, name_string]),
    ),
    OpcodeDescriptor::plain(
        NAME_OP,
        NodeKind::DefName,
        OpcodeRule::Implicit(&[name_string, data_ref_object]),
    ),
    OpcodeDescriptor::plain(SCOPE_OP, NodeKind::DefScope, SCOPED),
    OpcodeDescriptor::plain(
        METHOD_OP,
        NodeKind::DefMethod,
        OpcodeRule::Explicit(&[pkg_length, scope_name, method_flags, term_list]),
    ),
    OpcodeDescriptor::plain(
        EXTERNAL_OP,
        NodeKind::DefExternal,
        OpcodeRule::Implicit(&[name_string, object_type, argument_count]),
    ),
    OpcodeDescriptor::plain(
        CREATE_BIT_FIELD_OP,
        NodeKind::DefCreateBitField,
        OpcodeRule::Implicit(&[source_buff, bit_index, name_string]),
    ),
    OpcodeDescriptor::plain(CREATE_BYTE_FIELD_OP, NodeKind::DefCreateByteField, BYTE_FIELD),
    OpcodeDescriptor::plain(CREATE_WORD_FIELD_OP, NodeKind::DefCreateWordField, BYTE_FIELD),
    OpcodeDescriptor::plain(CREATE_DWORD_FIELD_OP, NodeKind::DefCreateDWordField, BYTE_FIELD),
    OpcodeDescriptor::plain(CREATE_QWORD_FIELD_OP, NodeKind::DefCreateQWordField, BYTE_FIELD),
    OpcodeDescriptor::extended(
        CREATE_FIELD_OP,
        NodeKind::DefCreateField,
        OpcodeRule::Implicit(&[source_buff, bit_index, num_bits, name_string]),
    ),
    OpcodeDescriptor::extended(
        MUTEX_OP,
        NodeKind::DefMutex,
        OpcodeRule::Implicit(&[name_string, sync_flags]),
    ),
    OpcodeDescriptor::extended(EVENT_OP, NodeKind::DefEvent, OpcodeRule::Implicit(&[name_string])),
    OpcodeDescriptor::extended(
        OP_REGION_OP,
        NodeKind::DefOpRegion,
        OpcodeRule::Implicit(&[name_string, region_space, region_offset, region_len]),
    ),
    OpcodeDescriptor::extended(
        FIELD_OP,
        NodeKind::DefField,
        OpcodeRule::Explicit(&[pkg_length, name_string, field_flags, field_list]),
    ),
    OpcodeDescriptor::extended(DEVICE_OP, NodeKind::DefDevice, SCOPED),
    OpcodeDescriptor::extended(
        PROCESSOR_OP,
        NodeKind::DefProcessor,
        OpcodeRule::Explicit(&[pkg_length, scope_name, proc_id, pblk_addr, pblk_len, term_list]),
    ),
    OpcodeDescriptor::extended(
        POWER_RES_OP,
        NodeKind::DefPowerRes,
        OpcodeRule::Explicit(&[pkg_length, scope_name, system_level, resource_order, term_list]),
    ),
    OpcodeDescriptor::extended(THERMAL_ZONE_OP, NodeKind::DefThermalZone, SCOPED),
    OpcodeDescriptor::extended(
        INDEX_FIELD_OP,
        NodeKind::DefIndexField,
        OpcodeRule::Explicit(&[pkg_length, name_string, name_string, field_flags, field_list]),
    ),
    OpcodeDescriptor::extended(
        BANK_FIELD_OP,
        NodeKind::DefBankField,
        OpcodeRule::Explicit(&[
            pkg_length,
            name_string,
            name_string,
            bank_value,
            field_flags,
            field_list,
        ]),
    ),
    OpcodeDescriptor::extended(
        DATA_REGION_OP,
        NodeKind::DefDataRegion,
        OpcodeRule::Implicit(&[name_string, term_arg, term_arg, term_arg]),
    ),
];

/// Namespace modifier and named object opcodes.
pub static OBJECT: OpcodeTable = OpcodeTable::new(NodeKind::Object, &OBJECT_DESCRIPTORS);

/// `Object := NameSpaceModifierObj | NamedObj`: dispatches on [`OBJECT`].
pub fn object<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    OBJECT.parse(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{MethodSignature, MethodTable};
    use crate::node::AmlNode;
    use crate::path::{AmlPath, NameSeg};

    fn parse(data: &[u8]) -> AmlNode<'_> {
        let mut cursor = Cursor::new(data);
        let node = object(&mut cursor).unwrap();
        assert!(cursor.is_empty(), "stopped at {:#x}", cursor.position());
        node
    }

    #[test]
    fn name_with_integer() {
        // Name (_UID, One)
        let node = parse(b"\x08_UID\x01");
        assert_eq!(node.children()[0].kind(), NodeKind::DefName);
    }

    #[test]
    fn method_body() {
        // Method (_STA, 0) { Return (0x0F) }
        let node = parse(b"\x14\x09_STA\x00\xA4\x0A\x0F");
        let method = &node.children()[0];
        assert_eq!(method.kind(), NodeKind::DefMethod);
        assert_eq!(method.children()[3].children().len(), 1);
    }

    #[test]
    fn device_with_nested_name() {
        // Device (PCI0) { Name (_ADR, Zero) }
        let node = parse(b"\x5B\x82\x0BPCI0\x08_ADR\x00");
        let device = &node.children()[0];
        assert_eq!(device.kind(), NodeKind::DefDevice);
        assert!(device.find(NodeKind::DefName).is_some());
    }

    #[test]
    fn op_region_and_field() {
        // OperationRegion (GPIO, SystemIO, 0x80, 4)
        parse(b"\x5B\x80GPIO\x01\x0A\x80\x0A\x04");
        // Field (GPIO, ByteAcc, NoLock, Preserve) { , 8, FLD0, 8, AccessAs (1, 0) }
        let node = parse(b"\x5B\x81\x10GPIO\x01\x00\x08FLD0\x08\x01\x01\x00");
        let field = &node.children()[0];
        assert_eq!(field.kind(), NodeKind::DefField);
        assert_eq!(field.children()[3].children().len(), 3);
    }

    #[test]
    fn device_body_resolves_in_device_scope() {
        // Scope (\_SB) { Device (DEV0) { ADD2 (One, One) } }
        let mut methods = MethodTable::new();
        let mut path = AmlPath::ROOT;
        for seg in [b"_SB_", b"DEV0", b"ADD2"] {
            path.push(NameSeg(*seg));
        }
        methods.insert(
            MethodSignature {
                path,
                arg_count: 2,
                serialized: false,
            },
            false,
        );

        let data = b"\x10\x13\\_SB_\x5B\x82\x0BDEV0ADD2\x01\x01";
        let mut cursor = Cursor::with_methods(data, &methods);
        let node = object(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(cursor.scope(), &AmlPath::ROOT);
        let call = node.find(NodeKind::MethodInvocation).unwrap();
        assert_eq!(call.children()[1].children().len(), 2);
    }

    #[test]
    fn external_method() {
        // External (\_SB.FOO, MethodObj, 2)
        let node = parse(b"\x15\\._SB_FOO_\x08\x02");
        assert_eq!(node.children()[0].kind(), NodeKind::DefExternal);
    }
}
