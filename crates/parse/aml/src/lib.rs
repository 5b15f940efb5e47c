//! `hadron-aml`: a standalone, `no_std` AML opcode grammar engine.
//!
//! This crate turns the AML bytecode body of a DSDT or SSDT into a syntax
//! tree. The grammar is a set of backtracking recursive-descent rules built
//! from a few [combinators](combinator) and four static opcode tables
//! ([`type1::TYPE1`], [`type2::TYPE2`], [`type2::TYPE6`] and
//! [`object::OBJECT`]), each keyed by `(extension, opcode)`.
//!
//! Parsing never evaluates anything. The only context it needs is the
//! argument count of each method, which decides how many operands follow a
//! method name in expression position; [`MethodTable::scan`] collects those
//! in a cheap pre-pass.
//!
//! # Usage
//!
//! ```ignore
//! let block = DefinitionBlock::new(dsdt_bytes)?;
//! let methods = block.scan_methods();
//! let tree = block.parse(&methods)?;
//! println!("{}", tree.display(Some(4)));
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod combinator;
pub mod cursor;
pub mod data;
pub mod error;
pub mod method;
pub mod name;
pub mod node;
pub mod object;
pub mod opcode;
pub mod path;
mod prescan;
pub mod table;
pub mod term;
pub mod type1;
pub mod type2;
pub mod value;

pub use cursor::{Bound, Checkpoint, Cursor};
pub use error::{AmlError, ParseResult};
pub use method::{MethodFlags, MethodSignature, MethodTable};
pub use node::{AmlNode, NodeKind};
pub use opcode::{Opcode, OpcodeDescriptor, OpcodeRule, OpcodeTable};
pub use path::{AmlName, AmlPath, NameSeg};
pub use table::{DefinitionBlock, SdtHeader};
pub use value::{AmlValue, EisaId};

/// Parses a complete AML body as a `TermList`.
///
/// `methods` supplies the argument counts of method invocations; pass
/// [`MethodTable::scan`] of the same body (and of any other tables the
/// body calls into).
///
/// # Errors
///
/// Returns [`AmlError::Unparsed`] with the offset of the first term that
/// could not be parsed if the term list does not cover the whole body.
pub fn parse_term_list<'a>(
    body: &'a [u8],
    methods: &'a MethodTable,
) -> Result<AmlNode<'a>, AmlError> {
    let mut cursor = Cursor::with_methods(body, methods);
    let tree = term::term_list(&mut cursor)?;
    if !cursor.is_empty() {
        let offset = cursor.position();
        log::warn!(
            "AML term list stopped at {offset:#x} of {:#x} (next bytes {:02x?})",
            body.len(),
            &body[offset..body.len().min(offset + 8)],
        );
        return Err(AmlError::Unparsed { offset });
    }
    log::debug!(
        "parsed {} top-level terms from {} bytes",
        tree.children().len(),
        body.len(),
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{
        DUAL_NAME_PREFIX, EXT_OP_PREFIX, IF_OP, L_EQUAL_OP, METHOD_OP, NOOP_OP, PACKAGE_OP,
        RETURN_OP, SCOPE_OP, STORE_OP,
    };
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn parse(body: &[u8]) -> Result<AmlNode<'_>, AmlError> {
        parse_term_list(body, &method::EMPTY_METHODS)
    }

    /// Kinds along the first-child chain below `node`.
    fn spine(node: &AmlNode<'_>) -> Vec<NodeKind> {
        let mut kinds = vec![node.kind()];
        let mut node = node;
        while let Some(child) = node.child(0) {
            kinds.push(child.kind());
            node = child;
        }
        kinds
    }

    #[test]
    fn store_local_to_name() {
        // Store (Local0, FOO_)
        let body = [STORE_OP, 0x60, b'F', b'O', b'O', b'_'];
        let tree = parse(&body).unwrap();
        let term = &tree.children()[0];
        assert_eq!(
            spine(term)[..3],
            [NodeKind::TermObj, NodeKind::Type2Opcode, NodeKind::DefStore]
        );
        let store = &term.children()[0].children()[0];
        assert_eq!(store.span(), &body);
        assert_eq!(store.children()[0].peel().kind(), NodeKind::LocalObj);
        assert_eq!(store.children()[1].peel().kind(), NodeKind::NameString);
    }

    #[test]
    fn if_with_equal_predicate() {
        // If (LEqual (Local0, One)) { Noop }
        let body = [IF_OP, 0x05, L_EQUAL_OP, 0x60, 0x01, NOOP_OP];
        let tree = parse(&body).unwrap();
        let if_else = tree.find(NodeKind::DefIfElse).unwrap();
        let kinds: Vec<_> = if_else.children().iter().map(AmlNode::kind).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::PkgLength,
                NodeKind::Predicate,
                NodeKind::TermList,
                NodeKind::DefElse,
            ]
        );
        assert!(if_else.children()[1].find(NodeKind::DefLEqual).is_some());
        assert!(if_else.children()[3].span().is_empty());
    }

    #[test]
    fn empty_package() {
        // Package (0) {}
        let body = [PACKAGE_OP, 0x02, 0x00];
        let mut cursor = Cursor::new(&body);
        let node = data::data_object(&mut cursor).unwrap();
        let package = node.find(NodeKind::DefPackage).unwrap();
        assert!(package.children()[2].is_leaf());
        assert!(cursor.is_empty());
    }

    #[test]
    fn truncated_extended_opcode() {
        let body = [EXT_OP_PREFIX];
        assert_eq!(parse(&body), Err(AmlError::Unparsed { offset: 0 }));
    }

    #[test]
    fn package_bound_past_input() {
        // Declares 0x10 bytes, has 3.
        let body = [PACKAGE_OP, 0x10, 0x01, 0x01];
        let mut cursor = Cursor::new(&body);
        assert!(data::data_object(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(parse(&body), Err(AmlError::Unparsed { offset: 0 }));
    }

    #[test]
    fn stops_at_first_bad_term() {
        let body = [NOOP_OP, NOOP_OP, 0x2A];
        assert_eq!(parse(&body), Err(AmlError::Unparsed { offset: 2 }));
        assert!(parse(&[]).unwrap().is_leaf());
    }

    #[test]
    fn invocation_uses_scanned_arity() {
        // Scope (\_SB) { Method (ADD2, 2) { Return (Arg0) } }
        // Return (\_SB.ADD2 (One, One))
        let mut body = vec![SCOPE_OP, 0x0F, b'\\', b'_', b'S', b'B', b'_'];
        body.extend_from_slice(&[METHOD_OP, 0x08, b'A', b'D', b'D', b'2', 0x02, RETURN_OP, 0x68]);
        body.extend_from_slice(&[RETURN_OP, b'\\', DUAL_NAME_PREFIX]);
        body.extend_from_slice(b"_SB_ADD2\x01\x01");

        let methods = MethodTable::scan(&body);
        assert_eq!(methods.len(), 1);
        let tree = parse_term_list(&body, &methods).unwrap();
        assert_eq!(tree.children().len(), 2);
        let call = tree.children()[1].find(NodeKind::MethodInvocation).unwrap();
        assert_eq!(call.children()[1].children().len(), 2);

        // Without signatures the name takes no arguments and the trailing
        // One bytes are not terms.
        assert_eq!(parse(&body), Err(AmlError::Unparsed { offset: 27 }));
    }

    #[test]
    fn same_name_in_sibling_scopes() {
        // Device (DEV0) {
        //     Method (FOO_, 2) { Return (Arg0) }
        //     Method (BAR_, 0) { Return (FOO_ (One, One)) }
        // }
        // Device (DEV1) {
        //     Name (FOO_, One)
        //     Method (BAR_, 0) { Return (FOO_) }
        // }
        let mut body = b"\x5B\x82\x1CDEV0\x14\x08FOO_\x02\xA4\x68".to_vec();
        body.extend_from_slice(b"\x14\x0DBAR_\x00\xA4FOO_\x01\x01");
        body.extend_from_slice(b"\x5B\x82\x17DEV1\x08FOO_\x01\x14\x0BBAR_\x00\xA4FOO_");

        let methods = MethodTable::scan(&body);
        assert_eq!(methods.len(), 3);
        let tree = parse_term_list(&body, &methods).unwrap();
        assert_eq!(tree.children().len(), 2);

        let mut calls = Vec::new();
        tree.walk(&mut |node, _| {
            if node.kind() == NodeKind::MethodInvocation {
                calls.push(node.children()[1].children().len());
            }
        });
        assert_eq!(calls, [2, 0]);
    }

    #[test]
    fn every_table_dispatches_its_own_entries() {
        for table in [&type1::TYPE1, &type2::TYPE2, &type2::TYPE6, &object::OBJECT] {
            for descriptor in table.descriptors() {
                let found = table.lookup(descriptor.opcode).unwrap();
                assert_eq!(found.kind, descriptor.kind);
            }
        }
        assert_eq!(type1::TYPE1.descriptors().len(), 16);
        assert_eq!(type2::TYPE6.descriptors().len(), 3);
    }

    #[test]
    fn dual_name_reference() {
        // Store (One, \_SB.FOO_)
        let body = [
            STORE_OP,
            0x01,
            b'\\',
            DUAL_NAME_PREFIX,
            b'_',
            b'S',
            b'B',
            b'_',
            b'F',
            b'O',
            b'O',
            b'_',
        ];
        let tree = parse(&body).unwrap();
        let name = tree.find(NodeKind::NameString).unwrap();
        assert_eq!(name.span(), &body[2..]);
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_overrun(body in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut cursor = Cursor::new(&body);
            let tree = term::term_list(&mut cursor).unwrap();
            prop_assert!(cursor.position() <= body.len());
            prop_assert_eq!(tree.span().len(), cursor.position());
            tree.walk(&mut |node, _| {
                let children: usize = node.children().iter().map(|c| c.span().len()).sum();
                assert!(children <= node.span().len());
            });
        }
    }
}
