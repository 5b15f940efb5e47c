//! Method signatures and method invocations.
//!
//! A `MethodInvocation` is a bare `NameString` followed by as many
//! `TermArg`s as the callee declares, and the byte stream does not say how
//! many that is. [`MethodTable`] holds the declared argument counts,
//! collected by a pre-pass over the table (see [`MethodTable::scan`]) and
//! consulted through the cursor while parsing, with the name resolved
//! against the cursor's current scope.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map::Entry;
use alloc::vec;
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::ParseResult;
use crate::name::name_string;
use crate::node::{AmlNode, NodeKind};
use crate::path::{AmlName, AmlPath};
use crate::term::term_arg;

bitflags::bitflags! {
    /// The `MethodFlags` byte of a `DefMethod`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u8 {
        /// Argument count, 0 to 7.
        const ARG_COUNT  = 0b0000_0111;
        /// Method is serialized.
        const SERIALIZED = 0b0000_1000;
        /// Synchronization level, 0 to 15.
        const SYNC_LEVEL = 0b1111_0000;
    }
}

impl MethodFlags {
    /// Returns the declared argument count.
    #[must_use]
    pub fn arg_count(self) -> u8 {
        (self & Self::ARG_COUNT).bits()
    }

    /// Returns the synchronization level.
    #[must_use]
    pub fn sync_level(self) -> u8 {
        (self & Self::SYNC_LEVEL).bits() >> 4
    }
}

/// A declared method: its absolute path and argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSignature {
    /// Absolute namespace path of the method.
    pub path: AmlPath,
    /// Number of arguments an invocation carries.
    pub arg_count: u8,
    /// Whether the method was declared `Serialized`; `false` for externals.
    pub serialized: bool,
}

/// Known method signatures, keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: BTreeMap<AmlPath, MethodSignature>,
}

/// A table with no methods; every invocation takes zero arguments.
pub static EMPTY_METHODS: MethodTable = MethodTable::new();

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Collects the `Method` and `External` method declarations of an AML body.
    #[must_use]
    pub fn scan(body: &[u8]) -> Self {
        crate::prescan::scan(body)
    }

    /// Records a signature. A definition replaces an earlier one for the
    /// same path; an external never replaces a definition.
    pub fn insert(&mut self, signature: MethodSignature, external: bool) {
        match self.methods.entry(signature.path) {
            Entry::Occupied(mut existing) => {
                if !external {
                    existing.insert(signature);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(signature);
            }
        }
    }

    /// Returns the signature declared at exactly `path`.
    #[must_use]
    pub fn get(&self, path: &AmlPath) -> Option<&MethodSignature> {
        self.methods.get(path)
    }

    /// Returns the argument count for an invocation of `name` from `scope`.
    ///
    /// A single-segment relative name is looked up in `scope` and then in
    /// each enclosing scope up to the root. Any other name resolves to one
    /// path, which must match exactly.
    #[must_use]
    pub fn arity(&self, name: &AmlName, scope: &AmlPath) -> Option<u8> {
        if name.segments.is_empty() {
            return None;
        }
        if name.rooted || name.parents > 0 || name.segments.len() > 1 {
            let path = scope.resolve(name)?;
            return self.get(&path).map(|m| m.arg_count);
        }

        let mut search = *scope;
        loop {
            if let Some(method) = search.resolve(name).and_then(|path| self.get(&path)) {
                return Some(method.arg_count);
            }
            search.pop()?;
        }
    }

    /// Returns the signatures ordered by path.
    pub fn iter(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.values()
    }

    /// Returns the number of known methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// `MethodInvocation := NameString TermArgList`.
///
/// The argument count comes from the cursor's [`MethodTable`], looked up
/// from the cursor's scope; a name that is not a known method is parsed as
/// a reference with no arguments.
pub fn method_invocation<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    let name = name_string(cursor)?;
    let arg_count = AmlName::decode(name.span())
        .and_then(|(decoded, _)| cursor.methods().arity(&decoded, cursor.scope()))
        .unwrap_or(0);

    let args_start = cursor.checkpoint();
    let mut args = Vec::with_capacity(usize::from(arg_count));
    for _ in 0..arg_count {
        match term_arg(cursor) {
            Ok(arg) => args.push(arg),
            Err(err) => {
                log::trace!(
                    "invocation at {:#x} missing argument {} of {arg_count}",
                    start.position(),
                    args.len() + 1,
                );
                cursor.restore(start);
                return Err(err);
            }
        }
    }
    let args = AmlNode::new(NodeKind::TermArgList, cursor.since(args_start), args);
    Ok(AmlNode::new(
        NodeKind::MethodInvocation,
        cursor.since(start),
        vec![name, args],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NameSeg;

    fn path(segments: &[&[u8; 4]]) -> AmlPath {
        let mut path = AmlPath::new();
        for seg in segments {
            path.push(NameSeg(**seg));
        }
        path
    }

    fn table() -> MethodTable {
        let mut methods = MethodTable::new();
        methods.insert(
            MethodSignature {
                path: path(&[b"_SB_", b"ADD2"]),
                arg_count: 2,
                serialized: false,
            },
            false,
        );
        methods
    }

    fn in_scope<'a>(data: &'a [u8], methods: &'a MethodTable, scope: AmlPath) -> Cursor<'a> {
        let mut cursor = Cursor::with_methods(data, methods);
        cursor.set_scope(scope);
        cursor
    }

    #[test]
    fn flags_decode() {
        let flags = MethodFlags::from_bits_retain(0x3B);
        assert_eq!(flags.arg_count(), 3);
        assert!(flags.contains(MethodFlags::SERIALIZED));
        assert_eq!(flags.sync_level(), 3);
    }

    #[test]
    fn arity_searches_enclosing_scopes() {
        let methods = table();
        let (relative, _) = AmlName::decode(b"ADD2").unwrap();
        assert_eq!(methods.arity(&relative, &path(&[b"_SB_"])), Some(2));
        assert_eq!(methods.arity(&relative, &path(&[b"_SB_", b"PCI0", b"LPCB"])), Some(2));
        assert_eq!(methods.arity(&relative, &AmlPath::ROOT), None);
        assert_eq!(methods.arity(&relative, &path(&[b"_GPE"])), None);

        let (other, _) = AmlName::decode(b"SUB2").unwrap();
        assert_eq!(methods.arity(&other, &path(&[b"_SB_"])), None);
    }

    #[test]
    fn arity_of_paths_is_exact() {
        let methods = table();
        let (rooted, _) = AmlName::decode(b"\\ADD2").unwrap();
        assert_eq!(methods.arity(&rooted, &path(&[b"_SB_"])), None);
        let (rooted, _) = AmlName::decode(b"\\._SB_ADD2").unwrap();
        assert_eq!(methods.arity(&rooted, &AmlPath::ROOT), Some(2));

        let (parent, _) = AmlName::decode(b"^ADD2").unwrap();
        assert_eq!(methods.arity(&parent, &path(&[b"_SB_", b"PCI0"])), Some(2));
        assert_eq!(methods.arity(&parent, &path(&[b"_SB_", b"PCI0", b"LPCB"])), None);

        // Multi-segment relative names are not searched upward.
        let (dual, _) = AmlName::decode(b"._SB_ADD2").unwrap();
        assert_eq!(methods.arity(&dual, &AmlPath::ROOT), Some(2));
        assert_eq!(methods.arity(&dual, &path(&[b"_GPE"])), None);
    }

    #[test]
    fn nearest_scope_wins() {
        let mut methods = table();
        methods.insert(
            MethodSignature {
                path: path(&[b"_SB_", b"PCI0", b"ADD2"]),
                arg_count: 1,
                serialized: false,
            },
            false,
        );
        let (name, _) = AmlName::decode(b"ADD2").unwrap();
        assert_eq!(methods.arity(&name, &path(&[b"_SB_", b"PCI0", b"LPCB"])), Some(1));
        assert_eq!(methods.arity(&name, &path(&[b"_SB_", b"PCI1"])), Some(2));
    }

    #[test]
    fn external_does_not_override_definition() {
        let mut methods = table();
        methods.insert(
            MethodSignature {
                path: path(&[b"_SB_", b"ADD2"]),
                arg_count: 5,
                serialized: false,
            },
            true,
        );
        assert_eq!(methods.len(), 1);
        assert_eq!(methods.get(&path(&[b"_SB_", b"ADD2"])).unwrap().arg_count, 2);
    }

    #[test]
    fn definition_replaces_external() {
        let mut methods = MethodTable::new();
        let target = path(&[b"_SB_", b"EXT0"]);
        for (arg_count, external) in [(3, true), (1, false)] {
            methods.insert(
                MethodSignature {
                    path: target,
                    arg_count,
                    serialized: false,
                },
                external,
            );
        }
        assert_eq!(methods.len(), 1);
        assert_eq!(methods.get(&target).unwrap().arg_count, 1);
    }

    #[test]
    fn iter_is_ordered_by_path() {
        let mut methods = MethodTable::new();
        for segments in [
            [b"_SB_", b"ZZZZ"],
            [b"_GPE", b"_L01"],
            [b"_SB_", b"AAAA"],
        ] {
            methods.insert(
                MethodSignature {
                    path: path(&segments),
                    arg_count: 0,
                    serialized: false,
                },
                false,
            );
        }
        let order: Vec<_> = methods.iter().map(|m| m.path.segments()[1]).collect();
        assert_eq!(
            order,
            [NameSeg(*b"_L01"), NameSeg(*b"AAAA"), NameSeg(*b"ZZZZ")]
        );
    }

    #[test]
    fn invocation_takes_declared_arguments() {
        let methods = table();
        let data = *b"ADD2\x0A\x01\x0A\x02\x0A\x03";
        let mut cursor = in_scope(&data, &methods, path(&[b"_SB_"]));
        let node = method_invocation(&mut cursor).unwrap();
        assert_eq!(node.children()[1].children().len(), 2);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn out_of_scope_name_takes_no_arguments() {
        let methods = table();
        let data = *b"ADD2\x0A\x01\x0A\x02";
        let mut cursor = in_scope(&data, &methods, path(&[b"_GPE"]));
        let node = method_invocation(&mut cursor).unwrap();
        assert!(node.children()[1].is_leaf());
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn unknown_name_takes_no_arguments() {
        let data = *b"FOO_\x0A\x01";
        let mut cursor = Cursor::new(&data);
        let node = method_invocation(&mut cursor).unwrap();
        assert!(node.children()[1].is_leaf());
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn missing_argument_restores() {
        let methods = table();
        let data = *b"ADD2\x0A\x01";
        let mut cursor = in_scope(&data, &methods, path(&[b"_SB_"]));
        assert!(method_invocation(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
    }
}
