//! AML syntax tree nodes.

use alloc::vec::Vec;
use core::fmt;

/// Grammar production a node was built from.
///
/// One variant per supported opcode (`Def*`), plus the composite
/// productions (operands, targets, names, data objects) that appear as
/// children of those opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NodeKind {
    // Grammar classes and lists.
    Type1Opcode,
    Type2Opcode,
    Type6Opcode,
    Object,
    TermObj,
    TermList,
    TermArg,
    TermArgList,
    MethodInvocation,

    // Raw data.
    ByteData,
    WordData,
    DWordData,
    QWordData,
    ByteList,
    PkgLength,

    // Names.
    NameSeg,
    NameString,
    NullName,
    SimpleName,
    SuperName,
    Target,

    // Data objects.
    String,
    ZeroOp,
    OneOp,
    OnesOp,
    ByteConst,
    WordConst,
    DWordConst,
    QWordConst,
    Revision,
    ComputationalData,
    DataObject,
    DataRefObject,
    ArgObj,
    LocalObj,
    DebugObj,

    // Operand roles.
    Operand,
    Predicate,
    NotifyObject,
    NotifyValue,
    MutexObject,
    EventObject,
    ArgObject,
    Timeout,
    MsecTime,
    UsecTime,
    FatalType,
    FatalCode,
    FatalArg,
    BufferSize,
    BuffPkgStrObj,
    IndexValue,
    NumElements,
    VarNumElements,
    PackageElement,
    PackageElementList,
    ShiftCount,
    ObjReference,
    Dividend,
    Divisor,
    Remainder,
    Quotient,
    BufData,
    MidObj,
    LengthArg,
    SearchPkg,
    MatchOpcode,
    StartIndex,
    BcdValue,

    // Statements (Type1).
    DefBreak,
    DefBreakPoint,
    DefContinue,
    DefElse,
    DefFatal,
    DefIfElse,
    DefLoad,
    DefNoop,
    DefNotify,
    DefRelease,
    DefReset,
    DefReturn,
    DefSignal,
    DefSleep,
    DefStall,
    DefWhile,

    // Expressions (Type2) and references (Type6).
    DefAcquire,
    DefAdd,
    DefAnd,
    DefBuffer,
    DefConcat,
    DefConcatRes,
    DefCondRefOf,
    DefCopyObject,
    DefDecrement,
    DefDerefOf,
    DefDivide,
    DefFindSetLeftBit,
    DefFindSetRightBit,
    DefFromBcd,
    DefIncrement,
    DefIndex,
    DefLAnd,
    DefLEqual,
    DefLGreater,
    DefLGreaterEqual,
    DefLLess,
    DefLLessEqual,
    DefMid,
    DefLNot,
    DefLNotEqual,
    DefLoadTable,
    DefLOr,
    DefMatch,
    DefMod,
    DefMultiply,
    DefNAnd,
    DefNOr,
    DefNot,
    DefObjectType,
    DefOr,
    DefPackage,
    DefVarPackage,
    DefRefOf,
    DefShiftLeft,
    DefShiftRight,
    DefSizeOf,
    DefStore,
    DefSubtract,
    DefTimer,
    DefToBcd,
    DefToBuffer,
    DefToDecimalString,
    DefToHexString,
    DefToInteger,
    DefToString,
    DefWait,
    DefXor,

    // Namespace modifiers and named objects.
    DefAlias,
    DefName,
    DefScope,
    DefMethod,
    MethodFlags,
    DefExternal,
    ObjectType,
    ArgumentCount,
    DefCreateBitField,
    DefCreateByteField,
    DefCreateWordField,
    DefCreateDWordField,
    DefCreateQWordField,
    DefCreateField,
    SourceBuff,
    BitIndex,
    ByteIndex,
    NumBits,
    DefMutex,
    SyncFlags,
    DefEvent,
    DefOpRegion,
    RegionSpace,
    RegionOffset,
    RegionLen,
    DefField,
    DefIndexField,
    DefBankField,
    BankValue,
    FieldFlags,
    FieldList,
    FieldElement,
    NamedField,
    ReservedField,
    AccessField,
    ConnectField,
    ExtendedAccessField,
    DefDevice,
    DefProcessor,
    ProcId,
    PblkAddr,
    PblkLen,
    DefPowerRes,
    SystemLevel,
    ResourceOrder,
    DefThermalZone,
    DefDataRegion,
}

/// A node of the AML syntax tree.
///
/// The node owns its children; its span borrows the body bytes it was
/// parsed from. Nodes are built once by the grammar and never modified
/// afterwards. Synthesized nodes (an absent `Else`) have an empty span.
#[derive(Clone, PartialEq, Eq)]
pub struct AmlNode<'a> {
    kind: NodeKind,
    span: &'a [u8],
    children: Vec<AmlNode<'a>>,
}

impl<'a> AmlNode<'a> {
    pub(crate) fn new(kind: NodeKind, span: &'a [u8], children: Vec<AmlNode<'a>>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    pub(crate) fn leaf(kind: NodeKind, span: &'a [u8]) -> Self {
        Self::new(kind, span, Vec::new())
    }

    /// Returns the production this node was built from.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the body bytes covered by this node, opcode included.
    #[must_use]
    pub fn span(&self) -> &'a [u8] {
        self.span
    }

    /// Returns the children in grammar order.
    #[must_use]
    pub fn children(&self) -> &[AmlNode<'a>] {
        &self.children
    }

    /// Returns the child at `index`, if any.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&AmlNode<'a>> {
        self.children.get(index)
    }

    /// Returns `true` if the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Follows single-child wrapper nodes down to the first node that is
    /// either a leaf or has several children.
    #[must_use]
    pub fn peel(&self) -> &AmlNode<'a> {
        let mut node = self;
        while let [only] = node.children.as_slice() {
            node = only;
        }
        node
    }

    /// Returns the first node of `kind` in depth-first pre-order, `self` included.
    #[must_use]
    pub fn find(&self, kind: NodeKind) -> Option<&AmlNode<'a>> {
        if self.kind == kind {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(kind))
    }

    /// Calls `visit` for every node in depth-first pre-order with its depth.
    pub fn walk(&self, visit: &mut impl FnMut(&AmlNode<'a>, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&AmlNode<'a>, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Decodes the value of a [`NodeKind::PkgLength`] node.
    #[must_use]
    pub fn pkg_length(&self) -> Option<usize> {
        if self.kind == NodeKind::PkgLength {
            crate::data::decode_pkg_length(self.span)
        } else {
            None
        }
    }

    /// Returns an adapter that prints the tree, cut off below `max_depth`.
    #[must_use]
    pub fn display(&self, max_depth: Option<usize>) -> TreeDisplay<'_, 'a> {
        TreeDisplay {
            node: self,
            max_depth,
        }
    }
}

impl fmt::Debug for AmlNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("AmlNode");
        out.field("kind", &self.kind).field("len", &self.span.len());
        if !self.children.is_empty() {
            out.field("children", &self.children);
        }
        out.finish()
    }
}

impl fmt::Display for AmlNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(None).fmt(f)
    }
}

/// Indented tree printer returned by [`AmlNode::display`].
pub struct TreeDisplay<'n, 'a> {
    node: &'n AmlNode<'a>,
    max_depth: Option<usize>,
}

/// Leaf bytes shown before the dump is elided.
const MAX_LEAF_BYTES: usize = 16;

impl fmt::Display for TreeDisplay<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = Ok(());
        self.node.walk(&mut |node, depth| {
            if result.is_err() || self.max_depth.is_some_and(|max| depth > max) {
                return;
            }
            result = write_line(f, node, depth);
        });
        result
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, node: &AmlNode<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:indent$}{:?}", "", node.kind, indent = depth * 2)?;
    if node.is_leaf() && !node.span.is_empty() {
        f.write_str(" [")?;
        for (i, byte) in node.span.iter().take(MAX_LEAF_BYTES).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        if node.span.len() > MAX_LEAF_BYTES {
            write!(f, " ... +{}", node.span.len() - MAX_LEAF_BYTES)?;
        }
        f.write_str("]")?;
    }
    writeln!(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn sample(bytes: &[u8]) -> AmlNode<'_> {
        AmlNode::new(
            NodeKind::Operand,
            bytes,
            vec![AmlNode::new(
                NodeKind::TermArg,
                bytes,
                vec![AmlNode::leaf(NodeKind::ByteData, &bytes[1..])],
            )],
        )
    }

    #[test]
    fn peel_stops_at_leaf() {
        let bytes = [0x0A, 0x05];
        let node = sample(&bytes);
        assert_eq!(node.peel().kind(), NodeKind::ByteData);
    }

    #[test]
    fn find_and_walk_visit_in_preorder() {
        let bytes = [0x0A, 0x05];
        let node = sample(&bytes);
        assert!(node.find(NodeKind::TermArg).is_some());
        assert!(node.find(NodeKind::DefAdd).is_none());

        let mut seen = vec![];
        node.walk(&mut |n, depth| seen.push((n.kind(), depth)));
        assert_eq!(
            seen,
            vec![
                (NodeKind::Operand, 0),
                (NodeKind::TermArg, 1),
                (NodeKind::ByteData, 2),
            ]
        );
    }

    #[test]
    fn display_prints_leaf_bytes() {
        let bytes = [0x0A, 0x05];
        let node = sample(&bytes);
        assert_eq!(
            node.to_string(),
            "Operand\n  TermArg\n    ByteData [05]\n"
        );
        assert_eq!(node.display(Some(0)).to_string(), "Operand\n");
    }
}
