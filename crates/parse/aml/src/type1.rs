//! Statement opcodes (`Type1Opcode`).

use alloc::vec;

use crate::combinator::{bounded, production};
use crate::cursor::Cursor;
use crate::data::{byte_data, dword_data, pkg_length};
use crate::error::{AmlError, ParseResult};
use crate::name::super_name;
use crate::node::{AmlNode, NodeKind};
use crate::opcode::{
    BREAK_OP, BREAKPOINT_OP, CONTINUE_OP, ELSE_OP, FATAL_OP, IF_OP, LOAD_OP, NOOP_OP, NOTIFY_OP,
    Opcode, OpcodeDescriptor, OpcodeRule, OpcodeTable, RELEASE_OP, RESET_OP, RETURN_OP,
    SIGNAL_OP, SLEEP_OP, STALL_OP, WHILE_OP,
};
use crate::term::{predicate, term_arg, term_list};

production! {
    /// `NotifyObject := SuperName`.
    fn notify_object => NotifyObject(super_name);
    /// `NotifyValue := TermArg`.
    fn notify_value => NotifyValue(term_arg);
    /// `MutexObject := SuperName`.
    pub(crate) fn mutex_object => MutexObject(super_name);
    /// `EventObject := SuperName`.
    pub(crate) fn event_object => EventObject(super_name);
    /// `ArgObject := TermArg`.
    fn arg_object => ArgObject(term_arg);
    /// `MsecTime := TermArg`.
    fn msec_time => MsecTime(term_arg);
    /// `UsecTime := TermArg`.
    fn usec_time => UsecTime(term_arg);
    /// `FatalType := ByteData`.
    fn fatal_type => FatalType(byte_data);
    /// `FatalCode := DWordData`.
    fn fatal_code => FatalCode(dword_data);
    /// `FatalArg := TermArg`.
    fn fatal_arg => FatalArg(term_arg);
}

const ELSE: OpcodeDescriptor = OpcodeDescriptor::plain(
    ELSE_OP,
    NodeKind::DefElse,
    OpcodeRule::Explicit(&[pkg_length, term_list]),
);

static TYPE1_DESCRIPTORS: [OpcodeDescriptor; 16] = [
    OpcodeDescriptor::plain(BREAK_OP, NodeKind::DefBreak, OpcodeRule::Empty),
    OpcodeDescriptor::plain(BREAKPOINT_OP, NodeKind::DefBreakPoint, OpcodeRule::Empty),
    OpcodeDescriptor::plain(CONTINUE_OP, NodeKind::DefContinue, OpcodeRule::Empty),
    ELSE,
    OpcodeDescriptor::extended(
        FATAL_OP,
        NodeKind::DefFatal,
        OpcodeRule::Implicit(&[fatal_type, fatal_code, fatal_arg]),
    ),
    OpcodeDescriptor::plain(IF_OP, NodeKind::DefIfElse, OpcodeRule::Custom(def_if_else)),
    OpcodeDescriptor::extended(LOAD_OP, NodeKind::DefLoad, OpcodeRule::Unimplemented),
    OpcodeDescriptor::plain(NOOP_OP, NodeKind::DefNoop, OpcodeRule::Empty),
    OpcodeDescriptor::plain(
        NOTIFY_OP,
        NodeKind::DefNotify,
        OpcodeRule::Implicit(&[notify_object, notify_value]),
    ),
    OpcodeDescriptor::extended(
        RELEASE_OP,
        NodeKind::DefRelease,
        OpcodeRule::Implicit(&[mutex_object]),
    ),
    OpcodeDescriptor::extended(RESET_OP, NodeKind::DefReset, OpcodeRule::Implicit(&[event_object])),
    OpcodeDescriptor::plain(RETURN_OP, NodeKind::DefReturn, OpcodeRule::Implicit(&[arg_object])),
    OpcodeDescriptor::extended(SIGNAL_OP, NodeKind::DefSignal, OpcodeRule::Implicit(&[event_object])),
    OpcodeDescriptor::extended(SLEEP_OP, NodeKind::DefSleep, OpcodeRule::Implicit(&[msec_time])),
    OpcodeDescriptor::extended(STALL_OP, NodeKind::DefStall, OpcodeRule::Implicit(&[usec_time])),
    OpcodeDescriptor::plain(
        WHILE_OP,
        NodeKind::DefWhile,
        OpcodeRule::Explicit(&[pkg_length, predicate, term_list]),
    ),
];

/// Statement opcodes.
pub static TYPE1: OpcodeTable = OpcodeTable::new(NodeKind::Type1Opcode, &TYPE1_DESCRIPTORS);

/// `Type1Opcode`: dispatches on [`TYPE1`].
pub fn type1_opcode<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    TYPE1.parse(cursor)
}

/// `DefIfElse := IfOp PkgLength Predicate TermList DefElse`.
///
/// The PkgLength bounds the predicate and the `then` branch only; the
/// `else` clause follows it. The node always has four children, the last
/// being a synthesized empty `DefElse` when no `else` is present.
fn def_if_else<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    let start = cursor.checkpoint();
    if !cursor.expect_opcode(Opcode::Plain(IF_OP)) {
        return Err(AmlError::NoMatch);
    }
    let children = bounded(cursor, &[pkg_length, predicate, term_list]).and_then(|mut children| {
        children.push(def_else(cursor)?);
        Ok(children)
    });
    match children {
        Ok(children) => Ok(AmlNode::new(NodeKind::DefIfElse, cursor.since(start), children)),
        Err(err) => {
            cursor.restore(start);
            Err(err)
        }
    }
}

/// `DefElse := Nothing | ElseOp PkgLength TermList`.
///
/// Never consumes anything when the next opcode is not `Else`.
pub fn def_else<'a>(cursor: &mut Cursor<'a>) -> ParseResult<'a> {
    if cursor.peek_opcode() == Some(Opcode::Plain(ELSE_OP)) {
        ELSE.parse(cursor)
    } else {
        Ok(AmlNode::new(NodeKind::DefElse, cursor.empty_span(), vec![]))
    }
}
