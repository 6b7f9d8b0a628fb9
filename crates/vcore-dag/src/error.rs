//! Error types for graph validation.

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodeId;

/// A violation of the graph's structural rules found by [`Graph::validate`](crate::Graph::validate).
///
/// A graph handed to lowering is expected to be valid; callers inside the
/// compiler treat these as defects rather than user errors.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The distinguished entry node is not an `EntryToken` without operands.
    #[error("Graph `{function}`: entry node {node} is not an operand-free EntryToken")]
    #[diagnostic(code(vcore_dag::bad_entry))]
    BadEntry { function: String, node: NodeId },

    /// The graph has no exit points, so nothing is reachable.
    #[error("Graph `{function}` has no exit points")]
    #[diagnostic(code(vcore_dag::no_exits))]
    NoExits { function: String },

    /// A side-effecting node does not take exactly one chain operand.
    #[error("Graph `{function}`: {node} ({opcode}) takes {found} chain operands, expected exactly one")]
    #[diagnostic(
        code(vcore_dag::chain_operands),
        help("every side-effecting node other than the entry is ordered by a single incoming chain")
    )]
    ChainOperandCount {
        function: String,
        node: NodeId,
        opcode: String,
        found: usize,
    },

    /// An exit point produces a chain, so the control chain does not terminate there.
    #[error("Graph `{function}`: exit {node} ({opcode}) produces a chain result")]
    #[diagnostic(code(vcore_dag::open_exit))]
    OpenExit {
        function: String,
        node: NodeId,
        opcode: String,
    },

    /// A live node produces a chain nothing consumes.
    #[error("Graph `{function}`: chain produced by {node} ({opcode}) is never consumed")]
    #[diagnostic(code(vcore_dag::dangling_chain))]
    DanglingChain {
        function: String,
        node: NodeId,
        opcode: String,
    },
}
