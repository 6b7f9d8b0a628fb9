//! Nodes, node identifiers and operand edges.

use std::fmt;

use crate::kind::ValueKind;
use crate::opcode::{CondCode, NeutralOp, Opcode};

/// Unique identifier for a node within a specific [`Graph`](crate::Graph).
/// NodeIds are arena indices and are local to the graph they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Index of a result port on a [`Node`]. Ports index the node's `results` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortIndex(pub u32);

/// A non-owning edge to one result of another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Operand {
    /// The node producing the value.
    pub node: NodeId,
    /// Which of its results is used.
    pub port: PortIndex,
}

impl Operand {
    pub fn new(node: NodeId, port: u32) -> Self {
        Operand { node, port: PortIndex(port) }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port.0 == 0 {
            write!(f, "{}", self.node)
        } else {
            write!(f, "{}:{}", self.node, self.port.0)
        }
    }
}

/// A physical register number. Targets give registers their class and meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysReg(pub u16);

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Non-edge payload attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeAttr {
    #[default]
    None,
    Imm(i64),
    ArgIndex(u32),
    Reg(PhysReg),
    StackOffset(u32),
    Cond(CondCode),
}

impl fmt::Display for NodeAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeAttr::None => Ok(()),
            NodeAttr::Imm(value) => write!(f, "<{}>", value),
            NodeAttr::ArgIndex(index) => write!(f, "<arg {}>", index),
            NodeAttr::Reg(reg) => write!(f, "<{}>", reg),
            NodeAttr::StackOffset(offset) => write!(f, "<fp+{}>", offset),
            NodeAttr::Cond(cond) => write!(f, "<{}>", cond),
        }
    }
}

/// Source position of the construct a node was built for. Propagated, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

/// A single operation in the graph.
///
/// Nodes are immutable once added to a [`Graph`](crate::Graph); lowering builds
/// replacement nodes instead of editing operand lists in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub results: Vec<ValueKind>,
    pub attr: NodeAttr,
    pub loc: Option<SourceLoc>,
}

impl Node {
    pub fn new(opcode: impl Into<Opcode>, operands: Vec<Operand>, results: Vec<ValueKind>) -> Self {
        Node {
            opcode: opcode.into(),
            operands,
            results,
            attr: NodeAttr::None,
            loc: None,
        }
    }

    pub fn with_attr(mut self, attr: NodeAttr) -> Self {
        self.attr = attr;
        self
    }

    pub fn with_loc(mut self, loc: Option<SourceLoc>) -> Self {
        self.loc = loc;
        self
    }

    pub fn is_neutral(&self, op: NeutralOp) -> bool {
        self.opcode == Opcode::Neutral(op)
    }

    /// Kind of the first result, which decides legality for most opcodes.
    pub fn primary_kind(&self) -> Option<ValueKind> {
        self.results.first().copied()
    }

    /// Port of the chain result, if the node produces one.
    pub fn chain_port(&self) -> Option<PortIndex> {
        self.results
            .iter()
            .position(|kind| *kind == ValueKind::Chain)
            .map(|pos| PortIndex(pos as u32))
    }

    pub fn attr_imm(&self) -> Option<i64> {
        match self.attr {
            NodeAttr::Imm(value) => Some(value),
            _ => None,
        }
    }
}
