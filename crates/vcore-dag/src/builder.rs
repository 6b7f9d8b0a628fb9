//! A small convenience layer for building neutral graphs.
//!
//! The upstream IR builder constructs graphs node by node; this builder covers the
//! common shapes (arguments, arithmetic, memory, exits) and threads the control
//! chain through memory operations automatically.

use crate::graph::Graph;
use crate::kind::ValueKind;
use crate::node::{Node, NodeAttr, NodeId, Operand, SourceLoc};
use crate::opcode::{CondCode, NeutralOp};

pub struct GraphBuilder {
    graph: Graph,
    chain: Operand,
    loc: Option<SourceLoc>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let graph = Graph::new(name);
        let chain = graph.entry_chain();
        GraphBuilder { graph, chain, loc: None }
    }

    /// Source position attached to every node built from now on.
    pub fn at(&mut self, line: u32, column: u32) -> &mut Self {
        self.loc = Some(SourceLoc { line, column });
        self
    }

    /// The current tail of the control chain.
    pub fn chain(&self) -> Operand {
        self.chain
    }

    /// Resets the chain tail, e.g. to start a second exit path from an earlier point.
    pub fn set_chain(&mut self, chain: Operand) {
        self.chain = chain;
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn push(&mut self, node: Node) -> NodeId {
        let node = node.with_loc(self.loc);
        self.graph.add_node(node)
    }

    pub fn formal_argument(&mut self, index: u32, kind: ValueKind) -> Operand {
        let id = self.push(Node::new(NeutralOp::FormalArgument, vec![], vec![kind]).with_attr(NodeAttr::ArgIndex(index)));
        Operand::new(id, 0)
    }

    pub fn constant(&mut self, kind: ValueKind, value: i64) -> Operand {
        let id = self.push(Node::new(NeutralOp::Constant, vec![], vec![kind]).with_attr(NodeAttr::Imm(value)));
        Operand::new(id, 0)
    }

    /// `lhs <op> rhs`, producing a value of `kind`.
    pub fn binary(&mut self, op: NeutralOp, kind: ValueKind, lhs: Operand, rhs: Operand) -> Operand {
        let id = self.push(Node::new(op, vec![lhs, rhs], vec![kind]));
        Operand::new(id, 0)
    }

    pub fn setcc(&mut self, cond: CondCode, lhs: Operand, rhs: Operand) -> Operand {
        let id = self.push(Node::new(NeutralOp::SetCC, vec![lhs, rhs], vec![ValueKind::I1]).with_attr(NodeAttr::Cond(cond)));
        Operand::new(id, 0)
    }

    pub fn select(&mut self, cond: Operand, if_true: Operand, if_false: Operand) -> Operand {
        let kind = self.graph.value_kind(if_true);
        let id = self.push(Node::new(NeutralOp::Select, vec![cond, if_true, if_false], vec![kind]));
        Operand::new(id, 0)
    }

    /// Extension or truncation of `value` to `kind`.
    pub fn convert(&mut self, op: NeutralOp, kind: ValueKind, value: Operand) -> Operand {
        let id = self.push(Node::new(op, vec![value], vec![kind]));
        Operand::new(id, 0)
    }

    pub fn frame_index(&mut self, offset: u32) -> Operand {
        let id = self.push(Node::new(NeutralOp::FrameIndex, vec![], vec![ValueKind::I32]).with_attr(NodeAttr::StackOffset(offset)));
        Operand::new(id, 0)
    }

    pub fn va_start(&mut self) -> Operand {
        let id = self.push(Node::new(NeutralOp::VaStart, vec![], vec![ValueKind::I32]));
        Operand::new(id, 0)
    }

    /// Loads a `kind` from `address`, ordered after the current chain.
    pub fn load(&mut self, kind: ValueKind, address: Operand) -> Operand {
        let id = self.push(Node::new(NeutralOp::Load, vec![self.chain, address], vec![kind, ValueKind::Chain]));
        self.chain = Operand::new(id, 1);
        Operand::new(id, 0)
    }

    /// Stores `value` to `address`, ordered after the current chain.
    pub fn store(&mut self, value: Operand, address: Operand) -> NodeId {
        let id = self.push(Node::new(NeutralOp::Store, vec![self.chain, value, address], vec![ValueKind::Chain]));
        self.chain = Operand::new(id, 0);
        id
    }

    /// Adds an exit returning `values`, ordered after the current chain.
    pub fn ret(&mut self, values: &[Operand]) -> NodeId {
        let mut operands = vec![self.chain];
        operands.extend_from_slice(values);
        let id = self.push(Node::new(NeutralOp::Return, operands, vec![]));
        self.graph.add_exit(id);
        id
    }

    /// Adds an arbitrary node, for shapes the helpers above do not cover.
    pub fn node(&mut self, node: Node) -> NodeId {
        self.push(node)
    }

    pub fn finish(self) -> Graph {
        self.graph
    }
}
