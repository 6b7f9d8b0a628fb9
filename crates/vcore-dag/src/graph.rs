//! # Function Graph
//!
//! A function body as a directed acyclic graph of [`Node`]s stored in an arena.
//!
//! ## Core Design
//!
//! *   **Arena storage:** nodes live in a `Vec` indexed by [`NodeId`]. Nodes are never
//!     removed or edited; lowering appends replacement nodes and repoints the graph's
//!     exits at them. Nodes that become unreachable simply stop being *live*.
//! *   **Acyclic by construction:** [`Graph::add_node`] only accepts operands that
//!     reference nodes already in the arena, so every edge points at a smaller id.
//! *   **Control chain:** side-effecting nodes are ordered by `Chain` operands/results
//!     (see [`Graph::validate`]). The entry node starts the chain, exit nodes end it.
//! *   **Exits:** a function can have several exit points (one per source-level
//!     `return`); liveness is computed from all of them.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

use crate::error::GraphError;
use crate::kind::ValueKind;
use crate::node::{Node, NodeId, Operand, PortIndex};
use crate::opcode::{NeutralOp, OpcodeNames};

/// Whether the graph still holds architecture-neutral exits or has been lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphStage {
    Neutral,
    Lowered,
}

/// Stack-frame metadata maintained alongside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Bytes of incoming argument area the function reads.
    pub stack_size: u32,
    /// Offset of the first variadic argument, for variadic functions.
    pub vararg_offset: Option<u32>,
}

/// One function's computation, owned by whoever is currently transforming it.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    name: String,
    nodes: Vec<Node>,
    entry: NodeId,
    exits: Vec<NodeId>,
    /// After argument lowering: the materialized value of each formal parameter.
    arguments: Vec<Operand>,
    frame: FrameInfo,
    stage: GraphStage,
}

impl Graph {
    /// Creates a graph containing only its `EntryToken` node.
    pub fn new(name: impl Into<String>) -> Self {
        let entry_node = Node::new(NeutralOp::EntryToken, vec![], vec![ValueKind::Chain]);
        Graph {
            name: name.into(),
            nodes: vec![entry_node],
            entry: NodeId(0),
            exits: Vec::new(),
            arguments: Vec::new(),
            frame: FrameInfo::default(),
            stage: GraphStage::Neutral,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// The chain produced by the entry node.
    pub fn entry_chain(&self) -> Operand {
        Operand::new(self.entry, 0)
    }

    /// Adds a node to the arena, assigning it the next [`NodeId`].
    ///
    /// # Panics
    /// Panics if an operand references a node or port that does not exist. That can
    /// only happen through a bug in the code building the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        for operand in &node.operands {
            let producer = self.nodes.get(operand.node.index()).unwrap_or_else(|| {
                panic!(
                    "Graph `{}`: operand {} references a node that does not exist",
                    self.name, operand
                )
            });
            assert!(
                (operand.port.0 as usize) < producer.results.len(),
                "Graph `{}`: operand {} references a missing result port",
                self.name,
                operand
            );
        }
        let id = NodeId(self.nodes.len() as u32);
        assert!(id.0 < u32::MAX, "Graph NodeId overflow for `{}`", self.name);
        self.nodes.push(node);
        id
    }

    /// # Panics
    /// Panics if `id` was not allocated by this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.index())
            .unwrap_or_else(|| panic!("Graph `{}`: node {} does not exist", self.name, id))
    }

    /// Number of nodes ever allocated, live or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Kind of the value an operand refers to.
    pub fn value_kind(&self, operand: Operand) -> ValueKind {
        let node = self.node(operand.node);
        node.results[operand.port.0 as usize]
    }

    pub fn exits(&self) -> &[NodeId] {
        &self.exits
    }

    pub fn add_exit(&mut self, id: NodeId) {
        // Touch the node so an unknown id fails here rather than during liveness.
        let _ = self.node(id);
        self.exits.push(id);
    }

    pub fn set_exits(&mut self, exits: Vec<NodeId>) {
        self.exits = exits;
    }

    pub fn arguments(&self) -> &[Operand] {
        &self.arguments
    }

    pub fn set_arguments(&mut self, arguments: Vec<Operand>) {
        self.arguments = arguments;
    }

    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameInfo {
        &mut self.frame
    }

    pub fn stage(&self) -> GraphStage {
        self.stage
    }

    pub fn set_stage(&mut self, stage: GraphStage) {
        self.stage = stage;
    }

    // --- Liveness ---

    /// Nodes reachable from the exits, operands before users.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack: Vec<(NodeId, bool)> = self.exits.iter().rev().map(|id| (*id, false)).collect();

        while let Some((id, finished)) = stack.pop() {
            if finished {
                order.push(id);
                continue;
            }
            if visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;
            stack.push((id, true));
            for operand in self.node(id).operands.iter().rev() {
                if !visited[operand.node.index()] {
                    stack.push((operand.node, false));
                }
            }
        }
        order
    }

    /// Counts live nodes matching `pred`.
    pub fn count_live(&self, pred: impl Fn(&Node) -> bool) -> usize {
        self.live_nodes().into_iter().filter(|id| pred(self.node(*id))).count()
    }

    /// For every value used by a live node, the live nodes using it (one entry per edge).
    pub fn uses(&self) -> FxHashMap<Operand, Vec<NodeId>> {
        let mut uses: FxHashMap<Operand, Vec<NodeId>> = FxHashMap::default();
        for id in self.live_nodes() {
            for operand in &self.node(id).operands {
                uses.entry(*operand).or_default().push(id);
            }
        }
        uses
    }

    // --- Validation ---

    /// Checks the chain discipline over all live nodes.
    ///
    /// *   the entry is an `EntryToken` without operands;
    /// *   there is at least one exit and no exit produces a chain;
    /// *   every other node that produces or consumes a chain takes exactly one chain operand;
    /// *   every chain produced by a live node is consumed by a live node.
    ///
    /// Multiple exit paths fork the chain, so a chain may have several consumers.
    pub fn validate(&self) -> Result<(), GraphError> {
        let entry = self.node(self.entry);
        if !entry.is_neutral(NeutralOp::EntryToken) || !entry.operands.is_empty() {
            return Err(GraphError::BadEntry { function: self.name.clone(), node: self.entry });
        }
        if self.exits.is_empty() {
            return Err(GraphError::NoExits { function: self.name.clone() });
        }

        let names = crate::opcode::NoTargetNames;
        for exit in &self.exits {
            let node = self.node(*exit);
            if node.chain_port().is_some() {
                return Err(GraphError::OpenExit {
                    function: self.name.clone(),
                    node: *exit,
                    opcode: names.opcode_name(node.opcode),
                });
            }
        }

        let uses = self.uses();
        for id in self.live_nodes() {
            let node = self.node(id);
            let chain_operands = node
                .operands
                .iter()
                .filter(|op| self.value_kind(**op) == ValueKind::Chain)
                .count();
            let side_effecting = chain_operands > 0 || node.chain_port().is_some();
            if id != self.entry && side_effecting && chain_operands != 1 {
                return Err(GraphError::ChainOperandCount {
                    function: self.name.clone(),
                    node: id,
                    opcode: names.opcode_name(node.opcode),
                    found: chain_operands,
                });
            }
            if let Some(port) = node.chain_port() {
                let chain = Operand { node: id, port };
                if !uses.contains_key(&chain) {
                    return Err(GraphError::DanglingChain {
                        function: self.name.clone(),
                        node: id,
                        opcode: names.opcode_name(node.opcode),
                    });
                }
            }
        }
        Ok(())
    }

    // --- Debug output ---

    /// Renders the live part of the graph, one node per line.
    pub fn dump(&self, names: &dyn OpcodeNames) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "graph {} ({:?}, frame {} bytes)",
            self.name, self.stage, self.frame.stack_size
        );
        for id in self.live_nodes() {
            let node = self.node(id);
            let results: Vec<String> = node.results.iter().map(|k| k.to_string()).collect();
            let operands: Vec<String> = node.operands.iter().map(|o| o.to_string()).collect();
            let _ = write!(out, "  {}: ", id);
            if !results.is_empty() {
                let _ = write!(out, "{} = ", results.join(","));
            }
            let _ = write!(out, "{}{}", names.opcode_name(node.opcode), node.attr);
            if !operands.is_empty() {
                let _ = write!(out, " {}", operands.join(", "));
            }
            out.push('\n');
        }
        let exits: Vec<String> = self.exits.iter().map(|e| e.to_string()).collect();
        let _ = writeln!(out, "exits: {}", exits.join(", "));
        out
    }
}

/// Operand for the result at `port` of `node`.
pub fn port(node: NodeId, port: u32) -> Operand {
    Operand { node, port: PortIndex(port) }
}
