//! Per-function lowering state.
//!
//! The [`LoweringContext`] owns everything that lives for exactly one run of
//! [`lower_function`](crate::lower_function): the memo of replacements, the visit
//! state of each original node, the materialized formal arguments and the return
//! plan. Nothing in it outlives the function being lowered.

use rustc_hash::FxHashMap;
use vcore_dag::{
    FunctionSignature, Graph, NeutralOp, Node, NodeAttr, NodeId, Opcode, OpcodeNames, Operand, SourceLoc, ValueKind,
};

use crate::convention::ReturnPlan;
use crate::error::LoweringError;
use crate::target::{TargetLowering, TargetNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    /// Operands are being lowered; the node itself is not yet replaced.
    InProgress,
    /// The node has its final replacement in the memo.
    Legal,
}

/// State for lowering one function.
pub struct LoweringContext<'a> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) signature: &'a FunctionSignature,
    pub(crate) target: &'a dyn TargetLowering,

    /// Original node -> replacement value for each of its result ports.
    lowered: FxHashMap<NodeId, Vec<Operand>>,
    /// Original node -> the node that takes its place, for nodes replaced whole.
    replaced: FxHashMap<NodeId, NodeId>,
    visit: FxHashMap<NodeId, VisitState>,
    worklist: Vec<(NodeId, bool)>,
    /// (opcode, kind) pairs whose strategy is currently running.
    expanding: Vec<(NeutralOp, ValueKind)>,
    loc: Option<SourceLoc>,

    pub(crate) arguments: Option<Vec<Operand>>,
    pub(crate) entry_chain: Option<Operand>,
    pub(crate) return_pointer: Option<Operand>,
    return_plan: Option<ReturnPlan>,

    pub(crate) rewritten: usize,
    pub(crate) created: usize,
}

impl<'a> LoweringContext<'a> {
    pub fn new(graph: &'a mut Graph, signature: &'a FunctionSignature, target: &'a dyn TargetLowering) -> Self {
        LoweringContext {
            graph,
            signature,
            target,
            lowered: FxHashMap::default(),
            replaced: FxHashMap::default(),
            visit: FxHashMap::default(),
            worklist: Vec::new(),
            expanding: Vec::new(),
            loc: None,
            arguments: None,
            entry_chain: None,
            return_pointer: None,
            return_plan: None,
            rewritten: 0,
            created: 0,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        self.signature
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn kind_of(&self, operand: Operand) -> ValueKind {
        self.graph.value_kind(operand)
    }

    /// The return plan for this function's signature, computed once.
    pub fn return_plan(&mut self) -> Result<ReturnPlan, LoweringError> {
        if let Some(plan) = &self.return_plan {
            return Ok(plan.clone());
        }
        let plan = self
            .target
            .convention()
            .plan_results(&self.signature.name, &self.signature.results)?;
        self.return_plan = Some(plan.clone());
        Ok(plan)
    }

    // --- Node creation ---

    /// Appends a node without legalizing it. The node inherits the source
    /// position of the node currently being lowered.
    pub fn add(&mut self, node: Node) -> NodeId {
        let loc = node.loc.or(self.loc);
        self.created += 1;
        self.graph.add_node(node.with_loc(loc))
    }

    /// Appends a node and legalizes it immediately, returning the value for each
    /// of its result ports.
    pub fn emit(&mut self, node: Node) -> Result<Vec<Operand>, LoweringError> {
        let id = self.add(node);
        let node = self.graph.node(id).clone();
        let operands = node.operands.clone();
        self.legalize_node(id, &node, operands)
    }

    /// [`emit`](Self::emit) for single-value nodes.
    pub fn emit_value(&mut self, node: Node) -> Result<Operand, LoweringError> {
        let results = self.emit(node)?;
        Ok(results[0])
    }

    /// Replacement of `node`, reusing it when none of its operands changed.
    pub fn keep(&mut self, id: NodeId, node: &Node, operands: Vec<Operand>) -> Vec<Operand> {
        let new_id = if operands == node.operands {
            id
        } else {
            let mut rebuilt = node.clone();
            rebuilt.operands = operands;
            self.add(rebuilt)
        };
        self.replaced.insert(id, new_id);
        (0..node.results.len() as u32).map(|port| Operand::new(new_id, port)).collect()
    }

    /// Splits a 64-bit value into its 32-bit halves, looking through `BuildPair`.
    pub fn split_pair(&mut self, value: Operand) -> Result<(Operand, Operand), LoweringError> {
        let producer = self.graph.node(value.node);
        if producer.is_neutral(NeutralOp::BuildPair) {
            return Ok((producer.operands[0], producer.operands[1]));
        }
        let half = |index| {
            Node::new(NeutralOp::ExtractElement, vec![value], vec![ValueKind::I32])
                .with_attr(NodeAttr::Imm(index))
        };
        let lo = self.emit_value(half(0))?;
        let hi = self.emit_value(half(1))?;
        Ok((lo, hi))
    }

    /// Runs a strategy for `(op, kind)`. A strategy whose output would require the
    /// same strategy again never terminates, so re-entry is a defect.
    pub fn expand_with<T>(
        &mut self,
        op: NeutralOp,
        kind: ValueKind,
        strategy: impl FnOnce(&mut Self) -> Result<T, LoweringError>,
    ) -> Result<T, LoweringError> {
        assert!(
            !self.expanding.contains(&(op, kind)),
            "lowering {} on {} in `{}` re-emitted {} on {}",
            op.name(),
            kind,
            self.signature.name,
            op.name(),
            kind
        );
        self.expanding.push((op, kind));
        let result = strategy(self);
        self.expanding.pop();
        result
    }

    // --- Dispatch ---

    /// Legalizes everything reachable from `root`, operands before users.
    pub(crate) fn run_from(&mut self, root: NodeId) -> Result<(), LoweringError> {
        self.worklist.push((root, false));
        while let Some((id, operands_done)) = self.worklist.pop() {
            match self.visit.get(&id) {
                Some(VisitState::Legal) => continue,
                Some(VisitState::InProgress) if !operands_done => {
                    panic!("cycle through {} in `{}`", id, self.signature.name)
                }
                _ => {}
            }

            if operands_done {
                let replacement = self.dispatch(id)?;
                self.lowered.insert(id, replacement);
                self.visit.insert(id, VisitState::Legal);
                continue;
            }

            self.visit.insert(id, VisitState::InProgress);
            self.worklist.push((id, true));
            let node = self.graph.node(id);
            for operand in node.operands.iter().rev() {
                if self.visit.get(&operand.node) != Some(&VisitState::Legal) {
                    self.worklist.push((operand.node, false));
                }
            }
        }
        Ok(())
    }

    fn lowered_operand(&self, operand: Operand) -> Operand {
        match self.lowered.get(&operand.node) {
            Some(values) => values[operand.port.0 as usize],
            None => panic!("{} used before it was lowered", operand),
        }
    }

    /// Lowers one original node whose operands are all lowered.
    fn dispatch(&mut self, id: NodeId) -> Result<Vec<Operand>, LoweringError> {
        let node = self.graph.node(id).clone();
        let operands: Vec<Operand> = node.operands.iter().map(|op| self.lowered_operand(*op)).collect();
        let replacement = self.legalize_node(id, &node, operands)?;

        let identity = replacement.iter().enumerate().all(|(port, op)| *op == Operand::new(id, port as u32));
        if !identity || self.replaced.get(&id).is_some_and(|new| *new != id) {
            self.rewritten += 1;
        }
        Ok(replacement)
    }

    fn legalize_node(&mut self, id: NodeId, node: &Node, operands: Vec<Operand>) -> Result<Vec<Operand>, LoweringError> {
        self.loc = node.loc;
        let target = self.target;
        log::trace!("{}: lowering {} {}", self.signature.name, id, TargetNames(target).opcode_name(node.opcode));

        let op = match node.opcode {
            Opcode::Target(_) => return Ok(self.keep(id, node, operands)),
            Opcode::Neutral(op) => op,
        };
        match op {
            NeutralOp::EntryToken => {
                let chain = self.entry_chain.unwrap_or(Operand::new(id, 0));
                Ok(vec![chain])
            }
            NeutralOp::FormalArgument => {
                let index = match node.attr {
                    NodeAttr::ArgIndex(index) => index as usize,
                    other => panic!("formal argument {} without an index ({:?})", id, other),
                };
                let arguments = self
                    .arguments
                    .as_ref()
                    .unwrap_or_else(|| panic!("formal argument {} in a function whose arguments are lowered", id));
                match arguments.get(index) {
                    Some(value) => {
                        let declared = self.signature.params[index];
                        assert_eq!(
                            node.results[0], declared,
                            "formal argument {} of `{}` is {} but the signature declares {}",
                            index, self.signature.name, node.results[0], declared
                        );
                        Ok(vec![*value])
                    }
                    None => panic!(
                        "formal argument {} of `{}` is out of range ({} parameters)",
                        index,
                        self.signature.name,
                        arguments.len()
                    ),
                }
            }
            NeutralOp::Return => {
                let marker = target.lower_return(self, node, operands)?;
                self.replaced.insert(id, marker);
                Ok(Vec::new())
            }
            _ => target.legalize(self, id, node, operands),
        }
    }

    /// The node that took the place of `id`, for nodes replaced whole (exits).
    pub(crate) fn replacement_node(&self, id: NodeId) -> NodeId {
        match self.replaced.get(&id) {
            Some(new) => *new,
            None => panic!("{} was never lowered", id),
        }
    }
}
