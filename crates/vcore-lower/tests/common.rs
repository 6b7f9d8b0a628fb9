//! Shared helpers for the lowering integration tests.
#![allow(dead_code)]

use vcore_dag::{FunctionSignature, Graph, GraphBuilder, Node, NodeAttr, NodeId, Opcode, PhysReg, ValueKind};
use vcore_lower::legalize::legality_kind;
use vcore_lower::{
    create_target_lowering, lower_function, Action, LoweringError, LoweringSummary, TargetConfig, TargetLowering,
    TargetNames, VideocoreOp,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a target from an inline TOML configuration.
///
/// # Panics
/// Panics if the configuration is invalid.
pub fn target_from_toml(toml: &str) -> Box<dyn TargetLowering> {
    let config = TargetConfig::from_toml_str(toml).expect("Failed to parse test configuration");
    create_target_lowering(&config).expect("Failed to create target lowering")
}

pub fn default_target() -> Box<dyn TargetLowering> {
    target_from_toml("")
}

/// Builds a function body and lowers it.
pub fn lower(
    target: &dyn TargetLowering,
    signature: &FunctionSignature,
    build: impl FnOnce(&mut GraphBuilder),
) -> Result<(Graph, LoweringSummary), LoweringError> {
    init_logger();
    let mut builder = GraphBuilder::new(signature.name.clone());
    build(&mut builder);
    let mut graph = builder.finish();
    let summary = lower_function(&mut graph, signature, target)?;
    log::debug!("{}", graph.dump(&TargetNames(target)));
    Ok((graph, summary))
}

pub fn live_where(graph: &Graph, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
    graph.live_nodes().into_iter().filter(|id| pred(graph.node(*id))).collect()
}

pub fn is_op(node: &Node, op: VideocoreOp) -> bool {
    VideocoreOp::of(node) == Some(op)
}

pub fn reg(node: &Node) -> PhysReg {
    match node.attr {
        NodeAttr::Reg(reg) => reg,
        other => panic!("Expected a register attribute, found {:?}", other),
    }
}

pub fn stack_offset(node: &Node) -> u32 {
    match node.attr {
        NodeAttr::StackOffset(offset) => offset,
        other => panic!("Expected a stack offset attribute, found {:?}", other),
    }
}

/// Asserts that every live neutral node is one the target keeps as is.
pub fn assert_fully_legal(graph: &Graph, target: &dyn TargetLowering) {
    for id in graph.live_nodes() {
        let node = graph.node(id);
        if let Opcode::Neutral(op) = node.opcode {
            let kind = legality_kind(graph, node);
            assert_eq!(
                target.action(op, kind),
                Some(Action::Legal),
                "{} ({} on {}) is not legal after lowering",
                id,
                op.name(),
                kind
            );
        }
    }
}

pub fn signature(name: &str, params: &[ValueKind], results: &[ValueKind]) -> FunctionSignature {
    FunctionSignature::new(name, params.to_vec(), results.to_vec())
}
