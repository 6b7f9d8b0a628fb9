//! Common helper functions for lowering tests.

use vcore_dag::{FunctionSignature, Graph, GraphBuilder, Node, NodeAttr, NodeId, PhysReg, ValueKind};

use crate::catalog::VideocoreOp;
use crate::config::ConventionConfig;
use crate::convention::CallingConvention;
use crate::error::LoweringError;
use crate::target::{TargetNames, VideocoreLowering};
use crate::{lower_function, LoweringSummary};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn videocore() -> VideocoreLowering {
    VideocoreLowering::default()
}

/// VideoCore with a modified convention table.
pub(crate) fn videocore_with(edit: impl FnOnce(&mut ConventionConfig)) -> VideocoreLowering {
    let mut config = ConventionConfig::default();
    edit(&mut config);
    let convention = CallingConvention::from_config(&config).expect("test convention must be valid");
    VideocoreLowering::new(convention)
}

/// Builds a graph with `build`, then lowers it for the default VideoCore target.
pub(crate) fn lower_built(
    signature: &FunctionSignature,
    build: impl FnOnce(&mut GraphBuilder),
) -> Result<(Graph, LoweringSummary), LoweringError> {
    lower_built_for(&videocore(), signature, build)
}

pub(crate) fn lower_built_for(
    target: &VideocoreLowering,
    signature: &FunctionSignature,
    build: impl FnOnce(&mut GraphBuilder),
) -> Result<(Graph, LoweringSummary), LoweringError> {
    init_logger();
    let mut builder = GraphBuilder::new(signature.name.clone());
    build(&mut builder);
    let mut graph = builder.finish();
    let summary = lower_function(&mut graph, signature, target)?;
    log::trace!("{}", graph.dump(&TargetNames(target)));
    Ok((graph, summary))
}

/// Live nodes performing `op`, in post order.
pub(crate) fn live_target_nodes(graph: &Graph, op: VideocoreOp) -> Vec<NodeId> {
    graph
        .live_nodes()
        .into_iter()
        .filter(|id| VideocoreOp::of(graph.node(*id)) == Some(op))
        .collect()
}

pub(crate) fn live_nodes_where(graph: &Graph, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
    graph.live_nodes().into_iter().filter(|id| pred(graph.node(*id))).collect()
}

pub(crate) fn reg_of(node: &Node) -> PhysReg {
    match node.attr {
        NodeAttr::Reg(reg) => reg,
        other => panic!("Expected a register attribute, found {:?}", other),
    }
}

pub(crate) fn stack_offset_of(node: &Node) -> u32 {
    match node.attr {
        NodeAttr::StackOffset(offset) => offset,
        other => panic!("Expected a stack offset attribute, found {:?}", other),
    }
}

pub(crate) fn sig(name: &str, params: &[ValueKind], results: &[ValueKind]) -> FunctionSignature {
    FunctionSignature::new(name, params.to_vec(), results.to_vec())
}
