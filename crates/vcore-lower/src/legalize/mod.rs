//! # Legalization
//!
//! Maps each neutral node to an [`Action`] through the target's table and runs the
//! matching strategy. Every node a strategy creates is legalized as soon as it is
//! emitted, so a strategy returns values that are already legal.

mod actions;
mod custom;
mod expand;
mod promote;

pub use actions::{videocore_action, Action};

use vcore_dag::{Graph, NeutralOp, Node, NodeId, Operand, ValueKind};

use crate::context::LoweringContext;
use crate::error::LoweringError;
use crate::target::TargetLowering;

pub(crate) use expand::offset_address;

/// The kind that decides how `node` is legalized.
pub fn legality_kind(graph: &Graph, node: &Node) -> ValueKind {
    let operand_kind = |index: usize| graph.value_kind(node.operands[index]);
    match node.opcode.as_neutral() {
        Some(NeutralOp::Store | NeutralOp::CopyToReg) => operand_kind(1),
        Some(NeutralOp::SetCC | NeutralOp::Truncate | NeutralOp::ExtractElement) => operand_kind(0),
        _ => node.primary_kind().unwrap_or(ValueKind::Chain),
    }
}

pub(crate) fn legalize_node(
    target: &dyn TargetLowering,
    ctx: &mut LoweringContext<'_>,
    id: NodeId,
    node: &Node,
    operands: Vec<Operand>,
) -> Result<Vec<Operand>, LoweringError> {
    let Some(op) = node.opcode.as_neutral() else {
        return Ok(ctx.keep(id, node, operands));
    };
    let kind = legality_kind(ctx.graph(), node);
    let action = target
        .action(op, kind)
        .ok_or_else(|| LoweringError::legalization_gap(ctx.function_name(), op.name(), kind))?;

    match action {
        Action::Legal => Ok(ctx.keep(id, node, operands)),
        Action::Promote => ctx.expand_with(op, kind, |ctx| promote::promote(ctx, op, node, operands)),
        Action::Expand => ctx.expand_with(op, kind, |ctx| expand::expand(ctx, op, node, operands)),
        Action::Custom => ctx.expand_with(op, kind, |ctx| custom::lower_custom(ctx, op, node, operands)),
    }
}
