//! Operations VideoCore implements with its own opcodes.

use vcore_dag::{NeutralOp, Node, NodeAttr, Operand, ValueKind};

use crate::catalog::VideocoreOp;
use crate::context::LoweringContext;
use crate::error::LoweringError;

pub(super) fn lower_custom(
    ctx: &mut LoweringContext<'_>,
    op: NeutralOp,
    node: &Node,
    operands: Vec<Operand>,
) -> Result<Vec<Operand>, LoweringError> {
    match op {
        NeutralOp::SDiv | NeutralOp::UDiv => {
            let div = if op == NeutralOp::SDiv { VideocoreOp::DivS } else { VideocoreOp::DivU };
            ctx.emit(Node::new(div.opcode(), operands, node.results.clone()))
        }
        NeutralOp::VaStart => {
            let offset = ctx.graph().frame().vararg_offset.unwrap_or_else(|| {
                panic!("va_start in `{}`, which is not variadic", ctx.function_name())
            });
            ctx.emit(
                Node::new(VideocoreOp::VarArgsAddr.opcode(), operands, vec![ValueKind::I32])
                    .with_attr(NodeAttr::StackOffset(offset)),
            )
        }
        _ => panic!("{} is lowered by the driver, not the legalizer", op.name()),
    }
}
