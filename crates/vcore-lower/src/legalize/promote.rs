//! Integer promotion: compute narrow operations in 32 bits.
//!
//! Operands are widened with the extension the operation needs to stay exact
//! (sign for signed division, remainder and arithmetic shift, zero for their
//! unsigned forms and for shift amounts, any otherwise), the operation runs on
//! `i32`, and the result is truncated back to the original kind.

use vcore_dag::{CondCode, NeutralOp, Node, NodeAttr, Operand, ValueKind};

use crate::context::LoweringContext;
use crate::error::LoweringError;

pub(super) fn promote(
    ctx: &mut LoweringContext<'_>,
    op: NeutralOp,
    node: &Node,
    operands: Vec<Operand>,
) -> Result<Vec<Operand>, LoweringError> {
    match op {
        NeutralOp::SetCC => {
            let cond = match node.attr {
                NodeAttr::Cond(cond) => cond,
                other => panic!("comparison without a condition code ({:?})", other),
            };
            let ext = compare_extension(cond);
            let lhs = widen(ctx, ext, operands[0])?;
            let rhs = widen(ctx, ext, operands[1])?;
            ctx.emit(Node::new(NeutralOp::SetCC, vec![lhs, rhs], node.results.clone()).with_attr(node.attr))
        }
        NeutralOp::Select => {
            let if_true = widen(ctx, NeutralOp::AnyExtend, operands[1])?;
            let if_false = widen(ctx, NeutralOp::AnyExtend, operands[2])?;
            let value = ctx.emit_value(Node::new(
                NeutralOp::Select,
                vec![operands[0], if_true, if_false],
                vec![ValueKind::I32],
            ))?;
            narrow(ctx, value, node.results[0])
        }
        _ if op.is_int_binary() => {
            let (lhs_ext, rhs_ext) = binary_extensions(op);
            let lhs = widen(ctx, lhs_ext, operands[0])?;
            let rhs = widen(ctx, rhs_ext, operands[1])?;
            let value = ctx.emit_value(Node::new(op, vec![lhs, rhs], vec![ValueKind::I32]).with_attr(node.attr))?;
            narrow(ctx, value, node.results[0])
        }
        _ => panic!("{} has no promotion", op.name()),
    }
}

fn compare_extension(cond: CondCode) -> NeutralOp {
    if cond.is_signed() {
        NeutralOp::SignExtend
    } else {
        // Unsigned and equality comparisons both need the upper bits cleared.
        NeutralOp::ZeroExtend
    }
}

fn binary_extensions(op: NeutralOp) -> (NeutralOp, NeutralOp) {
    use NeutralOp::*;
    match op {
        SDiv | SRem => (SignExtend, SignExtend),
        UDiv | URem => (ZeroExtend, ZeroExtend),
        Sra => (SignExtend, ZeroExtend),
        Srl => (ZeroExtend, ZeroExtend),
        Shl => (AnyExtend, ZeroExtend),
        _ => (AnyExtend, AnyExtend),
    }
}

fn widen(ctx: &mut LoweringContext<'_>, ext: NeutralOp, value: Operand) -> Result<Operand, LoweringError> {
    ctx.emit_value(Node::new(ext, vec![value], vec![ValueKind::I32]))
}

fn narrow(ctx: &mut LoweringContext<'_>, value: Operand, kind: ValueKind) -> Result<Vec<Operand>, LoweringError> {
    let value = ctx.emit_value(Node::new(NeutralOp::Truncate, vec![value], vec![kind]))?;
    Ok(vec![value])
}
