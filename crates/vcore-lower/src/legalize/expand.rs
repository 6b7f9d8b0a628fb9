//! Expansion of 64-bit integer operations into 32-bit halves, and of remainders
//! into divide, multiply and subtract.
//!
//! A 64-bit value is represented by a `BuildPair` of its low and high halves.
//! Memory is little-endian: the low word lives at the lower address.

use vcore_dag::{NeutralOp, Node, NodeAttr, Operand, ValueKind};

use crate::catalog::VideocoreOp;
use crate::context::LoweringContext;
use crate::convention::WORD_BYTES;
use crate::error::LoweringError;

pub(super) fn expand(
    ctx: &mut LoweringContext<'_>,
    op: NeutralOp,
    node: &Node,
    operands: Vec<Operand>,
) -> Result<Vec<Operand>, LoweringError> {
    use NeutralOp::*;
    match op {
        Constant => {
            let value = node
                .attr_imm()
                .unwrap_or_else(|| panic!("constant without an immediate ({:?})", node.attr));
            let lo = constant(ctx, value as u32 as i32 as i64)?;
            let hi = constant(ctx, (value >> 32) as i32 as i64)?;
            pair(ctx, lo, hi)
        }
        Add | Sub => {
            let (lhs_lo, lhs_hi) = ctx.split_pair(operands[0])?;
            let (rhs_lo, rhs_hi) = ctx.split_pair(operands[1])?;
            let (low_op, high_op) = if op == Add {
                (VideocoreOp::AddCarry, VideocoreOp::AddExtended)
            } else {
                (VideocoreOp::SubCarry, VideocoreOp::SubExtended)
            };
            let low = ctx.emit(Node::new(low_op.opcode(), vec![lhs_lo, rhs_lo], vec![ValueKind::I32, ValueKind::Glue]))?;
            let high = ctx.emit(Node::new(
                high_op.opcode(),
                vec![lhs_hi, rhs_hi, low[1]],
                vec![ValueKind::I32, ValueKind::Glue],
            ))?;
            pair(ctx, low[0], high[0])
        }
        And | Or | Xor => {
            let (lhs_lo, lhs_hi) = ctx.split_pair(operands[0])?;
            let (rhs_lo, rhs_hi) = ctx.split_pair(operands[1])?;
            let lo = ctx.emit_value(Node::new(op, vec![lhs_lo, rhs_lo], vec![ValueKind::I32]))?;
            let hi = ctx.emit_value(Node::new(op, vec![lhs_hi, rhs_hi], vec![ValueKind::I32]))?;
            pair(ctx, lo, hi)
        }
        Select => {
            let cond = operands[0];
            let (true_lo, true_hi) = ctx.split_pair(operands[1])?;
            let (false_lo, false_hi) = ctx.split_pair(operands[2])?;
            let lo = ctx.emit_value(Node::new(Select, vec![cond, true_lo, false_lo], vec![ValueKind::I32]))?;
            let hi = ctx.emit_value(Node::new(Select, vec![cond, true_hi, false_hi], vec![ValueKind::I32]))?;
            pair(ctx, lo, hi)
        }
        SignExtend | ZeroExtend | AnyExtend => {
            let source = operands[0];
            let lo = if ctx.kind_of(source) == ValueKind::I32 {
                source
            } else {
                ctx.emit_value(Node::new(op, vec![source], vec![ValueKind::I32]))?
            };
            let hi = if op == SignExtend {
                let shift = constant(ctx, 31)?;
                ctx.emit_value(Node::new(Sra, vec![lo, shift], vec![ValueKind::I32]))?
            } else {
                constant(ctx, 0)?
            };
            pair(ctx, lo, hi)
        }
        Truncate => {
            let (lo, _) = ctx.split_pair(operands[0])?;
            let kind = node.results[0];
            if kind == ValueKind::I32 {
                Ok(vec![lo])
            } else {
                ctx.emit(Node::new(Truncate, vec![lo], vec![kind]))
            }
        }
        Load => {
            let (chain, address) = (operands[0], operands[1]);
            let low = ctx.emit(Node::new(Load, vec![chain, address], vec![ValueKind::I32, ValueKind::Chain]))?;
            let high_address = offset_address(ctx, address, WORD_BYTES)?;
            let high = ctx.emit(Node::new(Load, vec![low[1], high_address], vec![ValueKind::I32, ValueKind::Chain]))?;
            let value = pair(ctx, low[0], high[0])?;
            Ok(vec![value[0], high[1]])
        }
        Store => {
            let (chain, value, address) = (operands[0], operands[1], operands[2]);
            let (lo, hi) = ctx.split_pair(value)?;
            let low = ctx.emit(Node::new(Store, vec![chain, lo, address], vec![ValueKind::Chain]))?;
            let high_address = offset_address(ctx, address, WORD_BYTES)?;
            ctx.emit(Node::new(Store, vec![low[0], hi, high_address], vec![ValueKind::Chain]))
        }
        SRem | URem => {
            let (lhs, rhs) = (operands[0], operands[1]);
            let div = if op == SRem { SDiv } else { UDiv };
            let quotient = ctx.emit_value(Node::new(div, vec![lhs, rhs], vec![ValueKind::I32]))?;
            let product = ctx.emit_value(Node::new(Mul, vec![quotient, rhs], vec![ValueKind::I32]))?;
            ctx.emit(Node::new(Sub, vec![lhs, product], vec![ValueKind::I32]))
        }
        _ => panic!("{} has no expansion", op.name()),
    }
}

fn constant(ctx: &mut LoweringContext<'_>, value: i64) -> Result<Operand, LoweringError> {
    ctx.emit_value(Node::new(NeutralOp::Constant, vec![], vec![ValueKind::I32]).with_attr(NodeAttr::Imm(value)))
}

fn pair(ctx: &mut LoweringContext<'_>, lo: Operand, hi: Operand) -> Result<Vec<Operand>, LoweringError> {
    ctx.emit(Node::new(NeutralOp::BuildPair, vec![lo, hi], vec![ValueKind::I64]))
}

/// `address + offset`, for addressing the high word.
pub(crate) fn offset_address(
    ctx: &mut LoweringContext<'_>,
    address: Operand,
    offset: u32,
) -> Result<Operand, LoweringError> {
    if offset == 0 {
        return Ok(address);
    }
    let offset = constant(ctx, offset as i64)?;
    ctx.emit_value(Node::new(NeutralOp::Add, vec![address, offset], vec![ValueKind::I32]))
}
