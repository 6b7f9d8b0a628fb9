//! Return lowering.
//!
//! Every exit becomes one `RET_FLAG` marker. Values returned in registers are
//! copied there first; the copies are glued together so nothing is scheduled
//! between them and the marker. Results that do not fit in the result registers
//! are stored through the hidden pointer, which is then returned in the first
//! result register.

use vcore_dag::{NeutralOp, Node, NodeAttr, NodeId, Operand, PhysReg, ValueKind};

use crate::catalog::VideocoreOp;
use crate::context::LoweringContext;
use crate::convention::{ArgLocation, LocationDescriptor, ReturnPlan};
use crate::error::LoweringError;
use crate::legalize::offset_address;

/// Chain and glue threaded through the copies into result registers.
struct ReturnSequence {
    chain: Operand,
    glue: Option<Operand>,
}

impl ReturnSequence {
    fn copy_to_reg(&mut self, ctx: &mut LoweringContext<'_>, reg: PhysReg, value: Operand) -> Result<(), LoweringError> {
        let mut operands = vec![self.chain, value];
        operands.extend(self.glue);
        let results = ctx.emit(
            Node::new(NeutralOp::CopyToReg, operands, vec![ValueKind::Chain, ValueKind::Glue])
                .with_attr(NodeAttr::Reg(reg)),
        )?;
        self.chain = results[0];
        self.glue = Some(results[1]);
        Ok(())
    }
}

fn register(loc: &LocationDescriptor) -> PhysReg {
    match loc.reg() {
        Some(reg) => reg,
        None => panic!("result assigned to the stack ({})", loc),
    }
}

pub(crate) fn lower_return(
    ctx: &mut LoweringContext<'_>,
    exit: &Node,
    operands: Vec<Operand>,
) -> Result<NodeId, LoweringError> {
    let (chain, values) = match operands.split_first() {
        Some((chain, values)) => (*chain, values.to_vec()),
        None => panic!("return without a chain in `{}`", ctx.function_name()),
    };
    let declared = ctx.signature().results.len();
    assert_eq!(
        values.len(),
        declared,
        "exit of `{}` returns {} values but the signature declares {}",
        ctx.function_name(),
        values.len(),
        declared
    );
    for (index, (value, kind)) in values.iter().zip(&ctx.signature().results).enumerate() {
        let found = ctx.kind_of(*value);
        assert_eq!(
            found,
            *kind,
            "result {} of `{}` is {} but the signature declares {}",
            index,
            ctx.function_name(),
            found,
            kind
        );
    }

    let mut seq = ReturnSequence { chain, glue: None };
    match ctx.return_plan()? {
        ReturnPlan::Void => {}
        ReturnPlan::Registers(locations) => {
            for (value, location) in values.iter().zip(&locations) {
                match location {
                    ArgLocation::Direct { value: kind, loc } => {
                        let value = if *kind == loc.kind() {
                            *value
                        } else {
                            ctx.emit_value(Node::new(NeutralOp::AnyExtend, vec![*value], vec![loc.kind()]))?
                        };
                        seq.copy_to_reg(ctx, register(loc), value)?;
                    }
                    ArgLocation::Split { lo, hi, .. } => {
                        let (lo_value, hi_value) = ctx.split_pair(*value)?;
                        seq.copy_to_reg(ctx, register(lo), lo_value)?;
                        seq.copy_to_reg(ctx, register(hi), hi_value)?;
                    }
                }
            }
        }
        ReturnPlan::Indirect { result_reg, offsets, .. } => {
            let pointer = ctx
                .return_pointer
                .unwrap_or_else(|| panic!("no result area pointer in `{}`", ctx.function_name()));
            for (value, offset) in values.iter().zip(&offsets) {
                let address = offset_address(ctx, pointer, *offset)?;
                let value = match ctx.kind_of(*value) {
                    ValueKind::Int(1 | 8 | 16) => {
                        ctx.emit_value(Node::new(NeutralOp::ZeroExtend, vec![*value], vec![ValueKind::I32]))?
                    }
                    _ => *value,
                };
                let stored = ctx.emit(Node::new(NeutralOp::Store, vec![seq.chain, value, address], vec![ValueKind::Chain]))?;
                seq.chain = stored[0];
            }
            seq.copy_to_reg(ctx, result_reg, pointer)?;
        }
    }

    let mut marker_operands = vec![seq.chain];
    marker_operands.extend(values);
    marker_operands.extend(seq.glue);
    let marker = ctx.add(Node::new(VideocoreOp::RetFlag.opcode(), marker_operands, vec![]).with_loc(exit.loc));
    log::debug!("{}: exit lowered to {}", ctx.function_name(), marker);
    Ok(marker)
}
