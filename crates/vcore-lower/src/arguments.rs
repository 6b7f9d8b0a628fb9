//! Formal argument lowering.
//!
//! Each parameter is read exactly once, right after the entry token: register
//! parameters with a `CopyFromReg`, stack parameters with a `LoadArg` at their
//! incoming offset. The reads are chained in parameter order, and every use of
//! the parameter refers to the single materialized value.

use vcore_dag::{NeutralOp, Node, NodeAttr, Operand, ValueKind};

use crate::catalog::VideocoreOp;
use crate::context::LoweringContext;
use crate::convention::{ArgLocation, LocationDescriptor, RegClass, ReturnPlan};
use crate::error::{LoweringError, ValuePosition};

pub(crate) fn lower_formal_arguments(ctx: &mut LoweringContext<'_>) -> Result<(), LoweringError> {
    let target = ctx.target;
    let signature = ctx.signature;
    let plan = ctx.return_plan()?;

    let mut state = target.convention().begin(&signature.name);
    let mut chain = ctx.graph().entry_chain();

    if let ReturnPlan::Indirect { .. } = plan {
        let reg = state
            .reserve_pointer()
            .ok_or_else(|| LoweringError::convention_gap(&signature.name, ValuePosition::Result(0), ValueKind::I32))?;
        let loc = LocationDescriptor::Register { class: RegClass::Gpr, reg, kind: ValueKind::I32 };
        let pointer = read_location(ctx, &mut chain, &loc)?;
        log::debug!("{}: results returned through the area at {}", signature.name, reg);
        ctx.return_pointer = Some(pointer);
    }

    let mut arguments = Vec::with_capacity(signature.params.len());
    for (index, kind) in signature.params.iter().enumerate() {
        let location = state.assign(index as u32, *kind, false)?;
        log::debug!("{}: parameter {} ({}) in {:?}", signature.name, index, kind, location.parts());
        arguments.push(materialize(ctx, &mut chain, &location)?);
    }

    let incoming = state.stack_offset();
    let frame = ctx.graph.frame_mut();
    frame.stack_size += incoming;
    if signature.is_variadic {
        frame.vararg_offset = Some(incoming);
    }

    ctx.arguments = Some(arguments);
    ctx.entry_chain = Some(chain);
    Ok(())
}

fn materialize(
    ctx: &mut LoweringContext<'_>,
    chain: &mut Operand,
    location: &ArgLocation,
) -> Result<Operand, LoweringError> {
    match location {
        ArgLocation::Direct { value, loc } => {
            let read = read_location(ctx, chain, loc)?;
            if *value == loc.kind() {
                Ok(read)
            } else {
                ctx.emit_value(Node::new(NeutralOp::Truncate, vec![read], vec![*value]))
            }
        }
        ArgLocation::Split { value, lo, hi } => {
            let lo = read_location(ctx, chain, lo)?;
            let hi = read_location(ctx, chain, hi)?;
            ctx.emit_value(Node::new(NeutralOp::BuildPair, vec![lo, hi], vec![*value]))
        }
    }
}

fn read_location(
    ctx: &mut LoweringContext<'_>,
    chain: &mut Operand,
    loc: &LocationDescriptor,
) -> Result<Operand, LoweringError> {
    let node = match loc {
        LocationDescriptor::Register { reg, kind, .. } => {
            Node::new(NeutralOp::CopyFromReg, vec![*chain], vec![*kind, ValueKind::Chain]).with_attr(NodeAttr::Reg(*reg))
        }
        LocationDescriptor::Stack { offset, kind } => {
            Node::new(VideocoreOp::LoadArg.opcode(), vec![*chain], vec![*kind, ValueKind::Chain])
                .with_attr(NodeAttr::StackOffset(*offset))
        }
    };
    let results = ctx.emit(node)?;
    *chain = results[1];
    Ok(results[0])
}
