//! Tests for return lowering.

use vcore_dag::{NeutralOp, NodeAttr, Operand, PhysReg, ValueKind};

use super::helpers::*;
use crate::catalog::VideocoreOp;
use crate::error::{LoweringError, ValuePosition};

#[test]
fn test_single_result_copied_to_first_register() -> Result<(), LoweringError> {
    let signature = sig("f", &[], &[ValueKind::I32]);
    let (graph, summary) = lower_built(&signature, |b| {
        let c = b.constant(ValueKind::I32, 7);
        b.ret(&[c]);
    })?;

    assert_eq!(summary.return_markers.len(), 1);
    assert_eq!(graph.exits(), summary.return_markers.as_slice());
    let marker = graph.node(summary.return_markers[0]);
    assert_eq!(VideocoreOp::of(marker), Some(VideocoreOp::RetFlag));
    assert!(marker.results.is_empty());

    // [chain, value, glue]
    assert_eq!(marker.operands.len(), 3);
    let copy = graph.node(marker.operands[0].node);
    assert!(copy.is_neutral(NeutralOp::CopyToReg));
    assert_eq!(reg_of(copy), PhysReg(0));
    assert_eq!(marker.operands[2], Operand::new(marker.operands[0].node, 1));
    assert_eq!(graph.node(marker.operands[1].node).attr, NodeAttr::Imm(7));
    Ok(())
}

#[test]
fn test_void_return_has_only_chain() -> Result<(), LoweringError> {
    let signature = sig("f", &[], &[]);
    let (graph, summary) = lower_built(&signature, |b| {
        b.ret(&[]);
    })?;

    let marker = graph.node(summary.return_markers[0]);
    assert_eq!(marker.operands, vec![graph.entry_chain()]);
    Ok(())
}

#[test]
fn test_register_copies_are_glued_in_order() -> Result<(), LoweringError> {
    let signature = sig("f", &[ValueKind::I32, ValueKind::I32], &[ValueKind::I32, ValueKind::I32]);
    let (graph, summary) = lower_built(&signature, |b| {
        let x = b.formal_argument(0, ValueKind::I32);
        let y = b.formal_argument(1, ValueKind::I32);
        b.ret(&[y, x]);
    })?;

    let marker = graph.node(summary.return_markers[0]);
    let second = graph.node(marker.operands[0].node);
    assert_eq!(reg_of(second), PhysReg(1));
    let first_id = second.operands[0].node;
    let first = graph.node(first_id);
    assert_eq!(reg_of(first), PhysReg(0));
    // The second copy consumes the first one's glue.
    assert_eq!(second.operands.last(), Some(&Operand::new(first_id, 1)));
    assert_eq!(first.operands[1], summary.arguments[1]);
    Ok(())
}

#[test]
fn test_wide_result_split_over_two_registers() -> Result<(), LoweringError> {
    let signature = sig("f", &[ValueKind::I64], &[ValueKind::I64]);
    let (graph, summary) = lower_built(&signature, |b| {
        let a = b.formal_argument(0, ValueKind::I64);
        b.ret(&[a]);
    })?;

    let copies = live_nodes_where(&graph, |n| n.is_neutral(NeutralOp::CopyToReg));
    let regs: Vec<PhysReg> = copies.iter().map(|id| reg_of(graph.node(*id))).collect();
    assert_eq!(regs, vec![PhysReg(0), PhysReg(1)]);

    // The halves come straight from the incoming registers.
    let pair = graph.node(summary.arguments[0].node);
    let lo_copy = graph.node(copies[0]);
    assert_eq!(lo_copy.operands[1], pair.operands[0]);
    Ok(())
}

#[test]
fn test_narrow_result_is_extended() -> Result<(), LoweringError> {
    let signature = sig("f", &[ValueKind::I16], &[ValueKind::I16]);
    let (graph, _) = lower_built(&signature, |b| {
        let a = b.formal_argument(0, ValueKind::I16);
        b.ret(&[a]);
    })?;

    let copies = live_nodes_where(&graph, |n| n.is_neutral(NeutralOp::CopyToReg));
    let value = graph.node(graph.node(copies[0]).operands[1].node);
    assert!(value.is_neutral(NeutralOp::AnyExtend));
    assert_eq!(value.results, vec![ValueKind::I32]);
    Ok(())
}

#[test]
fn test_results_stored_through_hidden_pointer() -> Result<(), LoweringError> {
    let signature = sig("f", &[], &[ValueKind::I32, ValueKind::I32, ValueKind::I8]);
    let (graph, _) = lower_built(&signature, |b| {
        let c = b.constant(ValueKind::I32, 1);
        let d = b.constant(ValueKind::I8, 2);
        b.ret(&[c, c, d]);
    })?;

    let stores = live_nodes_where(&graph, |n| n.is_neutral(NeutralOp::Store));
    assert_eq!(stores.len(), 3);
    let copies = live_nodes_where(&graph, |n| n.is_neutral(NeutralOp::CopyToReg));
    assert_eq!(copies.len(), 1);
    let copy = graph.node(copies[0]);
    assert_eq!(reg_of(copy), PhysReg(0));

    // The pointer handed back is the one read from the first argument register.
    let pointer = graph.node(copy.operands[1].node);
    assert!(pointer.is_neutral(NeutralOp::CopyFromReg));
    assert_eq!(reg_of(pointer), PhysReg(0));
    // Narrow results are widened to a full slot.
    let last_store = graph.node(copy.operands[0].node);
    assert_eq!(graph.value_kind(last_store.operands[1]), ValueKind::I32);
    Ok(())
}

#[test]
fn test_each_exit_gets_its_own_marker() -> Result<(), LoweringError> {
    let signature = sig("f", &[ValueKind::I32], &[ValueKind::I32]);
    let (graph, summary) = lower_built(&signature, |b| {
        let a = b.formal_argument(0, ValueKind::I32);
        let one = b.constant(ValueKind::I32, 1);
        let start = b.chain();
        b.ret(&[a]);
        b.set_chain(start);
        b.ret(&[one]);
    })?;

    assert_eq!(summary.return_markers.len(), 2);
    assert_ne!(summary.return_markers[0], summary.return_markers[1]);
    assert_eq!(live_target_nodes(&graph, VideocoreOp::RetFlag).len(), 2);
    Ok(())
}

#[test]
fn test_unreturnable_result_is_a_gap() {
    let signature = sig("f", &[], &[ValueKind::F64]);
    let err = lower_built(&signature, |b| {
        let c = b.constant(ValueKind::F64, 0);
        b.ret(&[c]);
    })
    .unwrap_err();
    assert_eq!(
        err,
        LoweringError::ConventionGap {
            function: "f".to_string(),
            position: ValuePosition::Result(0),
            kind: ValueKind::F64,
        }
    );
}

#[test]
#[should_panic(expected = "returns 1 values but the signature declares 2")]
fn test_return_arity_mismatch_panics() {
    let signature = sig("f", &[], &[ValueKind::I32, ValueKind::I32]);
    let _ = lower_built(&signature, |b| {
        let c = b.constant(ValueKind::I32, 0);
        b.ret(&[c]);
    });
}

#[test]
#[should_panic(expected = "result 0 of `f` is i8 but the signature declares i32")]
fn test_return_kind_mismatch_panics() {
    let signature = sig("f", &[], &[ValueKind::I32]);
    let _ = lower_built(&signature, |b| {
        let c = b.constant(ValueKind::I8, 1);
        b.ret(&[c]);
    });
}
