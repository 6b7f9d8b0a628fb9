mod common;

use common::*;
use vcore_dag::{NeutralOp, PhysReg, ValueKind};
use vcore_lower::{ArgLocation, LocationDescriptor, LoweringError, VideocoreOp};

#[test]
fn test_two_register_arguments_result_in_third() -> Result<(), LoweringError> {
    let target = target_from_toml(
        r#"
        [convention]
        arg_registers = ["r0", "r1"]
        return_registers = ["r2"]
        "#,
    );
    let sig = signature("f", &[ValueKind::I32, ValueKind::I32], &[ValueKind::I32]);
    let (graph, summary) = lower(target.as_ref(), &sig, |b| {
        let a = b.formal_argument(0, ValueKind::I32);
        let c = b.formal_argument(1, ValueKind::I32);
        let product = b.binary(NeutralOp::Mul, ValueKind::I32, a, c);
        b.ret(&[product]);
    })?;

    let reads = live_where(&graph, |n| n.is_neutral(NeutralOp::CopyFromReg));
    assert_eq!(reads.len(), 2);
    let read_regs: Vec<PhysReg> = reads.iter().map(|id| reg(graph.node(*id))).collect();
    assert_eq!(read_regs, vec![PhysReg(0), PhysReg(1)]);

    assert_eq!(summary.return_markers.len(), 1);
    let marker = graph.node(summary.return_markers[0]);
    assert!(is_op(marker, VideocoreOp::RetFlag));
    let copy = graph.node(marker.operands[0].node);
    assert!(copy.is_neutral(NeutralOp::CopyToReg));
    assert_eq!(reg(copy), PhysReg(2));
    let value = graph.node(copy.operands[1].node);
    assert!(value.is_neutral(NeutralOp::Mul));
    assert_eq!(value.operands, summary.arguments);

    assert_fully_legal(&graph, target.as_ref());
    Ok(())
}

#[test]
fn test_third_argument_spills_to_stack() -> Result<(), LoweringError> {
    let target = target_from_toml(
        r#"
        [convention]
        arg_registers = ["r0", "r1"]
        "#,
    );

    let mut state = target.convention().begin("f");
    state.assign(0, ValueKind::I32, false)?;
    state.assign(1, ValueKind::I32, false)?;
    let third = state.assign(2, ValueKind::I32, false)?;
    assert_eq!(
        third,
        ArgLocation::Direct { value: ValueKind::I32, loc: LocationDescriptor::Stack { offset: 0, kind: ValueKind::I32 } }
    );

    let sig = signature("f", &[ValueKind::I32; 3], &[ValueKind::I32]);
    let (graph, _) = lower(target.as_ref(), &sig, |b| {
        let a = b.formal_argument(0, ValueKind::I32);
        let c = b.formal_argument(2, ValueKind::I32);
        let sum = b.binary(NeutralOp::Add, ValueKind::I32, a, c);
        b.ret(&[sum]);
    })?;
    assert_eq!(graph.frame().stack_size, 4);
    assert_eq!(live_where(&graph, |n| is_op(n, VideocoreOp::LoadArg)).len(), 1);
    Ok(())
}

#[test]
fn test_variadic_arguments_at_increasing_offsets() -> Result<(), LoweringError> {
    let target = default_target();
    let mut state = target.convention().begin("g");

    let first = state.assign(0, ValueKind::I32, false)?;
    assert!(matches!(first, ArgLocation::Direct { loc: LocationDescriptor::Register { .. }, .. }));

    let offsets: Vec<u32> = (1..=4)
        .map(|index| match state.assign(index, ValueKind::I32, true)? {
            ArgLocation::Direct { loc: LocationDescriptor::Stack { offset, .. }, .. } => Ok(offset),
            other => panic!("Expected a stack location, got {:?}", other),
        })
        .collect::<Result<_, LoweringError>>()?;
    assert_eq!(offsets, vec![0, 4, 8, 12]);
    Ok(())
}

#[test]
fn test_variadic_callee_reads_area_past_fixed_arguments() -> Result<(), LoweringError> {
    let target = target_from_toml("[convention]\narg_registers = [\"r0\"]\n");
    let sig = signature("g", &[ValueKind::I32, ValueKind::I32], &[ValueKind::I32]).variadic();
    let (graph, _) = lower(target.as_ref(), &sig, |b| {
        let area = b.va_start();
        let value = b.load(ValueKind::I32, area);
        b.ret(&[value]);
    })?;

    assert_eq!(graph.frame().vararg_offset, Some(4));
    assert_eq!(live_where(&graph, |n| is_op(n, VideocoreOp::VarArgsAddr)).len(), 1);
    assert_fully_legal(&graph, target.as_ref());
    Ok(())
}

#[test]
fn test_zero_argument_zero_result_function() -> Result<(), LoweringError> {
    let target = default_target();
    let sig = signature("nop", &[], &[]);
    let (graph, summary) = lower(target.as_ref(), &sig, |b| {
        b.ret(&[]);
    })?;

    assert!(summary.arguments.is_empty());
    assert_eq!(summary.return_markers.len(), 1);
    assert_eq!(graph.node(summary.return_markers[0]).operands, vec![graph.entry_chain()]);
    assert_eq!(graph.frame().stack_size, 0);
    Ok(())
}

#[test]
fn test_mixed_width_function() -> Result<(), LoweringError> {
    let target = default_target();
    let sig = signature("mix", &[ValueKind::I8, ValueKind::I64, ValueKind::I32], &[ValueKind::I64]);
    let (graph, _) = lower(target.as_ref(), &sig, |b| {
        let small = b.formal_argument(0, ValueKind::I8);
        let wide = b.formal_argument(1, ValueKind::I64);
        let addr = b.formal_argument(2, ValueKind::I32);
        let extended = b.convert(NeutralOp::ZeroExtend, ValueKind::I64, small);
        let loaded = b.load(ValueKind::I64, addr);
        let sum = b.binary(NeutralOp::Add, ValueKind::I64, extended, loaded);
        let diff = b.binary(NeutralOp::Sub, ValueKind::I64, sum, wide);
        b.store(diff, addr);
        b.ret(&[diff]);
    })?;

    assert_fully_legal(&graph, target.as_ref());
    assert_eq!(live_where(&graph, |n| is_op(n, VideocoreOp::AddCarry)).len(), 1);
    assert_eq!(live_where(&graph, |n| is_op(n, VideocoreOp::SubExtended)).len(), 1);
    assert_eq!(graph.count_live(|n| n.primary_kind() == Some(ValueKind::I64) && !n.is_neutral(NeutralOp::BuildPair)), 0);
    Ok(())
}

#[test]
fn test_wide_argument_split_between_last_register_and_stack() -> Result<(), LoweringError> {
    let target = target_from_toml("[convention]\narg_registers = [\"r0\", \"r1\"]\n");
    let sig = signature("f", &[ValueKind::I32, ValueKind::I64], &[ValueKind::I64]);
    let (graph, summary) = lower(target.as_ref(), &sig, |b| {
        let wide = b.formal_argument(1, ValueKind::I64);
        b.ret(&[wide]);
    })?;

    let pair = graph.node(summary.arguments[1].node);
    assert!(pair.is_neutral(NeutralOp::BuildPair));
    let lo = graph.node(pair.operands[0].node);
    let hi = graph.node(pair.operands[1].node);
    assert!(lo.is_neutral(NeutralOp::CopyFromReg));
    assert_eq!(reg(lo), PhysReg(1));
    assert!(is_op(hi, VideocoreOp::LoadArg));
    assert_eq!(stack_offset(hi), 0);

    assert_eq!(live_where(&graph, |n| is_op(n, VideocoreOp::LoadArg)).len(), 1);
    assert_eq!(graph.frame().stack_size, 4);
    assert_fully_legal(&graph, target.as_ref());
    Ok(())
}

#[test]
fn test_no_split_sends_wide_and_later_arguments_to_stack() -> Result<(), LoweringError> {
    let target = target_from_toml(
        r#"
        [convention]
        arg_registers = ["r0", "r1"]
        wide_values = "no-split"
        "#,
    );
    let sig = signature("f", &[ValueKind::I32, ValueKind::I64, ValueKind::I32], &[ValueKind::I32]);
    let (graph, summary) = lower(target.as_ref(), &sig, |b| {
        let a = b.formal_argument(0, ValueKind::I32);
        let c = b.formal_argument(2, ValueKind::I32);
        let sum = b.binary(NeutralOp::Add, ValueKind::I32, a, c);
        b.ret(&[sum]);
    })?;

    let reads = live_where(&graph, |n| n.is_neutral(NeutralOp::CopyFromReg));
    assert_eq!(reads.len(), 1);
    assert_eq!(reg(graph.node(reads[0])), PhysReg(0));

    let mut offsets: Vec<u32> = live_where(&graph, |n| is_op(n, VideocoreOp::LoadArg))
        .into_iter()
        .map(|id| stack_offset(graph.node(id)))
        .collect();
    offsets.sort();
    assert_eq!(offsets, vec![0, 4, 8]);

    let pair = graph.node(summary.arguments[1].node);
    assert!(pair.operands.iter().all(|half| is_op(graph.node(half.node), VideocoreOp::LoadArg)));
    let last = graph.node(summary.arguments[2].node);
    assert!(is_op(last, VideocoreOp::LoadArg));
    assert_eq!(stack_offset(last), 8);
    assert_eq!(graph.frame().stack_size, 12);
    Ok(())
}

#[test]
fn test_wide_result_through_hidden_pointer_on_every_exit() -> Result<(), LoweringError> {
    let target = default_target();
    let sig = signature("f", &[ValueKind::I64], &[ValueKind::I64, ValueKind::I32]);
    let (mut graph, first) = lower(target.as_ref(), &sig, |b| {
        let wide = b.formal_argument(0, ValueKind::I64);
        let start = b.chain();
        for k in 0..2 {
            b.set_chain(start);
            let tag = b.constant(ValueKind::I32, k);
            b.ret(&[wide, tag]);
        }
    })?;

    assert_eq!(first.return_markers.len(), 2);
    // Both halves of the wide result and the word, on each exit.
    let stores = live_where(&graph, |n| n.is_neutral(NeutralOp::Store));
    assert_eq!(stores.len(), 6);
    for id in &stores {
        assert_eq!(graph.value_kind(graph.node(*id).operands[1]), ValueKind::I32);
    }

    let pointer_reads = live_where(&graph, |n| n.is_neutral(NeutralOp::CopyFromReg) && reg(n) == PhysReg(0));
    assert_eq!(pointer_reads.len(), 1);
    let pointer = vcore_dag::Operand::new(pointer_reads[0], 0);
    let at_base = stores.iter().filter(|id| graph.node(**id).operands[2] == pointer).count();
    assert_eq!(at_base, 2);

    for marker in &first.return_markers {
        let node = graph.node(*marker);
        assert!(is_op(node, VideocoreOp::RetFlag));
        let copy = graph.node(node.operands[0].node);
        assert!(copy.is_neutral(NeutralOp::CopyToReg));
        assert_eq!(reg(copy), PhysReg(0));
        assert_eq!(copy.operands[1], pointer);
    }
    assert_fully_legal(&graph, target.as_ref());

    let second = vcore_lower::lower_function(&mut graph, &sig, target.as_ref())?;
    assert_eq!((second.rewritten, second.created), (0, 0));
    assert_eq!(second.return_markers, first.return_markers);
    Ok(())
}
