//! The VideoCore legalization table.
//!
//! The core has 32-bit integer registers and single precision floating point.
//! Anything narrower is promoted, 64-bit integers are expanded into 32-bit halves,
//! and a few operations have custom sequences.

use vcore_dag::{NeutralOp, ValueKind};

/// What the dispatcher does with a neutral node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// The node is kept as is.
    Legal,
    /// Computed in 32 bits and truncated back.
    Promote,
    /// Split into operations on 32-bit halves.
    Expand,
    /// Replaced by a target-specific sequence.
    Custom,
}

/// The action for `op` at `kind`, or `None` if VideoCore cannot lower it.
///
/// `kind` is the kind that decides legality: the result kind for most opcodes,
/// the stored value for `Store` and `CopyToReg`, the source for `Truncate`,
/// `SetCC` and `ExtractElement`.
pub fn videocore_action(op: NeutralOp, kind: ValueKind) -> Option<Action> {
    use Action::*;
    use NeutralOp::*;

    let narrow = matches!(kind, ValueKind::Int(1 | 8 | 16));
    let word = kind == ValueKind::I32;
    let wide = kind == ValueKind::I64;
    let single = kind == ValueKind::F32;

    let action = match op {
        EntryToken => Legal,
        FormalArgument | Return => Custom,

        Constant if narrow || word || single => Legal,
        Constant if wide => Expand,
        FrameIndex if word => Legal,
        VaStart if word => Custom,
        CopyFromReg | CopyToReg if word || single => Legal,

        Add | Sub | And | Or | Xor if word => Legal,
        Add | Sub | And | Or | Xor if narrow => Promote,
        Add | Sub | And | Or | Xor if wide => Expand,
        Mul | Shl | Sra | Srl if word => Legal,
        Mul | Shl | Sra | Srl if narrow => Promote,
        SDiv | UDiv if word => Custom,
        SDiv | UDiv | SRem | URem if narrow => Promote,
        SRem | URem if word => Expand,

        SetCC if word => Legal,
        SetCC if narrow => Promote,
        Select if word || single => Legal,
        Select if narrow => Promote,
        Select if wide => Expand,

        SignExtend | ZeroExtend | AnyExtend if narrow || word => Legal,
        SignExtend | ZeroExtend | AnyExtend if wide => Expand,
        Truncate if narrow || word => Legal,
        Truncate if wide => Expand,

        Load | Store if (narrow && kind != ValueKind::I1) || word || single => Legal,
        Load | Store if wide => Expand,

        BuildPair | ExtractElement if wide => Legal,

        FAdd | FSub | FMul if single => Legal,

        _ => return None,
    };
    Some(action)
}
