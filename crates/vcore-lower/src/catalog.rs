//! # VideoCore Operation Catalog
//!
//! Target-specific opcodes. Numbering starts right after the architecture-neutral
//! range: [`FIRST_NUMBER`] is [`BUILTIN_OP_END`] itself and stays reserved, the
//! first real opcode is `FIRST_NUMBER + 1`. New opcodes are appended at the end.

use vcore_dag::{Node, Opcode, TargetOpcode, BUILTIN_OP_END};

/// Reserved first number of the VideoCore opcode range.
pub const FIRST_NUMBER: u32 = BUILTIN_OP_END;

/// VideoCore-specific operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VideocoreOp {
    /// Return marker: `[chain, values..., glue?]`, no results. Terminates an exit path.
    RetFlag,
    /// Reads an incoming stack argument at attr `StackOffset`: `[chain] -> [value, chain]`.
    LoadArg,
    /// Signed 32-bit divide.
    DivS,
    /// Unsigned 32-bit divide.
    DivU,
    /// Low half of a 64-bit add: `[lhs, rhs] -> [i32, glue(carry)]`.
    AddCarry,
    /// High half of a 64-bit add: `[lhs, rhs, glue] -> [i32, glue]`.
    AddExtended,
    /// Low half of a 64-bit subtract.
    SubCarry,
    /// High half of a 64-bit subtract.
    SubExtended,
    /// Address of the variadic argument area at attr `StackOffset`.
    VarArgsAddr,
}

impl VideocoreOp {
    pub const ALL: [VideocoreOp; 9] = [
        VideocoreOp::RetFlag,
        VideocoreOp::LoadArg,
        VideocoreOp::DivS,
        VideocoreOp::DivU,
        VideocoreOp::AddCarry,
        VideocoreOp::AddExtended,
        VideocoreOp::SubCarry,
        VideocoreOp::SubExtended,
        VideocoreOp::VarArgsAddr,
    ];

    pub fn target_opcode(self) -> TargetOpcode {
        TargetOpcode::new(FIRST_NUMBER + 1 + self as u32)
    }

    pub fn opcode(self) -> Opcode {
        Opcode::Target(self.target_opcode())
    }

    pub fn from_target_opcode(op: TargetOpcode) -> Option<Self> {
        let index = op.raw().checked_sub(FIRST_NUMBER + 1)?;
        Self::ALL.get(index as usize).copied()
    }

    /// The VideoCore operation a node performs, if it is one.
    pub fn of(node: &Node) -> Option<Self> {
        match node.opcode {
            Opcode::Target(op) => Self::from_target_opcode(op),
            Opcode::Neutral(_) => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VideocoreOp::RetFlag => "VideocoreISD::RET_FLAG",
            VideocoreOp::LoadArg => "VideocoreISD::LOAD_ARG",
            VideocoreOp::DivS => "VideocoreISD::DIVS",
            VideocoreOp::DivU => "VideocoreISD::DIVU",
            VideocoreOp::AddCarry => "VideocoreISD::ADDC",
            VideocoreOp::AddExtended => "VideocoreISD::ADDE",
            VideocoreOp::SubCarry => "VideocoreISD::SUBC",
            VideocoreOp::SubExtended => "VideocoreISD::SUBE",
            VideocoreOp::VarArgsAddr => "VideocoreISD::VARARGS_ADDR",
        }
    }
}
