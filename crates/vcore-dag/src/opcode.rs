//! # Opcodes
//!
//! Architecture-neutral opcodes ([`NeutralOp`]) are defined once for every target.
//! Target-specific opcodes live in a separate numeric range starting at
//! [`BUILTIN_OP_END`]; each target maps its own catalog onto that range, so two
//! targets compiled into the same build never collide with the neutral set.

use std::fmt;

/// Architecture-neutral operations produced by the upstream IR builder.
///
/// The discriminant order is the stable numeric index of each opcode. New opcodes
/// are appended before [`BUILTIN_OP_END`] is recomputed, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum NeutralOp {
    /// The function entry. No operands; produces the initial chain.
    EntryToken,
    /// Formal parameter `i` (attr `ArgIndex(i)`). Pure; replaced during argument lowering.
    FormalArgument,
    /// A function exit: `[chain, values...]`. Replaced by a target return marker.
    Return,
    /// An immediate (attr `Imm`).
    Constant,
    /// Address of a frame slot (attr `StackOffset`).
    FrameIndex,
    /// `[chain] -> [value, chain]`, reads the register in attr `Reg`.
    CopyFromReg,
    /// `[chain, value, glue?] -> [chain, glue]`, writes the register in attr `Reg`.
    CopyToReg,
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    Sra,
    Srl,
    /// `[lhs, rhs] -> [i1]`, comparison in attr `Cond`.
    SetCC,
    /// `[cond, if_true, if_false]`.
    Select,
    SignExtend,
    ZeroExtend,
    AnyExtend,
    Truncate,
    /// `[chain, address] -> [value, chain]`.
    Load,
    /// `[chain, value, address] -> [chain]`.
    Store,
    /// `[lo, hi] -> [wide]`, joins two halves into one value.
    BuildPair,
    /// `[wide] -> [half]`, half selected by attr `Imm` (0 = low, 1 = high).
    ExtractElement,
    /// Address of the first variadic argument.
    VaStart,
    FAdd,
    FSub,
    FMul,
}

/// First opcode number available to target-specific catalogs.
pub const BUILTIN_OP_END: u32 = NeutralOp::FMul as u32 + 1;

impl NeutralOp {
    /// Every neutral opcode in index order.
    pub const ALL: [NeutralOp; BUILTIN_OP_END as usize] = [
        NeutralOp::EntryToken,
        NeutralOp::FormalArgument,
        NeutralOp::Return,
        NeutralOp::Constant,
        NeutralOp::FrameIndex,
        NeutralOp::CopyFromReg,
        NeutralOp::CopyToReg,
        NeutralOp::Add,
        NeutralOp::Sub,
        NeutralOp::Mul,
        NeutralOp::SDiv,
        NeutralOp::UDiv,
        NeutralOp::SRem,
        NeutralOp::URem,
        NeutralOp::And,
        NeutralOp::Or,
        NeutralOp::Xor,
        NeutralOp::Shl,
        NeutralOp::Sra,
        NeutralOp::Srl,
        NeutralOp::SetCC,
        NeutralOp::Select,
        NeutralOp::SignExtend,
        NeutralOp::ZeroExtend,
        NeutralOp::AnyExtend,
        NeutralOp::Truncate,
        NeutralOp::Load,
        NeutralOp::Store,
        NeutralOp::BuildPair,
        NeutralOp::ExtractElement,
        NeutralOp::VaStart,
        NeutralOp::FAdd,
        NeutralOp::FSub,
        NeutralOp::FMul,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    /// Diagnostic name, e.g. `"ISD::ADD"`.
    pub fn name(self) -> &'static str {
        match self {
            NeutralOp::EntryToken => "ISD::EntryToken",
            NeutralOp::FormalArgument => "ISD::FORMAL_ARGUMENT",
            NeutralOp::Return => "ISD::RET",
            NeutralOp::Constant => "ISD::Constant",
            NeutralOp::FrameIndex => "ISD::FrameIndex",
            NeutralOp::CopyFromReg => "ISD::CopyFromReg",
            NeutralOp::CopyToReg => "ISD::CopyToReg",
            NeutralOp::Add => "ISD::ADD",
            NeutralOp::Sub => "ISD::SUB",
            NeutralOp::Mul => "ISD::MUL",
            NeutralOp::SDiv => "ISD::SDIV",
            NeutralOp::UDiv => "ISD::UDIV",
            NeutralOp::SRem => "ISD::SREM",
            NeutralOp::URem => "ISD::UREM",
            NeutralOp::And => "ISD::AND",
            NeutralOp::Or => "ISD::OR",
            NeutralOp::Xor => "ISD::XOR",
            NeutralOp::Shl => "ISD::SHL",
            NeutralOp::Sra => "ISD::SRA",
            NeutralOp::Srl => "ISD::SRL",
            NeutralOp::SetCC => "ISD::SETCC",
            NeutralOp::Select => "ISD::SELECT",
            NeutralOp::SignExtend => "ISD::SIGN_EXTEND",
            NeutralOp::ZeroExtend => "ISD::ZERO_EXTEND",
            NeutralOp::AnyExtend => "ISD::ANY_EXTEND",
            NeutralOp::Truncate => "ISD::TRUNCATE",
            NeutralOp::Load => "ISD::LOAD",
            NeutralOp::Store => "ISD::STORE",
            NeutralOp::BuildPair => "ISD::BUILD_PAIR",
            NeutralOp::ExtractElement => "ISD::EXTRACT_ELEMENT",
            NeutralOp::VaStart => "ISD::VASTART",
            NeutralOp::FAdd => "ISD::FADD",
            NeutralOp::FSub => "ISD::FSUB",
            NeutralOp::FMul => "ISD::FMUL",
        }
    }

    /// Binary integer arithmetic and logic: `[lhs, rhs] -> [value]`.
    pub fn is_int_binary(self) -> bool {
        matches!(
            self,
            NeutralOp::Add
                | NeutralOp::Sub
                | NeutralOp::Mul
                | NeutralOp::SDiv
                | NeutralOp::UDiv
                | NeutralOp::SRem
                | NeutralOp::URem
                | NeutralOp::And
                | NeutralOp::Or
                | NeutralOp::Xor
                | NeutralOp::Shl
                | NeutralOp::Sra
                | NeutralOp::Srl
        )
    }
}

impl fmt::Display for NeutralOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A target-specific opcode number (always `>= BUILTIN_OP_END`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetOpcode(u32);

impl TargetOpcode {
    /// Wraps a raw opcode number.
    ///
    /// # Panics
    /// Panics if `raw` falls inside the neutral range.
    pub fn new(raw: u32) -> Self {
        assert!(
            raw >= BUILTIN_OP_END,
            "Target opcode {} collides with the architecture-neutral range (< {})",
            raw,
            BUILTIN_OP_END
        );
        TargetOpcode(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// An opcode is either architecture-neutral or target-specific, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Neutral(NeutralOp),
    Target(TargetOpcode),
}

impl Opcode {
    pub fn as_neutral(self) -> Option<NeutralOp> {
        match self {
            Opcode::Neutral(op) => Some(op),
            Opcode::Target(_) => None,
        }
    }

    /// The numeric value of the opcode in the shared namespace.
    pub fn raw(self) -> u32 {
        match self {
            Opcode::Neutral(op) => op.index(),
            Opcode::Target(op) => op.raw(),
        }
    }
}

impl From<NeutralOp> for Opcode {
    fn from(op: NeutralOp) -> Self {
        Opcode::Neutral(op)
    }
}

/// Resolves target opcode numbers to names for dumps and diagnostics.
pub trait OpcodeNames {
    fn target_op_name(&self, op: TargetOpcode) -> Option<&'static str>;

    fn opcode_name(&self, op: Opcode) -> String {
        match op {
            Opcode::Neutral(op) => op.name().to_string(),
            Opcode::Target(op) => self
                .target_op_name(op)
                .map(str::to_string)
                .unwrap_or_else(|| format!("target#{}", op.raw())),
        }
    }
}

/// Falls back to `target#N` for every target opcode.
pub struct NoTargetNames;

impl OpcodeNames for NoTargetNames {
    fn target_op_name(&self, _op: TargetOpcode) -> Option<&'static str> {
        None
    }
}

/// Integer comparison predicates for [`NeutralOp::SetCC`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CondCode {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl CondCode {
    pub fn is_signed(self) -> bool {
        matches!(self, CondCode::Lt | CondCode::Le | CondCode::Gt | CondCode::Ge)
    }
}

impl fmt::Display for CondCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CondCode::Eq => "eq",
            CondCode::Ne => "ne",
            CondCode::Lt => "lt",
            CondCode::Le => "le",
            CondCode::Gt => "gt",
            CondCode::Ge => "ge",
            CondCode::Ult => "ult",
            CondCode::Ule => "ule",
            CondCode::Ugt => "ugt",
            CondCode::Uge => "uge",
        };
        f.write_str(s)
    }
}
