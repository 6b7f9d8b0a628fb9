//! Error types for target lowering.
//!
//! Only two conditions are reported as errors, and both are fatal to the current
//! compilation unit: a calling-convention rule is missing, or a legalization
//! strategy is missing. Both are gaps in the target description, never transient.
//! Inconsistencies in the graph itself (cycles, dangling references, return arity
//! mismatches) are defects in the compiler and abort through `panic!`.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;
use vcore_dag::ValueKind;

/// Which declared value of a signature a convention lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuePosition {
    Parameter(u32),
    Result(u32),
}

impl fmt::Display for ValuePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePosition::Parameter(index) => write!(f, "parameter {}", index),
            ValuePosition::Result(index) => write!(f, "result {}", index),
        }
    }
}

/// Represents errors that can occur while lowering one function for a target.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// The calling convention table has no rule placing a value of this kind
    /// (or no room for it in the result registers).
    #[error("Calling convention has no location for {position} of `{function}` (kind {kind})")]
    #[diagnostic(
        code(vcore_lower::convention_gap),
        help("the calling convention table must cover every value kind the target accepts in signatures")
    )]
    ConventionGap {
        function: String,
        position: ValuePosition,
        kind: ValueKind,
    },

    /// The dispatcher met an architecture-neutral operation the target has no
    /// rewrite strategy for.
    #[error("No legalization strategy for {opcode} on {kind} in `{function}`")]
    #[diagnostic(
        code(vcore_lower::legalization_gap),
        help("register an action for this opcode and kind in the target's legalization table")
    )]
    LegalizationGap {
        function: String,
        opcode: String,
        kind: ValueKind,
    },
}

impl LoweringError {
    pub fn convention_gap(function: impl Into<String>, position: ValuePosition, kind: ValueKind) -> Self {
        LoweringError::ConventionGap { function: function.into(), position, kind }
    }

    pub fn legalization_gap(function: impl Into<String>, opcode: impl Into<String>, kind: ValueKind) -> Self {
        LoweringError::LegalizationGap { function: function.into(), opcode: opcode.into(), kind }
    }
}
