//! The target capability interface and the VideoCore implementation of it.

use vcore_dag::{NeutralOp, Node, NodeId, OpcodeNames, Operand, TargetOpcode, ValueKind};

use crate::arguments;
use crate::catalog::VideocoreOp;
use crate::config::{ConfigError, TargetConfig};
use crate::context::LoweringContext;
use crate::convention::CallingConvention;
use crate::error::LoweringError;
use crate::legalize::{self, Action};
use crate::returns;

/// What a backend target provides to the lowering driver.
///
/// Implementations are immutable tables plus strategies; all per-function state
/// lives in the [`LoweringContext`], so one target value can serve any number of
/// functions concurrently.
pub trait TargetLowering: Send + Sync {
    fn name(&self) -> &'static str;

    fn convention(&self) -> &CallingConvention;

    /// Name of one of this target's opcodes, for dumps and diagnostics.
    fn target_op_name(&self, op: TargetOpcode) -> Option<&'static str>;

    /// The action the target takes for a neutral opcode at a given kind, or `None`
    /// if it has no strategy for it.
    fn action(&self, op: NeutralOp, kind: ValueKind) -> Option<Action>;

    /// Materializes every formal parameter at its incoming location, chained from
    /// the entry token.
    fn lower_arguments(&self, ctx: &mut LoweringContext<'_>) -> Result<(), LoweringError>;

    /// Replaces one exit with the target's return sequence and marker. `operands`
    /// are the already lowered operands of the exit: chain first, then the values.
    fn lower_return(
        &self,
        ctx: &mut LoweringContext<'_>,
        exit: &Node,
        operands: Vec<Operand>,
    ) -> Result<NodeId, LoweringError>;

    /// Lowers one neutral node whose operands are already lowered, returning the
    /// replacement value of each of its result ports.
    fn legalize(
        &self,
        ctx: &mut LoweringContext<'_>,
        id: NodeId,
        node: &Node,
        operands: Vec<Operand>,
    ) -> Result<Vec<Operand>, LoweringError>;
}

/// Opcode naming through a target.
pub struct TargetNames<'a>(pub &'a dyn TargetLowering);

impl OpcodeNames for TargetNames<'_> {
    fn target_op_name(&self, op: TargetOpcode) -> Option<&'static str> {
        self.0.target_op_name(op)
    }
}

/// Lowering for the VideoCore IV scalar core.
#[derive(Debug, Clone, Default)]
pub struct VideocoreLowering {
    convention: CallingConvention,
}

impl VideocoreLowering {
    pub fn new(convention: CallingConvention) -> Self {
        VideocoreLowering { convention }
    }
}

impl TargetLowering for VideocoreLowering {
    fn name(&self) -> &'static str {
        "videocore"
    }

    fn convention(&self) -> &CallingConvention {
        &self.convention
    }

    fn target_op_name(&self, op: TargetOpcode) -> Option<&'static str> {
        VideocoreOp::from_target_opcode(op).map(VideocoreOp::name)
    }

    fn action(&self, op: NeutralOp, kind: ValueKind) -> Option<Action> {
        legalize::videocore_action(op, kind)
    }

    fn lower_arguments(&self, ctx: &mut LoweringContext<'_>) -> Result<(), LoweringError> {
        arguments::lower_formal_arguments(ctx)
    }

    fn lower_return(
        &self,
        ctx: &mut LoweringContext<'_>,
        exit: &Node,
        operands: Vec<Operand>,
    ) -> Result<NodeId, LoweringError> {
        returns::lower_return(ctx, exit, operands)
    }

    fn legalize(
        &self,
        ctx: &mut LoweringContext<'_>,
        id: NodeId,
        node: &Node,
        operands: Vec<Operand>,
    ) -> Result<Vec<Operand>, LoweringError> {
        legalize::legalize_node(self, ctx, id, node, operands)
    }
}

/// Creates the lowering for the configured target.
pub fn create_target_lowering(config: &TargetConfig) -> Result<Box<dyn TargetLowering>, ConfigError> {
    match config.target.as_str() {
        "videocore" | "vc4" => {
            let convention = CallingConvention::from_config(&config.convention)?;
            log::debug!("Created videocore lowering with {:?}", convention);
            Ok(Box::new(VideocoreLowering::new(convention)))
        }
        other => Err(ConfigError::UnknownTarget(other.to_string())),
    }
}
