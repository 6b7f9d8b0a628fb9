//! # VideoCore target lowering
//!
//! Rewrites the architecture-neutral selection graph of one function into a graph
//! that uses only operations and value kinds the VideoCore backend can select:
//!
//! 1. Formal parameters are materialized at their incoming locations.
//! 2. Every node reachable from an exit is legalized, operands first, by keeping
//!    it, promoting it, expanding it or replacing it with a target sequence.
//! 3. Every exit is replaced by the target's return sequence and marker.
//!
//! The graph is append-only: lowering adds replacement nodes and moves the exits,
//! and original nodes that are no longer reachable are simply left behind.

pub mod arguments;
pub mod catalog;
pub mod config;
pub mod context;
pub mod convention;
pub mod error;
pub mod legalize;
pub mod returns;
pub mod target;

#[cfg(test)]
mod tests;

pub use catalog::VideocoreOp;
pub use config::{ConfigError, ConventionConfig, TargetConfig, VariadicPolicy, WidePolicy};
pub use context::LoweringContext;
pub use convention::{ArgLocation, CallingConvention, ConventionState, LocationDescriptor, RegClass, ReturnPlan};
pub use error::{LoweringError, ValuePosition};
pub use legalize::Action;
pub use target::{create_target_lowering, TargetLowering, TargetNames, VideocoreLowering};

use vcore_dag::{FunctionSignature, Graph, GraphStage, NodeId, Operand};

/// What one run of [`lower_function`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweringSummary {
    /// The materialized value of each formal parameter, in order.
    pub arguments: Vec<Operand>,
    /// The return marker of each exit, in exit order.
    pub return_markers: Vec<NodeId>,
    /// Original nodes that were replaced.
    pub rewritten: usize,
    /// Nodes appended to the graph.
    pub created: usize,
}

/// Lowers `graph`, the body of `signature`, for `target`.
///
/// Running it again on an already lowered graph finds nothing to change.
///
/// # Panics
///
/// Panics if the graph is malformed (see [`Graph::validate`]), if an exit returns
/// a different number of values than the signature declares, or if a strategy
/// re-emits the very operation it is lowering. These are compiler defects, not
/// input errors.
pub fn lower_function(
    graph: &mut Graph,
    signature: &FunctionSignature,
    target: &dyn TargetLowering,
) -> Result<LoweringSummary, LoweringError> {
    if let Err(err) = graph.validate() {
        panic!("cannot lower `{}`: {}", signature.name, err);
    }
    let first_run = graph.stage() == GraphStage::Neutral;
    log::debug!(
        "Lowering `{}` for {} ({} nodes, {} exits, {:?})",
        signature.name,
        target.name(),
        graph.len(),
        graph.exits().len(),
        graph.stage()
    );

    let mut ctx = LoweringContext::new(graph, signature, target);
    if first_run {
        target.lower_arguments(&mut ctx)?;
    }

    let exits = ctx.graph().exits().to_vec();
    for exit in &exits {
        ctx.run_from(*exit)?;
    }
    let return_markers: Vec<NodeId> = exits.iter().map(|exit| ctx.replacement_node(*exit)).collect();

    let arguments = ctx.arguments.take();
    let (rewritten, created) = (ctx.rewritten, ctx.created);
    drop(ctx);

    graph.set_exits(return_markers.clone());
    if let Some(arguments) = arguments {
        graph.set_arguments(arguments);
    }
    graph.set_stage(GraphStage::Lowered);
    if let Err(err) = graph.validate() {
        panic!("lowering `{}` produced a malformed graph: {}", signature.name, err);
    }

    log::debug!(
        "Lowered `{}`: {} nodes rewritten, {} created, frame {} bytes",
        signature.name,
        rewritten,
        created,
        graph.frame().stack_size
    );
    Ok(LoweringSummary {
        arguments: graph.arguments().to_vec(),
        return_markers,
        rewritten,
        created,
    })
}
