//! VideoCore selection graph
//!
//! This crate defines the graph-structured, architecture-neutral representation of
//! one function that the target lowering layer (`vcore-lower`) rewrites, together
//! with the pieces shared by producers and consumers of that graph: value kinds,
//! the opcode namespace, function signatures and graph validation.

pub mod builder;
pub mod error;
pub mod graph;
pub mod kind;
pub mod node;
pub mod opcode;
pub mod signature;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{port, FrameInfo, Graph, GraphStage};
pub use kind::ValueKind;
pub use node::{Node, NodeAttr, NodeId, Operand, PhysReg, PortIndex, SourceLoc};
pub use opcode::{CondCode, NeutralOp, NoTargetNames, Opcode, OpcodeNames, TargetOpcode, BUILTIN_OP_END};
pub use signature::FunctionSignature;
