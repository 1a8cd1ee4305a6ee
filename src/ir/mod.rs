//! # Intermediate Representation Surface
//!
//! The data the (out-of-scope) front end hands to the analyzer: a flat
//! arena of operations per function, and per-nest loop descriptors with
//! constant-or-symbolic bounds. Operations are addressed by stable [`OpId`]
//! indices rather than references, so the whole model is trivially
//! cloneable and shareable across worker threads.

pub mod loops;
pub mod operation;

pub use loops::{Bound, LoopLevel, LoopNest};
pub use operation::{Function, InstructionCensus, OpId, Opcode, Operand, Operation};
