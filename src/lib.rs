//! # stridescope - Memory-Access Stream Analysis for Loop Nests
//!
//! [![Crates.io](https://img.shields.io/crates/v/stridescope.svg)](https://crates.io/crates/stridescope)
//! [![Documentation](https://docs.rs/stridescope/badge.svg)](https://docs.rs/stridescope)
//! [![License: MIT](https://img.shields.io/badge/License-MIT-yellow.svg)](https://opensource.org/licenses/MIT)
//!
//! stridescope reconstructs, for every load and store inside an affine loop
//! nest, the symbolic address expression, synthesizes the full sequence of
//! addresses the access touches across all iterations, and computes the
//! statistical descriptors (stride runs, jump distribution, reuse distance,
//! cross-access overlap) used by cache models and autotuners.
//!
//! ## Pipeline
//!
//! ```text
//! Function + LoopNest → DefUseIndex → ReverseClosure → InductionExpressionSolver
//!                     → LoopBoundComposer → AddressStreamSynthesizer → StreamStatistics
//! ```
//!
//! - [`DefUseIndex`] - flat name→definer and name→users maps, built once
//!   per function
//! - [`ReverseClosure`] - backward closure from an address operand to its
//!   allocation site; classifies the access direct / indirect / constant
//! - [`InductionExpressionSolver`] - fixed-point dataflow expressing every
//!   closure-reachable value as an arithmetic chain on an induction variable
//! - [`analysis::bounds::compose`] - row-major (stride multiplier, modulus)
//!   composition of nested loop bounds, with symbolic-bound substitution
//! - [`AddressStreamSynthesizer`] - parallel enumeration of the iteration
//!   space into an ordered address stream
//! - [`stream::stats`] - stride-run, reuse-distance and cross-stream
//!   overlap analyzers
//! - [`DataFlowGraphExporter`] - forward def-use subgraph and opcode
//!   histogram for external visualization
//!
//! ## Quick Start
//!
//! ```rust
//! use stridescope::{
//!     AnalyzerOptions, Function, LoopLevel, LoopNest, NestAnalyzer, Opcode, Operand, Operation,
//! };
//!
//! # fn main() -> stridescope::Result<()> {
//! // for (i = 0; i < 8; i++) v = a[i];
//! let mut f = Function::new("kernel");
//! f.push(Operation::named("a", Opcode::Alloca, vec![]));
//! f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
//! let p = f.push(
//!     Operation::named(
//!         "p",
//!         Opcode::Index,
//!         vec![Operand::Name("a".into()), Operand::Name("i".into())],
//!     )
//!     .with_dims(vec![8]),
//! );
//! let v = f.push(Operation::named(
//!     "v",
//!     Opcode::Load,
//!     vec![Operand::Name("p".into())],
//! ));
//!
//! let nest = LoopNest::new(vec![LoopLevel::rectangular("i", 8)], vec![p, v]);
//! let analyzer = NestAnalyzer::new(AnalyzerOptions::default());
//! let report = analyzer.analyze(&f, &nest)?;
//!
//! assert_eq!(report.accesses.len(), 1);
//! assert_eq!(report.accesses[0].stream_len, Some(8));
//! # Ok(())
//! # }
//! ```
//!
//! ## Scope
//!
//! The front end (IR construction, CFG/dominance analysis, loop-bound
//! detection) is a collaborator: it supplies the [`Function`] operation
//! arena and [`LoopNest`] descriptors this crate consumes. The engine
//! assumes rectangular or near-rectangular affine nests with one induction
//! variable per level; an operator outside add/sub/mul/rem/and/shr in an
//! address chain aborts that access's stream with a warning.
//!
//! All derived quantities (scales, moduli, stride multipliers) are
//! integers; no floating-point arithmetic appears in address computation.
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the stridescope analyzer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod error;
pub mod graph;
pub mod ir;
pub mod stream;

// Re-export main types
pub use analysis::{
    AccessKind, AccessReport, AnalyzerOptions, ChainStep, ClosureResult, ComposedLevel,
    DefUseIndex, DerivedExpression, FunctionReport, InductionExpressionSolver, NestAnalyzer,
    NestReport, ReverseClosure,
};
pub use error::{Error, Result};
pub use graph::{DataFlowGraph, DataFlowGraphExporter, DotConfig, DotWriter, GraphSink};
pub use ir::{
    Bound, Function, InstructionCensus, LoopLevel, LoopNest, OpId, Opcode, Operand, Operation,
};
pub use stream::{
    match_streams, reuse_profile, stride_profile, AccessPlan, AddressStream,
    AddressStreamSynthesizer, MemberSpan, OverlapGroup, PlannedLevel, ReuseProfile, StrideProfile,
    SynthesisConfig,
};
