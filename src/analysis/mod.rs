//! # Access Analysis
//!
//! The address-recovery pipeline: def/use indexing, backward closure and
//! classification, derived-induction solving, and loop-bound composition,
//! driven per loop nest by [`NestAnalyzer`].
//!
//! ## Usage
//!
//! ```ignore
//! use stridescope::{NestAnalyzer, AnalyzerOptions};
//!
//! let analyzer = NestAnalyzer::new(AnalyzerOptions::default());
//! let report = analyzer.analyze(&function, &nest)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod bounds;
pub mod closure;
pub mod def_use;
pub mod induction;

pub use bounds::{compose, ComposedLevel};
pub use closure::{AccessKind, ClosureResult, ReverseClosure};
pub use def_use::DefUseIndex;
pub use induction::{ChainStep, DerivedExpression, InductionExpressionSolver};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ir::{Function, InstructionCensus, LoopNest, OpId};
use crate::stream::{
    match_streams, reuse_profile, stride_profile, AccessPlan, AddressStream,
    AddressStreamSynthesizer, OverlapGroup, PlannedLevel, ReuseProfile, StrideProfile,
    SynthesisConfig,
};

/// Analyzer options
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Reserved prefix of loop-housekeeping names, never part of an address
    /// computation (default: "for")
    pub loop_prefix: String,
    /// Naming convention of the loop's own step computation, excluded from
    /// derived chains (default: "inc")
    pub increment_prefix: String,
    /// Worker threads for stream synthesis (default: num_cpus)
    pub workers: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            loop_prefix: "for".into(),
            increment_prefix: "inc".into(),
            workers: num_cpus::get(),
        }
    }
}

/// Per-access analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessReport {
    /// Id of the load/store operation
    pub op: OpId,
    /// Composite stream name: `function;allocation;kind`
    pub stream_name: String,
    /// Allocation site the address resolves to
    pub allocation: Option<String>,
    /// Access classification
    pub kind: AccessKind,
    /// Closure-reachable names in discovery order
    pub visited_names: Vec<String>,
    /// Length of the synthesized stream (direct accesses only)
    pub stream_len: Option<usize>,
    /// Stride-run/jump profile (direct accesses only)
    pub stride: Option<StrideProfile>,
    /// Reuse-distance profile (direct accesses only)
    pub reuse: Option<ReuseProfile>,
}

/// Analysis result for one loop nest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestReport {
    /// Enclosing function name
    pub function: String,
    /// Function-level instruction census
    pub census: InstructionCensus,
    /// One report per analyzable memory access, in program order
    pub accesses: Vec<AccessReport>,
    /// Overlap groups across the nest's synthesized streams
    pub overlaps: Vec<OverlapGroup>,
    /// Non-fatal conditions encountered (skipped accesses, aborted streams)
    pub warnings: Vec<String>,
}

/// Analysis result for a whole function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionReport {
    /// Function name
    pub function: String,
    /// Instruction census
    pub census: InstructionCensus,
    /// One report per admissible nest
    pub nests: Vec<NestReport>,
    /// Inadmissible nests skipped, with the reason
    pub warnings: Vec<String>,
}

/// Memory-access analyzer for affine loop nests
///
/// All per-nest state (the classification memo among it) lives in the
/// `analyze` invocation: repeated or concurrent runs are independent.
pub struct NestAnalyzer {
    options: AnalyzerOptions,
}

impl NestAnalyzer {
    /// Create an analyzer with the given options
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// Analyze one loop nest of a function
    ///
    /// Unanalyzable accesses are skipped with a warning; a non-affine
    /// dimension type aborts the whole nest.
    pub fn analyze(&self, function: &Function, nest: &LoopNest) -> Result<NestReport> {
        nest.validate()?;
        let composed = bounds::compose(&nest.levels)?;
        let index = DefUseIndex::build(function);
        let closure = ReverseClosure::new(function, &index, &self.options.loop_prefix);
        let solver = InductionExpressionSolver::new(function, &self.options.increment_prefix);
        let synthesizer = AddressStreamSynthesizer::new(SynthesisConfig {
            workers: self.options.workers,
        });

        // Cleared-by-construction classification memo; entries never
        // survive into another nest's analysis.
        let mut memo: HashMap<String, AccessKind> = HashMap::new();
        let mut streams: Vec<AddressStream> = Vec::new();
        let mut accesses: Vec<AccessReport> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        for &id in &nest.body {
            let op = function.op(id);
            if !op.opcode.is_memory_access() {
                continue;
            }
            let result = closure.trace(id, &memo)?;
            if !result.is_analyzable() && result.kind != AccessKind::Indirect {
                tracing::debug!(op = id, "access not analyzable, skipped");
                warnings.push(format!("access #{id}: no allocation reachable, skipped"));
                continue;
            }
            if let Some(name) = &op.name {
                memo.insert(name.clone(), result.kind);
            }

            let stream_name = format!(
                "{};{};{}",
                function.name,
                result.allocation.as_deref().unwrap_or("?"),
                result.kind
            );
            let mut report = AccessReport {
                op: id,
                stream_name: stream_name.clone(),
                allocation: result.allocation.clone(),
                kind: result.kind,
                visited_names: result.visited_names.clone(),
                stream_len: None,
                stride: None,
                reuse: None,
            };

            if result.kind == AccessKind::Direct {
                let plan = self.plan_access(&solver, nest, &composed, &result);
                match synthesizer.synthesize(&stream_name, &plan) {
                    Ok(stream) => {
                        report.stream_len = Some(stream.addresses.len());
                        report.stride = Some(stride_profile(&stream.addresses));
                        report.reuse = Some(reuse_profile(&stream.addresses));
                        streams.push(stream);
                    }
                    Err(e @ Error::UnsupportedOperator { .. }) => {
                        tracing::warn!(op = id, error = %e, "stream synthesis aborted");
                        warnings.push(format!("access #{id}: {e}"));
                    }
                    Err(e) => return Err(e),
                }
            }
            accesses.push(report);
        }

        Ok(NestReport {
            function: function.name.clone(),
            census: function.census(),
            accesses,
            overlaps: match_streams(&streams),
            warnings,
        })
    }

    /// Analyze every nest of a function, skipping inadmissible ones
    pub fn analyze_function(
        &self,
        function: &Function,
        nests: &[LoopNest],
    ) -> Result<FunctionReport> {
        let mut reports = Vec::new();
        let mut warnings = Vec::new();
        for (n, nest) in nests.iter().enumerate() {
            if let Err(e) = nest.validate() {
                tracing::warn!(nest = n, error = %e, "inadmissible nest skipped");
                warnings.push(format!("nest #{n}: {e}"));
                continue;
            }
            reports.push(self.analyze(function, nest)?);
        }
        Ok(FunctionReport {
            function: function.name.clone(),
            census: function.census(),
            nests: reports,
            warnings,
        })
    }

    /// Build the frozen evaluation plan for one direct access
    ///
    /// Each level is solved with its own induction variable as the seed;
    /// the first visited name (discovery order) with a derived expression
    /// at that level is the match, and the level's hidden factor is the
    /// product of the access's index factors for that induction variable.
    fn plan_access(
        &self,
        solver: &InductionExpressionSolver<'_>,
        nest: &LoopNest,
        composed: &[ComposedLevel],
        result: &ClosureResult,
    ) -> AccessPlan {
        let mut levels = Vec::with_capacity(composed.len());
        for level in composed {
            let map = solver.solve(&nest.body, &level.ind_var, &result.visited_names);
            let expression = result
                .visited_names
                .iter()
                .find_map(|name| map.get(name))
                .cloned();
            let hidden_factor = result
                .index_factors
                .get(&level.ind_var)
                .map(|dims| dims.iter().product())
                .unwrap_or(1);
            levels.push(PlannedLevel {
                level: level.clone(),
                expression,
                hidden_factor,
            });
        }
        AccessPlan { levels }
    }
}

impl Default for NestAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerOptions::default())
    }
}
