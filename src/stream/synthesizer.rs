//! # Address Stream Synthesis
//!
//! Enumerates the iteration space of a composed loop nest and evaluates the
//! recovered index expression at every point, producing the ordered address
//! sequence the access would touch. The enumeration is embarrassingly
//! parallel and fans out to a rayon pool; everything the workers read is
//! frozen before the fan-out and the per-worker buffers are concatenated in
//! chunk order, so the result is identical to a sequential enumeration.

use serde::{Deserialize, Serialize};

use crate::analysis::bounds::ComposedLevel;
use crate::analysis::induction::DerivedExpression;
use crate::error::{Error, Result};
use crate::ir::Opcode;

/// Configuration for parallel synthesis
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Number of worker threads (default: num_cpus)
    pub workers: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

/// One loop level as seen by a single access: the composed bounds plus the
/// matched derived expression and its hidden multi-dimensional factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedLevel {
    /// Composed stride multiplier and modulus of the level
    pub level: ComposedLevel,
    /// Derived expression driving this access at this level, if any; a
    /// level with no match contributes nothing to the address
    pub expression: Option<DerivedExpression>,
    /// Product of the array-dimension sizes folded into this level's index
    pub hidden_factor: i64,
}

/// The full per-access evaluation plan, frozen before worker fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPlan {
    /// Levels outer-to-inner
    pub levels: Vec<PlannedLevel>,
}

impl AccessPlan {
    /// Total number of iteration points (product of level moduli)
    pub fn total_iterations(&self) -> u64 {
        self.levels
            .iter()
            .map(|p| p.level.modulus as u64)
            .product()
    }
}

/// A synthesized address stream for one access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressStream {
    /// Composite name: `function;allocation;kind`
    pub name: String,
    /// One address per enumerated iteration, in iteration order
    pub addresses: Vec<i64>,
}

/// Iteration-space enumerator
pub struct AddressStreamSynthesizer {
    config: SynthesisConfig,
}

impl AddressStreamSynthesizer {
    /// Create a synthesizer with the given configuration
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Enumerate the whole iteration space in parallel
    ///
    /// The range `[0, total)` is split into equal contiguous chunks, one per
    /// worker; each worker fills a private buffer and the buffers are
    /// concatenated in chunk order. The output is element-for-element equal
    /// to [`synthesize_serial`](Self::synthesize_serial).
    pub fn synthesize(&self, name: impl Into<String>, plan: &AccessPlan) -> Result<AddressStream> {
        let name = name.into();
        let total = plan.total_iterations();

        // Small spaces and single-worker configs skip the pool entirely.
        let workers = self.config.workers.max(1);
        if workers == 1 || total <= workers as u64 {
            return Ok(AddressStream {
                addresses: evaluate_range(plan, 0, total, &name)?,
                name,
            });
        }

        let chunk = total.div_ceil(workers as u64);
        let ranges: Vec<(u64, u64)> = (0..workers as u64)
            .map(|w| (w * chunk, ((w + 1) * chunk).min(total)))
            .filter(|(start, end)| start < end)
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        // collect() preserves the input order of the parallel iterator, so
        // the concatenation below is in chunk order.
        let buffers: Vec<Vec<i64>> = pool.install(|| {
            use rayon::prelude::*;
            ranges
                .par_iter()
                .map(|&(start, end)| evaluate_range(plan, start, end, &name))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut addresses = Vec::with_capacity(total as usize);
        for buffer in buffers {
            addresses.extend(buffer);
        }
        Ok(AddressStream { name, addresses })
    }

    /// Single-threaded enumeration over the same range
    pub fn synthesize_serial(
        &self,
        name: impl Into<String>,
        plan: &AccessPlan,
    ) -> Result<AddressStream> {
        let name = name.into();
        let total = plan.total_iterations();
        Ok(AddressStream {
            addresses: evaluate_range(plan, 0, total, &name)?,
            name,
        })
    }
}

/// Evaluate the plan for every iteration counter in `[start, end)`
fn evaluate_range(plan: &AccessPlan, start: u64, end: u64, context: &str) -> Result<Vec<i64>> {
    let mut out = Vec::with_capacity((end - start) as usize);
    for counter in start..end {
        let mut address = 0i64;
        for planned in &plan.levels {
            let Some(expr) = &planned.expression else {
                continue;
            };
            let index =
                (counter / planned.level.stride_multiplier as u64) % planned.level.modulus as u64;
            address += evaluate_chain(expr, index as i64, context)? * planned.hidden_factor;
        }
        out.push(address);
    }
    Ok(out)
}

/// Apply the scale-chain steps in recorded order, then the modulus list
pub fn evaluate_chain(expr: &DerivedExpression, index: i64, context: &str) -> Result<i64> {
    let mut value = index;
    for step in &expr.chain {
        value = match step.opcode {
            Opcode::Mul => value.wrapping_mul(step.value),
            Opcode::Add => value.wrapping_add(step.value),
            Opcode::Sub => value.wrapping_sub(step.value),
            Opcode::And => value & step.value,
            Opcode::Shr => value >> (step.value & 63),
            opcode => {
                return Err(Error::UnsupportedOperator {
                    opcode: opcode.mnemonic().into(),
                    context: context.into(),
                })
            }
        };
    }
    for &m in &expr.moduli {
        if m == 0 {
            return Err(Error::internal(format!(
                "zero modulus in scale chain for {context}"
            )));
        }
        value %= m;
    }
    Ok(value)
}
