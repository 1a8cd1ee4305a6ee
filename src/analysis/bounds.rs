//! # Loop Bound Composition
//!
//! Turns a list of per-level loop bounds into per-level (stride multiplier,
//! modulus) pairs for row-major address linearization. Symbolic bounds are
//! substituted from their referenced ancestor level before composing; a
//! dangling reference or a reference cycle is reported, never silently
//! resolved.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ir::{Bound, LoopLevel};

/// One composed nesting level, ready for iteration-space enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedLevel {
    /// Induction-variable name of the level
    pub ind_var: String,
    /// Product of all inner levels' limits
    pub stride_multiplier: i64,
    /// The level's own limit
    pub modulus: i64,
}

/// Compose levels (outer-to-inner) into stride multipliers and moduli
///
/// This is exact only for rectangular iteration spaces; data-dependent
/// bounds never reach this point (they are flagged indirect upstream).
pub fn compose(levels: &[LoopLevel]) -> Result<Vec<ComposedLevel>> {
    let resolved = resolve_limits(levels)?;

    let mut composed = Vec::with_capacity(levels.len());
    for (depth, level) in levels.iter().enumerate() {
        let modulus = resolved[depth];
        if modulus <= 0 {
            return Err(Error::InvalidLoopBound {
                var: level.ind_var.clone(),
                reason: format!("resolved limit {modulus} yields an empty iteration space"),
            });
        }
        let stride_multiplier = resolved[depth + 1..].iter().product();
        composed.push(ComposedLevel {
            ind_var: level.ind_var.clone(),
            stride_multiplier,
            modulus,
        });
    }
    Ok(composed)
}

/// Substitute symbolic limits from ancestor levels, detecting cycles
fn resolve_limits(levels: &[LoopLevel]) -> Result<Vec<i64>> {
    let mut resolved: Vec<Option<i64>> = levels
        .iter()
        .map(|level| match level.limit {
            Bound::Const(v) => Some(v),
            Bound::Symbolic(_) => None,
        })
        .collect();

    // Each pass resolves at least one level or the reference graph has a
    // cycle; `levels.len()` passes are therefore enough.
    for _ in 0..levels.len() {
        let mut progressed = false;
        for (depth, level) in levels.iter().enumerate() {
            if resolved[depth].is_some() {
                continue;
            }
            let Bound::Symbolic(referenced) = &level.limit else {
                continue;
            };
            let Some(target) = levels.iter().position(|l| l.ind_var == *referenced) else {
                return Err(Error::UnresolvedBoundReference {
                    var: level.ind_var.clone(),
                    referenced: referenced.clone(),
                });
            };
            if let Some(value) = resolved[target] {
                resolved[depth] = Some(value);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    resolved
        .into_iter()
        .zip(levels)
        .map(|(value, level)| {
            value.ok_or_else(|| Error::BoundReferenceCycle {
                var: level.ind_var.clone(),
            })
        })
        .collect()
}
