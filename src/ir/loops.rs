//! Loop-nest descriptors supplied by the front-end loop analyzer.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ir::OpId;

/// A loop bound value: a compile-time constant or a symbolic reference to
/// an outer loop's induction variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    /// Known integer value
    Const(i64),
    /// Reference to an ancestor level's induction variable
    Symbolic(String),
}

/// One nesting level of a loop nest
///
/// Created fresh per loop-nest traversal and discarded after its stream is
/// synthesized. `limit` is the final induction-variable value (exclusive
/// upper bound for an upward-counting loop).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopLevel {
    /// Induction-variable name (one per level)
    pub ind_var: String,
    /// Initial induction-variable value
    pub initial: Bound,
    /// Final induction-variable value
    pub limit: Bound,
    /// Per-iteration step
    pub step: Bound,
}

impl LoopLevel {
    /// A canonical `for (v = 0; v < limit; v++)` level
    pub fn rectangular(ind_var: impl Into<String>, limit: i64) -> Self {
        Self {
            ind_var: ind_var.into(),
            initial: Bound::Const(0),
            limit: Bound::Const(limit),
            step: Bound::Const(1),
        }
    }

    /// Admissibility check on the descriptor: the induction variable must be
    /// named, the step a non-zero constant, and a constant limit positive.
    ///
    /// This is the descriptor-level subset of the loop admissibility rules;
    /// structural checks (single exit, header-exiting form) belong to the
    /// front-end loop analyzer.
    pub fn validate(&self) -> Result<()> {
        if self.ind_var.is_empty() {
            return Err(Error::InvalidLoopBound {
                var: String::new(),
                reason: "level has no induction variable".into(),
            });
        }
        match self.step {
            Bound::Const(0) => {
                return Err(Error::InvalidLoopBound {
                    var: self.ind_var.clone(),
                    reason: "step is zero".into(),
                })
            }
            Bound::Symbolic(_) => {
                return Err(Error::InvalidLoopBound {
                    var: self.ind_var.clone(),
                    reason: "step must be a constant".into(),
                })
            }
            Bound::Const(_) => {}
        }
        if let Bound::Const(limit) = self.limit {
            if limit <= 0 {
                return Err(Error::InvalidLoopBound {
                    var: self.ind_var.clone(),
                    reason: format!("limit {limit} yields an empty iteration space"),
                });
            }
        }
        Ok(())
    }
}

/// A loop nest: levels outer-to-inner plus the body operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopNest {
    /// Levels from outermost to innermost
    pub levels: Vec<LoopLevel>,
    /// Ids of the operations in the nest body, in program order
    pub body: Vec<OpId>,
}

impl LoopNest {
    /// Create a nest from levels and body operation ids
    pub fn new(levels: Vec<LoopLevel>, body: Vec<OpId>) -> Self {
        Self { levels, body }
    }

    /// Validate every level and check that symbolic bounds only reference
    /// ancestor levels of the same nest
    pub fn validate(&self) -> Result<()> {
        for (depth, level) in self.levels.iter().enumerate() {
            level.validate()?;
            for bound in [&level.initial, &level.limit] {
                if let Bound::Symbolic(referenced) = bound {
                    let ancestor = self.levels[..depth]
                        .iter()
                        .any(|outer| outer.ind_var == *referenced);
                    if !ancestor {
                        return Err(Error::UnresolvedBoundReference {
                            var: level.ind_var.clone(),
                            referenced: referenced.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
