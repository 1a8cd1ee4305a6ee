//! # Reverse Closure
//!
//! Backward reachability from a memory operation's address operand to its
//! allocation site. The closure classifies the access (loop-affine,
//! indirect, or loop-invariant) and collects the multi-dimensional index
//! factors needed later to fold array indices into flat offsets.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::analysis::def_use::DefUseIndex;
use crate::error::{Error, Result};
use crate::ir::{Function, OpId, Opcode};

/// Classification of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    /// Address is an affine function of loop induction variables
    Direct,
    /// Address depends on another computed value (gather/scatter)
    Indirect,
    /// Loop-invariant address
    Constant,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccessKind::Direct => "direct",
            AccessKind::Indirect => "indirect",
            AccessKind::Constant => "constant",
        })
    }
}

/// Outcome of tracing one memory access backward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureResult {
    /// Allocation site the address chain terminates at; `None` means the
    /// access is not analyzable and the caller discards it
    pub allocation: Option<String>,
    /// Access classification; meaningful only when an allocation was found
    /// or the indirect flag fired
    pub kind: AccessKind,
    /// Reachable value names in discovery (enqueue) order. This order later
    /// becomes the priority order for matching induction variables, so it is
    /// deterministic for a given input graph.
    pub visited_names: Vec<String>,
    /// Per induction variable, the array-dimension sizes to the right of the
    /// index dimension it feeds; the product folds the index into a flat
    /// row-major offset
    pub index_factors: HashMap<String, Vec<i64>>,
    /// Number of phi nodes reached while tracing
    pub phi_ancestors: usize,
}

impl ClosureResult {
    /// True when the closure terminated at an allocation site
    pub fn is_analyzable(&self) -> bool {
        self.allocation.is_some()
    }
}

/// Backward data-flow closure over a function's def-use graph
///
/// Holds only borrowed, read-only state; the def-use index is never
/// mutated.
pub struct ReverseClosure<'a> {
    function: &'a Function,
    index: &'a DefUseIndex,
    loop_prefix: &'a str,
}

impl<'a> ReverseClosure<'a> {
    /// Create a closure tracer
    ///
    /// `loop_prefix` is the reserved prefix of loop-housekeeping names
    /// (block labels, exit conditions); operands carrying it are never part
    /// of an address computation and are skipped.
    pub fn new(function: &'a Function, index: &'a DefUseIndex, loop_prefix: &'a str) -> Self {
        Self {
            function,
            index,
            loop_prefix,
        }
    }

    /// Trace the access at `access` backward from its address operand
    ///
    /// `memo` maps names of previously analyzed accesses in the same nest to
    /// their classification; reaching one of them means the address depends
    /// on an earlier computed stream, which classifies this access indirect
    /// and stops the traversal early.
    pub fn trace(&self, access: OpId, memo: &HashMap<String, AccessKind>) -> Result<ClosureResult> {
        let op = self.function.op(access);
        let Some(address) = op.address_operand() else {
            return Err(Error::NotMemoryAccess {
                opcode: op.opcode.mnemonic().into(),
            });
        };

        let mut result = ClosureResult {
            allocation: None,
            kind: AccessKind::Constant,
            visited_names: Vec::new(),
            index_factors: HashMap::new(),
            phi_ancestors: 0,
        };

        // A literal-constant address never reaches an allocation site.
        let Some(root) = address.name() else {
            return Ok(result);
        };

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        queue.push_back(root.to_string());
        seen.insert(root.to_string());
        result.visited_names.push(root.to_string());

        let mut indirect = false;
        while let Some(name) = queue.pop_front() {
            if memo.contains_key(&name) {
                // Address depends on a previously computed access stream.
                indirect = true;
                break;
            }
            let Some(def) = self.index.def(&name) else {
                // The operand chain exits the function's known names.
                tracing::debug!(name = %name, "closure reached an undefined name");
                result.allocation = None;
                return Ok(result);
            };
            let def_op = self.function.op(def);

            match def_op.opcode {
                Opcode::Alloca => match &result.allocation {
                    Some(existing) if *existing != name => {
                        // Two distinct allocation sites feed one address;
                        // no single base stream can describe the access.
                        indirect = true;
                    }
                    _ => result.allocation = Some(name.clone()),
                },
                Opcode::Phi => result.phi_ancestors += 1,
                Opcode::Index => self.collect_index_factors(def, &mut result)?,
                _ => {}
            }

            for operand in &def_op.operands {
                let Some(next) = operand.name() else { continue };
                if next.starts_with(self.loop_prefix) {
                    continue;
                }
                if seen.insert(next.to_string()) {
                    queue.push_back(next.to_string());
                    result.visited_names.push(next.to_string());
                }
            }
        }

        result.kind = if indirect {
            AccessKind::Indirect
        } else if result.phi_ancestors > 0 {
            AccessKind::Direct
        } else {
            AccessKind::Constant
        };
        if result.allocation.is_none() && !indirect {
            // Classification failure; the kind field is not meaningful.
            result.kind = AccessKind::Constant;
        }
        Ok(result)
    }

    /// Attribute the dimension sizes of an indexing operation to the
    /// induction variables feeding its index operands
    ///
    /// Operand 0 is the indexed aggregate; operand `p + 1` indexes dimension
    /// `p` and contributes the sizes of the dimensions to its right.
    fn collect_index_factors(&self, index_op: OpId, result: &mut ClosureResult) -> Result<()> {
        let op = self.function.op(index_op);
        if op.dims.is_empty() {
            return Err(Error::NonAffineDimension {
                name: op.name.clone().unwrap_or_else(|| format!("#{index_op}")),
            });
        }
        for (dim, operand) in op.operands.iter().skip(1).enumerate() {
            let Some(idx_name) = operand.name() else { continue };
            let Some(ind_var) = self.induction_source(idx_name) else {
                continue;
            };
            let factors = &op.dims[(dim + 1).min(op.dims.len())..];
            result
                .index_factors
                .entry(ind_var)
                .or_default()
                .extend_from_slice(factors);
        }
        Ok(())
    }

    /// Short secondary backward trace resolving which induction variable
    /// feeds an index operand; stops at the first phi found
    fn induction_source(&self, start: &str) -> Option<String> {
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        queue.push_back(start.to_string());
        seen.insert(start.to_string());

        while let Some(name) = queue.pop_front() {
            let def = self.index.def(&name)?;
            let def_op = self.function.op(def);
            if def_op.opcode == Opcode::Phi {
                return Some(name);
            }
            for operand in &def_op.operands {
                let Some(next) = operand.name() else { continue };
                if next.starts_with(self.loop_prefix) {
                    continue;
                }
                if seen.insert(next.to_string()) {
                    queue.push_back(next.to_string());
                }
            }
        }
        None
    }
}
