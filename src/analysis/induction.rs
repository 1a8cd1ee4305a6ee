//! # Derived Induction Expressions
//!
//! Fixed-point dataflow expressing every closure-reachable value as an
//! arithmetic chain rooted at a loop's induction variable. The chain keeps
//! (operator, constant) steps in discovery order; modulo contributions are
//! accumulated separately because they bound the value rather than scale it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ir::{Function, OpId, Opcode};

/// One step of a scale chain: apply `opcode` with `value` as the constant
/// operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Operator applied at this step
    pub opcode: Opcode,
    /// Constant operand of the step
    pub value: i64,
}

/// A value expressed as a chain of operations on a base induction variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedExpression {
    /// Name of the base induction variable
    pub base: String,
    /// Scale-chain steps, applied cumulatively in recorded order
    pub chain: Vec<ChainStep>,
    /// Modulus contributions, applied after the chain
    pub moduli: Vec<i64>,
}

impl DerivedExpression {
    /// The identity expression: the induction variable itself
    pub fn identity(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            chain: Vec::new(),
            moduli: Vec::new(),
        }
    }
}

/// Derived-induction-variable solver for one loop nest
pub struct InductionExpressionSolver<'a> {
    function: &'a Function,
    increment_prefix: &'a str,
}

impl<'a> InductionExpressionSolver<'a> {
    /// Create a solver
    ///
    /// `increment_prefix` is the naming convention of the loop's own step
    /// computation; those operations are already captured by the seed and
    /// must not be folded into derived chains.
    pub fn new(function: &'a Function, increment_prefix: &'a str) -> Self {
        Self {
            function,
            increment_prefix,
        }
    }

    /// Solve for one loop level
    ///
    /// `body` is the operation list of the outermost loop of the nest,
    /// `seed` the level's induction-variable name, and `visited_names` the
    /// closure set of the access under analysis; only names in it are
    /// considered, which prevents cross-access leakage.
    ///
    /// Returns a map from value name to its derived expression. A name with
    /// no binary-operator path back to the seed is absent from the map.
    pub fn solve(
        &self,
        body: &[OpId],
        seed: &str,
        visited_names: &[String],
    ) -> HashMap<String, DerivedExpression> {
        let visited: HashSet<&str> = visited_names.iter().map(String::as_str).collect();
        let mut map: HashMap<String, DerivedExpression> = HashMap::new();
        map.insert(seed.to_string(), DerivedExpression::identity(seed));
        let mut consumed: HashSet<String> = HashSet::new();

        // The map only grows and its cardinality is bounded by the body
        // length, so this converges.
        loop {
            let mut grew = false;
            for &id in body {
                let op = self.function.op(id);
                if !op.opcode.is_binary() || op.operands.len() != 2 {
                    continue;
                }
                let Some(name) = &op.name else { continue };
                if !visited.contains(name.as_str())
                    || name.starts_with(self.increment_prefix)
                    || map.contains_key(name)
                {
                    continue;
                }

                // Exactly one operand must be a constant and the other a
                // name already in the map.
                let (lhs, rhs) = (&op.operands[0], &op.operands[1]);
                let pair = match (lhs.name(), rhs.constant()) {
                    (Some(src), Some(c)) if map.contains_key(src) => Some((src, c)),
                    _ => match (rhs.name(), lhs.constant()) {
                        (Some(src), Some(c)) if map.contains_key(src) => Some((src, c)),
                        _ => None,
                    },
                };
                let Some((source, constant)) = pair else {
                    continue;
                };

                let mut expr = map[source].clone();
                match op.opcode {
                    Opcode::Rem => expr.moduli.push(constant),
                    opcode => expr.chain.push(ChainStep {
                        opcode,
                        value: constant,
                    }),
                }
                consumed.insert(source.to_string());
                map.insert(name.clone(), expr);
                grew = true;
            }
            if !grew {
                break;
            }
        }

        // Consumed names were intermediates, not independently meaningful
        // induction expressions. The seed survives: an access may use the
        // induction variable both directly and through a derived chain.
        for name in consumed {
            if name != seed {
                map.remove(&name);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Operand, Operation};

    fn body_of(f: &Function) -> Vec<OpId> {
        (0..f.ops.len()).collect()
    }

    #[test]
    fn test_scale_and_offset_chain() {
        // mul = i * 4; add = mul + 2
        let mut f = Function::new("f");
        f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
        f.push(Operation::named(
            "mul",
            Opcode::Mul,
            vec![Operand::Name("i".into()), Operand::Const(4)],
        ));
        f.push(Operation::named(
            "add",
            Opcode::Add,
            vec![Operand::Name("mul".into()), Operand::Const(2)],
        ));

        let solver = InductionExpressionSolver::new(&f, "inc");
        let names = vec!["add".to_string(), "mul".to_string(), "i".to_string()];
        let map = solver.solve(&body_of(&f), "i", &names);

        let add = &map["add"];
        assert_eq!(add.base, "i");
        assert_eq!(
            add.chain,
            vec![
                ChainStep {
                    opcode: Opcode::Mul,
                    value: 4
                },
                ChainStep {
                    opcode: Opcode::Add,
                    value: 2
                },
            ]
        );
        // "mul" was consumed into "add"
        assert!(!map.contains_key("mul"));
        // the seed is never deleted
        assert!(map.contains_key("i"));
    }

    #[test]
    fn test_modulo_kept_separate() {
        let mut f = Function::new("f");
        f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
        f.push(Operation::named(
            "rem",
            Opcode::Rem,
            vec![Operand::Name("i".into()), Operand::Const(8)],
        ));
        let solver = InductionExpressionSolver::new(&f, "inc");
        let names = vec!["rem".to_string(), "i".to_string()];
        let map = solver.solve(&body_of(&f), "i", &names);
        assert!(map["rem"].chain.is_empty());
        assert_eq!(map["rem"].moduli, vec![8]);
    }

    #[test]
    fn test_increment_convention_excluded() {
        let mut f = Function::new("f");
        f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
        f.push(Operation::named(
            "inc",
            Opcode::Add,
            vec![Operand::Name("i".into()), Operand::Const(1)],
        ));
        let solver = InductionExpressionSolver::new(&f, "inc");
        let names = vec!["inc".to_string(), "i".to_string()];
        let map = solver.solve(&body_of(&f), "i", &names);
        assert!(!map.contains_key("inc"));
    }

    #[test]
    fn test_names_outside_closure_ignored() {
        let mut f = Function::new("f");
        f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
        f.push(Operation::named(
            "mul",
            Opcode::Mul,
            vec![Operand::Name("i".into()), Operand::Const(4)],
        ));
        let solver = InductionExpressionSolver::new(&f, "inc");
        // closure set does not mention "mul"
        let names = vec!["i".to_string()];
        let map = solver.solve(&body_of(&f), "i", &names);
        assert!(!map.contains_key("mul"));
        assert!(map.contains_key("i"));
    }

    #[test]
    fn test_no_path_to_seed_absent() {
        // x = y * 3 where y is not an induction variable
        let mut f = Function::new("f");
        f.push(Operation::named("i", Opcode::Phi, vec![Operand::Const(0)]));
        f.push(Operation::named("y", Opcode::Other, vec![]));
        f.push(Operation::named(
            "x",
            Opcode::Mul,
            vec![Operand::Name("y".into()), Operand::Const(3)],
        ));
        let solver = InductionExpressionSolver::new(&f, "inc");
        let names = vec!["x".to_string(), "y".to_string(), "i".to_string()];
        let map = solver.solve(&body_of(&f), "i", &names);
        assert!(!map.contains_key("x"));
    }
}
