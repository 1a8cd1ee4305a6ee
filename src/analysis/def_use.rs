//! Flat def/use maps for one function scope.

use std::collections::HashMap;

use crate::ir::{Function, OpId};

/// Name-keyed definition and use maps, built once per function
///
/// Consumed read-only by every other analysis; cloning it hands a worker an
/// independent view with no shared state.
#[derive(Debug, Clone, Default)]
pub struct DefUseIndex {
    defs: HashMap<String, OpId>,
    users: HashMap<String, Vec<OpId>>,
}

impl DefUseIndex {
    /// Build the index over a function's operation arena
    ///
    /// Unnamed operations define nothing; the first definition of a name
    /// wins, matching single-assignment input.
    pub fn build(function: &Function) -> Self {
        let mut index = DefUseIndex::default();
        for (id, op) in function.ops.iter().enumerate() {
            if let Some(name) = &op.name {
                index.defs.entry(name.clone()).or_insert(id);
            }
            for operand in &op.operands {
                if let Some(name) = operand.name() {
                    index.users.entry(name.to_string()).or_default().push(id);
                }
            }
        }
        index
    }

    /// Id of the operation defining `name`, if any
    pub fn def(&self, name: &str) -> Option<OpId> {
        self.defs.get(name).copied()
    }

    /// Ids of the operations using `name` as an operand, in program order
    pub fn users(&self, name: &str) -> &[OpId] {
        self.users.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct defined names
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True when the function defines no names
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Opcode, Operand, Operation};

    #[test]
    fn test_defs_and_users() {
        let mut f = Function::new("f");
        let a = f.push(Operation::named("a", Opcode::Alloca, vec![]));
        let x = f.push(Operation::named(
            "x",
            Opcode::Load,
            vec![Operand::Name("a".into())],
        ));
        let _ = f.push(Operation::new(
            Opcode::Store,
            vec![Operand::Name("x".into()), Operand::Name("a".into())],
        ));

        let index = DefUseIndex::build(&f);
        assert_eq!(index.def("a"), Some(a));
        assert_eq!(index.def("x"), Some(x));
        assert_eq!(index.def("missing"), None);
        assert_eq!(index.users("a").len(), 2);
        assert_eq!(index.users("x").len(), 1);
        assert!(index.users("missing").is_empty());
    }

    #[test]
    fn test_first_definition_wins() {
        let mut f = Function::new("f");
        let first = f.push(Operation::named("x", Opcode::Alloca, vec![]));
        f.push(Operation::named("x", Opcode::Other, vec![]));
        let index = DefUseIndex::build(&f);
        assert_eq!(index.def("x"), Some(first));
    }
}
