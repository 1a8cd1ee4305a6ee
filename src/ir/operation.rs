//! Operations and the per-function arena that owns them.

use serde::{Deserialize, Serialize};

/// Stable index of an operation inside its [`Function`] arena
pub type OpId = usize;

/// Operator kind of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Allocation of a named memory object (array or scalar)
    Alloca,
    /// Load through an address operand (operand 0)
    Load,
    /// Store of a value (operand 0) through an address operand (operand 1)
    Store,
    /// Read-element-pointer: base aggregate followed by one operand per
    /// index dimension; carries the aggregate's dimension sizes
    Index,
    /// Loop-carried recurrence (phi) node
    Phi,
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Modulo (signed remainder)
    Rem,
    /// Bitwise and
    And,
    /// Logical right shift
    Shr,
    /// Function call; carries an optional callee name
    Call,
    /// Anything the analyzer does not interpret
    Other,
}

impl Opcode {
    /// Mnemonic used in reports and graph labels
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Index => "index",
            Opcode::Phi => "phi",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Rem => "rem",
            Opcode::And => "and",
            Opcode::Shr => "shr",
            Opcode::Call => "call",
            Opcode::Other => "other",
        }
    }

    /// True for load and store
    pub fn is_memory_access(&self) -> bool {
        matches!(self, Opcode::Load | Opcode::Store)
    }

    /// True for the two-operand arithmetic operators the induction solver
    /// understands
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Rem | Opcode::And | Opcode::Shr
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An operand reference: a named value or a literal integer constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Reference to a named value defined elsewhere in the function
    Name(String),
    /// Literal integer constant
    Const(i64),
}

impl Operand {
    /// The referenced name, if this is a named operand
    pub fn name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            Operand::Const(_) => None,
        }
    }

    /// The literal value, if this is a constant operand
    pub fn constant(&self) -> Option<i64> {
        match self {
            Operand::Name(_) => None,
            Operand::Const(c) => Some(*c),
        }
    }
}

/// One instruction node, immutable once built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Result name; absent for unnamed temporaries and stores
    pub name: Option<String>,
    /// Operator kind
    pub opcode: Opcode,
    /// Ordered operand references
    pub operands: Vec<Operand>,
    /// Array dimension sizes for `Index` operations (empty otherwise)
    pub dims: Vec<i64>,
    /// Callee name for `Call` operations, when known
    pub callee: Option<String>,
}

impl Operation {
    /// Build an unnamed operation
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            name: None,
            opcode,
            operands,
            dims: Vec::new(),
            callee: None,
        }
    }

    /// Build a named operation
    pub fn named(name: impl Into<String>, opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            name: Some(name.into()),
            opcode,
            operands,
            dims: Vec::new(),
            callee: None,
        }
    }

    /// Attach aggregate dimension sizes (for `Index` operations)
    pub fn with_dims(mut self, dims: Vec<i64>) -> Self {
        self.dims = dims;
        self
    }

    /// Attach a callee name (for `Call` operations)
    pub fn with_callee(mut self, callee: impl Into<String>) -> Self {
        self.callee = Some(callee.into());
        self
    }

    /// The address operand of a memory access: operand 0 of a load,
    /// operand 1 of a store. `None` for anything else.
    pub fn address_operand(&self) -> Option<&Operand> {
        match self.opcode {
            Opcode::Load => self.operands.first(),
            Opcode::Store => self.operands.get(1),
            _ => None,
        }
    }
}

/// Per-function instruction census
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionCensus {
    /// Total operation count
    pub operations: usize,
    /// Load count
    pub loads: usize,
    /// Store count
    pub stores: usize,
}

/// One function scope: an arena of operations with stable ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Operation arena; an [`OpId`] is an index into this vector
    pub ops: Vec<Operation>,
}

impl Function {
    /// Create an empty function scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ops: Vec::new(),
        }
    }

    /// Append an operation, returning its id
    pub fn push(&mut self, op: Operation) -> OpId {
        self.ops.push(op);
        self.ops.len() - 1
    }

    /// Look up an operation by id
    pub fn op(&self, id: OpId) -> &Operation {
        &self.ops[id]
    }

    /// Count operations, loads and stores
    pub fn census(&self) -> InstructionCensus {
        let mut census = InstructionCensus {
            operations: self.ops.len(),
            ..Default::default()
        };
        for op in &self.ops {
            match op.opcode {
                Opcode::Load => census.loads += 1,
                Opcode::Store => census.stores += 1,
                _ => {}
            }
        }
        census
    }
}
