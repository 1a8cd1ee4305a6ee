//! Error types for the stridescope analyzer

use thiserror::Error;

/// Analysis errors
///
/// An access the analyzer cannot handle is *not* an error: it is skipped and
/// logged. The variants here are precondition violations that abort the
/// analysis of a nest or the synthesis of a stream.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Indexing operation whose aggregate carries no dimension metadata
    ///
    /// **Triggered by:** an `Index` operation with an empty dimension list
    /// **Severity:** fatal for the enclosing loop nest
    #[error("Non-affine dimension type at indexing operation '{name}'")]
    NonAffineDimension {
        /// Name of the offending indexing operation
        name: String,
    },

    /// Operator outside the supported set reached the scale-chain evaluator
    ///
    /// Supported operators are add, subtract, multiply, modulo, bitwise-and
    /// and right-shift. Anything else aborts synthesis for the access rather
    /// than silently producing a wrong address.
    #[error("Unsupported operator {opcode} in scale chain for {context}")]
    UnsupportedOperator {
        /// Mnemonic of the unsupported operator
        opcode: String,
        /// Stream or access the chain belongs to
        context: String,
    },

    /// Cycle in the symbolic loop-bound reference graph
    #[error("Symbolic bound reference cycle involving induction variable '{var}'")]
    BoundReferenceCycle {
        /// Induction variable on the cycle
        var: String,
    },

    /// Symbolic loop bound referencing an unknown induction variable
    #[error("Loop bound of '{var}' references unknown induction variable '{referenced}'")]
    UnresolvedBoundReference {
        /// Induction variable whose bound is symbolic
        var: String,
        /// The name the bound refers to
        referenced: String,
    },

    /// Loop bound that cannot describe a countable iteration space
    #[error("Invalid bound for loop '{var}': {reason}")]
    InvalidLoopBound {
        /// Induction variable of the offending level
        var: String,
        /// Why the bound is unusable
        reason: String,
    },

    /// Operation passed as a memory access is neither a load nor a store
    #[error("Operation is not a memory access: {opcode}")]
    NotMemoryAccess {
        /// Mnemonic of the actual operator
        opcode: String,
    },

    /// Worker pool construction failed
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// I/O failure while writing a graph file
    #[error("I/O error: {message}")]
    Io {
        /// Underlying error description
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io {
            message: e.to_string(),
        }
    }
}

/// Result type for stridescope operations
pub type Result<T> = std::result::Result<T, Error>;
