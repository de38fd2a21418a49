//! Runtime execution errors.
//!
//! # Error Categories
//!
//! - **Faults**: invalid operations detected by the VM (wrong operand types,
//!   unknown classes or members, bad indexes, private access). Faults are
//!   never catchable by a `t { } h (...) { }` handler and end the run.
//!
//! - **Resource exceeded errors**: configured limits (call depth,
//!   instruction budget) were hit. Also uncatchable.
//!
//! - **Uncaught exceptions**: a language-level exception that found no
//!   handler in any active frame.
//!
//! Only language-level exceptions (`z.t()` and the throw instruction) are
//! catchable, and those never surface here unless nothing handled them.

use ecow::EcoString;
use thiserror::Error;

use super::ClassId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error(transparent)]
    ResourceExceeded(#[from] ResourceExceeded),

    /// The rendered exception value.
    #[error("Unhandled exception: {0}")]
    Uncaught(String),
}

/// Invalid operation detected while executing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("unsupported operand types for {op}: {left} and {right}")]
    BinaryOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("bad operand type for unary {op}: {operand}")]
    UnaryOperand {
        op: &'static str,
        operand: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown class: {0}")]
    UnknownClass(EcoString),

    #[error("unknown class id: {0}")]
    UnknownClassId(ClassId),

    #[error("method {0} not found")]
    MethodNotFound(EcoString),

    #[error("private method {0} is not accessible")]
    PrivateMethod(EcoString),

    #[error("static method {method} not found in {class}")]
    StaticMethodNotFound { class: EcoString, method: EcoString },

    #[error("private field {0} is not accessible")]
    PrivateField(EcoString),

    #[error("cannot call method {method} on {receiver}")]
    InvalidReceiver {
        method: EcoString,
        receiver: &'static str,
    },

    #[error("field {field} accessed on non-object {found}")]
    NotAnInstance { field: EcoString, found: &'static str },

    #[error("static field {field} accessed on non-class {found}")]
    NotAClass { field: EcoString, found: &'static str },

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("unhashable map key type: {0}")]
    UnhashableKey(&'static str),

    #[error("cannot index {container} with {index}")]
    NotIndexable {
        container: &'static str,
        index: &'static str,
    },

    #[error("unknown system operation: {0}")]
    UnknownSystemOp(EcoString),

    #[error("system operation {0} is missing its argument")]
    MissingArgument(EcoString),

    #[error("end of input")]
    EndOfInput,

    #[error("cannot read {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("i/o error: {0}")]
    Io(String),

    #[error("operand stack underflow")]
    StackUnderflow,
}

/// Resource limit exceeded errors that cannot be caught.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceExceeded {
    #[error("call depth {depth} exceeds maximum of {max_depth}")]
    CallDepth { depth: usize, max_depth: usize },

    #[error("instruction budget of {limit} exhausted")]
    Instructions { limit: u64 },
}

impl From<std::io::Error> for Fault {
    fn from(e: std::io::Error) -> Self {
        Fault::Io(e.to_string())
    }
}
