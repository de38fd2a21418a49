//! Public error type for the Alphabet API.
//!
//! Internal errors are converted to [`Error`] at API boundaries, which is
//! also where the process exit code of each failure is decided.

use thiserror::Error;

use crate::compiler::CompileError;
use crate::vm::{ExecutionError, Fault, ResourceExceeded};

/// Public error type for all Alphabet operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The program could not be compiled to bytecode.
    #[error("Compile error: {0}")]
    Compilation(#[from] CompileError),

    /// A runtime fault. Language handlers never see these.
    #[error("Runtime error: {0}")]
    Runtime(Fault),

    /// A thrown value that no handler caught, already rendered.
    #[error("Unhandled exception: {0}")]
    Uncaught(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceExceeded(ResourceExceeded),

    /// The source file could not be read.
    #[error("Cannot read '{path}': {message}")]
    Io { path: String, message: String },
}

impl Error {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Compilation(_) => 65,
            Error::Io { .. } => 66,
            Error::Runtime(_) | Error::Uncaught(_) | Error::ResourceExceeded(_) => 1,
        }
    }
}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Fault(fault) => Error::Runtime(fault),
            ExecutionError::ResourceExceeded(limit) => Error::ResourceExceeded(limit),
            ExecutionError::Uncaught(value) => Error::Uncaught(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let compile = Error::from(CompileError::Unsupported { construct: "'@'" });
        assert_eq!(compile.exit_code(), 65);
        assert_eq!(Error::Uncaught("15".into()).exit_code(), 1);
        assert_eq!(Error::Runtime(Fault::DivisionByZero).exit_code(), 1);
        let io = Error::Io {
            path: "missing.ab".into(),
            message: "not found".into(),
        };
        assert_eq!(io.exit_code(), 66);
    }

    #[test]
    fn test_execution_errors_convert() {
        let err = Error::from(ExecutionError::Uncaught("Custom Error 15".into()));
        assert_eq!(err.to_string(), "Unhandled exception: Custom Error 15");

        let err = Error::from(ExecutionError::from(ResourceExceeded::Instructions {
            limit: 10,
        }));
        assert!(matches!(err, Error::ResourceExceeded(_)));
    }
}
