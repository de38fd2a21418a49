//! Bytecode compilation errors.

use ecow::EcoString;
use thiserror::Error;

/// Errors that stop compilation.
///
/// The parser accepts a few constructs that have no bytecode form; they are
/// rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: &'static str },

    /// A method outside a class body, or a class inside a block or method.
    #[error("{kind} '{name}' cannot be declared here")]
    MisplacedDeclaration { kind: &'static str, name: EcoString },

    #[error("too many {what} (limit: {limit})")]
    TooMany { what: &'static str, limit: usize },
}
