//! Bytecode compiler for Alphabet programs.
//!
//! Turns parsed statements into a [`Program`](crate::vm::Program): one
//! descriptor per concrete class plus the top-level `main` sequence.
//!
//! ## Design
//!
//! - Two passes: class identifiers are assigned first, so code may refer to
//!   a class declared further down
//! - Control flow uses placeholder jumps patched once the target is known
//! - Stack depth is tracked per sequence to record its exact maximum
//! - Names, class identifiers and the global slot pool persist across
//!   `compile` calls, which is what the REPL relies on

mod bytecode;
mod error;

#[cfg(test)]
mod bytecode_test;

pub use bytecode::Compiler;
pub use error::CompileError;
