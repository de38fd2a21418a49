//! Public API for the Alphabet language.
//!
//! This module is the stable entry point for compiling and running Alphabet
//! programs:
//!
//! - [`compile`]: source text to a [`CompiledProgram`]
//! - [`run_source`]: one-shot compile and run
//! - [`Engine`]: an incremental session, as used by the REPL
//!
//! # Example
//!
//! ```
//! use alphabet_core::api::{ExecutionOptions, run_source};
//! use alphabet_core::vm::Console;
//!
//! let mut out = Vec::new();
//! let source = "5 x = 5 5 y = 0 l(x > 0) { y = y + x x = x - 1 } z.o(y)";
//! run_source(
//!     source,
//!     ExecutionOptions::default(),
//!     Console::new(&mut out, std::io::empty()),
//! )
//! .unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "15\n");
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::{CompiledProgram, Engine, compile, run_source};
pub use error::Error;
pub use options::ExecutionOptions;
