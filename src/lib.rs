//! Alphabet - a terse, single-letter-keyword object language
//!
//! # Overview
//!
//! Alphabet programs are compiled to bytecode and run on a stack VM. The
//! language has classes with single inheritance, static members, private
//! fields and methods, lists, maps, and `t { } h (...) { }` exception
//! handlers. Every keyword is one letter:
//!
//! ```text
//! c Counter {
//!     s 5 n = 0
//!     s m 5 bump() { Counter.n = Counter.n + 1 r Counter.n }
//! }
//! z.o(Counter.bump())
//! ```
//!
//! # Quick Start
//!
//! ```
//! use alphabet::{Console, Engine, ExecutionOptions};
//!
//! let mut out = Vec::new();
//! let mut engine = Engine::new(
//!     ExecutionOptions::default(),
//!     Console::new(&mut out, std::io::empty()),
//! );
//! engine.eval("5 x = [10, 20, 30] z.o(x[2])").unwrap();
//! drop(engine);
//! assert_eq!(String::from_utf8(out).unwrap(), "30\n");
//! ```

pub mod error_renderer;

// Re-export public API from alphabet_core
pub use alphabet_core::api::{
    CompiledProgram, Engine, Error, ExecutionOptions, compile, run_source,
};

// Re-export the pieces embedders and tools need
pub use alphabet_core::compiler::{CompileError, Compiler};
pub use alphabet_core::parser::{ParseError, Parsed, parse};
pub use alphabet_core::vm::{Console, ExecutionError, Fault, Program, ResourceExceeded, Value, Vm};

pub use error_renderer::{
    render_diagnostics, render_diagnostics_to, render_diagnostics_to_string_no_color,
};
