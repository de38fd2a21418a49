//! Compiling and running Alphabet source text.

use tracing::debug;

use super::{Error, ExecutionOptions};
use crate::compiler::Compiler;
use crate::parser::{self, ParseError};
use crate::vm::{Console, Program, Value, Vm};

/// A compiled program together with the parse errors recovered on the way.
///
/// A malformed declaration does not stop compilation: it is reported here
/// and skipped, and every well-formed statement around it still runs.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    program: Program,
    diagnostics: Vec<ParseError>,
}

impl CompiledProgram {
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Lexes, parses and compiles `source` with a fresh compiler.
///
/// # Example
///
/// ```
/// use alphabet_core::api::compile;
///
/// let compiled = compile("z.o(1 + 2)").unwrap();
/// assert!(compiled.diagnostics().is_empty());
/// ```
pub fn compile(source: &str) -> Result<CompiledProgram, Error> {
    compile_with(&mut Compiler::new(), source)
}

fn compile_with(compiler: &mut Compiler, source: &str) -> Result<CompiledProgram, Error> {
    let parsed = parser::parse(source);
    for error in &parsed.errors {
        debug!(%error, "Recovered from parse error");
    }
    let program = compiler.compile(&parsed.statements)?;
    Ok(CompiledProgram {
        program,
        diagnostics: parsed.errors,
    })
}

/// Compiles and runs `source` once.
///
/// Returns the recovered parse errors of a program that ran to completion.
pub fn run_source(
    source: &str,
    options: ExecutionOptions,
    console: Console<'_>,
) -> Result<Vec<ParseError>, Error> {
    let compiled = compile(source)?;
    let mut vm = Vm::new(options, console);
    vm.run(&compiled.program)?;
    Ok(compiled.diagnostics)
}

/// Incremental compile-and-run session.
///
/// The engine keeps one [`Compiler`] and one [`Vm`] alive, so classes,
/// statics and globals declared by one `eval` are visible to the next.
/// This is what the REPL is built on.
///
/// # Example
///
/// ```
/// use alphabet_core::api::{Engine, ExecutionOptions};
/// use alphabet_core::vm::Console;
///
/// let mut out = Vec::new();
/// let mut engine = Engine::new(
///     ExecutionOptions::default(),
///     Console::new(&mut out, std::io::empty()),
/// );
/// engine.eval("5 x = 40").unwrap();
/// engine.eval("z.o(x + 2)").unwrap();
/// drop(engine);
/// assert_eq!(String::from_utf8(out).unwrap(), "42\n");
/// ```
pub struct Engine<'io> {
    compiler: Compiler,
    vm: Vm<'io>,
}

impl<'io> Engine<'io> {
    pub fn new(options: ExecutionOptions, console: Console<'io>) -> Self {
        Self {
            compiler: Compiler::new(),
            vm: Vm::new(options, console),
        }
    }

    /// Compiles `source` against the session state without running it.
    ///
    /// A failed compilation leaves the session untouched.
    pub fn compile(&mut self, source: &str) -> Result<CompiledProgram, Error> {
        compile_with(&mut self.compiler, source)
    }

    /// Runs a program compiled by [`Engine::compile`].
    pub fn run(&mut self, compiled: &CompiledProgram) -> Result<(), Error> {
        self.vm.run(&compiled.program)?;
        Ok(())
    }

    /// Compiles and runs one more piece of source.
    ///
    /// Declarations survive a runtime failure: a class or global compiled
    /// before the fault stays known to later entries.
    pub fn eval(&mut self, source: &str) -> Result<CompiledProgram, Error> {
        let compiled = self.compile(source)?;
        debug!(
            instructions = compiled.program.instruction_count(),
            recovered = compiled.diagnostics.len(),
            "Evaluating entry"
        );
        self.run(&compiled)?;
        Ok(compiled)
    }

    /// Current value of a global, declared or assigned.
    pub fn global(&self, name: &str) -> Option<&Value> {
        let declared = self
            .compiler
            .globals()
            .iter()
            .position(|global| global.as_str() == name);
        match declared {
            Some(slot) => self.vm.slot(u32::try_from(slot).ok()?),
            None => self.vm.global(name),
        }
    }

    pub fn vm(&self) -> &Vm<'io> {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm<'io> {
        &mut self.vm
    }
}
