//! The built-in system object `z` and the console it talks to.

use std::io::{self, BufRead, Write};

use tracing::debug;

use super::{Fault, Value};

/// Output and input streams of a VM.
pub struct Console<'io> {
    out: Box<dyn Write + 'io>,
    input: Box<dyn BufRead + 'io>,
}

impl<'io> Console<'io> {
    pub fn new(out: impl Write + 'io, input: impl BufRead + 'io) -> Self {
        Self {
            out: Box::new(out),
            input: Box::new(input),
        }
    }

    /// Process standard output and standard input.
    pub fn std() -> Console<'static> {
        Console::new(io::stdout(), io::stdin().lock())
    }

    /// Writes `values` separated by spaces, then a newline.
    pub fn print(&mut self, values: &[Value]) -> Result<(), Fault> {
        let mut line = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&value.to_string());
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Reads one line. Input that parses as a number becomes a number,
    /// anything else stays a string.
    pub fn read_line(&mut self) -> Result<Value, Fault> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Fault::EndOfInput);
        }
        let line = line.strip_suffix('\n').unwrap_or(&line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        Ok(match line.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Str(line.into()),
        })
    }
}

/// Result of a system operation.
#[derive(Debug)]
pub enum Outcome {
    Return(Value),
    /// The operation raised a catchable exception.
    Throw(Value),
}

/// Exception value raised by `z.t()`.
pub const CUSTOM_ERROR: &str = "Custom Error 15";

/// Runs the system operation `name`.
///
/// `o` prints, `i` reads a line, `t` throws and `f` reads a whole file.
pub fn call(console: &mut Console<'_>, name: &str, args: &[Value]) -> Result<Outcome, Fault> {
    debug!(op = name, argc = args.len(), "System call");
    match name {
        "o" => {
            console.print(args)?;
            Ok(Outcome::Return(Value::Nil))
        }
        "i" => console.read_line().map(Outcome::Return),
        "t" => Ok(Outcome::Throw(Value::Str(CUSTOM_ERROR.into()))),
        "f" => {
            let path = match args.first() {
                Some(Value::Str(path)) => path.to_string(),
                Some(other) => other.to_string(),
                None => return Err(Fault::MissingArgument(name.into())),
            };
            std::fs::read_to_string(&path)
                .map(|text| Outcome::Return(Value::Str(text.into())))
                .map_err(|e| Fault::FileRead {
                    path,
                    message: e.to_string(),
                })
        }
        _ => Err(Fault::UnknownSystemOp(name.into())),
    }
}
