mod highlighter;
mod lexer;

use alphabet::{Console, Engine, Error, ExecutionOptions, render_diagnostics};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    FileBackedHistory, IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, ValidationResult, Validator, default_emacs_keybindings,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Alphabet - a language where every keyword is a single letter
#[derive(Parser, Debug)]
#[command(name = "alphabet", version)]
#[command(about = "Run Alphabet programs", long_about = None)]
struct Args {
    /// Program to run (starts the REPL when omitted and stdin is a terminal)
    file: Option<PathBuf>,

    /// Start the REPL, after running FILE if one is given
    #[arg(long)]
    repl: bool,

    /// Compile only and report instruction counts
    #[arg(short = 'c', long)]
    check: bool,

    /// Print the compiled bytecode instead of running it
    #[arg(long)]
    disassemble: bool,

    /// Maximum number of live call frames
    #[arg(long, default_value_t = 1024)]
    max_call_depth: usize,

    /// Stop a run after this many instructions
    #[arg(long)]
    max_instructions: Option<u64>,
}

const HISTORY_SIZE: usize = 1000;

/// Exit status of `--check` when the source had parse errors.
const COMPILE_FAILURE: u8 = 65;

/// Accepts a REPL entry once every bracket and string is closed.
struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match lexer::calculate_depth(line) {
            Some(0) => ValidationResult::Complete,
            _ => ValidationResult::Incomplete,
        }
    }
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline() -> (Reedline, DefaultPrompt) {
    let words: Vec<String> = ["this", "z.o", "z.i", "z.t", "z.f"]
        .into_iter()
        .map(String::from)
        .collect();

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['.']);
        completions.insert(words);
        completions
    });

    // Use the interactive menu to select options from the completer
    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let completion_menu = Box::new(ide_menu);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let edit_mode = Box::new(Emacs::new(keybindings));

    let mut line_editor = Reedline::create()
        .with_highlighter(Box::new(highlighter::Highlighter::new()))
        .with_validator(Box::new(BracketValidator))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_edit_mode(edit_mode);

    if let Some(path) = dirs::data_dir().map(|dir| dir.join("alphabet_history")) {
        match FileBackedHistory::with_file(HISTORY_SIZE, path) {
            Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
            Err(e) => debug!(error = %e, "History disabled"),
        }
    }

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("alphabet".to_string()),
        DefaultPromptSegment::Empty,
    );

    (line_editor, prompt)
}

/// Prints a failure on stderr.
fn report(error: &Error) {
    match error {
        Error::Uncaught(_) => eprintln!("{error}"),
        _ => eprintln!("{:?}", miette::miette!("{error}")),
    }
}

fn read_source(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn read_stdin() -> Result<String, Error> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| Error::Io {
            path: "<stdin>".to_string(),
            message: e.to_string(),
        })?;
    Ok(source)
}

/// Compiles `source` and, unless only checking or disassembling, runs it.
///
/// Returns the number of recovered parse errors.
fn run_program(
    engine: &mut Engine<'_>,
    name: &str,
    source: &str,
    args: &Args,
) -> Result<usize, Error> {
    let compiled = engine.compile(source)?;
    render_diagnostics(name, source, compiled.diagnostics());
    let recovered = compiled.diagnostics().len();

    if args.disassemble {
        println!("{}", compiled.program());
    }
    if args.check {
        let program = compiled.program();
        println!(
            "{name}: {} classes, {} instructions, {recovered} parse errors",
            program.classes.len(),
            program.instruction_count()
        );
    }
    if args.check || args.disassemble {
        return Ok(recovered);
    }

    engine.run(&compiled)?;
    Ok(recovered)
}

fn repl(engine: &mut Engine<'_>) -> Result<()> {
    let (mut line_editor, prompt) = setup_reedline();

    println!("Alphabet REPL - type 'q' or press Ctrl+D to exit");

    loop {
        let sig = line_editor.read_line(&prompt).into_diagnostic()?;
        match sig {
            Signal::Success(buffer) => {
                let entry = buffer.trim();
                if entry == "q" {
                    return Ok(());
                }
                if entry.is_empty() {
                    continue;
                }
                match engine.eval(entry) {
                    Ok(compiled) => render_diagnostics("<repl>", entry, compiled.diagnostics()),
                    Err(e) => report(&e),
                }
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("\nGoodbye!");
                return Ok(());
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use ALPHABET_LOG or RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_env("ALPHABET_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let options = ExecutionOptions {
        max_depth: args.max_call_depth,
        max_instructions: args.max_instructions,
    };

    let is_interactive = atty::is(atty::Stream::Stdin);

    // A piped program is read in full before the VM takes over stdin.
    let source = match &args.file {
        Some(path) => Some((path.display().to_string(), read_source(path))),
        None if !is_interactive && !args.repl => Some(("<stdin>".to_string(), read_stdin())),
        None => None,
    };

    let mut engine = Engine::new(options, Console::std());

    if let Some((name, source)) = source {
        match source.and_then(|source| run_program(&mut engine, &name, &source, &args)) {
            Ok(recovered) if args.check && recovered > 0 => {
                return Ok(ExitCode::from(COMPILE_FAILURE));
            }
            Ok(_) => {}
            Err(e) => {
                report(&e);
                return Ok(ExitCode::from(e.exit_code() as u8));
            }
        }
    }

    if args.repl || (args.file.is_none() && is_interactive) {
        repl(&mut engine)?;
    }

    Ok(ExitCode::SUCCESS)
}
