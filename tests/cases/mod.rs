#![allow(dead_code)]

use alphabet::{Console, Error, ExecutionOptions, run_source};

/// Everything a program printed, and how it ended.
#[derive(Debug)]
pub struct Run {
    pub result: Result<(), Error>,
    pub output: String,
}

pub fn run(source: &str) -> Run {
    run_with(source, "", ExecutionOptions::default())
}

pub fn run_with(source: &str, stdin: &str, options: ExecutionOptions) -> Run {
    let mut out = Vec::new();
    let result = run_source(source, options, Console::new(&mut out, stdin.as_bytes())).map(|_| ());
    Run {
        result,
        output: String::from_utf8(out).unwrap(),
    }
}

/// Declares a test that runs a program and checks its output.
///
/// With `error:` the run must fail with an error matching the pattern,
/// after printing `output`.
macro_rules! test_case {
    ($name:ident, input: $input:expr, output: $output:expr $(,)?) => {
        #[test]
        fn $name() {
            let run = $crate::cases::run($input);
            pretty_assertions::assert_eq!(run.result, Ok(()));
            pretty_assertions::assert_eq!(run.output, $output);
        }
    };
    ($name:ident, input: $input:expr, output: $output:expr, error: $error:pat $(,)?) => {
        #[test]
        fn $name() {
            let run = $crate::cases::run($input);
            assert!(
                matches!(run.result, Err($error)),
                "unexpected result: {:?}",
                run.result
            );
            pretty_assertions::assert_eq!(run.output, $output);
        }
    };
}
