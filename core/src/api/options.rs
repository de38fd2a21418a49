//! Configuration options for running Alphabet programs.

/// Resource limits applied while a program runs.
///
/// Exceeding a limit stops the run with
/// [`ResourceExceeded`](crate::vm::ResourceExceeded); language handlers
/// cannot catch it.
///
/// # Example
///
/// ```
/// use alphabet_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: 256,
///     max_instructions: Some(1_000_000),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum number of live call frames, `main` included.
    ///
    /// Default: 1024
    pub max_depth: usize,

    /// Maximum number of instructions executed by one run.
    ///
    /// Set to `None` for no limit (be careful with untrusted code!).
    ///
    /// Default: None
    pub max_instructions: Option<u64>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            max_instructions: None,
        }
    }
}
