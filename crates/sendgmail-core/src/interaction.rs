//! Operator prompts.

use std::io::{self, BufRead, Write};

/// Asks the operator to confirm before continuing.
pub trait Interaction {
    /// Shows `message` and waits for the operator.
    ///
    /// Returns `false` if the operator cannot answer (end of input).
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or read.
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
}

/// Prompts on a terminal: prints the message and waits for Enter.
#[derive(Debug)]
pub struct ConsoleInteraction<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleInteraction<R, W> {
    /// Creates a prompt over the given streams.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ConsoleInteraction<io::StdinLock<'static>, io::Stdout> {
    /// Creates a prompt over stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Interaction for ConsoleInteraction<R, W> {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        writeln!(self.output, "{message}")?;
        writeln!(self.output, "(Press Enter to continue)")?;
        self.output.flush()?;

        let mut line = String::new();
        Ok(self.input.read_line(&mut line)? > 0)
    }
}
