//! How the shell talks to its terminal.
//!
//! `ReplCore` never touches stdin or stdout. It goes through an `IoHost`,
//! which is reedline in the binary and a scripted queue in tests.

pub mod types;

#[cfg(test)]
pub mod test_host;

pub use types::*;

#[cfg(test)]
pub use test_host::TestHost;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("terminal error: {0}")]
    Io(String),
}

/// The terminal side of the shell.
pub trait IoHost {
    /// Block until a line or a signal is ready to read.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// The line typed since the last wait, if any.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// Ctrl+C or Ctrl+D received since the last wait, if any.
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Prompt to show before the next line: store label and watch count.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
