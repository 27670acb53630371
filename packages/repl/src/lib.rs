//! # clinicdb-repl
//!
//! An interactive shell over a clinicdb store.
//!
//! Reads go through the same data access utilities an application uses:
//! `list` is a collection fetch, `watch` keeps a live fetch open, and every
//! write is a `mutate_data` call.
//!
//! ## Usage
//!
//! ```bash
//! clinicdb --config clinic.json --seed fixtures.json
//!
//! # Inside the shell:
//! > push /patients {"name": "Asha", "blood": "O+"}
//! > list /patients
//! > watch /appointments/a1
//! > update /appointments/a1 {"status": "confirmed"}
//! ```

pub mod commands;
pub mod completer;
pub mod context;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod repl;

pub use context::{ContextError, ShellContext};
pub use host::{EditModeChoice, TerminalHost};
pub use repl::ReplCore;

/// Errors that end the shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("could not start terminal: {0}")]
    Terminal(#[from] std::io::Error),
    #[error(transparent)]
    Io(#[from] io::IoError),
}

/// Run the interactive shell on the terminal.
pub fn run(
    ctx: ShellContext,
    label: impl Into<String>,
    edit_mode: Option<EditModeChoice>,
) -> Result<io::ExitReason, ShellError> {
    let mut host = TerminalHost::new(edit_mode)?;
    let mut core = ReplCore::new(ctx, label);
    Ok(core.run(&mut host)?)
}
