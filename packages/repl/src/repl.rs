//! Platform-independent shell core.

use crate::commands::{self, CommandResult};
use crate::context::ShellContext;
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};

/// The platform-independent shell core.
pub struct ReplCore {
    ctx: ShellContext,
    label: String,
}

impl ReplCore {
    pub fn new(ctx: ShellContext, label: impl Into<String>) -> Self {
        Self {
            ctx,
            label: label.into(),
        }
    }

    /// Run the shell loop, reading/writing through the provided I/O host.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write_output(Output::banner(BANNER))?;

        loop {
            io.write_prompt(PromptConfig {
                watch_count: self.ctx.watched_paths().len(),
                label: self.label.clone(),
            })?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => {
                        io.write_output(Output::info("Goodbye!"))?;
                        io.flush()?;
                        return Ok(ExitReason::Eof);
                    }
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let input = match io.read_input()? {
                Some(input) => input,
                None => continue,
            };

            match commands::execute(&input.line, &mut self.ctx) {
                CommandResult::Ok(None) => {}
                CommandResult::Ok(Some(output)) => {
                    io.write_output(Output::normal(output))?;
                }
                CommandResult::Error(msg) => {
                    io.write_output(Output::error(msg))?;
                }
                CommandResult::Help => {
                    io.write_output(Output::normal(commands::format_help()))?;
                }
                CommandResult::Exit => {
                    io.write_output(Output::info("Goodbye!"))?;
                    io.flush()?;
                    return Ok(ExitReason::UserExit);
                }
            }

            // Changes caused by the command show up right after its output.
            for (path, state) in self.ctx.take_changes() {
                io.write_output(Output::event(commands::format_change(&path, &state)))?;
            }

            io.flush()?;
        }
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ShellContext {
        &mut self.ctx
    }
}

const BANNER: &str = r#"
       _ _       _         _ _
   ___| (_)_ __ (_) ___ __| | |__
  / __| | | '_ \| |/ __/ _` | '_ \
 | (__| | | | | | | (_| (_| | |_) |
  \___|_|_|_| |_|_|\___\__,_|_.__/

Type 'help' for available commands, 'exit' to quit.
"#;
