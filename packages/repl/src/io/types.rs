//! Values passed between `ReplCore` and its host.

#[derive(Debug, Clone)]
pub struct InputLine {
    pub line: String,
}

#[derive(Debug, Clone)]
pub enum Signal {
    /// Ctrl+C: drop the current line and keep going.
    Interrupt,
    /// Ctrl+D: leave the shell.
    Eof,
}

/// One line of shell output with a hint for how to color it.
#[derive(Debug, Clone)]
pub struct Output {
    pub text: String,
    pub style: OutputStyle,
}

impl Output {
    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Command output. Usually already colored.
    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    /// A watched path changed.
    pub fn event(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Event)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    #[default]
    Normal,
    Error,
    Info,
    Event,
    Banner,
}

#[derive(Debug, Clone, Default)]
pub struct PromptConfig {
    pub watch_count: usize,
    /// Where the store was loaded from, `memory` when nothing was.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit`, `quit` or `q`.
    UserExit,
    Eof,
}
