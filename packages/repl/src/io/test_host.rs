//! In-memory host for driving the shell loop from tests.

use std::collections::VecDeque;

use super::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

/// Test host with in-memory I/O buffers.
///
/// Input lines and signals are consumed in order. Once both queues are
/// empty the host reports end of input, so a run always terminates.
#[derive(Debug, Default)]
pub struct TestHost {
    input_queue: VecDeque<String>,
    signal_queue: VecDeque<Signal>,
    output_buffer: Vec<Output>,
    last_prompt: Option<PromptConfig>,
    flush_count: usize,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut host = Self::new();
        host.input_queue.extend(lines.into_iter().map(Into::into));
        host
    }

    pub fn queue_signal(&mut self, signal: Signal) {
        self.signal_queue.push_back(signal);
    }

    pub fn output(&self) -> &[Output] {
        &self.output_buffer
    }

    /// All output text, one entry per line.
    pub fn output_text(&self) -> String {
        self.output_buffer
            .iter()
            .map(|o| o.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn output_with_style(&self, style: OutputStyle) -> Vec<&str> {
        self.output_buffer
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.output_with_style(OutputStyle::Error)
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.last_prompt.as_ref()
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }
}

impl IoHost for TestHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        if self.input_queue.is_empty() && self.signal_queue.is_empty() {
            self.signal_queue.push_back(Signal::Eof);
        }
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.input_queue.pop_front().map(|line| InputLine { line }))
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.signal_queue.pop_front())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.output_buffer.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.last_prompt = Some(config);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_come_back_in_order() {
        let mut host = TestHost::with_inputs(["first", "second"]);
        assert_eq!(host.read_input().unwrap().unwrap().line, "first");
        assert_eq!(host.read_input().unwrap().unwrap().line, "second");
        assert!(host.read_input().unwrap().is_none());
    }

    #[test]
    fn drained_host_reports_eof() {
        let mut host = TestHost::new();
        host.wait_for_input().unwrap();
        assert!(matches!(host.read_signal().unwrap(), Some(Signal::Eof)));
    }

    #[test]
    fn queued_signal_wins_over_eof() {
        let mut host = TestHost::new();
        host.queue_signal(Signal::Interrupt);
        host.wait_for_input().unwrap();
        assert!(matches!(host.read_signal().unwrap(), Some(Signal::Interrupt)));
    }

    #[test]
    fn output_is_buffered_by_style() {
        let mut host = TestHost::new();
        host.write_output(Output::normal("a")).unwrap();
        host.write_output(Output::error("b")).unwrap();
        host.write_output(Output::info("c")).unwrap();

        assert_eq!(host.output().len(), 3);
        assert_eq!(host.output_text(), "a\nb\nc");
        assert_eq!(host.errors(), vec!["b"]);
        assert_eq!(host.output_with_style(OutputStyle::Info), vec!["c"]);
    }

    #[test]
    fn prompt_and_flush_are_recorded() {
        let mut host = TestHost::new();
        host.write_prompt(PromptConfig {
            watch_count: 2,
            label: "memory".to_string(),
        })
        .unwrap();
        host.flush().unwrap();

        assert_eq!(host.last_prompt().unwrap().watch_count, 2);
        assert_eq!(host.flush_count(), 1);
    }
}
