use reedline::{Completer, Span, Suggestion};

const COMMANDS: [(&str, &str); 12] = [
    ("help", "Show help"),
    ("exit", "Exit the shell"),
    ("get", "Read the value at a path"),
    ("list", "Show a collection as a list"),
    ("set", "Overwrite the value at a path"),
    ("push", "Store under a new generated key"),
    ("update", "Merge fields into a value"),
    ("delete", "Remove the value at a path"),
    ("watch", "Print every change at a path"),
    ("unwatch", "Stop watching a path"),
    ("watches", "List watched paths"),
    ("dump", "Show the whole store"),
];

/// Command completer for the shell
#[derive(Default)]
pub struct ReplCompleter;

impl ReplCompleter {
    pub fn new() -> Self {
        Self
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();

        // Only the command itself is completed.
        if !(words.is_empty() || (words.len() == 1 && !line_to_pos.ends_with(' '))) {
            return Vec::new();
        }

        let prefix = words.first().copied().unwrap_or("");
        let start = line_to_pos.rfind(prefix).unwrap_or(0);

        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(prefix))
            .map(|(cmd, description)| Suggestion {
                value: cmd.to_string(),
                description: Some(description.to_string()),
                style: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: true,
                match_indices: None,
            })
            .collect()
    }
}
