use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

/// Syntax highlighter for the shell
pub struct ReplHighlighter {
    commands: Vec<&'static str>,
}

impl ReplHighlighter {
    pub fn new() -> Self {
        Self {
            commands: vec![
                "help", "?", "exit", "quit", "q", "get", "read", "r", "list", "ls", "set", "push",
                "update", "delete", "rm", "watch", "unwatch", "watches", "dump",
            ],
        }
    }
}

impl Default for ReplHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.is_empty() {
            return styled;
        }

        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], &line[pos..]),
            None => (line, ""),
        };

        let cmd_lower = command.to_lowercase();
        let cmd_style = if self.commands.contains(&cmd_lower.as_str()) {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        if rest.is_empty() {
            return styled;
        }

        match cmd_lower.as_str() {
            "set" | "push" | "update" => {
                if let Some(json_pos) = rest.find(['{', '[', '"']) {
                    styled.push((Style::new().fg(Color::Yellow), rest[..json_pos].to_string()));
                    styled.push((Style::new().fg(Color::Green), rest[json_pos..].to_string()));
                } else {
                    styled.push((Style::new().fg(Color::Yellow), rest.to_string()));
                }
            }
            "get" | "read" | "r" | "list" | "ls" | "delete" | "rm" | "watch" | "unwatch" => {
                styled.push((Style::new().fg(Color::Yellow), rest.to_string()));
            }
            _ => {
                styled.push((Style::new(), rest.to_string()));
            }
        }

        styled
    }
}
