//! Shell command parsing and execution.
//!
//! Commands:
//! - `get <path>` - Read and display the value at a path
//! - `list <path> [field=value]` - Show a collection as a list, optionally filtered
//! - `set <path> <json>` - Overwrite the value at a path
//! - `push <path> <json>` - Store under a new generated key
//! - `update <path> <json>` - Merge fields into the value at a path
//! - `delete <path>` - Remove the value at a path
//! - `watch <path>` / `unwatch <path>` / `watches` - Live reads
//! - `dump` - Show the whole store
//! - `help` - Show help
//! - `exit` - Exit the shell

use nu_ansi_term::{Color, Style};
use serde_json::Value as JsonValue;

use clinicdb_access::{mutate_data, use_fetch, Action, FetchOptions, FetchState, MutateRequest};
use clinicdb_core::{Path, Value};
use clinicdb_serde::{json_to_value, value_to_json};

use crate::context::ShellContext;

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command succeeded, optionally with output to display
    Ok(Option<String>),
    /// Command failed with an error message
    Error(String),
    /// User requested to exit
    Exit,
    /// Show help
    Help,
}

impl CommandResult {
    fn ok_display(display: impl Into<String>) -> Self {
        CommandResult::Ok(Some(display.into()))
    }

    fn ok_none() -> Self {
        CommandResult::Ok(None)
    }
}

/// Parse and execute a command
pub fn execute(input: &str, ctx: &mut ShellContext) -> CommandResult {
    let input = input.trim();

    if input.is_empty() {
        return CommandResult::ok_none();
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    match command.to_lowercase().as_str() {
        "help" | "?" => CommandResult::Help,
        "exit" | "quit" | "q" => CommandResult::Exit,
        "get" | "read" | "r" => cmd_get(args, ctx),
        "list" | "ls" => cmd_list(args, ctx),
        "set" => cmd_write(Action::Create, args, ctx),
        "push" => cmd_write(Action::CreateWithId, args, ctx),
        "update" => cmd_write(Action::Update, args, ctx),
        "delete" | "rm" => cmd_delete(args, ctx),
        "watch" => cmd_watch(args, ctx),
        "unwatch" => cmd_unwatch(args, ctx),
        "watches" => cmd_watches(ctx),
        "dump" => cmd_dump(ctx),
        _ => CommandResult::Error(format!(
            "Unknown command: '{}'. Type 'help' for available commands.",
            command
        )),
    }
}

/// Format help text
pub fn format_help() -> String {
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);
    let desc_style = Style::new().fg(Color::White);

    let mut help = String::new();
    help.push_str(&format!(
        "{}\n\n",
        Style::new().bold().paint("clinicdb Commands")
    ));

    let commands = [
        ("get", "<path>", "Read the value at path (alias: read, r)"),
        (
            "list",
            "<path> [field=value]",
            "Show a collection as a list (alias: ls)",
        ),
        ("", "", ""),
        ("set", "<path> <json>", "Overwrite the value at path"),
        ("push", "<path> <json>", "Store under a new generated key"),
        ("update", "<path> <json>", "Merge fields into the value at path"),
        ("delete", "<path>", "Remove the value at path (alias: rm)"),
        ("", "", ""),
        ("watch", "<path>", "Print every change at path"),
        ("unwatch", "<path>", "Stop watching path"),
        ("watches", "", "List watched paths"),
        ("dump", "", "Show the whole store"),
        ("", "", ""),
        ("help", "", "Show this help message"),
        ("exit", "", "Exit the shell (alias: quit, q)"),
    ];

    for (cmd, args, desc) in commands {
        if cmd.is_empty() {
            help.push('\n');
        } else {
            help.push_str(&format!(
                "  {:<12} {:<24} {}\n",
                cmd_style.paint(cmd),
                arg_style.paint(args),
                desc_style.paint(desc)
            ));
        }
    }

    help.push_str(&format!("\n{}\n", Style::new().bold().paint("Examples")));
    for example in [
        "push /patients {\"name\": \"Asha\", \"blood\": \"O+\"}",
        "list /slots taken=false",
        "update /appointments/a1 {\"status\": \"confirmed\"}",
        "watch /ambulanceBookings",
    ] {
        help.push_str(&format!("  {}\n", arg_style.paint(example)));
    }

    help.push_str(&format!(
        "\n{}",
        Style::new()
            .italic()
            .paint("Paths are slash separated; keys may not contain '.', '#', '$', '[' or ']'")
    ));

    help
}

fn cmd_get(args: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: get <path>".to_string());
    }
    let path = match Path::parse(args) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(format!("Invalid path: {}", e)),
    };

    match ctx.db().get(&path) {
        Ok(Some(value)) => CommandResult::ok_display(format_json(&value_to_json(value))),
        Ok(None) => CommandResult::ok_display(format!("{}", Color::DarkGray.paint("(no data)"))),
        Err(e) => CommandResult::Error(format!("Read error: {}", e)),
    }
}

fn cmd_list(args: &str, ctx: &mut ShellContext) -> CommandResult {
    let mut parts = args.split_whitespace();
    let path = match parts.next() {
        Some(p) => p,
        None => return CommandResult::Error("Usage: list <path> [field=value]".to_string()),
    };

    let mut options = FetchOptions::default();
    if let Some(condition) = parts.next() {
        let (field, expected) = match parse_condition(condition) {
            Ok(c) => c,
            Err(e) => return CommandResult::Error(e),
        };
        options = options.with_filter(move |record| record.get(&field) == Some(&expected));
    }

    // The in-memory store answers subscriptions right away, so the first
    // state is already the result.
    let fetch = use_fetch::<JsonValue>(ctx.db(), path, options);
    match fetch.state() {
        FetchState::Ready(Some(list)) => CommandResult::ok_display(format_json(&list)),
        FetchState::Ready(None) | FetchState::Idle | FetchState::Loading => {
            CommandResult::ok_display(format!("{}", Color::DarkGray.paint("(no data)")))
        }
        FetchState::Failed(e) => CommandResult::Error(format!("List error: {}", e)),
    }
}

/// Parse `field=value`. The value is JSON if it parses, a string otherwise.
fn parse_condition(condition: &str) -> Result<(Path, Value), String> {
    let (field, raw) = condition
        .split_once('=')
        .ok_or_else(|| format!("Expected field=value, got '{}'", condition))?;
    let field = Path::parse(field).map_err(|e| format!("Invalid field: {}", e))?;
    if field.is_empty() {
        return Err("Expected field=value, field is empty".to_string());
    }
    let expected = serde_json::from_str::<JsonValue>(raw)
        .map(json_to_value)
        .unwrap_or_else(|_| Value::from(raw));
    Ok((field, expected))
}

fn cmd_write(action: Action, args: &str, ctx: &mut ShellContext) -> CommandResult {
    let (path, json) = match parse_write_args(args) {
        Some(parts) => parts,
        None => {
            return CommandResult::Error(format!(
                "Usage: {} <path> <json>\nExample: {} /patients/p1 {{\"name\": \"Asha\"}}",
                command_name(action),
                command_name(action)
            ))
        }
    };

    let data: JsonValue = match serde_json::from_str(&json) {
        Ok(v) => v,
        Err(e) => return CommandResult::Error(format!("Invalid JSON: {}", e)),
    };

    let request = MutateRequest {
        path,
        data: Some(json_to_value(data)),
        action,
    };
    report(mutate_data(ctx.db().as_ref(), request))
}

fn cmd_delete(args: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: delete <path>".to_string());
    }
    report(mutate_data(ctx.db().as_ref(), MutateRequest::delete(args)))
}

fn report(result: clinicdb_access::MutationResult) -> CommandResult {
    match (result.success, result.id, result.error) {
        (true, Some(id), _) => CommandResult::ok_display(format!(
            "{} {} {}",
            Color::Green.paint("ok"),
            Color::Cyan.paint("id:"),
            id
        )),
        (true, None, _) => CommandResult::ok_display(format!("{}", Color::Green.paint("ok"))),
        (false, _, error) => CommandResult::Error(format!(
            "Write error: {}",
            error.unwrap_or_else(|| "unknown".to_string())
        )),
    }
}

fn command_name(action: Action) -> &'static str {
    match action {
        Action::Create => "set",
        Action::CreateWithId => "push",
        Action::Update => "update",
        Action::Delete => "delete",
    }
}

fn cmd_watch(args: &str, ctx: &mut ShellContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <path>".to_string());
    }
    match ctx.watch(args) {
        Ok((key, Some(state))) => CommandResult::ok_display(format_change(&key, &state)),
        Ok((key, None)) => CommandResult::Error(format!("Already watching {}", key)),
        Err(e) => CommandResult::Error(format!("Invalid path: {}", e)),
    }
}

fn cmd_unwatch(args: &str, ctx: &mut ShellContext) -> CommandResult {
    if ctx.unwatch(args) {
        CommandResult::ok_display(format!("{}", Color::Green.paint("ok")))
    } else {
        CommandResult::Error(format!("Not watching {}", args))
    }
}

fn cmd_watches(ctx: &mut ShellContext) -> CommandResult {
    let paths = ctx.watched_paths();
    if paths.is_empty() {
        return CommandResult::ok_display(format!(
            "{}",
            Color::Yellow.paint("No watches. Use 'watch <path>' to follow a path.")
        ));
    }
    let mut output = String::new();
    for path in paths {
        output.push_str(&format!("  {}\n", Color::Cyan.paint(path)));
    }
    CommandResult::ok_display(output.trim_end().to_string())
}

fn cmd_dump(ctx: &mut ShellContext) -> CommandResult {
    match ctx.store().export() {
        Ok(Value::Null) => {
            CommandResult::ok_display(format!("{}", Color::DarkGray.paint("(empty store)")))
        }
        Ok(tree) => CommandResult::ok_display(format_json(&value_to_json(tree))),
        Err(e) => CommandResult::Error(format!("Read error: {}", e)),
    }
}

/// Format one watch update for display.
pub fn format_change(path: &str, state: &FetchState<Option<Value>>) -> String {
    let label = Color::Magenta.paint(format!("[watch {}]", path));
    match state {
        FetchState::Ready(Some(value)) => {
            format!("{} {}", label, format_json(&value_to_json(value.clone())))
        }
        FetchState::Ready(None) => format!("{} {}", label, Color::DarkGray.paint("(no data)")),
        FetchState::Loading => format!("{} {}", label, Color::DarkGray.paint("loading...")),
        FetchState::Idle => format!("{} {}", label, Color::DarkGray.paint("idle")),
        FetchState::Failed(e) => format!("{} {}", label, Color::Red.paint(e)),
    }
}

/// Parse write command arguments into (path, json)
fn parse_write_args(args: &str) -> Option<(String, String)> {
    let args = args.trim();
    if args.is_empty() {
        return None;
    }

    // The value starts at the first '{', '[' or '"', or at the first token
    // after whitespace that looks like a JSON literal.
    let mut value_start = args.find(['{', '[', '"']);

    if value_start.is_none() {
        let chars: Vec<(usize, char)> = args.char_indices().collect();
        for pair in chars.windows(2) {
            let (_, c) = pair[0];
            let (next_index, next) = pair[1];
            if !c.is_whitespace() {
                continue;
            }
            let rest = &args[next_index..];
            if next.is_ascii_digit()
                || next == '-'
                || rest.starts_with("true")
                || rest.starts_with("false")
                || rest.starts_with("null")
            {
                value_start = Some(next_index);
                break;
            }
        }
    }

    let value_start = value_start?;

    let path = args[..value_start].trim().to_string();
    let value = args[value_start..].trim().to_string();

    if path.is_empty() || value.is_empty() {
        return None;
    }

    Some((path, value))
}

/// Format JSON with syntax highlighting
fn format_json(value: &JsonValue) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());

    let mut result = String::new();
    let mut in_string = false;
    let mut escape_next = false;

    for c in pretty.chars() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            result.push(c);
            escape_next = true;
            continue;
        }

        if c == '"' {
            in_string = !in_string;
            result.push_str(&format!("{}", Color::Green.paint("\"")));
            continue;
        }

        if in_string {
            result.push_str(&format!("{}", Color::Green.paint(c.to_string())));
        } else {
            match c {
                '{' | '}' | '[' | ']' => {
                    result.push_str(&format!("{}", Color::White.bold().paint(c.to_string())))
                }
                _ if c.is_ascii_digit() || c == '.' || c == '-' => {
                    result.push_str(&format!("{}", Color::Cyan.paint(c.to_string())))
                }
                _ => result.push(c),
            }
        }
    }

    result
}
