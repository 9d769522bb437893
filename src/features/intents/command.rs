//! Structured text commands (`/todo add ...`, `/events`, `/reminders`)
//!
//! These take precedence over natural-language classification.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: `/todo all`, `/events`, `/reminders`; configurable todo prefix
//! - 1.0.0: `/todo add|list|complete|delete`

pub const EVENTS_COMMAND: &str = "/events";
pub const REMINDERS_COMMAND: &str = "/reminders";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoCommand {
    Add(String),
    /// Pending tasks only
    List,
    /// Every task, completed ones marked
    All,
    Complete(i64),
    Delete(i64),
    /// Prefix with no subcommand
    Usage,
    /// Unknown subcommand, wrong argument count or bad id
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Todo(TodoCommand),
    ListEvents,
    ListReminders,
}

#[derive(Debug, Clone)]
pub struct CommandParser {
    todo_prefix: String,
}

impl CommandParser {
    pub fn new(todo_prefix: impl Into<String>) -> Self {
        Self {
            todo_prefix: todo_prefix.into(),
        }
    }

    pub fn todo_prefix(&self) -> &str {
        &self.todo_prefix
    }

    /// `None` when `text` doesn't start with a known command token
    pub fn parse(&self, text: &str) -> Option<Command> {
        let (head, rest) = split_token(text.trim());

        if head == self.todo_prefix {
            return Some(Command::Todo(parse_todo(rest)));
        }

        match head {
            EVENTS_COMMAND => Some(Command::ListEvents),
            REMINDERS_COMMAND => Some(Command::ListReminders),
            _ => None,
        }
    }
}

fn parse_todo(args: &str) -> TodoCommand {
    let args = args.trim();
    if args.is_empty() {
        return TodoCommand::Usage;
    }

    let (subcommand, argument) = split_token(args);
    let argument = argument.trim();

    match (subcommand, argument.is_empty()) {
        ("add", false) => TodoCommand::Add(argument.to_string()),
        ("list", _) => TodoCommand::List,
        ("all", _) => TodoCommand::All,
        ("complete", false) => parse_id(argument).map_or(TodoCommand::Invalid, TodoCommand::Complete),
        ("delete", false) => parse_id(argument).map_or(TodoCommand::Invalid, TodoCommand::Delete),
        _ => TodoCommand::Invalid,
    }
}

fn parse_id(argument: &str) -> Option<i64> {
    argument.parse::<i64>().ok()
}

/// Split off the first whitespace-delimited token
fn split_token(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], &text[index..]),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(text: &str) -> Option<Command> {
        CommandParser::new("/todo").parse(text)
    }

    #[test]
    fn test_todo_subcommands() {
        assert_eq!(
            todo("/todo add buy  milk "),
            Some(Command::Todo(TodoCommand::Add("buy  milk".into())))
        );
        assert_eq!(todo("/todo list"), Some(Command::Todo(TodoCommand::List)));
        assert_eq!(todo("  /todo   all"), Some(Command::Todo(TodoCommand::All)));
        assert_eq!(todo("/todo complete 3"), Some(Command::Todo(TodoCommand::Complete(3))));
        assert_eq!(todo("/todo delete 12"), Some(Command::Todo(TodoCommand::Delete(12))));
    }

    #[test]
    fn test_usage_and_invalid() {
        assert_eq!(todo("/todo"), Some(Command::Todo(TodoCommand::Usage)));
        assert_eq!(todo("/todo   "), Some(Command::Todo(TodoCommand::Usage)));
        assert_eq!(todo("/todo add"), Some(Command::Todo(TodoCommand::Invalid)));
        assert_eq!(todo("/todo complete"), Some(Command::Todo(TodoCommand::Invalid)));
        assert_eq!(todo("/todo complete three"), Some(Command::Todo(TodoCommand::Invalid)));
        assert_eq!(todo("/todo delete 1 2"), Some(Command::Todo(TodoCommand::Invalid)));
        assert_eq!(todo("/todo frobnicate"), Some(Command::Todo(TodoCommand::Invalid)));
    }

    #[test]
    fn test_prefix_must_be_whole_token() {
        assert_eq!(todo("/todos list"), None);
        assert_eq!(todo("please /todo list"), None);
        assert_eq!(todo("add buy milk to my todo"), None);
    }

    #[test]
    fn test_custom_prefix() {
        let parser = CommandParser::new("cmd");
        assert_eq!(parser.parse("cmd list"), Some(Command::Todo(TodoCommand::List)));
        assert_eq!(parser.parse("/todo list"), None);
        assert_eq!(parser.todo_prefix(), "cmd");
    }

    #[test]
    fn test_listing_commands() {
        assert_eq!(todo("/events"), Some(Command::ListEvents));
        assert_eq!(todo("/reminders please"), Some(Command::ListReminders));
        assert_eq!(todo("/eventsx"), None);
    }
}
