//! Natural-language intent cascade
//!
//! Matcher groups are tried in a fixed priority order and the first group that
//! yields an intent wins. Inside a group the first matching pattern decides;
//! if its captures don't survive validation (empty text, impossible date) the
//! whole group counts as no match and the cascade moves on.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.2.0: Japanese phrasings for every group
//! - 1.1.0: "tomorrow" and am/pm support for reminders
//! - 1.0.0: Todo list/add, calendar event and reminder groups

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use log::debug;
use regex::{Captures, Regex};

use crate::core::error::{AssistantError, AssistantResult};
use crate::features::time::{resolve_calendar, resolve_relative, ClockTime, DayAnchor, Meridiem};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddTodo { description: String },
    ShowTodoList,
    AddEvent { title: String, start: DateTime<Tz> },
    AddReminder { message: String, remind_at: DateTime<Tz> },
    NoMatch,
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddTodo { .. } => "add_todo",
            Self::ShowTodoList => "show_todo_list",
            Self::AddEvent { .. } => "add_event",
            Self::AddReminder { .. } => "add_reminder",
            Self::NoMatch => "no_match",
        }
    }
}

const SHOW_TODO_LIST: &[&str] = &[
    r"(?i)\b(?:show|list|view|see|display)\s+(?:me\s+)?(?:my\s+|the\s+)?(?:todos?|to-dos?|tasks?)(?:\s*list)?\b",
    r"(?i)\bwhat(?:'s|’s|\s+is|\s+are)\s+(?:on\s+)?my\s+(?:todos?|to-dos?|tasks?)(?:\s*list)?\b",
    r"(?i)(?:やること|タスク|todo)(?:リスト|一覧)?\s*を?\s*(?:見せて|表示|教えて)",
];

const ADD_TODO: &[&str] = &[
    r"(?i)\badd\s+(?P<desc>.+?)\s+to\s+(?:my\s+|the\s+)?(?:todos?|to-dos?|tasks?)(?:\s*list)?\b",
    r"(?i)\b(?:todo|to-do)\s*[:：]\s*(?P<desc>.+)",
    r"(?i)(?P<desc>.+?)\s*を\s*(?:やること|タスク|todo)(?:リスト)?に追加",
];

const ADD_EVENT: &[&str] = &[
    r"\b(?P<month>\d{1,2})/(?P<day>\d{1,2})\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})\s+(?P<title>.+)",
    r"(?P<month>\d{1,2})月(?P<day>\d{1,2})日\s*(?P<hour>\d{1,2})時(?:(?P<minute>\d{1,2})分)?\s*(?:に|から)?\s*(?P<title>.+)",
];

const ADD_REMINDER: &[&str] = &[
    r"(?i)\bremind\s+me\s+(?:(?P<tomorrow>tomorrow)\s+)?at\s+(?P<hour>\d{1,2})(?::(?P<minute>\d{2}))?\s*(?P<meridiem>[ap]\.?m\.?)?\s+to\s+(?P<message>.+)",
    r"(?i)\bremind\s+me\s+at\s+(?P<hour>\d{1,2})(?::(?P<minute>\d{2}))?\s*(?P<meridiem>[ap]\.?m\.?)?\s+(?P<tomorrow>tomorrow)\s+to\s+(?P<message>.+)",
    r"(?:(?P<tomorrow>明日)[の、,\s]*)?(?P<meridiem>午前|午後)?\s*(?P<hour>\d{1,2})時(?:(?P<minute>\d{1,2})分)?に\s*(?P<message>.+?)\s*(?:と|って)?\s*リマインド",
];

type Extractor = fn(&Captures<'_>, &DateTime<Tz>) -> AssistantResult<Intent>;

struct MatcherGroup {
    name: &'static str,
    patterns: Vec<Regex>,
    extract: Extractor,
}

impl MatcherGroup {
    fn compile(name: &'static str, patterns: &[&str], extract: Extractor) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    anyhow::anyhow!("Invalid pattern in matcher group '{}': {}", name, e)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            patterns,
            extract,
        })
    }

    /// Captures of the first pattern that matches anywhere in `text`
    fn first_match<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.patterns.iter().find_map(|pattern| pattern.captures(text))
    }
}

/// Maps free text to an [`Intent`]. Pure: no I/O, no clock reads.
pub struct IntentClassifier {
    groups: Vec<MatcherGroup>,
}

impl IntentClassifier {
    pub fn new() -> Result<Self> {
        // Order is priority: list before add, so "show my todo list" is never an add
        let groups = vec![
            MatcherGroup::compile("show_todo_list", SHOW_TODO_LIST, extract_show_todo_list)?,
            MatcherGroup::compile("add_todo", ADD_TODO, extract_add_todo)?,
            MatcherGroup::compile("add_event", ADD_EVENT, extract_add_event)?,
            MatcherGroup::compile("add_reminder", ADD_REMINDER, extract_add_reminder)?,
        ];
        Ok(Self { groups })
    }

    /// Classify `text`; `now` supplies both the reference instant and the zone
    pub fn classify(&self, text: &str, now: &DateTime<Tz>) -> Intent {
        for group in &self.groups {
            let Some(captures) = group.first_match(text) else {
                continue;
            };

            match (group.extract)(&captures, now) {
                Ok(intent) => return intent,
                Err(e) => debug!("Matcher group '{}' matched but was discarded: {}", group.name, e),
            }
        }

        Intent::NoMatch
    }
}

fn extract_show_todo_list(_: &Captures<'_>, _: &DateTime<Tz>) -> AssistantResult<Intent> {
    Ok(Intent::ShowTodoList)
}

fn extract_add_todo(captures: &Captures<'_>, _: &DateTime<Tz>) -> AssistantResult<Intent> {
    Ok(Intent::AddTodo {
        description: required_text(captures, "desc")?,
    })
}

fn extract_add_event(captures: &Captures<'_>, now: &DateTime<Tz>) -> AssistantResult<Intent> {
    let title = required_text(captures, "title")?;
    let start = resolve_calendar(
        now,
        number(captures, "month")?,
        number(captures, "day")?,
        number(captures, "hour")?,
        optional_number(captures, "minute")?,
    )?;
    Ok(Intent::AddEvent { title, start })
}

fn extract_add_reminder(captures: &Captures<'_>, now: &DateTime<Tz>) -> AssistantResult<Intent> {
    let message = required_text(captures, "message")?;
    let anchor = if captures.name("tomorrow").is_some() {
        DayAnchor::Tomorrow
    } else {
        DayAnchor::Today
    };
    let meridiem = captures
        .name("meridiem")
        .map(|m| {
            Meridiem::parse(m.as_str()).ok_or_else(|| {
                AssistantError::malformed_time(format!("unknown meridiem {:?}", m.as_str()))
            })
        })
        .transpose()?;
    let clock = ClockTime::new(
        number(captures, "hour")?,
        optional_number(captures, "minute")?,
        meridiem,
    );
    let remind_at = resolve_relative(now, anchor, clock)?;
    Ok(Intent::AddReminder { message, remind_at })
}

fn required_text(captures: &Captures<'_>, name: &str) -> AssistantResult<String> {
    let text = captures.name(name).map(|m| m.as_str().trim()).unwrap_or_default();
    if text.is_empty() {
        return Err(AssistantError::Validation(format!("empty {name}")));
    }
    Ok(text.to_string())
}

fn number(captures: &Captures<'_>, name: &str) -> AssistantResult<u32> {
    optional_number(captures, name)?
        .ok_or_else(|| AssistantError::malformed_time(format!("missing {name}")))
}

fn optional_number(captures: &Captures<'_>, name: &str) -> AssistantResult<Option<u32>> {
    captures
        .name(name)
        .map(|m| {
            ascii_digits(m.as_str())
                .parse::<u32>()
                .map_err(|e| AssistantError::malformed_time(format!("{name} {:?}: {e}", m.as_str())))
        })
        .transpose()
}

/// `\d` also matches full-width digits (０-９), which `parse` rejects
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
            _ => c,
        })
        .collect()
}
