//! Inbound message handling
//!
//! Filters messages down to the owner's direct messages, then dispatches in
//! priority order: structured command, natural-language intent, chat fallback.
//! Returns the reply text; sending it is the caller's job.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Platform-neutral InboundMessage, intent cascade, injected chat fallback
//! - 1.0.0: `/todo` commands with ChatGPT fallback

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AssistantError;
use crate::database::Database;
use crate::features::chat::ChatFallback;
use crate::features::intents::{Command, CommandParser, Intent, IntentClassifier, TodoCommand};
use crate::features::reminders::{Reminder, ReminderStore};
use crate::features::schedule::{Event, EventDetails, EventStore};
use crate::features::time::{display, now_in};
use crate::features::todos::{Task, TaskStore};

const DUE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The parts of a chat message the handler cares about
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_is_bot: bool,
    /// One-to-one conversation (not a server channel or group)
    pub is_direct: bool,
    pub content: String,
}

#[derive(Clone)]
pub struct CommandHandler {
    tasks: TaskStore,
    events: EventStore,
    reminders: ReminderStore,
    parser: CommandParser,
    classifier: Arc<IntentClassifier>,
    fallback: Arc<dyn ChatFallback>,
    allowed_user_id: u64,
    timezone: Tz,
}

impl CommandHandler {
    pub fn new(
        database: Database,
        fallback: Arc<dyn ChatFallback>,
        allowed_user_id: u64,
        command_prefix: &str,
        timezone: Tz,
    ) -> Result<Self> {
        Ok(Self {
            tasks: TaskStore::new(database.clone(), timezone),
            events: EventStore::new(database.clone(), timezone),
            reminders: ReminderStore::new(database, timezone),
            parser: CommandParser::new(command_prefix),
            classifier: Arc::new(IntentClassifier::new()?),
            fallback,
            allowed_user_id,
            timezone,
        })
    }

    /// Only the owner's own direct messages are answered
    pub fn is_authorized(&self, msg: &InboundMessage) -> bool {
        !msg.author_is_bot && msg.author_id == self.allowed_user_id && msg.is_direct
    }

    /// Reply for `msg`, or `None` when the message is ignored
    pub async fn handle_message(&self, msg: &InboundMessage) -> Result<Option<String>> {
        if !self.is_authorized(msg) {
            debug!(
                "Ignoring message from {} (bot: {}, direct: {})",
                msg.author_id, msg.author_is_bot, msg.is_direct
            );
            return Ok(None);
        }

        let content = msg.content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let request_id = Uuid::new_v4();
        info!(
            "[{}] 📥 Message received | Content: '{}'",
            request_id,
            content.chars().take(100).collect::<String>()
        );

        let reply = self.respond_at(content, &now_in(self.timezone)).await?;

        info!("[{request_id}] ✅ Message processing completed");
        Ok(Some(reply))
    }

    /// Reply for already-authorized text, with an explicit clock
    pub async fn respond_at(&self, content: &str, now: &DateTime<Tz>) -> Result<String> {
        if let Some(command) = self.parser.parse(content) {
            debug!("🎯 Structured command: {command:?}");
            return self.handle_command(command).await;
        }

        let intent = self.classifier.classify(content, now);
        debug!("🔍 Classified as {}", intent.kind());
        self.handle_intent(intent, content).await
    }

    async fn handle_command(&self, command: Command) -> Result<String> {
        let prefix = self.parser.todo_prefix();

        let reply = match command {
            Command::Todo(TodoCommand::Add(description)) => {
                let id = self.tasks.add(&description, None).await?;
                format!("Added task #{id}")
            }
            Command::Todo(TodoCommand::List) => format_pending_tasks(&self.tasks.list_pending().await?),
            Command::Todo(TodoCommand::All) => format_all_tasks(&self.tasks.list().await?),
            Command::Todo(TodoCommand::Complete(id)) => {
                self.tasks.complete(id).await?;
                "Completed".to_string()
            }
            Command::Todo(TodoCommand::Delete(id)) => {
                self.tasks.delete(id).await?;
                "Deleted".to_string()
            }
            Command::Todo(TodoCommand::Usage) => {
                format!("Usage: {prefix} <add|list|all|complete|delete>")
            }
            Command::Todo(TodoCommand::Invalid) => format!("Invalid {prefix} command"),
            Command::ListEvents => format_events(&self.events.list().await?),
            Command::ListReminders => format_reminders(&self.reminders.list_pending().await?),
        };

        Ok(reply)
    }

    async fn handle_intent(&self, intent: Intent, content: &str) -> Result<String> {
        let reply = match intent {
            Intent::AddTodo { description } => {
                let id = self.tasks.add(&description, None).await?;
                info!("📝 Added task #{id}: {description}");
                format!("Added task #{id}")
            }
            Intent::ShowTodoList => format_pending_tasks(&self.tasks.list_pending().await?),
            Intent::AddEvent { title, start } => {
                let id = self.events.add(&title, &start, EventDetails::default()).await?;
                info!("📅 Added event #{id}: {title} at {start}");
                format!("Added event #{id}: {title} at {}", display(&start))
            }
            Intent::AddReminder { message, remind_at } => {
                match self.reminders.add(&message, &remind_at).await {
                    Ok(id) => {
                        info!("⏰ Added reminder #{id} for {remind_at}");
                        format!("Reminder #{id} set for {}: {message}", display(&remind_at))
                    }
                    Err(AssistantError::Validation(reason)) => format!("Reminder not set: {reason}"),
                    Err(e) => return Err(e.into()),
                }
            }
            Intent::NoMatch => {
                debug!("💬 No intent matched, using chat fallback");
                self.fallback.reply(content).await?
            }
        };

        Ok(reply)
    }
}

fn format_pending_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "(no pending tasks)".to_string();
    }

    tasks
        .iter()
        .map(|task| match &task.due_date {
            Some(due) => format!("{}: {} (due {})", task.id, task.description, due.format(DUE_FORMAT)),
            None => format!("{}: {}", task.id, task.description),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_all_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "(no tasks)".to_string();
    }

    tasks
        .iter()
        .map(|task| {
            let done = if task.completed { " ✅" } else { "" };
            format!("{}: {}{}", task.id, task.description, done)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "(no events)".to_string();
    }

    events
        .iter()
        .map(|event| {
            let mut line = format!("{}: {} {}", event.id, display(&event.start_time), event.title);
            if let Some(end) = &event.end_time {
                line.push_str(&format!(" (until {})", end.format(DUE_FORMAT)));
            }
            if let Some(location) = &event.location {
                line.push_str(&format!(" @ {location}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_reminders(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "(no pending reminders)".to_string();
    }

    reminders
        .iter()
        .map(|r| format!("{}: {} {}", r.id, display(&r.remind_at), r.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::delivery::DeliverySink;
    use crate::core::error::AssistantResult;
    use crate::features::reminders::ReminderScheduler;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;
    use std::time::Duration;
    use tokio::sync::Mutex;

    const OWNER: u64 = 1001;

    struct EchoChat;

    #[async_trait]
    impl ChatFallback for EchoChat {
        async fn reply(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    struct BrokenChat;

    #[async_trait]
    impl ChatFallback for BrokenChat {
        async fn reply(&self, _prompt: &str) -> Result<String> {
            Err(anyhow::anyhow!("upstream down"))
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliverySink for CollectingSink {
        async fn deliver(&self, _recipient: u64, text: &str) -> AssistantResult<()> {
            self.sent.lock().await.push(text.to_string());
            Ok(())
        }
    }

    async fn handler_with(prefix: &str) -> (Database, CommandHandler) {
        let db = Database::in_memory().await.unwrap();
        let handler = CommandHandler::new(db.clone(), Arc::new(EchoChat), OWNER, prefix, Tokyo).unwrap();
        (db, handler)
    }

    async fn handler() -> CommandHandler {
        handler_with("/todo").await.1
    }

    fn at(mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2026, mo, d, h, mi, 0).unwrap()
    }

    fn dm(content: &str) -> InboundMessage {
        InboundMessage {
            author_id: OWNER,
            author_is_bot: false,
            is_direct: true,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ignores_strangers_bots_and_guilds() {
        let h = handler().await;

        let stranger = InboundMessage { author_id: 5, ..dm("/todo list") };
        let bot = InboundMessage { author_is_bot: true, ..dm("/todo list") };
        let guild = InboundMessage { is_direct: false, ..dm("/todo list") };

        assert_eq!(h.handle_message(&stranger).await.unwrap(), None);
        assert_eq!(h.handle_message(&bot).await.unwrap(), None);
        assert_eq!(h.handle_message(&guild).await.unwrap(), None);
        assert_eq!(h.handle_message(&dm("   ")).await.unwrap(), None);
        assert_eq!(
            h.handle_message(&dm("/todo list")).await.unwrap().as_deref(),
            Some("(no pending tasks)")
        );
    }

    #[tokio::test]
    async fn test_add_todo_scenario() {
        let h = handler().await;
        let reply = h.handle_message(&dm("add buy milk to my todo")).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Added task #1"));

        let list = h.respond_at("show my todo list", &at(10, 18, 8, 0)).await.unwrap();
        assert_eq!(list, "1: buy milk");
    }

    #[tokio::test]
    async fn test_custom_prefix_empty_list() {
        let (_db, h) = handler_with("cmd").await;
        let reply = h.respond_at("cmd list", &at(10, 18, 8, 0)).await.unwrap();
        assert_eq!(reply, "(no pending tasks)");
    }

    #[tokio::test]
    async fn test_todo_command_flow() {
        let h = handler().await;
        let now = at(10, 18, 8, 0);

        assert_eq!(h.respond_at("/todo add buy milk", &now).await.unwrap(), "Added task #1");
        assert_eq!(h.respond_at("/todo add walk dog", &now).await.unwrap(), "Added task #2");
        assert_eq!(h.respond_at("/todo complete 1", &now).await.unwrap(), "Completed");
        assert_eq!(h.respond_at("/todo list", &now).await.unwrap(), "2: walk dog");
        assert_eq!(
            h.respond_at("/todo all", &now).await.unwrap(),
            "1: buy milk ✅\n2: walk dog"
        );
        assert_eq!(h.respond_at("/todo delete 2", &now).await.unwrap(), "Deleted");
        assert_eq!(h.respond_at("/todo delete 99", &now).await.unwrap(), "Deleted");
        assert_eq!(h.respond_at("/todo list", &now).await.unwrap(), "(no pending tasks)");
    }

    #[tokio::test]
    async fn test_command_errors_are_replies() {
        let h = handler().await;
        let now = at(10, 18, 8, 0);

        assert_eq!(
            h.respond_at("/todo", &now).await.unwrap(),
            "Usage: /todo <add|list|all|complete|delete>"
        );
        assert_eq!(h.respond_at("/todo complete x", &now).await.unwrap(), "Invalid /todo command");
        assert_eq!(h.respond_at("/todo nope", &now).await.unwrap(), "Invalid /todo command");
    }

    #[tokio::test]
    async fn test_command_beats_natural_language() {
        let h = handler().await;
        let now = at(10, 18, 8, 0);

        assert_eq!(
            h.respond_at("/todo add remind me at 9 to call mom", &now).await.unwrap(),
            "Added task #1"
        );
        assert_eq!(h.respond_at("/reminders", &now).await.unwrap(), "(no pending reminders)");
    }

    #[tokio::test]
    async fn test_pending_list_shows_due_dates() {
        let (db, h) = handler_with("/todo").await;
        let tasks = TaskStore::new(db, Tokyo);
        tasks.add("pay rent", Some(&at(11, 1, 9, 0))).await.unwrap();
        tasks.add("stretch", None).await.unwrap();

        assert_eq!(
            h.respond_at("what's on my todo list?", &at(10, 18, 8, 0)).await.unwrap(),
            "1: pay rent (due 2026-11-01 09:00)\n2: stretch"
        );
    }

    #[tokio::test]
    async fn test_add_event_scenario() {
        let h = handler().await;
        let now = at(10, 1, 12, 0);

        let reply = h.respond_at("10/5 15:00 meeting", &now).await.unwrap();
        assert_eq!(reply, "Added event #1: meeting at 2026-10-05 15:00 JST");

        h.respond_at("10/3 09:30 standup", &now).await.unwrap();
        assert_eq!(
            h.respond_at("/events", &now).await.unwrap(),
            "2: 2026-10-03 09:30 JST standup\n1: 2026-10-05 15:00 JST meeting"
        );
    }

    #[tokio::test]
    async fn test_reminder_scenario_end_to_end() {
        let (db, h) = handler_with("/todo").await;
        let reply = h
            .respond_at("remind me at 9 to call mom", &at(10, 18, 7, 30))
            .await
            .unwrap();
        assert_eq!(reply, "Reminder #1 set for 2026-10-18 09:00 JST: call mom");
        assert_eq!(
            h.respond_at("/reminders", &at(10, 18, 7, 31)).await.unwrap(),
            "1: 2026-10-18 09:00 JST call mom"
        );

        let store = ReminderStore::new(db, Tokyo);
        let sink = Arc::new(CollectingSink::default());
        let scheduler =
            ReminderScheduler::new(store.clone(), sink.clone(), OWNER, Tokyo, Duration::from_secs(60));

        scheduler.run_cycle_at(&at(10, 18, 9, 1)).await.unwrap();
        scheduler.run_cycle_at(&at(10, 18, 9, 2)).await.unwrap();

        assert_eq!(*sink.sent.lock().await, vec!["call mom".to_string()]);
        assert!(store.due(&at(10, 18, 9, 3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_reminder_is_refused_with_reply() {
        let h = handler().await;
        let text = format!("remind me at 9 to {}", "x".repeat(2001));

        let reply = h.respond_at(&text, &at(10, 18, 7, 30)).await.unwrap();
        assert!(reply.starts_with("Reminder not set:"), "{reply}");
        assert_eq!(
            h.respond_at("/reminders", &at(10, 18, 7, 31)).await.unwrap(),
            "(no pending reminders)"
        );
    }

    #[tokio::test]
    async fn test_no_match_uses_fallback() {
        let h = handler().await;
        assert_eq!(
            h.respond_at("how are you?", &at(10, 18, 8, 0)).await.unwrap(),
            "echo: how are you?"
        );
    }

    #[tokio::test]
    async fn test_fallback_error_is_reported() {
        let db = Database::in_memory().await.unwrap();
        let h = CommandHandler::new(db, Arc::new(BrokenChat), OWNER, "/todo", Tokyo).unwrap();
        assert!(h.respond_at("hello", &at(10, 18, 8, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error_not_a_panic() {
        let (db, h) = handler_with("/todo").await;
        db.execute_batch("DROP TABLE tasks").await.unwrap();

        assert!(h.respond_at("/todo list", &at(10, 18, 8, 0)).await.is_err());
        // other tables still work
        assert_eq!(
            h.respond_at("/events", &at(10, 18, 8, 0)).await.unwrap(),
            "(no events)"
        );
    }
}
