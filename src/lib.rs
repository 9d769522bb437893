// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod command_handler;

pub use core::Config;
pub use command_handler::{CommandHandler, InboundMessage};
pub use database::Database;

pub use features::{
    // Chat
    ChatFallback, OpenAiChat,
    // Intents
    Intent, IntentClassifier,
    // Reminders
    ReminderScheduler, ReminderStore,
    // Schedule
    EventStore,
    // Todos
    TaskStore,
};
