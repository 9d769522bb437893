use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::sync::watch;

use junbot::command_handler::{CommandHandler, InboundMessage};
use junbot::core::config::DEFAULT_CONFIG_PATH;
use junbot::core::logging::init_logging;
use junbot::core::{chunk_for_message, Config, DirectMessageSink};
use junbot::database::Database;
use junbot::features::{OpenAiChat, ReminderScheduler, ReminderStore};

struct Handler {
    command_handler: CommandHandler,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = InboundMessage {
            author_id: msg.author.id.0,
            author_is_bot: msg.author.bot,
            is_direct: msg.guild_id.is_none(),
            content: msg.content.clone(),
        };

        match self.command_handler.handle_message(&inbound).await {
            Ok(Some(reply)) => {
                for chunk in chunk_for_message(&reply) {
                    if let Err(why) = msg.channel_id.say(&ctx.http, &chunk).await {
                        error!("Failed to send reply: {why}");
                        break;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("Error handling message: {e}");
                if let Err(why) = msg
                    .channel_id
                    .say(
                        &ctx.http,
                        "Sorry, I encountered an error processing your message.",
                    )
                    .await
                {
                    error!("Failed to send error message: {why}");
                }
            }
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("🔗 Gateway session ID: {:?}", ready.session_id);
        info!("🤖 Bot ID: {}", ready.user.id);
        debug!("🌐 Gateway version: {}", ready.version);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    // The openai crate reads its key from the environment
    std::env::set_var("OPENAI_API_KEY", &config.openai_api_key);
    std::env::set_var("OPENAI_KEY", &config.openai_api_key);

    init_logging(&config.logging)?;

    info!("Starting junbot...");
    info!("📄 Loaded config from {config_path}");

    let database = Database::new(&config.database.path).await?;

    let chat = Arc::new(OpenAiChat::new(&config.openai));
    let command_handler = CommandHandler::new(
        database.clone(),
        chat,
        config.discord.allowed_user_id,
        &config.discord.command_prefix,
        config.timezone,
    )?;

    let intents = GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler { command_handler })
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the reminder scheduler
    let scheduler = ReminderScheduler::new(
        ReminderStore::new(database.clone(), config.timezone),
        Arc::new(DirectMessageSink::new(client.cache_and_http.http.clone())),
        config.discord.allowed_user_id,
        config.timezone,
        config.check_interval(),
    );
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        info!("🛑 Shutdown requested");
        shard_manager.lock().await.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        error!("Reminder scheduler task failed: {e}");
    }

    info!("👋 junbot stopped");
    Ok(())
}
