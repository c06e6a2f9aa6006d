//! Operator notifications.
//!
//! Failures that leave storage and the database out of step are reported through a
//! [`NotificationSink`], which formats the alert and delivers it on the background
//! runner so the request that hit the failure never waits on the bot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use labbeauty_core::Config;
use labbeauty_worker::BackgroundTasks;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Delivers a text message to whoever watches this service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Telegram Bot API `sendMessage` client.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Telegram")?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Point the client at another Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.client
            .get(self.send_message_url())
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .context("Telegram request failed")?
            .error_for_status()
            .context("Telegram rejected the message")?;

        tracing::debug!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(())
    }
}

/// Used when no bot is configured: the alert only reaches the logs.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        tracing::warn!(notification = %text, "No bot configured; notification logged only");
        Ok(())
    }
}

/// Build the notifier from configuration.
pub fn notifier_from_config(config: &Config) -> Result<Arc<dyn Notifier>> {
    match (config.bot_token(), config.chat_id()) {
        (Some(token), Some(chat_id)) => {
            tracing::info!("Telegram notifications enabled");
            Ok(Arc::new(TelegramNotifier::new(token, chat_id)?))
        }
        _ => {
            tracing::warn!("BOT_TOKEN or CHAT_ID not set, notifications go to the log only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Fire-and-forget alerting for failures that need a human.
#[derive(Clone)]
pub struct NotificationSink {
    notifier: Arc<dyn Notifier>,
    tasks: BackgroundTasks,
}

impl NotificationSink {
    pub fn new(notifier: Arc<dyn Notifier>, tasks: BackgroundTasks) -> Self {
        Self { notifier, tasks }
    }

    /// Log the failure and send `Error: {message} with name or path {resource}` in
    /// the background. Delivery problems are logged and otherwise ignored.
    pub fn report(&self, message: &str, resource: &str, err: &dyn Display) {
        tracing::error!(error = %err, resource = %resource, "{}", message);

        let text = alert_text(message, resource);
        let notifier = self.notifier.clone();
        self.tasks.spawn("notify", async move {
            if let Err(e) = notifier.send(&text).await {
                tracing::error!(error = %e, "Failed to deliver operator notification");
            }
        });
    }
}

pub fn alert_text(message: &str, resource: &str) -> String {
    format!("Error: {} with name or path {}", message, resource)
}
