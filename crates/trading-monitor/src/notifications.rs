//! Operator notifications.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use trading_core::traits::Notifier;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Notifier construction errors.
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Missing Telegram setting: {0}")]
    MissingSetting(&'static str),

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(target: "notifications", "{message}");
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Sends notifications through a Telegram bot.
///
/// Delivery runs on a spawned task; failures are logged and never reach
/// the caller.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifierError> {
        Self::with_base_url(config, TELEGRAM_API)
    }

    /// Point the notifier at another API host.
    pub fn with_base_url(config: &TelegramConfig, base_url: &str) -> Result<Self, NotifierError> {
        if config.token.is_empty() {
            return Err(NotifierError::MissingSetting("token"));
        }
        if config.chat_id.is_empty() {
            return Err(NotifierError::MissingSetting("chat_id"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| NotifierError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/bot{}/sendMessage", base_url.trim_end_matches('/'), config.token),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Deliver `message` and report the outcome.
    pub async fn send(&self, message: &str) -> Result<(), NotifierError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message,
        };
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifierError::Client(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(NotifierError::Client(format!("{}: {}", status, text)));
        }
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, message: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, telegram notification dropped");
            return;
        };
        let notifier = self.clone();
        let message = message.to_string();
        handle.spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                warn!(error = %e, "telegram notification failed");
            }
        });
    }
}
