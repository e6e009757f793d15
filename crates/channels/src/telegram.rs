//! Telegram channel adapter.
//!
//! Implements the Channel trait for the Telegram Bot API over HTTPS:
//! `getUpdates` long polling for inbound events, `sendMessage` and
//! `editMessageText` for outbound ones. Only text messages and callback
//! queries become [`ChatEvent`]s; every other update kind is skipped.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sheetdraft_config::TelegramSettings;
use sheetdraft_core::channel::{
    Channel, ChatEvent, ChatId, InlineKeyboard, MessageEdit, MessageId, OutboundMessage,
};
use sheetdraft_core::error::ChannelError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Allowed chat IDs. Empty = deny all, ["*"] = allow all.
    pub allowed_chats: Vec<String>,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    /// Whether `start` spawns the `getUpdates` loop. Off, only injected
    /// events are delivered.
    pub long_polling: bool,
    /// Bot API root.
    pub api_url: String,
}

impl TelegramConfig {
    pub fn from_settings(settings: &TelegramSettings, bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            allowed_chats: settings.allowed_chats.clone(),
            poll_timeout_secs: settings.poll_timeout_secs,
            long_polling: true,
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_chats", &self.allowed_chats)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("long_polling", &self.long_polling)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Telegram channel adapter.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    /// Sender shared with the poll loop; also used to inject test events.
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<ChatEvent, ChannelError>>>>,
    poll_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self, ChannelError> {
        // Must outlive the long-poll wait or every idle poll times out.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()
            .map_err(|e| ChannelError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            inject_tx: tokio::sync::Mutex::new(None),
            poll_task: tokio::sync::Mutex::new(None),
        })
    }

    /// Inject an event as if it came from Telegram (for testing).
    pub async fn inject_event(&self, event: ChatEvent) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(event))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Event channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("Channel not started".into()))
        }
    }

    /// The bot's username, from `getMe`.
    pub async fn bot_username(&self) -> Result<String, ChannelError> {
        let me: BotUser = call_api(&self.client, &self.method_url("getMe"), &json!({})).await?;
        Ok(me.username.unwrap_or(me.first_name))
    }

    fn method_url(&self, method: &str) -> String {
        method_url(&self.config.api_url, &self.config.bot_token, method)
    }
}

fn method_url(api_url: &str, token: &str, method: &str) -> String {
    format!("{}/bot{}/{}", api_url.trim_end_matches('/'), token, method)
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Result<ChatEvent, ChannelError>>, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("bot token is empty".into()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx.clone());

        if self.config.long_polling {
            info!(timeout_secs = self.config.poll_timeout_secs, "Telegram channel starting (long polling)");
            let handle = tokio::spawn(poll_loop(
                self.client.clone(),
                self.method_url("getUpdates"),
                self.config.poll_timeout_secs,
                tx,
            ));
            *self.poll_task.lock().await = Some(handle);
        } else {
            info!("Telegram channel starting (injection only)");
        }

        Ok(rx)
    }

    async fn send(&self, message: &OutboundMessage) -> Result<MessageId, ChannelError> {
        let payload = send_message_payload(message);
        let sent: SentMessage = call_api(&self.client, &self.method_url("sendMessage"), &payload)
            .await
            .map_err(|e| match e {
                err @ ChannelError::AuthenticationFailed(_) => err,
                other => ChannelError::DeliveryFailed {
                    channel: "telegram".into(),
                    reason: other.to_string(),
                },
            })?;

        trace!(chat_id = message.chat_id, message_id = sent.message_id, "Telegram message sent");
        Ok(sent.message_id)
    }

    async fn edit(&self, edit: &MessageEdit) -> Result<(), ChannelError> {
        let payload = edit_message_payload(edit);
        let result: Result<Value, ChannelError> =
            call_api(&self.client, &self.method_url("editMessageText"), &payload).await;

        match result {
            Ok(_) => {
                trace!(chat_id = edit.chat_id, message_id = edit.message_id, "Telegram message edited");
                Ok(())
            }
            // Re-rendering identical content is a no-op, not a failure.
            Err(ChannelError::InvalidPayload(reason)) if reason.contains("message is not modified") => {
                debug!(chat_id = edit.chat_id, message_id = edit.message_id, "Edit left message unchanged");
                Ok(())
            }
            Err(err @ ChannelError::AuthenticationFailed(_)) => Err(err),
            Err(other) => Err(ChannelError::EditFailed {
                channel: "telegram".into(),
                reason: other.to_string(),
            }),
        }
    }

    fn is_allowed(&self, chat_id: ChatId) -> bool {
        if self.config.allowed_chats.is_empty() {
            return false;
        }
        if self.config.allowed_chats.iter().any(|c| c == "*") {
            return true;
        }
        let chat_id = chat_id.to_string();
        self.config.allowed_chats.iter().any(|c| *c == chat_id)
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Telegram channel stopping");
        if let Some(handle) = self.poll_task.lock().await.take() {
            handle.abort();
        }
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Ok(false);
        }
        Ok(self.bot_username().await.is_ok())
    }
}

async fn poll_loop(
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
    tx: mpsc::Sender<Result<ChatEvent, ChannelError>>,
) {
    let mut offset: i64 = 0;

    while !tx.is_closed() {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });

        match call_api::<Vec<Update>>(&client, &url, &body).await {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(event) = update.into_event() else {
                        continue;
                    };
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed");
                if tx.send(Err(e)).await.is_err() {
                    return;
                }
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
            }
        }
    }
}

/// POST a Bot API method and unwrap the `{ok, result}` envelope.
async fn call_api<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    body: &Value,
) -> Result<T, ChannelError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| ChannelError::ConnectionLost(e.without_url().to_string()))?;

    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| ChannelError::InvalidPayload(e.without_url().to_string()))?;

    envelope.into_result()
}

// --- Outbound payloads ---

fn inline_markup(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.label, "callback_data": b.callback_data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

fn reply_markup(labels: &[String]) -> Value {
    let rows: Vec<Vec<Value>> = labels.iter().map(|l| vec![json!({ "text": l })]).collect();
    json!({
        "keyboard": rows,
        "resize_keyboard": true,
        "one_time_keyboard": true,
    })
}

fn send_message_payload(message: &OutboundMessage) -> Value {
    let mut payload = json!({
        "chat_id": message.chat_id,
        "text": message.text,
    });
    if message.markdown {
        payload["parse_mode"] = json!("Markdown");
    }
    if let Some(keyboard) = &message.inline_keyboard {
        payload["reply_markup"] = inline_markup(keyboard);
    } else if let Some(labels) = &message.reply_keyboard {
        payload["reply_markup"] = reply_markup(labels);
    }
    payload
}

fn edit_message_payload(edit: &MessageEdit) -> Value {
    let mut payload = json!({
        "chat_id": edit.chat_id,
        "message_id": edit.message_id,
        "text": edit.text,
    });
    if edit.markdown {
        payload["parse_mode"] = json!("Markdown");
    }
    // An edit without reply_markup removes the message's inline keyboard.
    if let Some(keyboard) = &edit.inline_keyboard {
        payload["reply_markup"] = inline_markup(keyboard);
    }
    payload
}

// --- Inbound payloads ---

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<T, ChannelError> {
        let description = self
            .description
            .unwrap_or_else(|| "no description".to_string());

        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(ChannelError::InvalidPayload("ok response without result".into())),
            (false, _) if matches!(self.error_code, Some(401) | Some(403)) => {
                Err(ChannelError::AuthenticationFailed(description))
            }
            (false, _) => Err(ChannelError::InvalidPayload(description)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: MessageId,
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: ChatId,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

impl Update {
    fn into_event(self) -> Option<ChatEvent> {
        if let Some(message) = self.message {
            let text = message.text?;
            return Some(ChatEvent::Text {
                chat_id: message.chat.id,
                message_id: message.message_id,
                text,
            });
        }

        let query = self.callback_query?;
        let message = query.message?;
        Some(ChatEvent::Callback {
            chat_id: message.chat.id,
            message_id: message.message_id,
            data: query.data?,
        })
    }
}
