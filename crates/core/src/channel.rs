//! Channel trait: the abstraction over the chat platform.
//!
//! A Channel connects sheetdraft to a messaging platform. It yields inbound
//! [`ChatEvent`]s (text messages and button presses) and carries outbound
//! [`OutboundMessage`]s and [`MessageEdit`]s back to the user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Platform chat identifier.
pub type ChatId = i64;

/// Platform message identifier within a chat.
pub type MessageId = i64;

/// An inbound event from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A plain text message (commands included).
    Text {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },

    /// A press on an inline keyboard button.
    Callback {
        chat_id: ChatId,
        /// The message carrying the pressed button
        message_id: MessageId,
        data: String,
    },
}

impl ChatEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            ChatEvent::Text { chat_id, .. } | ChatEvent::Callback { chat_id, .. } => *chat_id,
        }
    }
}

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline buttons attached to a message.
pub type InlineKeyboard = Vec<Vec<InlineButton>>;

/// A new message to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: ChatId,

    pub text: String,

    /// One reply-keyboard row per label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_keyboard: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_keyboard: Option<InlineKeyboard>,

    /// Render `*bold*` and `` `code` `` markup
    #[serde(default)]
    pub markdown: bool,
}

impl OutboundMessage {
    /// Create a plain-text message with no keyboard.
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_keyboard: None,
            inline_keyboard: None,
            markdown: false,
        }
    }

    /// Create a message rendered with markdown emphasis.
    pub fn markdown(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            markdown: true,
            ..Self::text(chat_id, text)
        }
    }

    pub fn with_reply_keyboard(mut self, labels: Vec<String>) -> Self {
        self.reply_keyboard = Some(labels);
        self
    }

    pub fn with_inline_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.inline_keyboard = Some(keyboard);
        self
    }
}

/// A replacement for the text (and buttons) of an existing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    pub chat_id: ChatId,

    pub message_id: MessageId,

    pub text: String,

    /// `None` strips any buttons from the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_keyboard: Option<InlineKeyboard>,

    #[serde(default)]
    pub markdown: bool,
}

impl MessageEdit {
    pub fn new(chat_id: ChatId, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            inline_keyboard: None,
            markdown: false,
        }
    }

    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }

    pub fn with_inline_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.inline_keyboard = Some(keyboard);
        self
    }
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic, payload
/// formatting, and authentication.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Start listening for inbound events.
    ///
    /// Returns a receiver that yields events. The implementation handles
    /// polling or webhook delivery internally.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChatEvent, ChannelError>>,
        ChannelError,
    >;

    /// Send a new message. Returns the platform id of the sent message.
    async fn send(&self, message: &OutboundMessage) -> std::result::Result<MessageId, ChannelError>;

    /// Replace the text and inline keyboard of an existing message.
    async fn edit(&self, edit: &MessageEdit) -> std::result::Result<(), ChannelError>;

    /// Check if a chat is allowed to talk to the bot.
    fn is_allowed(&self, chat_id: ChatId) -> bool;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check: is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
