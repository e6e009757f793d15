//! # sheetdraft core
//!
//! Domain types, traits, and error definitions shared by every sheetdraft
//! crate. Nothing here talks to the network: the chat platform and the
//! spreadsheet backend are described as traits and implemented elsewhere.
//!
//! ## Layout
//!
//! - [`channel`]: inbound chat events, outbound message descriptors, and the
//!   [`Channel`] trait
//! - [`sheets`]: the [`SpreadsheetService`] trait and append options
//! - [`callback`]: the button callback-data codec
//! - [`error`]: error types per bounded context

pub mod callback;
pub mod channel;
pub mod error;
pub mod sheets;

// Re-export key types at crate root for ergonomics
pub use callback::CallbackAction;
pub use channel::{
    Channel, ChatEvent, ChatId, InlineButton, InlineKeyboard, MessageEdit, MessageId,
    OutboundMessage,
};
pub use error::{ChannelError, ConversationError, Error, Result, SheetsError};
pub use sheets::{AppendOptions, InsertMode, Row, SpreadsheetService, ValueInputMode};
