//! Chat channel implementations for sheetdraft.
//!
//! Available channels:
//! - **Telegram**: Telegram Bot API (long polling, send, edit)

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramConfig};
