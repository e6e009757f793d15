//! # sheetdraft conversation
//!
//! The chat-driven workflow: offer the sheets of a spreadsheet, show the last
//! rows of the chosen one as a fixed-width table, and compose a new row
//! column by column before appending it.
//!
//! ## Layout
//!
//! - [`controller`]: the state machine, one event at a time
//! - [`session`]: per-chat state as tagged stages
//! - [`store`]: the [`SessionStore`] trait and its in-memory backend
//! - [`render`]: the table preview
//! - [`draft`]: pending edits, preview and finalized rows
//! - [`replies`]: texts and keyboards shown to the user
//! - [`markdown`]: escaping for sheet names and cell values
//! - [`dispatcher`]: per-chat workers and the idle sweeper

pub mod controller;
pub mod dispatcher;
pub mod draft;
pub mod markdown;
pub mod render;
pub mod replies;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_helpers;

pub use controller::{ConversationController, DEFAULT_ROW_COUNT};
pub use dispatcher::Dispatcher;
pub use draft::PendingEdits;
pub use render::TableRenderer;
pub use session::{ConversationState, Draft, Session, SheetSnapshot, Stage};
pub use store::{InMemorySessionStore, SessionStore};
