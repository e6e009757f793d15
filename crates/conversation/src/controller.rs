//! The conversation state machine.
//!
//! One call to [`ConversationController::handle_event`] processes one
//! inbound event for one chat. The session is loaded, mutated on a working
//! copy while the spreadsheet and chat collaborators are awaited, and stored
//! only once every call the new state depends on has succeeded. A failure
//! leaves the stored session as it was and is reported to the chat as a
//! warning.

use std::sync::Arc;

use sheetdraft_core::callback::CallbackAction;
use sheetdraft_core::channel::{Channel, ChatEvent, ChatId, MessageEdit, MessageId, OutboundMessage};
use sheetdraft_core::error::{ChannelError, ConversationError, Error, Result};
use sheetdraft_core::sheets::{AppendOptions, SpreadsheetService};
use tracing::{debug, error, info, warn};

use crate::render::TableRenderer;
use crate::replies;
use crate::session::{ConversationState, Session, SheetSnapshot};
use crate::store::SessionStore;

/// Default number of trailing rows shown in a sheet preview.
pub const DEFAULT_ROW_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Sheets,
}

impl Command {
    /// `/start`, `/sheets`, also with a `@botname` suffix or trailing words.
    fn parse(text: &str) -> Option<Self> {
        let word = text.trim().strip_prefix('/')?;
        let name = word.split(['@', ' ']).next().unwrap_or_default();
        match name {
            "start" => Some(Self::Start),
            "sheets" => Some(Self::Sheets),
            _ => None,
        }
    }
}

pub struct ConversationController {
    channel: Arc<dyn Channel>,
    sheets: Arc<dyn SpreadsheetService>,
    sessions: Arc<dyn SessionStore>,
    spreadsheet_id: String,
    renderer: TableRenderer,
    append_options: AppendOptions,
}

impl ConversationController {
    pub fn new(
        channel: Arc<dyn Channel>,
        sheets: Arc<dyn SpreadsheetService>,
        sessions: Arc<dyn SessionStore>,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            sheets,
            sessions,
            spreadsheet_id: spreadsheet_id.into(),
            renderer: TableRenderer::new(DEFAULT_ROW_COUNT),
            append_options: AppendOptions::default(),
        }
    }

    pub fn with_row_count(mut self, row_count: usize) -> Self {
        self.renderer = TableRenderer::new(row_count);
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Process one event. Errors are reported to the chat, never returned.
    pub async fn handle_event(&self, event: ChatEvent) {
        let chat_id = event.chat_id();
        let result = match &event {
            ChatEvent::Text { text, .. } => {
                info!(chat_id, text = %text, "Received message");
                self.on_text(chat_id, text).await
            }
            ChatEvent::Callback {
                message_id, data, ..
            } => {
                info!(chat_id, data = %data, "Received callback");
                self.on_callback(chat_id, *message_id, data).await
            }
        };

        if let Err(err) = result {
            self.report(chat_id, &err).await;
        }
    }

    async fn on_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let mut session = self.sessions.get_or_create(chat_id).await;

        match Command::parse(text) {
            Some(Command::Start) => {
                debug!(chat_id, "Sending welcome");
                self.channel
                    .send(&OutboundMessage::text(chat_id, replies::WELCOME))
                    .await?;
                return Ok(());
            }
            Some(Command::Sheets) => self.show_sheet_list(chat_id, &mut session).await?,
            None => self.on_free_text(chat_id, text, &mut session).await?,
        }

        self.sessions.put(chat_id, session).await;
        Ok(())
    }

    async fn on_free_text(&self, chat_id: ChatId, text: &str, session: &mut Session) -> Result<()> {
        match session.state() {
            ConversationState::SelectingSheet if session.has_sheet(text) => {
                info!(chat_id, sheet = %text, "Sheet selected");
                self.show_sheet(chat_id, text, session).await
            }
            ConversationState::SelectingSheet => {
                warn!(chat_id, text = %text, "Not one of the offered sheets");
                self.send_markdown(chat_id, replies::INVALID_SHEET).await
            }
            ConversationState::AwaitingNewValueForEdit => {
                let column = session.column_index_being_edited();
                session.record_value(text)?;
                info!(chat_id, column, "Value recorded");
                let draft = session.require_draft()?;
                let message = OutboundMessage::markdown(chat_id, replies::draft_text(draft))
                    .with_inline_keyboard(replies::column_picker(draft));
                self.channel.send(&message).await?;
                Ok(())
            }
            state => {
                debug!(chat_id, %state, "Free text outside a prompt");
                self.send_markdown(chat_id, replies::GENERIC_HINT).await
            }
        }
    }

    async fn on_callback(&self, chat_id: ChatId, message_id: MessageId, data: &str) -> Result<()> {
        let Some(mut session) = self.sessions.get(chat_id).await else {
            return Err(ConversationError::SessionNotFound { chat_id }.into());
        };

        let Some(action) = CallbackAction::parse(data) else {
            warn!(chat_id, data = %data, "Ignoring unrecognized callback");
            return Ok(());
        };

        let needs_draft = matches!(
            action,
            CallbackAction::EditColumn { .. }
                | CallbackAction::DoneEditing
                | CallbackAction::CancelEditing
                | CallbackAction::BackToColumnSelection
        );
        if needs_draft && session.draft().is_none() {
            info!(chat_id, data = %data, state = %session.state(), "Ignoring stale button");
            return Ok(());
        }

        match action {
            CallbackAction::AddNewRow { sheet_name } => {
                if let Some(shown) = session.snapshot()
                    && shown.sheet_name != sheet_name
                {
                    warn!(chat_id, sheet = %sheet_name, shown = %shown.sheet_name, "Adding a row from an older preview");
                }
                if let Err(err) = session.begin_draft(&sheet_name) {
                    self.sessions.put(chat_id, session).await;
                    return Err(err.into());
                }
                info!(chat_id, sheet = %sheet_name, "Draft started");
                self.edit_with_draft(chat_id, message_id, &session).await?;
            }
            CallbackAction::EditColumn { index } => {
                session.select_column(index)?;
                let draft = session.require_draft()?;
                debug!(chat_id, column = index, "Prompting for value");
                let edit = MessageEdit::new(chat_id, message_id, replies::value_prompt(draft, index))
                    .markdown()
                    .with_inline_keyboard(replies::value_prompt_keyboard());
                self.channel.edit(&edit).await?;
            }
            CallbackAction::DoneEditing => {
                return self.submit_draft(chat_id, message_id, session).await;
            }
            CallbackAction::CancelEditing => {
                info!(chat_id, "Draft cancelled");
                self.channel
                    .edit(&MessageEdit::new(chat_id, message_id, replies::CANCELLED))
                    .await?;
                session.finish_draft();
                self.show_sheet_list(chat_id, &mut session).await?;
            }
            CallbackAction::BackToSheetSelection => {
                self.show_sheet_list(chat_id, &mut session).await?;
            }
            CallbackAction::BackToColumnSelection => {
                session.back_to_columns()?;
                self.edit_with_draft(chat_id, message_id, &session).await?;
            }
        }

        self.sessions.put(chat_id, session).await;
        Ok(())
    }

    /// Append the finalized draft, then return to the sheet list.
    async fn submit_draft(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        mut session: Session,
    ) -> Result<()> {
        let draft = session.finish_draft().ok_or_else(|| {
            Error::Internal(format!("no draft to submit for chat {chat_id}"))
        })?;
        let row = draft.finalize();

        info!(chat_id, sheet = %draft.sheet_name, edits = draft.edits.len(), "Appending row");
        self.sheets
            .append_row(&self.spreadsheet_id, &draft.sheet_name, &row, self.append_options)
            .await?;

        // The row is in the sheet; never offer this draft again.
        self.sessions.put(chat_id, session.clone()).await;

        self.channel
            .edit(&MessageEdit::new(
                chat_id,
                message_id,
                replies::appended(&draft.sheet_name),
            ))
            .await?;
        self.show_sheet_list(chat_id, &mut session).await?;

        self.sessions.put(chat_id, session).await;
        Ok(())
    }

    async fn show_sheet_list(&self, chat_id: ChatId, session: &mut Session) -> Result<()> {
        let names = self.sheets.list_sheet_names(&self.spreadsheet_id).await?;
        if names.is_empty() {
            warn!(chat_id, spreadsheet = %self.spreadsheet_id, "Spreadsheet has no sheets");
            return self.send_markdown(chat_id, replies::NO_SHEETS).await;
        }

        info!(chat_id, count = names.len(), "Offering sheets");
        let message =
            OutboundMessage::text(chat_id, replies::CHOOSE_SHEET).with_reply_keyboard(names.clone());
        self.channel.send(&message).await?;
        session.show_sheet_list(names);
        Ok(())
    }

    async fn show_sheet(&self, chat_id: ChatId, sheet_name: &str, session: &mut Session) -> Result<()> {
        let rows = self
            .sheets
            .read_all_rows(&self.spreadsheet_id, sheet_name)
            .await?;

        let Some((_, data_rows)) = rows.split_first() else {
            info!(chat_id, sheet = %sheet_name, "Sheet is empty");
            self.channel
                .send(&OutboundMessage::text(chat_id, replies::no_data(sheet_name)))
                .await?;
            return Ok(());
        };

        let snapshot = SheetSnapshot::from_rows(sheet_name, &rows);
        let text = self.renderer.render(sheet_name, &snapshot.header, data_rows);
        debug!(
            chat_id,
            sheet = %sheet_name,
            rows = data_rows.len(),
            shown = self.renderer.window(data_rows).len(),
            "Rendering sheet"
        );

        let message = OutboundMessage::markdown(chat_id, text)
            .with_inline_keyboard(replies::sheet_actions(sheet_name));
        self.channel.send(&message).await?;
        session.view_sheet(snapshot);
        Ok(())
    }

    async fn edit_with_draft(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        session: &Session,
    ) -> Result<()> {
        let draft = session.require_draft()?;
        let edit = MessageEdit::new(chat_id, message_id, replies::draft_text(draft))
            .markdown()
            .with_inline_keyboard(replies::column_picker(draft));
        self.channel.edit(&edit).await?;
        Ok(())
    }

    async fn send_markdown(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.channel
            .send(&OutboundMessage::markdown(chat_id, text))
            .await?;
        Ok(())
    }

    async fn report(&self, chat_id: ChatId, err: &Error) {
        match err {
            Error::Sheets(e) if e.is_auth() => {
                error!(chat_id, error = %err, "Spreadsheet credentials rejected");
            }
            Error::Channel(ChannelError::AuthenticationFailed(_)) => {
                error!(chat_id, error = %err, "Bot token rejected");
                return;
            }
            Error::Conversation(_) => warn!(chat_id, error = %err, "Rejected input"),
            _ => error!(chat_id, error = %err, "Event failed"),
        }

        let message = OutboundMessage::text(chat_id, replies::warning(err));
        if let Err(send_err) = self.channel.send(&message).await {
            error!(chat_id, error = %send_err, "Failed to report error to chat");
        }
    }
}
