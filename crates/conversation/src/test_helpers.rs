//! Shared fixtures for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use sheetdraft_core::channel::{Channel, ChatEvent, ChatId, MessageEdit, MessageId, OutboundMessage};
use sheetdraft_core::error::ChannelError;
use sheetdraft_core::sheets::Row;
use sheetdraft_sheets::InMemorySheets;
use tokio::sync::mpsc;

/// Records everything sent or edited. Chats listed in `blocked` are
/// rejected by the allowlist.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<OutboundMessage>>,
    edits: Mutex<Vec<MessageEdit>>,
    next_id: AtomicI64,
    fail_edit: AtomicBool,
    blocked: Vec<ChatId>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocking(chat_ids: &[ChatId]) -> Self {
        Self {
            blocked: chat_ids.to_vec(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> OutboundMessage {
        self.sent().pop().expect("nothing was sent")
    }

    pub fn edits(&self) -> Vec<MessageEdit> {
        self.edits.lock().unwrap().clone()
    }

    pub fn fail_next_edit(&self) {
        self.fail_edit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Result<ChatEvent, ChannelError>>, ChannelError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: &OutboundMessage) -> Result<MessageId, ChannelError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn edit(&self, edit: &MessageEdit) -> Result<(), ChannelError> {
        if self.fail_edit.swap(false, Ordering::SeqCst) {
            return Err(ChannelError::EditFailed {
                channel: "recording".into(),
                reason: "message to edit not found".into(),
            });
        }
        self.edits.lock().unwrap().push(edit.clone());
        Ok(())
    }

    fn is_allowed(&self, chat_id: ChatId) -> bool {
        !self.blocked.contains(&chat_id)
    }
}

pub fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

pub fn sheets_with(sheets: &[(&str, Vec<Row>)]) -> InMemorySheets {
    sheets
        .iter()
        .fold(InMemorySheets::new(), |acc, (name, rows)| {
            acc.with_sheet(*name, rows.clone())
        })
}
