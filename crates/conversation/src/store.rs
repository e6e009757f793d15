//! Session storage keyed by chat id.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use sheetdraft_core::channel::ChatId;
use tokio::time::Instant;
use tracing::debug;

use crate::session::Session;

/// Where sessions live between events.
///
/// Implementations must be safe to share between the per-chat workers; a
/// single chat is never handled by two workers at once, so no cross-call
/// locking is needed for one key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    async fn get(&self, chat_id: ChatId) -> Option<Session>;

    /// Fetch the session, creating and storing an idle one if absent.
    async fn get_or_create(&self, chat_id: ChatId) -> Session;

    async fn put(&self, chat_id: ChatId, session: Session);

    /// Drop sessions untouched for at least `ttl`. Returns how many went.
    async fn evict_idle(&self, ttl: Duration) -> usize;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Process-local store. Sessions are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: DashMap<ChatId, Entry>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, chat_id: ChatId) -> Option<Session> {
        let mut entry = self.entries.get_mut(&chat_id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    async fn get_or_create(&self, chat_id: ChatId) -> Session {
        let mut entry = self.entries.entry(chat_id).or_insert_with(|| {
            debug!(chat_id, "Creating session");
            Entry {
                session: Session::new(),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        entry.session.clone()
    }

    async fn put(&self, chat_id: ChatId, session: Session) {
        self.entries.insert(
            chat_id,
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
    }

    async fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_seen.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }
}
