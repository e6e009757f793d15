//! Per-chat event dispatch.
//!
//! Every chat id gets its own unbounded queue and worker task, so one chat's
//! events are handled strictly in arrival order while different chats run
//! concurrently. Workers with nothing queued or in flight are dropped by
//! [`Dispatcher::prune_idle_workers`]; the next event for that chat starts a
//! fresh one.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use sheetdraft_core::channel::{Channel, ChatEvent, ChatId};
use sheetdraft_core::error::ChannelError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::controller::ConversationController;

struct Worker {
    tx: mpsc::UnboundedSender<ChatEvent>,
    // Queued plus in-flight events. Only incremented under the map's shard
    // lock, so a zero seen under that lock means the worker is idle.
    pending: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct Dispatcher {
    controller: Arc<ConversationController>,
    channel: Arc<dyn Channel>,
    workers: Arc<DashMap<ChatId, Worker>>,
}

impl Dispatcher {
    pub fn new(controller: Arc<ConversationController>, channel: Arc<dyn Channel>) -> Self {
        Self {
            controller,
            channel,
            workers: Arc::new(DashMap::new()),
        }
    }

    /// Queue an event on its chat's worker. A worker whose task has ended is
    /// replaced. Returns `false` if the chat is not allowed or the event could
    /// not be queued.
    pub fn dispatch(&self, event: ChatEvent) -> bool {
        let chat_id = event.chat_id();
        if !self.channel.is_allowed(chat_id) {
            warn!(chat_id, "Ignoring event from chat outside the allowlist");
            return false;
        }

        let mut worker = self
            .workers
            .entry(chat_id)
            .or_insert_with(|| self.spawn_worker(chat_id));
        worker.pending.fetch_add(1, Ordering::SeqCst);
        let Err(mpsc::error::SendError(event)) = worker.tx.send(event) else {
            return true;
        };

        worker.pending.fetch_sub(1, Ordering::SeqCst);
        warn!(chat_id, "Chat worker stopped unexpectedly; starting a new one");
        *worker = self.spawn_worker(chat_id);
        worker.pending.fetch_add(1, Ordering::SeqCst);
        if worker.tx.send(event).is_err() {
            worker.pending.fetch_sub(1, Ordering::SeqCst);
            error!(chat_id, "Replacement chat worker is gone; event dropped");
            return false;
        }
        true
    }

    fn spawn_worker(&self, chat_id: ChatId) -> Worker {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let controller = Arc::clone(&self.controller);
        let counter = Arc::clone(&pending);

        tokio::spawn(async move {
            debug!(chat_id, "Chat worker started");
            while let Some(event) = rx.recv().await {
                controller.handle_event(event).await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }
            debug!(chat_id, "Chat worker stopped");
        });

        Worker { tx, pending }
    }

    /// Feed the channel's event stream to the workers until it closes.
    pub async fn run(&self, mut events: mpsc::Receiver<Result<ChatEvent, ChannelError>>) {
        info!(channel = self.channel.name(), "Dispatching events");
        while let Some(item) = events.recv().await {
            match item {
                Ok(event) => {
                    self.dispatch(event);
                }
                Err(err) => warn!(error = %err, "Channel reported an error"),
            }
        }
        info!("Event stream closed");
    }

    /// Drop workers with nothing queued or running. Returns how many went.
    pub fn prune_idle_workers(&self) -> usize {
        let before = self.workers.len();
        self.workers
            .retain(|_, worker| worker.pending.load(Ordering::SeqCst) > 0);
        before.saturating_sub(self.workers.len())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Periodically evict sessions idle for `ttl` and prune idle workers.
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let dispatcher = self.clone();
        let store = Arc::clone(self.controller.sessions());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let sessions = store.evict_idle(ttl).await;
                let workers = dispatcher.prune_idle_workers();
                if sessions > 0 || workers > 0 {
                    info!(sessions, workers, "Swept idle chats");
                } else {
                    let live = store.len().await;
                    debug!(live, "Sweep found nothing idle");
                }
            }
        })
    }

    /// Close every queue. Workers finish what is already queued, then exit.
    pub fn shutdown(&self) {
        let count = self.workers.len();
        self.workers.clear();
        info!(workers = count, "Dispatcher shut down");
    }
}
