// SPDX-License-Identifier: MIT

//! Notification sync manager: keeps the unread badge fresh and supports
//! instant "mark all read" UX.
//!
//! The unread counter is polled on a fixed interval while authenticated; the
//! full entry list is fetched lazily (e.g. when the panel opens). Mark-all
//! applies an optimistic update and reconciles against the server on
//! failure — never a blind snapshot rollback, since other state may have
//! changed concurrently.

use crate::error::Result;
use crate::http::ApiClient;
use crate::models::{Notification, NotificationState, Session, UnreadCountResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Pure state container for notification data; UI layers subscribe.
pub struct NotificationService {
    api: ApiClient,
    session: watch::Receiver<Session>,
    state_tx: watch::Sender<NotificationState>,
    // Sequence tickets so a slow response cannot overwrite a newer one.
    count_seq: AtomicU64,
    list_seq: AtomicU64,
}

impl NotificationService {
    pub fn new(api: ApiClient, session: watch::Receiver<Session>) -> Self {
        let (state_tx, _) = watch::channel(NotificationState::default());
        Self {
            api,
            session,
            state_tx,
            count_seq: AtomicU64::new(0),
            list_seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> NotificationState {
        self.state_tx.borrow().clone()
    }

    fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Refresh the unread counter. No-op while unauthenticated. A fetch
    /// failure keeps the previous value (stale-but-consistent beats
    /// clearing good data).
    pub async fn fetch_unread_count(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let ticket = self.count_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self
            .api
            .get::<UnreadCountResponse>("/notifications/unread-count")
            .await
        {
            Ok(resp) => {
                if self.count_seq.load(Ordering::SeqCst) == ticket {
                    self.state_tx.send_modify(|s| s.unread_count = resp.count);
                } else {
                    tracing::debug!("Discarding stale unread-count response");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unread-count fetch failed, keeping previous value");
                Err(e)
            }
        }
    }

    /// Replace the full entry list. No-op while unauthenticated; failures
    /// keep the previous list.
    pub async fn fetch_notifications(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let ticket = self.list_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.get::<Vec<Notification>>("/notifications").await {
            Ok(entries) => {
                if self.list_seq.load(Ordering::SeqCst) == ticket {
                    self.state_tx.send_modify(|s| s.entries = entries);
                } else {
                    tracing::debug!("Discarding stale notification list response");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Notification fetch failed, keeping previous list");
                Err(e)
            }
        }
    }

    /// Mark everything read, optimistically: counter and read flags are
    /// updated before the server call resolves. If the call fails, the
    /// authoritative count and list are re-fetched to reconcile.
    pub async fn mark_all_as_read(&self) -> Result<()> {
        if !self.is_authenticated() || self.state_tx.borrow().unread_count == 0 {
            return Ok(());
        }

        self.state_tx.send_modify(|s| {
            s.unread_count = 0;
            for entry in &mut s.entries {
                entry.read = true;
            }
        });
        // Invalidate in-flight fetches so a response issued before the
        // optimistic update cannot resolve late and undo it.
        self.count_seq.fetch_add(1, Ordering::SeqCst);
        self.list_seq.fetch_add(1, Ordering::SeqCst);

        match self
            .api
            .post::<_, serde_json::Value>("/notifications/mark-as-read", &serde_json::json!({}))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Mark-all-read failed, reconciling with server");
                let _ = self.fetch_unread_count().await;
                let _ = self.fetch_notifications().await;
                Err(e)
            }
        }
    }

    /// Spawn the unread-count poller. The first poll runs immediately, then
    /// every `interval`. Returns the handle owning the task; dropping or
    /// stopping it cancels the poller, so no authenticated request can fire
    /// after logout.
    pub fn spawn_polling(service: &Arc<Self>, interval: Duration) -> PollHandle {
        let service = Arc::clone(service);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let _ = service.fetch_unread_count().await;
            }
        });

        PollHandle { handle }
    }

    /// Drop all notification state. Wired as a session-end teardown.
    pub fn clear(&self) {
        self.state_tx.send_replace(NotificationState::default());
    }
}

/// Owned handle for the unread-count polling task.
pub struct PollHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
