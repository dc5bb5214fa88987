//! Notification entries and the unread-count badge state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single notification as returned by `GET /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// In-memory notification state published to subscribers.
///
/// After any successful reconciliation with the server,
/// `unread_count == entries.iter().filter(|n| !n.read).count()`. Between an
/// optimistic mark-all-read and server confirmation the counter may lead the
/// server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    /// Entries in server-provided order (typically reverse-chronological).
    pub entries: Vec<Notification>,
    pub unread_count: u64,
}

/// Response body of `GET /notifications/unread-count`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}
