// SPDX-License-Identifier: MIT

//! Settings cache manager: one remote-backed settings record, refreshed
//! deliberately (no polling).
//!
//! The server owns the record: a successful update replaces the whole cached
//! value with the server's response, never a client-side merge, because the
//! server may derive or round fields the client did not send.

use crate::error::{Alerts, ApiError, Result};
use crate::http::ApiClient;
use crate::models::{SettingsRecord, SettingsUpdate};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

pub struct SettingsService {
    api: ApiClient,
    alerts: Alerts,
    cache_tx: watch::Sender<Option<SettingsRecord>>,
    // Sequence tickets so a slow load cannot overwrite a newer load or a
    // fresher update response.
    load_seq: AtomicU64,
}

impl SettingsService {
    pub fn new(api: ApiClient, alerts: Alerts) -> Self {
        let (cache_tx, _) = watch::channel(None);
        Self {
            api,
            alerts,
            cache_tx,
            load_seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SettingsRecord>> {
        self.cache_tx.subscribe()
    }

    /// Snapshot of the cached record, if loaded.
    pub fn current(&self) -> Option<SettingsRecord> {
        self.cache_tx.borrow().clone()
    }

    /// Fetch-and-replace the cached record. On failure the prior cached
    /// value stays in place.
    pub async fn load(&self) -> Result<()> {
        let ticket = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.get::<SettingsRecord>("/settings").await {
            Ok(record) => {
                if self.load_seq.load(Ordering::SeqCst) == ticket {
                    self.cache_tx.send_replace(Some(record));
                } else {
                    tracing::debug!("Discarding stale settings response");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Settings fetch failed, keeping cached value");
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Manual cache-bust (e.g. a refresh icon). Alias of [`load`].
    ///
    /// [`load`]: SettingsService::load
    pub async fn refresh(&self) -> Result<()> {
        self.load().await
    }

    /// Send partial changes; on success the cache becomes the server's
    /// response verbatim. On failure the cache is untouched and the caller
    /// decides whether to retry.
    ///
    /// The exchange rate is validated client-side only as "a number greater
    /// than zero"; precision and rounding are server-owned.
    pub async fn update(&self, changes: &SettingsUpdate) -> Result<SettingsRecord> {
        if let Some(rate) = changes.usd_to_vnd_rate {
            if !rate.is_finite() || rate <= 0.0 {
                let e =
                    ApiError::InvalidInput("Exchange rate must be a number greater than zero.".to_string());
                self.alerts.error(&e);
                return Err(e);
            }
        }

        match self.api.put::<_, SettingsRecord>("/settings", changes).await {
            Ok(record) => {
                // Invalidate any in-flight load so it cannot clobber the
                // fresher update response.
                self.load_seq.fetch_add(1, Ordering::SeqCst);
                self.cache_tx.send_replace(Some(record.clone()));
                self.alerts.success("Settings saved.");
                Ok(record)
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Drop the cached record. Wired as a session-end teardown.
    pub fn clear(&self) {
        self.cache_tx.send_replace(None);
    }
}
