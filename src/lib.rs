// SPDX-License-Identifier: MIT

//! Fintrack client core: session, notification and settings state for a
//! personal-finance app, spoken against a remote REST API.
//!
//! The managers are pure state containers — no UI dependencies. A UI layer
//! subscribes to their `watch` channels and calls their async operations
//! from its event handlers. [`AppCore`] is the composition root that wires
//! everything once at startup.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod store;

use config::Config;
use error::{Alerts, ApiError};
use http::ApiClient;
use services::{AuthService, NotificationService, PollHandle, SettingsService};
use std::sync::{Arc, Mutex};
use store::SessionStore;

/// Composition root: constructs and wires the managers.
///
/// All dependency injection happens here, by constructor — no globals. The
/// wiring also covers the cross-cutting rules:
/// - any authenticated request answered 401 purges the session,
/// - every purge stops the notification poller and clears the notification
///   and settings caches.
pub struct AppCore {
    pub config: Config,
    pub alerts: Alerts,
    pub auth: Arc<AuthService>,
    pub notifications: Arc<NotificationService>,
    pub settings: Arc<SettingsService>,
    poll_handle: Arc<Mutex<Option<PollHandle>>>,
}

/// Initialize structured JSON logging. Call once from the embedding binary.
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fintrack_client=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

impl AppCore {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api_base_url.clone());
        let store = SessionStore::new(&config.state_dir)?;
        let alerts = Alerts::new();

        let auth = Arc::new(AuthService::new(api.clone(), store, alerts.clone()));
        let notifications = Arc::new(NotificationService::new(api.clone(), auth.subscribe()));
        let settings = Arc::new(SettingsService::new(api.clone(), alerts.clone()));

        // 401 on any authenticated request forces a local sign-out. Weak
        // reference: the hook lives inside the ApiClient the auth service
        // owns, so a strong one would cycle.
        let weak_auth = Arc::downgrade(&auth);
        api.set_unauthorized_hook(move || {
            if let Some(auth) = weak_auth.upgrade() {
                tracing::info!("Authenticated request rejected (401), purging session");
                auth.purge_local();
            }
        });

        let poll_handle: Arc<Mutex<Option<PollHandle>>> = Arc::new(Mutex::new(None));
        {
            let poll_handle = Arc::clone(&poll_handle);
            let notifications = Arc::clone(&notifications);
            let settings = Arc::clone(&settings);
            auth.on_session_end(move || {
                if let Some(handle) = poll_handle.lock().unwrap().take() {
                    handle.stop();
                }
                notifications.clear();
                settings.clear();
            });
        }

        Ok(Self {
            config,
            alerts,
            auth,
            notifications,
            settings,
            poll_handle,
        })
    }

    /// Start the unread-count poller. Call on transition into authenticated;
    /// an already-running poller is replaced, never duplicated.
    pub fn start_notification_polling(&self) {
        let handle =
            NotificationService::spawn_polling(&self.notifications, self.config.poll_interval);
        if let Some(old) = self.poll_handle.lock().unwrap().replace(handle) {
            old.stop();
        }
    }

    /// Stop the unread-count poller, if running. Also happens automatically
    /// on logout/account deletion via the session-end teardown.
    pub fn stop_notification_polling(&self) {
        if let Some(handle) = self.poll_handle.lock().unwrap().take() {
            handle.stop();
        }
    }
}
