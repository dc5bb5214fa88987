// SPDX-License-Identifier: MIT

//! Auth session manager: the single source of truth for "who is the
//! current user".
//!
//! Handles:
//! - Startup reconciliation with the persisted mirror (`initialize`)
//! - Login/logout/registration and the password-reset flows
//! - Profile updates and avatar upload
//! - Account deletion
//! - Teardown callbacks run on every transition out of authenticated
//!
//! This service is the only writer of the persisted token/user mirror and of
//! the HTTP adapter's bearer credential. Concurrent calls are not coalesced;
//! the last response to arrive wins (the UI gates submit controls on its own
//! loading flag).

use crate::error::{Alerts, Result};
use crate::http::ApiClient;
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, Session,
    UserRecord,
};
use crate::store::SessionStore;
use std::sync::Mutex;
use tokio::sync::watch;

type TeardownFn = Box<dyn Fn() + Send + Sync>;

/// Owns the in-memory authentication state machine.
pub struct AuthService {
    api: ApiClient,
    store: SessionStore,
    alerts: Alerts,
    session_tx: watch::Sender<Session>,
    /// Callbacks invoked once per transition out of authenticated
    /// (logout, account deletion, 401).
    teardowns: Mutex<Vec<TeardownFn>>,
}

impl AuthService {
    pub fn new(api: ApiClient, store: SessionStore, alerts: Alerts) -> Self {
        let (session_tx, _) = watch::channel(Session::default());
        Self {
            api,
            store,
            alerts,
            session_tx,
            teardowns: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to session state. UI layers must not render protected
    /// surfaces until `Session::initialized` is true.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session_tx.borrow().clone()
    }

    /// Register a callback run on every transition out of authenticated.
    /// Replaces the ambient "global reset" escape hatch: the composition
    /// root registers cross-manager cleanup (stop polling, clear caches)
    /// here once at startup.
    pub fn on_session_end(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.teardowns.lock().unwrap().push(Box::new(callback));
    }

    /// Startup reconciliation with the persisted mirror. Runs once.
    ///
    /// No persisted token: no network call, session stays empty. A persisted
    /// token is validated by fetching the profile; any failure treats the
    /// token as invalid and purges the mirror. Either way `initialized` is
    /// signalled exactly once.
    pub async fn initialize(&self) {
        let Some(token) = self.store.token() else {
            tracing::debug!("No persisted token, starting unauthenticated");
            self.session_tx.send_modify(|s| s.initialized = true);
            return;
        };

        self.api.set_bearer(&token);

        match self.api.get::<UserRecord>("/user/profile").await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Session restored from persisted token");
                self.store.set_user(&user);
                self.session_tx.send_modify(|s| {
                    s.token = Some(token);
                    s.user = Some(user);
                    s.initialized = true;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted token rejected, purging mirror");
                self.purge_local();
                self.session_tx.send_modify(|s| s.initialized = true);
            }
        }
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse> {
        let payload = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };

        match self.api.post::<_, LoginResponse>("/auth/login", &payload).await {
            Ok(resp) => {
                self.store.set_token(&resp.token);
                self.store.set_user(&resp.user);
                self.api.set_bearer(&resp.token);
                self.session_tx.send_modify(|s| {
                    s.token = Some(resp.token.clone());
                    s.user = Some(resp.user.clone());
                });
                tracing::info!(user_id = resp.user.id, "Login successful");
                self.alerts.success("Signed in.");
                Ok(resp)
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// End the session. Safe to call when already unauthenticated.
    ///
    /// The server is notified best-effort; a failure there is logged but
    /// never blocks the local purge.
    pub async fn logout(&self) {
        if self.session_tx.borrow().is_authenticated() {
            if let Err(e) = self
                .api
                .post::<_, serde_json::Value>("/auth/logout", &serde_json::json!({}))
                .await
            {
                tracing::warn!(error = %e, "Server logout failed, purging locally anyway");
            }
        }

        self.purge_local();
        self.alerts.success("Signed out.");
    }

    /// Stateless account creation. Never touches the session: activation
    /// happens over email and the user signs in afterwards.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<()> {
        match self
            .api
            .post::<_, serde_json::Value>("/auth/register", payload)
            .await
        {
            Ok(_) => {
                self.alerts
                    .success("Account created. Check your email to activate it.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Activate an account from the emailed token. Stateless.
    pub async fn activate(&self, token: &str) -> Result<()> {
        match self
            .api
            .get_query::<serde_json::Value>("/auth/activate", &[("token", token)])
            .await
        {
            Ok(_) => {
                self.alerts.success("Account activated. You can sign in now.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Request a password-reset email. Stateless.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let payload = serde_json::json!({ "email": email });
        match self
            .api
            .post::<_, serde_json::Value>("/auth/forgot-password", &payload)
            .await
        {
            Ok(_) => {
                self.alerts.success("Password reset email sent.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Check that a reset token is still valid before showing the form.
    pub async fn validate_reset_token(&self, token: &str) -> Result<()> {
        match self
            .api
            .get_query::<serde_json::Value>("/auth/validate-reset-token", &[("token", token)])
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Complete a password reset. Stateless.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let payload = serde_json::json!({ "token": token, "newPassword": new_password });
        match self
            .api
            .post::<_, serde_json::Value>("/auth/reset-password", &payload)
            .await
        {
            Ok(_) => {
                self.alerts.success("Password reset. You can sign in now.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Update profile fields; on success the returned record replaces the
    /// in-memory user and the persisted mirror.
    pub async fn update_profile(&self, changes: &ProfileUpdate) -> Result<UserRecord> {
        match self.api.put::<_, UserRecord>("/user/profile", changes).await {
            Ok(user) => {
                self.replace_user(user.clone());
                self.alerts.success("Profile updated.");
                Ok(user)
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Upload a new avatar image. The manager publishes only the confirmed
    /// record; optimistic preview is a UI concern.
    pub async fn upload_avatar(&self, bytes: Vec<u8>, filename: &str) -> Result<UserRecord> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("avatar", part);

        match self.api.post_multipart::<UserRecord>("/user/avatar", form).await {
            Ok(user) => {
                self.replace_user(user.clone());
                self.alerts.success("Avatar updated.");
                Ok(user)
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Change the account password while signed in.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        let payload = ChangePasswordRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };

        match self
            .api
            .post::<_, serde_json::Value>("/user/change-password", &payload)
            .await
        {
            Ok(_) => {
                self.alerts.success("Password changed.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Delete the account remotely, then purge locally. No server logout
    /// call afterwards — the account no longer exists. Failure leaves the
    /// session unchanged.
    pub async fn delete_account(&self) -> Result<()> {
        match self.api.delete::<serde_json::Value>("/user/account").await {
            Ok(_) => {
                tracing::info!("Account deleted");
                self.purge_local();
                self.alerts.success("Account deleted.");
                Ok(())
            }
            Err(e) => {
                self.alerts.error(&e);
                Err(e)
            }
        }
    }

    /// Unconditional local purge: bearer credential, persisted mirror, and
    /// in-memory session. Idempotent; the teardown callbacks fire only when
    /// there was session state to clear, so overlapping purge paths (the
    /// 401 hook racing an explicit logout) tear down exactly once.
    ///
    /// Also invoked by the HTTP adapter's 401 hook, so any authenticated
    /// call rejected mid-session deauthenticates the whole client.
    pub fn purge_local(&self) {
        self.api.clear_bearer();
        self.store.clear_token();
        self.store.clear_user();
        let ended = self.session_tx.send_if_modified(|s| {
            let changed = s.token.is_some() || s.user.is_some();
            s.token = None;
            s.user = None;
            changed
        });

        if ended {
            for teardown in self.teardowns.lock().unwrap().iter() {
                teardown();
            }
        }
    }

    /// Replace the in-memory user and refresh its persisted mirror.
    fn replace_user(&self, user: UserRecord) {
        self.store.set_user(&user);
        self.session_tx.send_modify(|s| s.user = Some(user));
    }
}
