// SPDX-License-Identifier: MIT

//! HTTP adapter for the remote finance API.
//!
//! Handles:
//! - Verb methods over a fixed base URL
//! - Bearer credential attachment (single writer: the auth service)
//! - Status-code normalization into [`ApiError`]
//!
//! No retry, no backoff — retries are a caller concern and are not
//! implemented anywhere in this crate.

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};

type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Thin wrapper around `reqwest::Client` scoped to one API base URL.
///
/// Cheap to clone; all clones share the bearer slot, so a token set by the
/// auth service is attached to every subsequent request from any manager.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Arc<RwLock<Option<String>>>,
    on_unauthorized: Arc<RwLock<Option<UnauthorizedHook>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer: Arc::new(RwLock::new(None)),
            on_unauthorized: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bearer credential attached to outbound requests.
    /// Only the auth service calls this.
    pub fn set_bearer(&self, token: impl Into<String>) {
        *self.bearer.write().unwrap() = Some(token.into());
    }

    /// Remove the bearer credential. Idempotent.
    pub fn clear_bearer(&self) {
        *self.bearer.write().unwrap() = None;
    }

    /// True if a bearer credential is currently set.
    pub fn has_bearer(&self) -> bool {
        self.bearer.read().unwrap().is_some()
    }

    /// Register the hook fired when an *authenticated* request comes back
    /// 401. Anonymous 401s (e.g. a failed login) do not fire it, so a wrong
    /// password never tears down state.
    pub fn set_unauthorized_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_unauthorized.write().unwrap() = Some(Arc::new(hook));
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.get(self.url(path)));
        self.send_json(req, authed).await
    }

    /// GET with query parameters (e.g. activation/reset token lookups).
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.get(self.url(path)).query(query));
        self.send_json(req, authed).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.post(self.url(path)).json(body));
        self.send_json(req, authed).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.put(self.url(path)).json(body));
        self.send_json(req, authed).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.delete(self.url(path)));
        self.send_json(req, authed).await
    }

    /// POST a multipart form (avatar upload).
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let (req, authed) = self.authorize(self.http.post(self.url(path)).multipart(form));
        self.send_json(req, authed).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer credential if one is set. Returns whether the
    /// request went out authenticated (drives the 401 hook).
    fn authorize(&self, req: reqwest::RequestBuilder) -> (reqwest::RequestBuilder, bool) {
        match self.bearer.read().unwrap().as_deref() {
            Some(token) => (req.bearer_auth(token), true),
            None => (req, false),
        }
    }

    /// Send, normalize failures, parse the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        authed: bool,
    ) -> Result<T, ApiError> {
        let response = req
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);

            if matches!(err, ApiError::Unauthorized) && authed {
                let hook = self.on_unauthorized.read().unwrap().clone();
                if let Some(hook) = hook {
                    hook();
                }
            }

            return Err(err);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Unknown(format!("JSON parse error: {}", e)))
    }
}
