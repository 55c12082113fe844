use crate::fusion::error::{FusionError, Result};
use log::debug;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Mutex;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8697";

#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Base URL of the Fusion REST API, stored without a trailing slash.
    pub base_url: String,
    /// Credentials are carried for future use; the Fusion REST API on
    /// localhost does not require them and no auth header is sent.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
        }
    }
}

pub struct FusionClient {
    config: FusionConfig,
    base_url: Url,
    // Lazily opened HTTP session, reused across calls until close().
    session: Mutex<Option<Client>>,
}

impl FusionClient {
    pub fn new(mut config: FusionConfig) -> Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        // Url::join drops the last path segment unless the base ends in '/'.
        let base_url = Url::parse(&format!("{}/", config.base_url))?;

        Ok(Self {
            config,
            base_url,
            session: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Returns the HTTP session, opening it on first use (or first use
    /// after `close`). Cloning a reqwest `Client` shares its pool.
    fn session(&self) -> Result<Client> {
        let mut slot = self.session.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        debug!("Opening HTTP session to {}", self.config.base_url);
        let client = Client::builder().build().map_err(FusionError::Connection)?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Releases the HTTP session. Subsequent calls re-open it.
    pub fn close(&self) {
        let mut slot = self.session.lock().unwrap_or_else(|p| p.into_inner());
        if slot.take().is_some() {
            debug!("Closed HTTP session to {}", self.config.base_url);
        }
    }

    /// Issues one request and normalizes failures. A `vm_id` marks the call
    /// as VM-scoped so a 404 maps to `NotFound` instead of the generic API
    /// error. Returns `None` when the response body is empty.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        vm_id: Option<&str>,
    ) -> Result<Option<Value>> {
        let url = self.base_url.join(path)?;
        let resp = self
            .session()?
            .request(method, url)
            .send()
            .await
            .map_err(FusionError::Connection)?;

        let status = resp.status();
        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                if let Some(id) = vm_id {
                    return Err(FusionError::NotFound(id.to_string()));
                }
            }
            let text = resp.text().await.unwrap_or_default();
            return Err(FusionError::Api(status, text));
        }

        let body = resp.bytes().await.map_err(FusionError::Connection)?;
        if body.is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_slice(&body)?;
        Ok(Some(value))
    }
}
