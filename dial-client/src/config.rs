//! HTTP client configuration.

use std::time::Duration;

use crate::error::Result;

/// Configuration of the HTTP client shared by every [`DialDevice`](crate::DialDevice).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,

    /// Default: `dial-rs/{version}`
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            user_agent: format!("dial-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build a reqwest client from this configuration.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.clone());
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}
