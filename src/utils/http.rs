//! HTTP client utilities.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Default User-Agent sent to every provider
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client handle owned by one provider
///
/// The underlying `reqwest::Client` is built on first use and reused for every
/// later request made through this handle. There is no explicit shutdown; the
/// connection pool lives as long as the handle.
#[derive(Debug)]
pub struct HttpClient {
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
    client: OnceCell<Client>,
}

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a client from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> Self {
        let user_agent = match &config.mailto {
            Some(mailto) => format!("{} (mailto:{})", config.user_agent, mailto),
            None => config.user_agent.clone(),
        };

        Self {
            user_agent,
            timeout: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            client: OnceCell::new(),
        }
    }

    /// Whether the underlying client has been built yet
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// Get the underlying client, building it on first use
    pub async fn client(&self) -> Result<&Client, SourceError> {
        self.client
            .get_or_try_init(move || async move {
                tracing::debug!("Building HTTP client (user agent: {})", self.user_agent);
                Client::builder()
                    .user_agent(&self.user_agent)
                    .timeout(self.timeout)
                    .connect_timeout(self.connect_timeout)
                    .pool_idle_timeout(Duration::from_secs(90))
                    .build()
                    .map_err(|e| {
                        SourceError::Transport(format!("Failed to create HTTP client: {}", e))
                    })
            })
            .await
    }

    /// GET `url` with the given query parameters and read the whole body
    ///
    /// Connection failures, timeouts and unreadable bodies are transport
    /// errors. Non-2xx statuses are returned to the caller, which decides
    /// whether the body is still usable.
    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        accept: &str,
    ) -> Result<HttpResponse, SourceError> {
        let client = self.client().await?;

        let response = client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(format!("Failed to read response: {}", e)))?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
