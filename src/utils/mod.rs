//! Utility functions module

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// HTTP client builder
///
/// Every outbound request shares the same fixed headers and timeouts.
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    pool_max_idle_per_host: usize,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            user_agent: format!("phishtank-mcp/{}", crate::VERSION),
        }
    }
}

impl HttpClientBuilder {
    /// Create a new HTTP client builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Set connection pool size
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Set User-Agent
    #[must_use]
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build HTTP client
    pub fn build(self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::HttpRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.timeout, Duration::from_secs(30));
        assert!(builder.user_agent.starts_with("phishtank-mcp/"));
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_builder_custom_user_agent() {
        let client = HttpClientBuilder::new()
            .user_agent("my-agent/2.0".to_string())
            .timeout(Duration::from_secs(5))
            .build();
        assert!(client.is_ok());
    }
}
