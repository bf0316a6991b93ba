//! HTTP transport seam.
//!
//! The retry layer only ever talks to `HttpTransport`, so tests can swap
//! the network for scripted responses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::FetchConfig;

/// Query parameters whose values never appear in logs or status tables.
const REDACTED_PARAMS: &[&str] = &["apiKey", "api_key"];

/// A GET request against an upstream feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Full URL with secrets masked, for diagnostics.
    pub fn display_url(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| {
                let value = if REDACTED_PARAMS.contains(&k.as_str()) {
                    "***".to_string()
                } else {
                    urlencoding::encode(v).into_owned()
                };
                format!("{}={}", urlencoding::encode(k), value)
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the HTTP client.
///
/// Errors returned here are transport-level (DNS, TLS, timeout). Non-2xx
/// statuses come back as an `HttpResponse` and are judged by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<HttpResponse>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(Duration::from_secs(30))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let mut builder = self.http.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        let resp = builder.send().await.context("request failed")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.context("failed to read response body")?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_url_without_params() {
        let req = FetchRequest::new("https://example.com/feed.json");
        assert_eq!(req.display_url(), "https://example.com/feed.json");
    }

    #[test]
    fn test_display_url_redacts_api_key() {
        let req = FetchRequest::new("https://odds.example/v4")
            .param("apiKey", "abc123")
            .param("markets", "h2h,spreads");
        let url = req.display_url();
        assert!(!url.contains("abc123"));
        assert!(url.contains("apiKey=***"));
        assert!(url.contains("markets=h2h%2Cspreads"));
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse { status: 204, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 503, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 302, body: String::new() }.is_success());
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(&FetchConfig::default()).is_ok());
    }
}
