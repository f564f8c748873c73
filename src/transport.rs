//! HTTP round-trip seam between the request pipeline and the network.
//!
//! The pipeline hands a fully built URL and normalized parameters to a
//! [`Transport`] and gets the status code and the raw body back. Everything
//! above this module is independent of the HTTP stack.

use crate::error::SynoError::Network;
use anyhow::Result;
use log::debug;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP response described as plain data
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Executes one HTTP round-trip
pub trait Transport {
    /// Sends `params` as the query string (GET) or as a form body (POST)
    fn send(
        &self,
        method: HttpMethod,
        url: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// [`Transport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout_ms`
    #[must_use]
    pub fn new(timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = match method {
            HttpMethod::Get => self.client.get(url).query(params),
            HttpMethod::Post => self.client.post(url).form(params),
        };

        let response = request.send().await.map_err(Network)?;
        let status = response.status().as_u16();
        debug!("API request status: {status}");

        let body = response.text().await.map_err(Network)?;
        Ok(RawResponse { status, body })
    }
}
