//! Outbound HTTP behind a trait so dispatch can be tested without a network.

use reqwest::blocking::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (DNS, connect, TLS, timeout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type TransportResult = std::result::Result<HttpResponse, TransportError>;

pub trait Transport {
    fn get(&self, url: &str, query: &[(String, String)]) -> TransportResult;

    fn post_json(&self, url: &str, body: &Value) -> TransportResult;
}

/// Blocking reqwest client with a request timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shipnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal_unexpected(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { client })
    }
}

// Query strings carry the Slack token, so errors are reported without their URL.
fn transport_error(e: reqwest::Error) -> TransportError {
    TransportError(e.without_url().to_string())
}

fn read_response(response: reqwest::blocking::Response) -> TransportResult {
    let status = response.status().as_u16();
    let body = response.text().map_err(transport_error)?;
    Ok(HttpResponse { status, body })
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> TransportResult {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(transport_error)?;
        read_response(response)
    }

    fn post_json(&self, url: &str, body: &Value) -> TransportResult {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(transport_error)?;
        read_response(response)
    }
}
