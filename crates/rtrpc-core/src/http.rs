//! Optional HTTP collaborator for `@http://...` binary sources.
//!
//! Only compiled with the `http` feature. A blocking client with a fixed
//! timeout; the full body is buffered before it is returned, matching the
//! all-or-nothing contract of binary sourcing.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::args::FetchUrl;
use crate::error::{Result, RpcError};

/// Blocking URL fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rtxmlrpc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl FetchUrl for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("fetching binary source {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| RpcError::BinarySource {
                origin: url.to_string(),
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::BinarySource {
                origin: url.to_string(),
                reason: format!("HTTP status {}", status),
            });
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| RpcError::BinarySource {
                origin: url.to_string(),
                reason: e.to_string(),
            })
    }
}
