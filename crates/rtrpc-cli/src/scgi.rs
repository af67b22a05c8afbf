//! SCGI transport to the daemon's control socket.
//!
//! rtorrent speaks XML-RPC wrapped in SCGI: a netstring-framed header
//! block (`CONTENT_LENGTH`, `SCGI 1`) followed by the XML body, answered
//! with a CGI-style header block, a blank line, and the response payload.
//! One connection per call; the daemon closes the stream after replying.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use log::{debug, trace};
use rtrpc_core::{RpcError, Transport, Value};

use crate::xmlrpc;

/// Where the daemon listens. Accepted spellings:
///
/// - `scgi:///path/to/rtorrent.sock` or a bare path -> UNIX socket
/// - `scgi://host:port` or bare `host:port` -> TCP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    pub fn parse(spec: &str) -> anyhow::Result<Self> {
        if spec.contains("://") {
            let parsed = url::Url::parse(spec)
                .with_context(|| format!("invalid endpoint URL: {}", spec))?;
            if parsed.scheme() != "scgi" {
                bail!(
                    "unsupported endpoint scheme {:?} in {} (expected scgi://)",
                    parsed.scheme(),
                    spec
                );
            }
            return match parsed.host_str() {
                Some(host) if !host.is_empty() => {
                    let port = parsed
                        .port()
                        .with_context(|| format!("scgi:// TCP endpoints need a port: {}", spec))?;
                    Ok(Endpoint::Tcp(format!("{}:{}", host, port)))
                }
                _ => Ok(Endpoint::Unix(PathBuf::from(parsed.path()))),
            };
        }
        if spec.contains('/') || spec.starts_with('~') {
            return Ok(Endpoint::Unix(PathBuf::from(spec)));
        }
        if spec.contains(':') {
            return Ok(Endpoint::Tcp(spec.to_string()));
        }
        bail!(
            "cannot interpret endpoint {:?}: expected an scgi:// URL, a socket path, or host:port",
            spec
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp(addr) => f.write_str(addr),
        }
    }
}

/// Blocking SCGI transport; implements the core call channel.
pub struct ScgiTransport {
    endpoint: Endpoint,
    timeout: Duration,
}

impl ScgiTransport {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    fn exchange(&self, request: &[u8]) -> io::Result<Vec<u8>> {
        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let mut stream = UnixStream::connect(path)?;
                stream.set_read_timeout(Some(self.timeout))?;
                stream.set_write_timeout(Some(self.timeout))?;
                stream.write_all(request)?;
                stream.shutdown(Shutdown::Write)?;
                let mut response = Vec::new();
                stream.read_to_end(&mut response)?;
                Ok(response)
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "UNIX socket endpoints are not supported on this platform",
            )),
            Endpoint::Tcp(addr) => {
                let mut stream = TcpStream::connect(addr)?;
                stream.set_read_timeout(Some(self.timeout))?;
                stream.set_write_timeout(Some(self.timeout))?;
                stream.write_all(request)?;
                stream.shutdown(Shutdown::Write)?;
                let mut response = Vec::new();
                stream.read_to_end(&mut response)?;
                Ok(response)
            }
        }
    }
}

impl Transport for ScgiTransport {
    fn call(&mut self, method: &str, args: &[Value]) -> rtrpc_core::Result<Value> {
        let body = xmlrpc::render_call(method, args);
        trace!("request body: {}", body);

        let request = frame_request(body.as_bytes());
        debug!(
            "SCGI exchange with {} ({} byte request)",
            self.endpoint,
            request.len()
        );

        let raw = self
            .exchange(&request)
            .map_err(|e| RpcError::Transport(format!("{}: {}", self.endpoint, e)))?;
        let payload = split_response(&raw)?;
        let text = std::str::from_utf8(payload)
            .map_err(|_| RpcError::Transport("response payload is not valid UTF-8".to_string()))?;
        trace!("response body: {}", text);

        xmlrpc::parse_response(text)
    }
}

/// Wrap an XML body in an SCGI request: netstring-framed headers, then
/// the body.
fn frame_request(body: &[u8]) -> Vec<u8> {
    let headers = format!("CONTENT_LENGTH\x00{}\x00SCGI\x001\x00", body.len());
    let mut request = format!("{}:", headers.len()).into_bytes();
    request.extend_from_slice(headers.as_bytes());
    request.push(b',');
    request.extend_from_slice(body);
    request
}

/// Drop the CGI header block: everything up to and including the first
/// blank line.
fn split_response(raw: &[u8]) -> rtrpc_core::Result<&[u8]> {
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return Ok(&raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return Ok(&raw[pos + 2..]);
    }
    Err(RpcError::Transport(
        "response carries no header/body separator".to_string(),
    ))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
