//! Argument typing -- prefix-driven conversion of raw tokens into values.
//!
//! Each command-line token is typed solely by its leading character(s);
//! content is never inspected for type inference:
//!
//! - `+N` / `-N` -> signed integer (width picked by magnitude)
//! - `[a,b,...`  -> array, elements re-typed recursively; a trailing `]`
//!   is stripped when present and tolerated when absent
//! - `@source`   -> binary payload read from stdin (`@-`), a URL, or a
//!   local file path
//! - anything else -> string, byte-for-byte
//!
//! Typing is split into a pure classification step ([`classify`]) and a
//! side-effecting resolution step on [`Typer`], so the lexical rules stay
//! unit-testable without touching the filesystem or the network. Binary
//! acquisition is fully buffered: the complete payload is materialized
//! before it is wrapped as a [`Value`].
//!
//! # Array grammar
//!
//! Commas split elements at bracket depth zero only; nested `[...]`
//! groups recurse through the same rules. `[1,[2,3],x` therefore types as
//! three elements, the middle one a nested array.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use log::debug;

use crate::error::{Result, RpcError};
use crate::types::Value;

/// URL schemes recognized after `@`. `file://` is handled locally; the
/// network schemes require the HTTP collaborator.
const URL_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// Where the bytes of a `@` token come from. Purely lexical; no I/O has
/// happened yet when one of these is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinarySource {
    /// `@-`: the process standard input, read to end-of-stream.
    Stdin,
    /// `@http://...`, `@https://...`, `@ftp://...`: a network fetch.
    Url(String),
    /// Anything else (including `@file://...`): a local file, read fully.
    File(PathBuf),
}

impl BinarySource {
    fn parse(spec: &str) -> Self {
        if spec == "-" {
            BinarySource::Stdin
        } else if let Some(path) = spec.strip_prefix("file://") {
            BinarySource::File(PathBuf::from(path))
        } else if URL_SCHEMES.iter().any(|s| spec.starts_with(s)) {
            BinarySource::Url(spec.to_string())
        } else {
            BinarySource::File(PathBuf::from(spec))
        }
    }
}

/// The result of pure classification: a [`Value`] shape whose binary
/// leaves are still unresolved sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawArg {
    Str(String),
    Int(i64),
    Array(Vec<RawArg>),
    Binary(BinarySource),
}

/// Type a single token by prefix. Pure: performs no I/O.
///
/// An empty token types as `Str("")`; a token whose content merely looks
/// numeric but carries no sign prefix stays a string.
pub fn classify(token: &str) -> Result<RawArg> {
    if let Some(spec) = token.strip_prefix('@') {
        return Ok(RawArg::Binary(BinarySource::parse(spec)));
    }
    if token.starts_with('+') || token.starts_with('-') {
        return parse_integer(token);
    }
    if let Some(body) = token.strip_prefix('[') {
        return parse_array(body);
    }
    Ok(RawArg::Str(token.to_string()))
}

/// Parse a sign-prefixed integer token. The prefix supplies the sign and
/// is not part of the digit string.
fn parse_integer(token: &str) -> Result<RawArg> {
    let digits = &token[1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RpcError::InvalidNumber {
            token: token.to_string(),
        });
    }
    let magnitude: i64 = digits.parse().map_err(|_| RpcError::InvalidNumber {
        token: token.to_string(),
    })?;
    let n = if token.starts_with('-') {
        -magnitude
    } else {
        magnitude
    };
    Ok(RawArg::Int(n))
}

/// Parse the body of an array token (the text after the leading `[`).
///
/// Splits on commas at bracket depth zero and re-types each piece through
/// [`classify`]. One trailing `]` is stripped when the brackets balance;
/// a missing closer is tolerated.
fn parse_array(body: &str) -> Result<RawArg> {
    let body = strip_trailing_bracket(body);
    if body.is_empty() {
        return Ok(RawArg::Array(Vec::new()));
    }
    split_top_level(body)
        .into_iter()
        .map(classify)
        .collect::<Result<Vec<_>>>()
        .map(RawArg::Array)
}

/// Remove the closing `]` matching the already-consumed opener, if the
/// body ends with one. Leaves unbalanced bodies alone so that a `]`
/// closing a nested group is not eaten.
fn strip_trailing_bracket(body: &str) -> &str {
    let Some(inner) = body.strip_suffix(']') else {
        return body;
    };
    let mut depth = 0i32;
    for b in inner.bytes() {
        match b {
            b'[' => depth += 1,
            b']' => depth -= 1,
            _ => {}
        }
    }
    if depth >= 0 {
        inner
    } else {
        body
    }
}

/// Split on commas that are not inside a nested `[...]` group.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth -= 1,
            b',' if depth <= 0 => {
                pieces.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&body[start..]);
    pieces
}

/// Network fetch collaborator for `@http://...` style sources.
///
/// Constructor-injected into [`Typer`]; when absent, network sources fail
/// with [`RpcError::MissingCapability`]. The crate ships an implementation
/// behind the `http` feature ([`crate::http::HttpFetcher`]).
pub trait FetchUrl {
    /// Fetch the full body at `url`, buffered.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Turns token sequences into [`Value`] sequences, performing the I/O
/// that binary sources need.
///
/// Standard input is consumable at most once per process; a second `@-`
/// token in the same invocation yields empty bytes because the stream is
/// already drained.
#[derive(Default)]
pub struct Typer {
    http: Option<Box<dyn FetchUrl>>,
}

impl Typer {
    /// A typer without network capability.
    pub fn new() -> Self {
        Self { http: None }
    }

    /// A typer with an injected HTTP collaborator.
    pub fn with_http(fetcher: Box<dyn FetchUrl>) -> Self {
        Self { http: Some(fetcher) }
    }

    /// Type every token, left to right, reading `@-` sources from the
    /// process standard input. Later tokens are not touched until earlier
    /// ones have fully resolved.
    pub fn type_args(&self, tokens: &[String]) -> Result<Vec<Value>> {
        let mut stdin = io::stdin().lock();
        tokens
            .iter()
            .map(|token| self.type_token(token, &mut stdin))
            .collect()
    }

    /// Type a single token against an explicit stdin reader.
    pub fn type_token<R: Read>(&self, token: &str, stdin: &mut R) -> Result<Value> {
        let raw = classify(token)?;
        self.resolve(raw, stdin)
    }

    fn resolve<R: Read>(&self, raw: RawArg, stdin: &mut R) -> Result<Value> {
        match raw {
            RawArg::Str(s) => Ok(Value::Str(s)),
            RawArg::Int(n) => Ok(Value::int(n)),
            RawArg::Array(items) => items
                .into_iter()
                .map(|item| self.resolve(item, stdin))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            RawArg::Binary(source) => self.read_binary(source, stdin),
        }
    }

    fn read_binary<R: Read>(&self, source: BinarySource, stdin: &mut R) -> Result<Value> {
        match source {
            BinarySource::Stdin => {
                let mut buf = Vec::new();
                stdin
                    .read_to_end(&mut buf)
                    .map_err(|e| RpcError::BinarySource {
                        origin: "stdin".to_string(),
                        reason: e.to_string(),
                    })?;
                debug!("read {} bytes from stdin", buf.len());
                Ok(Value::Binary(buf))
            }
            BinarySource::File(path) => {
                let bytes = fs::read(&path).map_err(|e| RpcError::BinarySource {
                    origin: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                debug!("read {} bytes from {}", bytes.len(), path.display());
                Ok(Value::Binary(bytes))
            }
            BinarySource::Url(url) => match &self.http {
                Some(fetcher) => {
                    let bytes = fetcher.fetch(&url)?;
                    debug!("fetched {} bytes from {}", bytes.len(), url);
                    Ok(Value::Binary(bytes))
                }
                None => Err(RpcError::MissingCapability(url)),
            },
        }
    }
}
