//! # rtrpc-core
//!
//! Typed argument encoding and call dispatch for `rtxmlrpc`, a
//! command-line XML-RPC client for rtorrent-style torrent daemons.
//!
//! Command-line tokens are typed by prefix into a small protocol value
//! union, then dispatched to the daemon either as a direct remote call or
//! rewritten into daemon-native command syntax and executed through the
//! `import` primitive:
//!
//! ```text
//! tokens -> Typer -> Vec<Value> -> execute(transport, method, args, mode)
//! ```
//!
//! The wire transport is an external collaborator behind the [`Transport`]
//! trait; this crate specifies only the value union it must carry.
//!
//! ## Quick start
//!
//! ```rust
//! use rtrpc_core::{classify, RawArg};
//!
//! // Tokens are typed by prefix, never by content.
//! assert_eq!(classify("+100").unwrap(), RawArg::Int(100));
//! assert_eq!(classify("100").unwrap(), RawArg::Str("100".into()));
//! ```
//!
//! ## Modules
//!
//! - [`args`] — prefix-driven argument typing, binary source acquisition
//! - [`dispatch`] — direct vs. as-import call execution
//! - [`error`] — the failure taxonomy for typing and dispatch
//! - [`types`] — the `Value` union and its text rendering
//! - [`http`] — optional blocking URL fetcher (feature `http`)

pub mod args;
pub mod dispatch;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod types;

pub use args::{classify, BinarySource, FetchUrl, RawArg, Typer};
pub use dispatch::{execute, render_script, CallMode, Transport};
pub use error::{Result, RpcError};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use types::Value;
