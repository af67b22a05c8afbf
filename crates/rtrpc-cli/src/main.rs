//! `rtxmlrpc` -- typed XML-RPC calls against an rtorrent-style daemon.
//!
//! ## Usage
//!
//! ```sh
//! # Plain call: unprefixed arguments are strings
//! rtxmlrpc -U scgi:///run/rtorrent.sock system.client_version
//!
//! # Typed arguments: +/- integer, [ array, @ binary
//! rtxmlrpc -U localhost:5000 throttle.max_downloads.div.set '' +100
//!
//! # Binary payload from a file, a URL, or stdin
//! rtxmlrpc -U localhost:5000 load.raw_start '' @/tmp/file.torrent
//! cat file.torrent | rtxmlrpc -U localhost:5000 load.raw_start '' @-
//!
//! # Execute through the daemon's `import` primitive instead
//! rtxmlrpc -U localhost:5000 -i print 'Hello world!'
//! ```

mod scgi;
mod xmlrpc;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};
use rtrpc_core::{execute, CallMode, Typer, Value};

use crate::scgi::{Endpoint, ScgiTransport};

#[derive(Parser)]
#[command(
    name = "rtxmlrpc",
    version,
    about = "Typed XML-RPC command-line client for rtorrent-style daemons"
)]
struct Cli {
    /// XML-RPC method name
    method: String,

    /// Arguments, typed by prefix: +N/-N integer, [a,b,c array,
    /// @path/@url/@- binary, anything else string
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,

    /// Execute via the daemon's "import" command instead of a direct call
    #[arg(short = 'i', long = "as-import")]
    as_import: bool,

    /// Daemon endpoint: scgi:///path.sock, scgi://host:port, a socket
    /// path, or host:port
    #[arg(short = 'U', long = "url", env = "RTORRENT_RPC_URL")]
    url: Option<String>,

    /// Print the result as a debug representation instead of plain text
    #[arg(short, long)]
    repr: bool,

    /// Network timeout in seconds for the call and for @url sources
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Silence warnings
    #[arg(short, long)]
    quiet: bool,

    /// Show additional information
    #[arg(short, long)]
    verbose: bool,

    /// Show detailed messages
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let spec = cli.url.clone().context(
        "no daemon endpoint; pass -U/--url or set RTORRENT_RPC_URL",
    )?;
    let endpoint = Endpoint::parse(&spec)?;
    let timeout = Duration::from_secs(cli.timeout);

    let typer = build_typer(timeout)?;
    let args = typer
        .type_args(&cli.args)
        .context("failed to type arguments")?;
    debug!("typed arguments: {:?}", args);

    let mode = if cli.as_import {
        CallMode::Import
    } else {
        CallMode::Direct
    };

    let mut transport = ScgiTransport::new(endpoint, timeout);
    let result = execute(&mut transport, &cli.method, &args, mode)
        .with_context(|| format!("call to {} failed", cli.method))?;

    print_result(&result, cli.repr);
    Ok(())
}

/// Log level selection mirrors the classic pyroscope tools: warnings by
/// default, -q errors only, -v info, --debug everything. RUST_LOG still
/// wins when set.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Trace
    } else if cli.verbose {
        LevelFilter::Info
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

#[cfg(feature = "http")]
fn build_typer(timeout: Duration) -> Result<Typer> {
    let fetcher = rtrpc_core::HttpFetcher::new(timeout)?;
    Ok(Typer::with_http(Box::new(fetcher)))
}

#[cfg(not(feature = "http"))]
fn build_typer(_timeout: Duration) -> Result<Typer> {
    Ok(Typer::new())
}

fn print_result(result: &Value, repr: bool) {
    if repr {
        println!("{:?}", result);
    } else {
        println!("{}", result);
    }
}
