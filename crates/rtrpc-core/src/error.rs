//! Error types for argument typing and call dispatch.

use thiserror::Error;

/// Errors that can occur while typing arguments or dispatching a call.
///
/// Every variant is terminal for the invocation: nothing is retried or
/// silently downgraded. Typing-stage failures (`InvalidNumber`,
/// `BinarySource`, `MissingCapability`) abort before any call is made;
/// `Fault` and `Transport` surface after the exchange.
#[derive(Error, Debug)]
pub enum RpcError {
    /// A `+`/`-` prefixed token whose remainder is not a valid integer.
    #[error("invalid integer literal {token:?}")]
    InvalidNumber { token: String },

    /// A `@` binary source (file, URL, or stdin) could not be read.
    #[error("cannot read binary source {origin}: {reason}")]
    BinarySource { origin: String, reason: String },

    /// A network fetch was requested but no HTTP collaborator is configured
    /// (built without the `http` feature).
    #[error("fetching {0} requires HTTP support, which is not available in this build")]
    MissingCapability(String),

    /// The daemon reported a fault, either for the direct call or for the
    /// `import` call carrying a staged script.
    #[error("daemon fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The temporary import script could not be staged. Raised before the
    /// `import` call is attempted.
    #[error("cannot stage import script: {0}")]
    ImportWrite(#[source] std::io::Error),

    /// A binary value appeared in as-import mode; the daemon's command
    /// grammar has no literal form for raw bytes.
    #[error("binary values cannot be rendered in command syntax")]
    BinaryInScript,

    /// Connection or protocol failure below the fault level.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Convenience alias used throughout rtrpc-core.
pub type Result<T> = std::result::Result<T, RpcError>;
