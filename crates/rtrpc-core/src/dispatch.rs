//! Call dispatch -- direct calls and the as-import escape hatch.
//!
//! A call is a single blocking request/response exchange. In direct mode
//! the method is handed to the transport as-is. In as-import mode the
//! method and arguments are rendered into the daemon's own command syntax
//! (`method=arg1,arg2`), staged in a temporary file, and executed through
//! the daemon's `import` primitive instead. Some commands are size-limited
//! or behave differently inside the daemon's script-execution context, so
//! the mode is an explicit caller choice; there is no fallback in either
//! direction.

use std::io::Write;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{Result, RpcError};
use crate::types::Value;

/// How a call is executed. Resolved once from the CLI flag, not scattered
/// across call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallMode {
    /// One transport call naming the target method.
    #[default]
    Direct,
    /// One transport call to `import`, carrying a staged script.
    Import,
}

/// The opaque call channel to the daemon. Wire format is the transport's
/// business; faults come back as [`RpcError::Fault`].
pub trait Transport {
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value>;
}

/// The well-known script-execution primitive.
const IMPORT_METHOD: &str = "import";

/// Execute one call in the given mode. The single entry point for both
/// strategies; faults from either path surface verbatim.
pub fn execute(
    transport: &mut dyn Transport,
    method: &str,
    args: &[Value],
    mode: CallMode,
) -> Result<Value> {
    match mode {
        CallMode::Direct => {
            debug!("direct call: {}({} args)", method, args.len());
            transport.call(method, args)
        }
        CallMode::Import => execute_as_import(transport, method, args),
    }
}

/// Stage `method=args...` in a temporary file and execute it via `import`.
///
/// Staging failures abort before any call is made. The temporary file
/// stays alive until the `import` call returns, since the daemon reads it
/// during the exchange. No typed return value is recovered from the
/// script itself; success is the `import` call completing without fault.
fn execute_as_import(transport: &mut dyn Transport, method: &str, args: &[Value]) -> Result<Value> {
    let script = render_script(method, args)?;

    let mut file = NamedTempFile::new().map_err(RpcError::ImportWrite)?;
    file.write_all(script.as_bytes())
        .map_err(RpcError::ImportWrite)?;
    file.flush().map_err(RpcError::ImportWrite)?;

    let path = file.path().to_string_lossy().into_owned();
    debug!("staged import script at {}: {}", path, script.trim_end());

    transport.call(IMPORT_METHOD, &[Value::Str(path)])
}

/// Render a call in the daemon's command grammar: the method name, `=`,
/// and the comma-joined argument literals.
pub fn render_script(method: &str, args: &[Value]) -> Result<String> {
    let mut literals = Vec::with_capacity(args.len());
    for arg in args {
        literals.push(render_literal(arg)?);
    }
    Ok(format!("{}={}\n", method, literals.join(",")))
}

/// Render one value literal. Strings quote only when the bare form would
/// be ambiguous; arrays are comma-joined element literals; binary has no
/// literal form in the grammar and is rejected.
fn render_literal(value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(render_string_literal(s)),
        Value::Int(n) => Ok(n.to_string()),
        Value::Long(n) => Ok(n.to_string()),
        Value::Array(items) => {
            let rendered = items
                .iter()
                .map(render_literal)
                .collect::<Result<Vec<_>>>()?;
            Ok(rendered.join(","))
        }
        Value::Binary(_) => Err(RpcError::BinaryInScript),
    }
}

/// Quote a string when it is empty or contains a character the daemon's
/// tokenizer treats specially; otherwise emit it bare.
fn render_string_literal(s: &str) -> String {
    let needs_quoting = s.is_empty()
        || s.bytes()
            .any(|b| matches!(b, b',' | b'=' | b'"' | b'\\' | b';') || b.is_ascii_whitespace());
    if !needs_quoting {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
