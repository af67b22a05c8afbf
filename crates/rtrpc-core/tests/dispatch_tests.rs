//! Tests for call dispatch: direct vs. as-import execution, script
//! rendering, and the daemon command literal grammar.

use rtrpc_core::{execute, render_script, CallMode, Result, RpcError, Transport, Value};

/// Records every call and, when a path argument is present, snapshots the
/// staged script while the temporary file is still alive.
struct RecordingTransport {
    calls: Vec<(String, Vec<Value>)>,
    staged_scripts: Vec<String>,
    reply: fn() -> Result<Value>,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            staged_scripts: Vec::new(),
            reply: || Ok(Value::Int(0)),
        }
    }

    fn failing(reply: fn() -> Result<Value>) -> Self {
        Self {
            calls: Vec::new(),
            staged_scripts: Vec::new(),
            reply,
        }
    }
}

impl Transport for RecordingTransport {
    fn call(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        if method == "import" {
            // The daemon reads the script during the exchange; the staged
            // file must still exist at this point.
            let path = args[0].as_str().expect("import takes a path argument");
            let script = std::fs::read_to_string(path).expect("staged script must be readable");
            self.staged_scripts.push(script);
        }
        self.calls.push((method.to_string(), args.to_vec()));
        (self.reply)()
    }
}

// ============================================================================
// Direct mode
// ============================================================================

#[test]
fn direct_mode_calls_the_method_once() {
    let mut transport = RecordingTransport::new();
    let args = vec![Value::Str("".into()), Value::Int(100)];

    let result = execute(
        &mut transport,
        "throttle.max_downloads.div.set",
        &args,
        CallMode::Direct,
    )
    .unwrap();

    assert_eq!(result, Value::Int(0));
    assert_eq!(transport.calls.len(), 1);
    assert_eq!(transport.calls[0].0, "throttle.max_downloads.div.set");
    assert_eq!(transport.calls[0].1, args);
}

#[test]
fn direct_mode_never_touches_import() {
    let mut transport = RecordingTransport::new();
    execute(&mut transport, "system.listMethods", &[], CallMode::Direct).unwrap();

    assert!(transport.staged_scripts.is_empty());
    assert!(transport.calls.iter().all(|(m, _)| m != "import"));
}

#[test]
fn direct_mode_surfaces_faults_verbatim() {
    let mut transport = RecordingTransport::failing(|| {
        Err(RpcError::Fault {
            code: -506,
            message: "Method 'no.such' not defined".into(),
        })
    });

    match execute(&mut transport, "no.such", &[], CallMode::Direct) {
        Err(RpcError::Fault { code, message }) => {
            assert_eq!(code, -506);
            assert!(message.contains("not defined"));
        }
        other => panic!("expected fault, got {:?}", other),
    }
    // No fallback to import after a fault.
    assert_eq!(transport.calls.len(), 1);
}

// ============================================================================
// As-import mode
// ============================================================================

#[test]
fn import_mode_issues_exactly_one_import_call() {
    let mut transport = RecordingTransport::new();
    let args = vec![Value::Str("Hello world!".into())];

    execute(&mut transport, "print", &args, CallMode::Import).unwrap();

    assert_eq!(transport.calls.len(), 1);
    let (method, call_args) = &transport.calls[0];
    assert_eq!(method, "import");
    assert_eq!(call_args.len(), 1);
    assert!(call_args[0].as_str().is_some(), "import takes a path string");
}

#[test]
fn import_mode_never_calls_the_original_method() {
    let mut transport = RecordingTransport::new();
    execute(&mut transport, "print", &[], CallMode::Import).unwrap();
    assert!(transport.calls.iter().all(|(m, _)| m != "print"));
}

#[test]
fn import_mode_stages_the_rendered_command() {
    let mut transport = RecordingTransport::new();
    let args = vec![Value::Str("Hello world!".into()), Value::Int(7)];

    execute(&mut transport, "print", &args, CallMode::Import).unwrap();

    assert_eq!(transport.staged_scripts.len(), 1);
    assert_eq!(transport.staged_scripts[0], "print=\"Hello world!\",7\n");
}

#[test]
fn import_mode_surfaces_import_faults_verbatim() {
    let mut transport = RecordingTransport::failing(|| {
        Err(RpcError::Fault {
            code: -503,
            message: "Could not read import file".into(),
        })
    });

    match execute(&mut transport, "print", &[], CallMode::Import) {
        Err(RpcError::Fault { code, .. }) => assert_eq!(code, -503),
        other => panic!("expected fault, got {:?}", other),
    }
    assert_eq!(transport.calls.len(), 1);
}

#[test]
fn import_mode_aborts_before_calling_when_rendering_fails() {
    let mut transport = RecordingTransport::new();
    let args = vec![Value::Binary(vec![1, 2, 3])];

    match execute(&mut transport, "load.raw", &args, CallMode::Import) {
        Err(RpcError::BinaryInScript) => {}
        other => panic!("expected BinaryInScript, got {:?}", other),
    }
    assert!(transport.calls.is_empty(), "no call may be attempted");
}

// ============================================================================
// Command literal grammar
// ============================================================================

#[test]
fn script_quotes_only_ambiguous_strings() {
    assert_eq!(
        render_script("view.add", &[Value::Str("sorted".into())]).unwrap(),
        "view.add=sorted\n"
    );
    assert_eq!(
        render_script("print", &[Value::Str("two words".into())]).unwrap(),
        "print=\"two words\"\n"
    );
    assert_eq!(
        render_script("set", &[Value::Str("".into())]).unwrap(),
        "set=\"\"\n"
    );
}

#[test]
fn script_escapes_quotes_and_backslashes() {
    assert_eq!(
        render_script("print", &[Value::Str("say \"hi\"".into())]).unwrap(),
        "print=\"say \\\"hi\\\"\"\n"
    );
    assert_eq!(
        render_script("print", &[Value::Str("a\\b".into())]).unwrap(),
        "print=\"a\\\\b\"\n"
    );
}

#[test]
fn script_renders_integers_bare() {
    assert_eq!(
        render_script("throttle.global_down.max_rate.set", &[Value::Int(-1)]).unwrap(),
        "throttle.global_down.max_rate.set=-1\n"
    );
    assert_eq!(
        render_script("x", &[Value::Long(1 << 40)]).unwrap(),
        "x=1099511627776\n"
    );
}

#[test]
fn script_joins_array_elements_with_commas() {
    let args = vec![Value::Array(vec![
        Value::Str("main".into()),
        Value::Int(1),
        Value::Str("d.name=".into()),
    ])];
    assert_eq!(
        render_script("d.multicall2", &args).unwrap(),
        "d.multicall2=main,1,\"d.name=\"\n"
    );
}

/// The documented round-trip property: rendering and re-parsing through
/// the daemon grammar reconstructs the same method and argument.
#[test]
fn script_round_trips_through_the_daemon_grammar() {
    let script = render_script("print", &[Value::Str("Hello world!".into())]).unwrap();

    // Parse back per the grammar: `method=literal` with quoted-string
    // unescaping.
    let line = script.trim_end();
    let (method, literal) = line.split_once('=').unwrap();
    assert_eq!(method, "print");

    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap();
    let mut parsed = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            parsed.extend(chars.next());
        } else {
            parsed.push(c);
        }
    }
    assert_eq!(parsed, "Hello world!");
}
