//! XML-RPC wire codec for the `Value` union.
//!
//! Not a general-purpose codec: it serializes exactly the value union the
//! client speaks (`<string>`, `<i4>`/`<i8>`, `<base64>`, `<array>`) and
//! maps responses back into it. Response types outside the union degrade
//! gracefully: booleans, doubles and timestamps come back as their text,
//! structs flatten to `name=value` string arrays.

use data_encoding::BASE64;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use rtrpc_core::{Result, RpcError, Value};

/// Serialize a `<methodCall>` document.
pub fn render_call(method: &str, args: &[Value]) -> String {
    let mut xml = String::with_capacity(128);
    xml.push_str("<?xml version=\"1.0\"?>");
    xml.push_str("<methodCall><methodName>");
    xml.push_str(&escape(method));
    xml.push_str("</methodName><params>");
    for arg in args {
        xml.push_str("<param>");
        write_value(arg, &mut xml);
        xml.push_str("</param>");
    }
    xml.push_str("</params></methodCall>");
    xml
}

fn write_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Str(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s));
            out.push_str("</string>");
        }
        Value::Int(n) => {
            out.push_str("<i4>");
            out.push_str(&n.to_string());
            out.push_str("</i4>");
        }
        Value::Long(n) => {
            out.push_str("<i8>");
            out.push_str(&n.to_string());
            out.push_str("</i8>");
        }
        Value::Binary(bytes) => {
            out.push_str("<base64>");
            out.push_str(&BASE64.encode(bytes));
            out.push_str("</base64>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(item, out);
            }
            out.push_str("</data></array>");
        }
    }
    out.push_str("</value>");
}

/// Intermediate response tree. Keeps struct members around long enough to
/// extract fault details before flattening into the `Value` union.
#[derive(Debug)]
enum Node {
    Str(String),
    Int(i64),
    Binary(Vec<u8>),
    Array(Vec<Node>),
    Struct(Vec<(String, Node)>),
}

/// Parse a `<methodResponse>` document into a value or a fault.
pub fn parse_response(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"fault" => in_fault = true,
                b"value" => {
                    let node = read_value(&mut reader)?;
                    return if in_fault {
                        Err(fault_from(node))
                    } else {
                        Ok(flatten(node))
                    };
                }
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                return Ok(Value::Str(String::new()));
            }
            Event::Eof => {
                return Err(RpcError::Transport(
                    "response carries no value".to_string(),
                ))
            }
            _ => {}
        }
    }
}

/// Read one value; the enclosing `<value>` start tag is already consumed,
/// its end tag is consumed before returning. Untyped `<value>text</value>`
/// content is a string per XML-RPC.
fn read_value(reader: &mut Reader<&[u8]>) -> Result<Node> {
    let mut untyped: Option<String> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => {
                untyped = Some(t.unescape().map_err(xml_err)?.into_owned());
            }
            Event::Start(e) => {
                let tag = e.name().as_ref().to_vec();
                let node = match tag.as_slice() {
                    b"array" => read_array(reader)?,
                    b"struct" => read_struct(reader)?,
                    _ => scalar_node(&tag, read_text(reader, &tag)?)?,
                };
                skip_to_end(reader, b"value")?;
                return Ok(node);
            }
            Event::Empty(e) => {
                let node = scalar_node(e.name().as_ref(), String::new())?;
                skip_to_end(reader, b"value")?;
                return Ok(node);
            }
            Event::End(e) if e.name().as_ref() == b"value" => {
                return Ok(Node::Str(untyped.unwrap_or_default()));
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Map a typed scalar element to a node. Unknown tags keep their text.
fn scalar_node(tag: &[u8], text: String) -> Result<Node> {
    match tag {
        b"int" | b"i4" | b"i8" => text
            .trim()
            .parse::<i64>()
            .map(Node::Int)
            .map_err(|_| RpcError::Transport(format!("malformed integer in response: {:?}", text))),
        b"base64" => {
            let compact: String = text.split_whitespace().collect();
            BASE64
                .decode(compact.as_bytes())
                .map(Node::Binary)
                .map_err(|e| RpcError::Transport(format!("malformed base64 in response: {}", e)))
        }
        _ => Ok(Node::Str(text)),
    }
}

/// Read elements until `</array>`; `<data>` wrappers are skipped.
fn read_array(reader: &mut Reader<&[u8]>) -> Result<Node> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"value" => {
                items.push(read_value(reader)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"value" => {
                items.push(Node::Str(String::new()));
            }
            Event::End(e) if e.name().as_ref() == b"array" => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(Node::Array(items))
}

/// Read `<member><name>..</name><value>..</value></member>` pairs until
/// `</struct>`.
fn read_struct(reader: &mut Reader<&[u8]>) -> Result<Node> {
    let mut members = Vec::new();
    let mut pending_name: Option<String> = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"name" => pending_name = Some(read_text(reader, b"name")?),
                b"value" => {
                    let node = read_value(reader)?;
                    members.push((pending_name.take().unwrap_or_default(), node));
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"struct" => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(Node::Struct(members))
}

/// Collect text content until the matching end tag.
fn read_text(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(xml_err)?),
            Event::End(e) if e.name().as_ref() == tag => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(text)
}

/// Skip events until the end tag of `tag`.
fn skip_to_end(reader: &mut Reader<&[u8]>, tag: &[u8]) -> Result<()> {
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::End(e) if e.name().as_ref() == tag => return Ok(()),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Collapse the response tree into the value union. Structs have no
/// counterpart there; their members flatten to `name=value` strings.
fn flatten(node: Node) -> Value {
    match node {
        Node::Str(s) => Value::Str(s),
        Node::Int(n) => Value::int(n),
        Node::Binary(b) => Value::Binary(b),
        Node::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        Node::Struct(members) => Value::Array(
            members
                .into_iter()
                .map(|(name, value)| Value::Str(format!("{}={}", name, flatten(value))))
                .collect(),
        ),
    }
}

/// Extract `faultCode`/`faultString` from a fault struct.
fn fault_from(node: Node) -> RpcError {
    let Node::Struct(members) = node else {
        return RpcError::Transport("malformed fault payload".to_string());
    };
    let mut code = 0i32;
    let mut message = String::new();
    for (name, value) in members {
        match (name.as_str(), value) {
            // Codes always fit i32 in practice; clamp rather than wrap
            // if a daemon ever sends a wider value.
            ("faultCode", Node::Int(n)) => {
                code = n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            }
            ("faultString", Node::Str(s)) => message = s,
            _ => {}
        }
    }
    RpcError::Fault { code, message }
}

fn xml_err(e: impl std::fmt::Display) -> RpcError {
    RpcError::Transport(format!("malformed XML in response: {}", e))
}

fn truncated() -> RpcError {
    RpcError::Transport("truncated XML response".to_string())
}
