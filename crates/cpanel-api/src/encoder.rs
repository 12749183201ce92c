// Argument encoders
//
// An encoder turns one name/value pair into a wire fragment and knows the
// framing (content type, opening/closing separators, record separator) the
// request builder wraps around the joined fragments.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::error::Error;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
///
/// cPanel decodes form bodies and `/execute` path segments with this set in
/// mind, so `!*'()` must pass through untouched.
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single URI component.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Serializes arguments for one request body or query string.
pub trait ArgumentEncoder: fmt::Debug + Send + Sync {
    /// `Content-Type` header value for the encoded payload.
    fn content_type(&self) -> &'static str;

    /// Emitted once before the first record.
    fn separator_start(&self) -> &'static str;

    /// Emitted once after the last record.
    fn separator_end(&self) -> &'static str;

    /// Emitted between records.
    fn record_separator(&self) -> &'static str;

    /// Encode one record. The record separator is appended unless `last`.
    fn encode(&self, name: &str, value: &Value, last: bool) -> Result<String, Error>;

    /// Encode a complete parameter list, including the outer separators.
    fn encode_all(&self, params: &[(String, Value)]) -> Result<String, Error> {
        let mut out = String::from(self.separator_start());
        for (index, (name, value)) in params.iter().enumerate() {
            out.push_str(&self.encode(name, value, index + 1 == params.len())?);
        }
        out.push_str(self.separator_end());
        Ok(out)
    }
}

fn require_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::invalid_argument("Name must have a non-empty value"));
    }
    Ok(())
}

/// Integral floats print without a fraction: `1.0` becomes `1`.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_owned()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

// ── Form encoding ────────────────────────────────────────────────────

/// `application/x-www-form-urlencoded`: `a=1&b=two`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WwwFormUrlArgumentEncoder;

impl WwwFormUrlArgumentEncoder {
    /// Flat text form of a value, or `None` when the form cannot carry it.
    fn text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(number_text(n)),
            Value::Bool(b) => Some(b.to_string()),
            Value::Array(items) => items
                .iter()
                .map(Self::text)
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.join(",")),
            Value::Null | Value::Object(_) => None,
        }
    }
}

impl ArgumentEncoder for WwwFormUrlArgumentEncoder {
    fn content_type(&self) -> &'static str {
        "application/x-www-form-urlencoded"
    }

    fn separator_start(&self) -> &'static str {
        ""
    }

    fn separator_end(&self) -> &'static str {
        ""
    }

    fn record_separator(&self) -> &'static str {
        "&"
    }

    fn encode(&self, name: &str, value: &Value, last: bool) -> Result<String, Error> {
        require_name(name)?;
        let text = Self::text(value).ok_or_else(|| Error::NonSerializableValue {
            name: name.to_owned(),
            reason: format!("a {} can not be form encoded", kind(value)),
        })?;
        let sep = if last { "" } else { self.record_separator() };
        Ok(format!("{name}={}{sep}", encode_uri_component(&text)))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── JSON encoding ────────────────────────────────────────────────────

/// `application/json`: `{"a":1,"b":"two"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArgumentEncoder;

impl ArgumentEncoder for JsonArgumentEncoder {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn separator_start(&self) -> &'static str {
        "{"
    }

    fn separator_end(&self) -> &'static str {
        "}"
    }

    fn record_separator(&self) -> &'static str {
        ","
    }

    fn encode(&self, name: &str, value: &Value, last: bool) -> Result<String, Error> {
        require_name(name)?;
        let to_err = |e: serde_json::Error| Error::NonSerializableValue {
            name: name.to_owned(),
            reason: e.to_string(),
        };
        let key = serde_json::to_string(name).map_err(to_err)?;
        let value = serde_json::to_string(value).map_err(to_err)?;
        let sep = if last { "" } else { self.record_separator() };
        Ok(format!("{key}:{value}{sep}"))
    }
}
