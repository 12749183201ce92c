// UAPI response envelope
//
// Parses `{status, data, errors, warnings, messages, metadata}` into a typed
// view. Parsing is strict about the envelope (status and data must exist) and
// lenient about metadata (unparseable counters read as zero).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

// ── Messages ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Error,
    Warning,
    Information,
    Unknown,
}

/// One message from the envelope's `errors`, `warnings` or `messages` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub message: String,
}

// ── Metadata ─────────────────────────────────────────────────────────

/// Normalized response metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetaData {
    pub is_paged: bool,
    pub is_filtered: bool,
    /// 1-based index of the first record returned.
    pub record: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_records: i64,
    pub total_pages: i64,
    pub records_before_filter: i64,
    /// Set when the response came from `Batch::strict`.
    pub batch: bool,
    /// Every metadata key other than `paginate` and `filter`.
    pub properties: Map<String, Value>,
}

/// Builds [`MetaData`] from a UAPI `metadata` object.
pub struct UapiMetaData;

impl UapiMetaData {
    pub fn parse(meta: &Value) -> MetaData {
        let mut out = MetaData::default();
        let Some(object) = meta.as_object() else {
            return out;
        };

        if let Some(paginate) = object.get("paginate").filter(|v| truthy(v)) {
            out.is_paged = true;
            out.record = int_field(paginate, "start_result");
            out.page = int_field(paginate, "current_page");
            out.page_size = int_field(paginate, "results_per_page");
            out.total_pages = int_field(paginate, "total_pages");
            out.total_records = int_field(paginate, "total_results");
        }

        if let Some(filter) = object.get("filter").filter(|v| truthy(v)) {
            out.is_filtered = true;
            out.records_before_filter = int_field(filter, "records_before_filter");
        }

        for (key, value) in object {
            if key != "paginate" && key != "filter" {
                out.properties.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn int_field(object: &Value, key: &str) -> i64 {
    object.get(key).and_then(parse_int).unwrap_or(0)
}

/// Integer coercion with `parseInt` rules: numbers truncate toward zero,
/// strings contribute their leading (optionally signed) digits.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = if let Some(rest) = trimmed.strip_prefix('-') {
        (true, rest)
    } else {
        (false, trimmed.strip_prefix('+').unwrap_or(trimmed))
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = rest.get(..end).filter(|d| !d.is_empty())?;
    // Too many digits pins to the i64 bound rather than failing.
    Some(digits.bytes().fold(0_i64, |acc, digit| {
        let digit = i64::from(digit - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    }))
}

// ── Response trait ───────────────────────────────────────────────────

/// Options applied while parsing a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseOptions {
    /// Keep a copy of the raw JSON on the response.
    pub keep_unprocessed_response: bool,
}

/// Status and message accessors common to every API family.
pub trait Response {
    /// Positive on success, zero on failure.
    fn status(&self) -> i64;

    fn messages(&self) -> &[Message];

    fn meta(&self) -> &MetaData;

    fn success(&self) -> bool {
        self.status() > 0
    }

    fn failed(&self) -> bool {
        self.status() == 0
    }

    fn messages_of(&self, message_type: MessageType) -> Vec<&Message> {
        self.messages()
            .iter()
            .filter(|m| m.message_type == message_type)
            .collect()
    }

    fn errors(&self) -> Vec<&Message> {
        self.messages_of(MessageType::Error)
    }

    fn warnings(&self) -> Vec<&Message> {
        self.messages_of(MessageType::Warning)
    }

    fn info_messages(&self) -> Vec<&Message> {
        self.messages_of(MessageType::Information)
    }

    fn has_errors(&self) -> bool {
        self.messages()
            .iter()
            .any(|m| m.message_type == MessageType::Error)
    }

    fn has_warnings(&self) -> bool {
        self.messages()
            .iter()
            .any(|m| m.message_type == MessageType::Warning)
    }

    fn has_info_messages(&self) -> bool {
        self.messages()
            .iter()
            .any(|m| m.message_type == MessageType::Information)
    }

    fn is_paged(&self) -> bool {
        self.meta().is_paged
    }

    fn is_filtered(&self) -> bool {
        self.meta().is_filtered
    }
}

// ── UapiResponse ─────────────────────────────────────────────────────

/// A parsed UAPI envelope with `data` deserialized into `T`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UapiResponse<T = Value> {
    pub status: i64,
    pub data: T,
    pub messages: Vec<Message>,
    pub meta: MetaData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl<T: DeserializeOwned> UapiResponse<T> {
    /// Parse a response body.
    pub fn from_str(body: &str, options: ResponseOptions) -> Result<Self, Error> {
        let raw: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_owned(),
        })?;
        Self::from_value(raw, options)
    }

    /// Parse an already-decoded envelope.
    pub fn from_value(response: Value, options: ResponseOptions) -> Result<Self, Error> {
        if response.is_null() {
            return Err(Error::invalid_response(
                "The response was unexpectedly undefined or null",
            ));
        }
        let Value::Object(mut envelope) = response else {
            return Err(Error::invalid_response("The response must be a JSON object"));
        };

        let raw = options
            .keep_unprocessed_response
            .then(|| Value::Object(envelope.clone()));

        let status = envelope
            .get("status")
            .filter(|v| !v.is_null())
            .ok_or_else(|| {
                Error::invalid_response(
                    "The response should have a numeric status property indicating the API \
                     succeeded (>0) or failed (=0)",
                )
            })?;
        let status = parse_int(status).ok_or_else(|| {
            Error::invalid_response(format!("The response status {status} is not numeric"))
        })?;

        let mut messages = Vec::new();
        collect_messages(&envelope, "errors", MessageType::Error, &mut messages);
        collect_messages(&envelope, "warnings", MessageType::Warning, &mut messages);
        collect_messages(&envelope, "messages", MessageType::Information, &mut messages);

        let data = envelope.remove("data").ok_or_else(|| {
            Error::invalid_response(
                "Expected response to contain a data property, but it is missing",
            )
        })?;
        let data = serde_json::from_value(data.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: data.to_string(),
        })?;

        let meta = envelope
            .get("metadata")
            .filter(|v| truthy(v))
            .map(UapiMetaData::parse)
            .unwrap_or_default();

        Ok(Self {
            status,
            data,
            messages,
            meta,
            raw,
        })
    }
}

impl UapiResponse<Value> {
    /// Parse the envelope of a `Batch::strict` call.
    pub fn from_batch_value(response: Value, options: ResponseOptions) -> Result<Self, Error> {
        let mut parsed = Self::from_value(response, options)?;
        parsed.meta.batch = true;
        Ok(parsed)
    }

    /// Each element of a batch `data` array parsed as its own envelope.
    pub fn batch_items(&self, options: ResponseOptions) -> Result<Vec<Self>, Error> {
        if !self.meta.batch {
            return Err(Error::invalid_response("Not a batch response"));
        }
        match &self.data {
            Value::Array(items) => items
                .iter()
                .map(|item| Self::from_value(item.clone(), options))
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::invalid_response(format!(
                "Batch data must be an array, got {other}"
            ))),
        }
    }
}

impl<T> Response for UapiResponse<T> {
    fn status(&self) -> i64 {
        self.status
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn meta(&self) -> &MetaData {
        &self.meta
    }
}

fn collect_messages(
    envelope: &Map<String, Value>,
    key: &str,
    message_type: MessageType,
    out: &mut Vec<Message>,
) {
    let Some(Value::Array(items)) = envelope.get(key) else {
        return;
    };
    for item in items {
        let message = match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push(Message {
            message_type,
            message,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        x: i64,
    }

    #[test]
    fn successful_response() {
        let resp: UapiResponse<Payload> = UapiResponse::from_value(
            json!({ "status": "1", "data": { "x": 1 } }),
            ResponseOptions::default(),
        )
        .unwrap();
        assert!(resp.success());
        assert!(!resp.failed());
        assert_eq!(resp.data, Payload { x: 1 });
        assert!(resp.raw.is_none());
        assert!(!resp.is_paged());
    }

    #[test]
    fn failed_response_with_errors() {
        let resp: UapiResponse = UapiResponse::from_value(
            json!({ "status": "0", "data": null, "errors": ["bad"], "messages": null }),
            ResponseOptions::default(),
        )
        .unwrap();
        assert!(resp.failed());
        assert!(resp.has_errors());
        assert!(!resp.has_info_messages());
        let errors = resp.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "bad");
    }

    #[test]
    fn message_kinds_are_kept_apart() {
        let resp: UapiResponse = UapiResponse::from_value(
            json!({
                "status": 1,
                "data": [],
                "errors": null,
                "warnings": ["careful"],
                "messages": ["done", "really"]
            }),
            ResponseOptions::default(),
        )
        .unwrap();
        assert!(resp.has_warnings());
        assert_eq!(resp.warnings()[0].message, "careful");
        assert_eq!(resp.info_messages().len(), 2);
        assert!(!resp.has_errors());
    }

    #[test]
    fn null_and_malformed_envelopes() {
        let opts = ResponseOptions::default();
        assert!(matches!(
            UapiResponse::<Value>::from_value(Value::Null, opts),
            Err(Error::InvalidResponse { .. })
        ));
        assert!(matches!(
            UapiResponse::<Value>::from_value(json!({ "data": 1 }), opts),
            Err(Error::InvalidResponse { .. })
        ));
        assert!(matches!(
            UapiResponse::<Value>::from_value(json!({ "status": "yes", "data": 1 }), opts),
            Err(Error::InvalidResponse { .. })
        ));
        assert!(matches!(
            UapiResponse::<Value>::from_value(json!({ "status": 1 }), opts),
            Err(Error::InvalidResponse { .. })
        ));
        assert!(matches!(
            UapiResponse::<Value>::from_str("{not json", opts),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn data_type_mismatch_is_deserialization_error() {
        let err = UapiResponse::<Payload>::from_value(
            json!({ "status": 1, "data": { "x": "one" } }),
            ResponseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn status_uses_parse_int_rules() {
        let opts = ResponseOptions::default();
        let resp = UapiResponse::<Value>::from_value(json!({ "status": "2abc", "data": 1 }), opts)
            .unwrap();
        assert_eq!(resp.status, 2);
        let resp = UapiResponse::<Value>::from_value(json!({ "status": 1.9, "data": 1 }), opts)
            .unwrap();
        assert_eq!(resp.status, 1);
    }

    #[test]
    fn keeps_raw_when_asked() {
        let body = json!({ "status": 1, "data": { "x": 1 }, "extra": true });
        let resp = UapiResponse::<Payload>::from_value(
            body.clone(),
            ResponseOptions {
                keep_unprocessed_response: true,
            },
        )
        .unwrap();
        assert_eq!(resp.raw, Some(body));
    }

    #[test]
    fn metadata_parsing() {
        let meta = UapiMetaData::parse(&json!({
            "paginate": {
                "start_result": "21",
                "current_page": 3,
                "results_per_page": "10",
                "total_pages": "x",
                "total_results": 47
            },
            "filter": { "records_before_filter": "120" },
            "transformed": 1,
            "url": "/x"
        }));
        assert!(meta.is_paged);
        assert!(meta.is_filtered);
        assert_eq!(meta.record, 21);
        assert_eq!(meta.page, 3);
        assert_eq!(meta.page_size, 10);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.total_records, 47);
        assert_eq!(meta.records_before_filter, 120);
        assert!(!meta.batch);
        let keys: Vec<_> = meta.properties.keys().cloned().collect();
        assert_eq!(keys, ["transformed", "url"]);
    }

    #[test]
    fn missing_metadata_uses_defaults() {
        let resp = UapiResponse::<Value>::from_value(
            json!({ "status": 1, "data": 1, "metadata": {} }),
            ResponseOptions::default(),
        )
        .unwrap();
        assert_eq!(resp.meta, MetaData::default());
    }

    #[test]
    fn batch_items_parse_each_envelope() {
        let opts = ResponseOptions::default();
        let resp = UapiResponse::<Value>::from_batch_value(
            json!({
                "status": 1,
                "data": [
                    { "status": 1, "data": { "x": 1 }, "errors": null },
                    { "status": 0, "data": null, "errors": ["nope"] }
                ]
            }),
            opts,
        )
        .unwrap();
        assert!(resp.meta.batch);
        let items = resp.batch_items(opts).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].success());
        assert!(items[1].has_errors());

        let plain = UapiResponse::<Value>::from_value(json!({ "status": 1, "data": [] }), opts)
            .unwrap();
        assert!(plain.batch_items(opts).is_err());
    }

    #[test]
    fn parse_int_prefixes() {
        assert_eq!(parse_int(&json!(" -42px")), Some(-42));
        assert_eq!(parse_int(&json!("+7")), Some(7));
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!(true)), None);
        assert_eq!(parse_int(&json!("99999999999999999999")), Some(i64::MAX));
        assert_eq!(parse_int(&json!("-99999999999999999999")), Some(i64::MIN));
    }

    #[test]
    fn oversized_status_string_still_parses() {
        let resp = UapiResponse::<Value>::from_value(
            json!({ "status": "99999999999999999999", "data": null }),
            ResponseOptions::default(),
        )
        .unwrap();
        assert!(resp.success());
    }
}
