// Batch::strict
//
// Several UAPI calls in one round trip. Each call is packed into a JSON
// triple `[module, function, {params}]` and sent as the `command` argument
// of `Batch::strict`; the backend stops at the first failure.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::headers::HeaderInput;
use crate::request::{Request, RequestConfig, RequestInfo};
use crate::rules::{ArgumentSerializationRules, EncodingRule};
use crate::uapi::UapiRequest;

pub const BATCH_MODULE: &str = "Batch";
pub const BATCH_FUNCTION: &str = "strict";

/// Expand array values into `name`, `name-1`, `name-2`, ... the way cPanel
/// reads repeated arguments.
pub fn expand_arrays(params: Vec<(String, Value)>) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(params.len());
    for (name, value) in params {
        match value {
            Value::Array(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    let key = if index == 0 {
                        name.clone()
                    } else {
                        format!("{name}-{index}")
                    };
                    out.push((key, item));
                }
            }
            other => out.push((name, other)),
        }
    }
    out
}

/// An ordered list of UAPI calls executed through `Batch::strict`.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    calls: Vec<UapiRequest>,
    headers: Vec<HeaderInput>,
    config: RequestConfig,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: UapiRequest) -> &mut Self {
        self.calls.push(call);
        self
    }

    pub fn calls(&self) -> &[UapiRequest] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Header applied to the outer `Batch::strict` request.
    pub fn add_header(&mut self, header: impl Into<HeaderInput>) -> &mut Self {
        self.headers.push(header.into());
        self
    }

    pub fn set_config(&mut self, config: RequestConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// The `[module, function, {params}]` triple for one call.
    ///
    /// The triple has no room for headers, so a call carrying any is
    /// refused; put them on the batch with [`Self::add_header`].
    pub fn command(call: &UapiRequest) -> Result<String, Error> {
        if call.namespace().is_empty() {
            return Err(Error::MissingNamespaceOrMethod {
                missing: "namespace",
            });
        }
        if call.method().is_empty() {
            return Err(Error::MissingNamespaceOrMethod { missing: "method" });
        }
        if !call.parts().headers.is_empty() {
            return Err(Error::HeaderMismatch {
                message: format!(
                    "{}::{} has its own headers, which a batch command cannot carry; \
                     add them to the batch instead",
                    call.namespace(),
                    call.method()
                ),
            });
        }
        let args: Map<String, Value> = expand_arrays(call.params()).into_iter().collect();
        let triple = Value::Array(vec![
            Value::from(call.namespace()),
            Value::from(call.method()),
            Value::Object(args),
        ]);
        serde_json::to_string(&triple).map_err(|e| Error::NonSerializableValue {
            name: format!("{}::{}", call.namespace(), call.method()),
            reason: e.to_string(),
        })
    }

    /// Build the outer `Batch::strict` request.
    pub fn to_request(&self) -> Result<UapiRequest, Error> {
        if self.calls.is_empty() {
            return Err(Error::invalid_argument(
                "A batch needs at least one command",
            ));
        }
        let commands = self
            .calls
            .iter()
            .map(|call| Self::command(call).map(Value::from))
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = UapiRequest::new(BATCH_MODULE, BATCH_FUNCTION);
        request.set_config(self.config);
        for (name, value) in expand_arrays(vec![("command".to_owned(), Value::Array(commands))]) {
            request.add_argument((name, value))?;
        }
        for header in &self.headers {
            request.add_header(header.clone())?;
        }
        Ok(request)
    }

    pub fn generate(&self, rule: Option<EncodingRule>) -> Result<RequestInfo, Error> {
        self.to_request()?.generate(rule)
    }

    pub fn generate_with(
        &self,
        rule: Option<EncodingRule>,
        rules: &ArgumentSerializationRules,
    ) -> Result<RequestInfo, Error> {
        self.to_request()?.generate_with(rule, rules)
    }
}

impl FromIterator<UapiRequest> for BatchRequest {
    fn from_iter<I: IntoIterator<Item = UapiRequest>>(iter: I) -> Self {
        Self {
            calls: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::params::Pager;

    #[test]
    fn arrays_expand_with_suffixes() {
        let params = vec![
            ("a".to_owned(), json!(["x", "y", "z"])),
            ("b".to_owned(), json!(1)),
        ];
        assert_eq!(
            expand_arrays(params),
            vec![
                ("a".to_owned(), json!("x")),
                ("a-1".to_owned(), json!("y")),
                ("a-2".to_owned(), json!("z")),
                ("b".to_owned(), json!(1)),
            ]
        );
    }

    #[test]
    fn command_triples_carry_api_params() {
        let mut call = UapiRequest::new("Email", "list_pops");
        call.add_argument(("domain", json!(["a.com", "b.com"])))
            .unwrap()
            .paginate(Pager::new(1, 5).unwrap())
            .unwrap();
        let command: Value = serde_json::from_str(&BatchRequest::command(&call).unwrap()).unwrap();
        assert_eq!(
            command,
            json!(["Email", "list_pops", {
                "domain": "a.com",
                "domain-1": "b.com",
                "api.paginate": "1",
                "api.paginate_start": 1,
                "api.paginate_size": 5
            }])
        );
    }

    #[test]
    fn batch_generates_strict_call() {
        let batch: BatchRequest = [
            UapiRequest::new("Email", "list_pops"),
            UapiRequest::new("Mysql", "list_databases"),
        ]
        .into_iter()
        .collect();
        let request = batch.to_request().unwrap();
        let params = request.params();
        let names: Vec<_> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["command", "command-1"]);
        assert_eq!(params[0].1, json!(r#"["Email","list_pops",{}]"#));

        let info = batch.generate(None).unwrap();
        assert_eq!(info.url, "/execute/Batch/strict");
        assert!(info.body.starts_with("command=%5B%22Email%22"));
    }

    #[test]
    fn empty_batch_and_incomplete_calls_fail() {
        assert!(matches!(
            BatchRequest::new().to_request(),
            Err(Error::InvalidArgument { .. })
        ));
        let batch: BatchRequest = [UapiRequest::new("Email", "")].into_iter().collect();
        assert!(matches!(
            batch.to_request(),
            Err(Error::MissingNamespaceOrMethod { missing: "method" })
        ));
    }

    #[test]
    fn per_call_headers_are_refused() {
        let mut call = UapiRequest::new("Email", "list_pops");
        call.add_header(("X-Trace", "1")).unwrap();
        let batch: BatchRequest = [call].into_iter().collect();
        assert!(matches!(
            batch.to_request(),
            Err(Error::HeaderMismatch { ref message }) if message.contains("Email::list_pops")
        ));

        let mut batch = BatchRequest::new();
        batch.push(UapiRequest::new("Email", "list_pops"));
        batch.add_header(("X-Trace", "1"));
        let request = batch.to_request().unwrap();
        assert_eq!(request.parts().headers.len(), 1);
    }
}
