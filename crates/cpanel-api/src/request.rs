// Request building blocks shared by every API family
//
// `RequestParts` is the mutable state (namespace, method and the parameter
// collections). The `Request` trait layers the fluent `add_*` API on top and
// leaves `generate_with` to the concrete family, which decides how the
// collections become wire parameters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::encoder::{ArgumentEncoder, JsonArgumentEncoder, WwwFormUrlArgumentEncoder};
use crate::error::Error;
use crate::headers::{Header, HeaderInput, HeaderLiteral, Headers};
use crate::params::{
    Argument, ArgumentInput, ArgumentLiteral, Filter, FilterInput, FilterLiteral, Pager,
    PagerInput, PagerLiteral, Sort, SortInput, SortLiteral,
};
use crate::rules::{ArgumentSerializationRules, DEFAULT_RULES, EncodingRule};

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Ask the backend to record analytics for this call.
    pub analytics: bool,
    /// Encode arguments as a JSON body instead of a form.
    pub json: bool,
}

/// Literal initializer, e.g. loaded from a batch file.
///
/// Every collection is normalized through the same `add_*` path a caller
/// would use, so validation errors surface from `from_init`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestInit {
    #[serde(alias = "module")]
    pub namespace: String,
    #[serde(alias = "func", alias = "function")]
    pub method: String,
    pub arguments: Vec<ArgumentLiteral>,
    pub sorts: Vec<SortLiteral>,
    pub filters: Vec<FilterLiteral>,
    pub columns: Vec<String>,
    pub pager: Option<PagerLiteral>,
    pub config: Option<RequestConfig>,
    pub headers: Vec<HeaderLiteral>,
}

/// Transport-ready output of `generate()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    /// Path plus query, relative to the application root.
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

/// State shared by every request family.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub namespace: String,
    pub method: String,
    pub arguments: Vec<Argument>,
    pub sorts: Vec<Sort>,
    pub filters: Vec<Filter>,
    /// Recorded but not sent; UAPI has no column selection parameter.
    pub columns: Vec<String>,
    pub pager: Pager,
    pub use_pager: bool,
    pub headers: Headers,
    pub config: RequestConfig,
}

impl RequestParts {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    /// Encoder for this call: the rule's override, else JSON or form by config.
    pub fn resolve_encoder(&self, rule: &EncodingRule) -> Arc<dyn ArgumentEncoder> {
        match &rule.encoder {
            Some(encoder) => Arc::clone(encoder),
            None if self.config.json => Arc::new(JsonArgumentEncoder),
            None => Arc::new(WwwFormUrlArgumentEncoder),
        }
    }

    /// Frame already-built parameters into a [`RequestInfo`].
    ///
    /// `path` must already be percent-encoded. Placement comes from `rules`;
    /// URL placement adds `?query` only when there is something to send.
    pub fn assemble(
        &self,
        path: String,
        params: &[(String, Value)],
        rule: &EncodingRule,
        rules: &ArgumentSerializationRules,
    ) -> Result<RequestInfo, Error> {
        let encoder = self.resolve_encoder(rule);
        let placement = rules.rule_for(rule.verb);
        let encoded = encoder.encode_all(params)?;
        trace!(
            params = params.len(),
            verb = %rule.verb,
            in_body = placement.data_in_body,
            "encoded request parameters"
        );

        let mut headers = Headers::new();
        headers.push(Header::new("Content-Type", encoder.content_type())?);
        for header in &self.headers {
            headers.push(header.clone());
        }

        let mut url = path;
        let mut body = String::new();
        if placement.data_in_body {
            body = encoded;
        } else if !encoded.is_empty() {
            url.push('?');
            url.push_str(&encoded);
        }

        Ok(RequestInfo { url, headers, body })
    }
}

/// A buildable API call.
///
/// Implementors expose their [`RequestParts`] and provide `generate_with`;
/// the fluent builders come for free and may be overridden to restrict what
/// a family accepts.
pub trait Request {
    fn parts(&self) -> &RequestParts;

    fn parts_mut(&mut self) -> &mut RequestParts;

    /// Compile into `{url, headers, body}` using a custom placement table.
    fn generate_with(
        &self,
        rule: Option<EncodingRule>,
        rules: &ArgumentSerializationRules,
    ) -> Result<RequestInfo, Error>;

    /// Compile into `{url, headers, body}`. With no rule, POST is used.
    fn generate(&self, rule: Option<EncodingRule>) -> Result<RequestInfo, Error> {
        self.generate_with(rule, &DEFAULT_RULES)
    }

    fn namespace(&self) -> &str {
        &self.parts().namespace
    }

    fn method(&self) -> &str {
        &self.parts().method
    }

    fn config(&self) -> RequestConfig {
        self.parts().config
    }

    fn set_config(&mut self, config: RequestConfig) -> &mut Self
    where
        Self: Sized,
    {
        self.parts_mut().config = config;
        self
    }

    fn add_argument(&mut self, argument: impl Into<ArgumentInput>) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let argument = argument.into().into_argument()?;
        self.parts_mut().arguments.push(argument);
        Ok(self)
    }

    fn add_sort(&mut self, sort: impl Into<SortInput>) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let sort = sort.into().into_sort()?;
        self.parts_mut().sorts.push(sort);
        Ok(self)
    }

    fn add_filter(&mut self, filter: impl Into<FilterInput>) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let filter = filter.into().into_filter()?;
        self.parts_mut().filters.push(filter);
        Ok(self)
    }

    fn add_column(&mut self, column: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.parts_mut().columns.push(column.into());
        self
    }

    fn add_header(&mut self, header: impl Into<HeaderInput>) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let header = header.into().into_header()?;
        self.parts_mut().headers.push(header);
        Ok(self)
    }

    /// Replace the page window and turn pagination on.
    fn paginate(&mut self, pager: impl Into<PagerInput>) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let pager = pager.into().into_pager()?;
        let parts = self.parts_mut();
        parts.pager = pager;
        parts.use_pager = true;
        Ok(self)
    }

    fn use_pager(&self) -> bool {
        self.parts().use_pager
    }

    /// Apply a literal initializer in the order arguments, sorts, filters,
    /// columns, pager, config, headers.
    fn apply_init(&mut self, init: RequestInit) -> Result<&mut Self, Error>
    where
        Self: Sized,
    {
        let RequestInit {
            namespace,
            method,
            arguments,
            sorts,
            filters,
            columns,
            pager,
            config,
            headers,
        } = init;

        {
            let parts = self.parts_mut();
            parts.method = method;
            if !namespace.is_empty() {
                parts.namespace = namespace;
            }
        }
        for argument in arguments {
            self.add_argument(argument)?;
        }
        for sort in sorts {
            self.add_sort(sort)?;
        }
        for filter in filters {
            self.add_filter(filter)?;
        }
        for column in columns {
            self.add_column(column);
        }
        if let Some(pager) = pager {
            self.paginate(pager)?;
        }
        self.parts_mut().config = config.unwrap_or_default();
        for header in headers {
            self.add_header(header)?;
        }
        Ok(self)
    }
}
