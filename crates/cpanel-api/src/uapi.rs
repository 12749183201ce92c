// UAPI request generation
//
// Turns a `UapiRequest` into `/execute/<module>/<function>` plus the flat
// `api.*` parameter set cPanel's UAPI dispatcher understands.

use serde_json::Value;
use tracing::debug;

use crate::encoder::encode_uri_component;
use crate::error::Error;
use crate::headers::{HeaderInput, HeaderKind};
use crate::params::{PageSize, SortDirection};
use crate::request::{Request, RequestInfo, RequestInit, RequestParts};
use crate::rules::{ArgumentSerializationRules, EncodingRule};

/// UAPI booleans travel as `"1"` / `"0"`.
fn flag(value: bool) -> Value {
    Value::from(if value { "1" } else { "0" })
}

/// A single UAPI call, e.g. `Email::list_pops`.
#[derive(Debug, Clone, Default)]
pub struct UapiRequest {
    parts: RequestParts,
}

impl UapiRequest {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            parts: RequestParts::new(namespace, method),
        }
    }

    /// Build from a literal initializer, validating every entry.
    pub fn from_init(init: RequestInit) -> Result<Self, Error> {
        let mut request = Self::default();
        request.apply_init(init)?;
        Ok(request)
    }

    /// `/execute/<namespace>/<method>` with each segment percent-encoded.
    pub fn path(&self) -> String {
        [
            "",
            "execute",
            self.parts.namespace.as_str(),
            self.parts.method.as_str(),
        ]
        .into_iter()
        .map(encode_uri_component)
        .collect::<Vec<_>>()
        .join("/")
    }

    /// The flat parameter list in wire order: arguments, sorts, filters,
    /// pagination, configuration.
    pub fn params(&self) -> Vec<(String, Value)> {
        let mut params = Vec::new();
        self.push_arguments(&mut params);
        self.push_sorts(&mut params);
        self.push_filters(&mut params);
        self.push_pagination(&mut params);
        self.push_configuration(&mut params);
        params
    }

    fn push_arguments(&self, params: &mut Vec<(String, Value)>) {
        for argument in &self.parts.arguments {
            params.push((argument.name().to_owned(), argument.value().clone()));
        }
    }

    fn push_sorts(&self, params: &mut Vec<(String, Value)>) {
        if self.parts.sorts.is_empty() {
            return;
        }
        params.push(("api.sort".into(), flag(true)));
        for (index, sort) in self.parts.sorts.iter().enumerate() {
            params.push((format!("api.sort_column_{index}"), sort.column().into()));
            params.push((
                format!("api.sort_reverse_{index}"),
                flag(sort.direction() != SortDirection::Ascending),
            ));
            params.push((
                format!("api.sort_method_{index}"),
                sort.sort_type().wire_name().into(),
            ));
        }
    }

    fn push_filters(&self, params: &mut Vec<(String, Value)>) {
        for (index, filter) in self.parts.filters.iter().enumerate() {
            params.push((format!("api.filter_column_{index}"), filter.column().into()));
            params.push((
                format!("api.filter_type_{index}"),
                filter.operator().uapi_name().into(),
            ));
            params.push((format!("api.filter_term_{index}"), filter.value().clone()));
        }
    }

    fn push_pagination(&self, params: &mut Vec<(String, Value)>) {
        if !self.parts.use_pager {
            return;
        }
        let pager = &self.parts.pager;
        params.push(("api.paginate".into(), flag(true)));
        match (pager.start_record(), pager.page_size()) {
            (Some(start), PageSize::Size(size)) => {
                params.push(("api.paginate_start".into(), start.into()));
                params.push(("api.paginate_size".into(), size.into()));
            }
            _ => params.push(("api.paginate_start".into(), (-1).into())),
        }
    }

    fn push_configuration(&self, params: &mut Vec<(String, Value)>) {
        if self.parts.config.analytics {
            params.push(("api.analytics".into(), flag(true)));
        }
    }
}

impl Request for UapiRequest {
    fn parts(&self) -> &RequestParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }

    /// UAPI runs under cPanel credentials; a WHM API token is refused.
    fn add_header(&mut self, header: impl Into<HeaderInput>) -> Result<&mut Self, Error> {
        let header = header.into().into_header()?;
        if header.kind() == HeaderKind::WhmApiToken {
            return Err(Error::HeaderMismatch {
                message: "A WhmApiTokenHeader cannot be used on a UAPI request".into(),
            });
        }
        self.parts.headers.push(header);
        Ok(self)
    }

    fn generate_with(
        &self,
        rule: Option<EncodingRule>,
        rules: &ArgumentSerializationRules,
    ) -> Result<RequestInfo, Error> {
        if self.parts.namespace.is_empty() {
            return Err(Error::MissingNamespaceOrMethod {
                missing: "namespace",
            });
        }
        if self.parts.method.is_empty() {
            return Err(Error::MissingNamespaceOrMethod { missing: "method" });
        }

        let rule = rule.unwrap_or_default();
        let info = self
            .parts
            .assemble(self.path(), &self.params(), &rule, rules)?;
        debug!(verb = %rule.verb, url = %info.url, "generated UAPI request");
        Ok(info)
    }
}
