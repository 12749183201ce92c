use thiserror::Error;

/// Top-level error type for the `cpanel-api` crate.
///
/// Covers request building, argument encoding, envelope parsing and the
/// HTTP transport. `cpanel-cli` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Request building ────────────────────────────────────────────
    /// Empty name or column on a value object, or an unparseable literal.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Non-positive page or page size, or a first record past `i64::MAX`.
    #[error("Pager out of range: {message}")]
    PagerRange { message: String },

    /// A header that belongs to a different API family (e.g. a WHM token on UAPI).
    #[error("Header mismatch: {message}")]
    HeaderMismatch { message: String },

    /// Malformed API token passed to a token header.
    #[error("Invalid API token: {message}")]
    InvalidApiToken { message: String },

    /// `generate()` called before the namespace or method was set.
    #[error("You must define a {missing} for the UAPI call before you generate a request")]
    MissingNamespaceOrMethod { missing: &'static str },

    /// Filter operator with no UAPI wire mapping.
    #[error("Unrecognized filter operator '{operator}' for UAPI")]
    UnsupportedFilterOperator { operator: String },

    /// An argument value the active encoder cannot represent.
    #[error("The value for '{name}' can not be serialized: {reason}")]
    NonSerializableValue { name: String, reason: String },

    // ── Response parsing ────────────────────────────────────────────
    /// Null input, or a required envelope field is missing.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Login or token rejected (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Non-success HTTP status that is not an auth failure.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns `true` if the server rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if the error happened before anything was sent.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::PagerRange { .. }
                | Self::HeaderMismatch { .. }
                | Self::InvalidApiToken { .. }
                | Self::MissingNamespaceOrMethod { .. }
                | Self::UnsupportedFilterOperator { .. }
                | Self::NonSerializableValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_namespace_message_names_the_field() {
        let err = Error::MissingNamespaceOrMethod {
            missing: "namespace",
        };
        assert_eq!(
            err.to_string(),
            "You must define a namespace for the UAPI call before you generate a request"
        );
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = Error::Http {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
        assert!(!err.is_request_error());
    }

    #[test]
    fn builder_errors_are_request_errors() {
        assert!(Error::invalid_argument("x").is_request_error());
        assert!(!Error::invalid_response("x").is_request_error());
    }
}
