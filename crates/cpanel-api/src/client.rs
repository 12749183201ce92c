// Async HTTP client for cPanel UAPI.
//
// Base path: [/cpsessNNN]/execute/<module>/<function>
// Auth: `Authorization: cpanel user:token`, or a session security token with
// the session cookie kept in the transport's cookie jar.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::batch::BatchRequest;
use crate::error::Error;
use crate::headers::CpanelApiTokenHeader;
use crate::path::ApplicationPath;
use crate::request::{Request, RequestInfo};
use crate::response::{ResponseOptions, UapiResponse};
use crate::rules::{DEFAULT_RULES, EncodingRule, HttpVerb};
use crate::transport::TransportConfig;
use crate::uapi::UapiRequest;

/// How the client proves who it is.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// cPanel API token, sent as `Authorization: cpanel <user>:<token>`.
    ApiToken { user: String, token: SecretString },
    /// An existing browser-style session: `/cpsessNNN` in the path plus the
    /// `cpsession` cookie the server issued at login.
    Session {
        security_token: String,
        session_cookie: SecretString,
    },
}

const SESSION_COOKIE: &str = "cpsession";

impl Credentials {
    fn security_token(&self) -> Option<String> {
        match self {
            Self::Session { security_token, .. } if !security_token.is_empty() => {
                let token = security_token.trim_matches('/');
                Some(format!("/{token}"))
            }
            _ => None,
        }
    }

    /// Cookie jar holding the login cookie, for session credentials.
    fn session_jar(&self, server: &url::Url, shared: Option<&Arc<Jar>>) -> Option<Arc<Jar>> {
        let Self::Session { session_cookie, .. } = self else {
            return None;
        };
        let jar = shared.map_or_else(|| Arc::new(Jar::default()), Arc::clone);
        jar.add_cookie_str(
            &format!("{SESSION_COOKIE}={}; Path=/", session_cookie.expose_secret()),
            server,
        );
        Some(jar)
    }
}

/// Async client for cPanel UAPI.
pub struct UapiClient {
    http: reqwest::Client,
    base: ApplicationPath,
    response_options: ResponseOptions,
}

impl UapiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL such as `https://host:2083`.
    ///
    /// An API token is injected as a default `Authorization` header. A
    /// session security token overrides any `/cpsess` already in the URL,
    /// and its cookie is seeded into the transport's jar for this host.
    pub fn new(
        server: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Credentials::ApiToken { user, token } = credentials {
            let header = CpanelApiTokenHeader::new(token, Some(user))?.into_header();
            let mut value =
                HeaderValue::from_str(header.value()).map_err(|e| Error::InvalidApiToken {
                    message: format!("token is not a valid header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let url = url::Url::parse(server)?;
        let transport = match credentials.session_jar(&url, transport.session_cookies.as_ref()) {
            Some(jar) => transport.clone().with_session_cookies(jar),
            None => transport.clone(),
        };
        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(server, http, credentials.security_token())
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        server: &str,
        http: reqwest::Client,
        security_token: Option<String>,
    ) -> Result<Self, Error> {
        let mut base = ApplicationPath::parse(server)?;
        if let Some(token) = security_token {
            base.security_token = token;
        }
        Ok(Self {
            http,
            base,
            response_options: ResponseOptions::default(),
        })
    }

    pub fn with_response_options(mut self, options: ResponseOptions) -> Self {
        self.response_options = options;
        self
    }

    pub fn base(&self) -> &ApplicationPath {
        &self.base
    }

    /// Absolute URL for a generated request.
    pub fn url_for(&self, info: &RequestInfo) -> String {
        self.base.build_token_path(&info.url)
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// Generate, send and parse one UAPI call.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: &UapiRequest,
        rule: Option<EncodingRule>,
    ) -> Result<UapiResponse<T>, Error> {
        let verb = rule.as_ref().map(|r| r.verb).unwrap_or_default();
        let info = request.generate_with(rule, &DEFAULT_RULES)?;
        let body = self.send(verb, &info).await?;
        UapiResponse::from_str(&body, self.response_options)
    }

    /// Send a `Batch::strict` call. Use
    /// [`UapiResponse::batch_items`] to split the result.
    pub async fn call_batch(
        &self,
        batch: &BatchRequest,
        rule: Option<EncodingRule>,
    ) -> Result<UapiResponse<Value>, Error> {
        let verb = rule.as_ref().map(|r| r.verb).unwrap_or_default();
        let info = batch.generate(rule)?;
        let body = self.send(verb, &info).await?;
        let raw: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;
        UapiResponse::<Value>::from_batch_value(raw, self.response_options)
    }

    /// Send an already generated request and return the raw body.
    pub async fn send(&self, verb: HttpVerb, info: &RequestInfo) -> Result<String, Error> {
        let url = self.url_for(info);
        debug!("{verb} {url}");

        let mut builder = self.http.request(verb.to_method(), &url);
        for header in &info.headers {
            let name = HeaderName::from_bytes(header.name().as_bytes()).map_err(|e| {
                Error::invalid_argument(format!("invalid header name '{}': {e}", header.name()))
            })?;
            let mut value = HeaderValue::from_str(header.value()).map_err(|e| {
                Error::invalid_argument(format!(
                    "invalid value for header '{}': {e}",
                    header.name()
                ))
            })?;
            value.set_sensitive(header.kind().is_token());
            builder = builder.header(name, value);
        }
        if !info.body.is_empty() {
            builder = builder.body(info.body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("server rejected credentials (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), %url, "UAPI call failed");
            return Err(Error::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }
}
