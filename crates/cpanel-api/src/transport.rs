// reqwest client construction
//
// cPanel services usually run on self-signed certificates, so trust is an
// explicit choice. Session logins also need a cookie store: the server
// answers a `/cpsess` URL only alongside the matching `cpsession` cookie.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;

use crate::error::Error;

const USER_AGENT: &str = concat!("cpapi/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which server certificates to trust.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Platform roots only.
    #[default]
    System,
    /// Platform roots plus the PEM bundle at this path.
    CaFile(PathBuf),
    /// Skip verification entirely.
    AcceptInvalid,
}

impl TlsMode {
    fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder, Error> {
        Ok(match self {
            Self::System => builder,
            Self::CaFile(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA bundle {}: {e}", path.display()))
                })?;
                let certs = reqwest::Certificate::from_pem_bundle(&pem)
                    .map_err(|e| Error::Tls(format!("bad CA bundle {}: {e}", path.display())))?;
                certs
                    .into_iter()
                    .fold(builder, ClientBuilder::add_root_certificate)
            }
            Self::AcceptInvalid => builder.danger_accept_invalid_certs(true),
        })
    }
}

/// Knobs applied once when the HTTP client is built.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Shared cookie store. Session credentials get a fresh one when unset.
    pub session_cookies: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(TlsMode::default(), DEFAULT_TIMEOUT)
    }
}

impl TransportConfig {
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self {
            tls,
            timeout,
            session_cookies: None,
        }
    }

    pub fn with_session_cookies(mut self, jar: Arc<Jar>) -> Self {
        self.session_cookies = Some(jar);
        self
    }

    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Client that sends `headers` with every request.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .default_headers(headers);
        let builder = self.tls.configure(builder)?;
        let builder = match &self.session_cookies {
            Some(jar) => builder.cookie_provider(Arc::clone(jar)),
            None => builder,
        };
        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_ca_bundle_is_a_tls_error() {
        let config = TransportConfig::new(
            TlsMode::CaFile(PathBuf::from("/nonexistent/ca.pem")),
            DEFAULT_TIMEOUT,
        );
        assert!(matches!(config.build_client(), Err(Error::Tls(_))));
    }

    #[test]
    fn cookies_only_when_attached() {
        let config = TransportConfig::default();
        assert!(config.session_cookies.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        let config = config.with_session_cookies(Arc::new(Jar::default()));
        assert!(config.session_cookies.is_some());
    }
}
