// Custom HTTP headers
//
// An ordered header list plus the API-token header constructors. Token
// headers remember their kind so a request family can refuse the wrong one
// (UAPI runs under cPanel session/token auth, never a WHM token).

use std::fmt;

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What produced a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Custom,
    WhmApiToken,
    CpanelApiToken,
}

impl HeaderKind {
    pub fn is_token(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// One `name: value` pair.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    name: String,
    value: String,
    #[serde(skip)]
    kind: HeaderKind,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_argument("A header must have a non-empty name"));
        }
        Ok(Self {
            name,
            value: value.into(),
            kind: HeaderKind::Custom,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.kind.is_token() {
            "[REDACTED]"
        } else {
            self.value.as_str()
        };
        f.debug_struct("Header")
            .field("name", &self.name)
            .field("value", &value)
            .field("kind", &self.kind)
            .finish()
    }
}

// ── Token headers ────────────────────────────────────────────────────

fn has_user_prefix(token: &str) -> bool {
    token.split_once(':').is_some_and(|(user, _)| !user.is_empty())
}

fn token_value(scheme: &str, token: &SecretString, user: Option<&str>) -> Result<String, Error> {
    let raw = token.expose_secret();
    if raw.is_empty() {
        return Err(Error::InvalidApiToken {
            message: "You must pass a valid token to the constructor.".into(),
        });
    }
    match user.filter(|u| !u.is_empty()) {
        Some(user) => Ok(format!("{scheme} {user}:{raw}")),
        None => {
            if !has_user_prefix(raw) {
                return Err(Error::InvalidApiToken {
                    message: format!(
                        "You must pass a {scheme} username associated with the API token."
                    ),
                });
            }
            if raw.split_once(':').is_none_or(|(_, t)| t.is_empty()) {
                return Err(Error::InvalidApiToken {
                    message: "You must pass a valid API token.".into(),
                });
            }
            Ok(format!("{scheme} {raw}"))
        }
    }
}

/// `Authorization: whm <user>:<token>` for WHM API calls.
///
/// The token may already carry the user as `user:token`.
pub struct WhmApiTokenHeader(Header);

impl WhmApiTokenHeader {
    pub fn new(token: &SecretString, user: Option<&str>) -> Result<Self, Error> {
        Ok(Self(Header {
            name: "Authorization".into(),
            value: token_value("whm", token, user)?,
            kind: HeaderKind::WhmApiToken,
        }))
    }

    pub fn into_header(self) -> Header {
        self.0
    }
}

/// `Authorization: cpanel <user>:<token>` for cPanel (UAPI) calls.
pub struct CpanelApiTokenHeader(Header);

impl CpanelApiTokenHeader {
    pub fn new(token: &SecretString, user: Option<&str>) -> Result<Self, Error> {
        Ok(Self(Header {
            name: "Authorization".into(),
            value: token_value("cpanel", token, user)?,
            kind: HeaderKind::CpanelApiToken,
        }))
    }

    pub fn into_header(self) -> Header {
        self.0
    }
}

// ── Header input ─────────────────────────────────────────────────────

/// Plain `{name, value}` literal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderLiteral {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub enum HeaderInput {
    Built(Header),
    Literal(HeaderLiteral),
}

impl HeaderInput {
    pub(crate) fn into_header(self) -> Result<Header, Error> {
        match self {
            Self::Built(header) => Ok(header),
            Self::Literal(HeaderLiteral { name, value }) => Header::new(name, value),
        }
    }
}

impl From<Header> for HeaderInput {
    fn from(header: Header) -> Self {
        Self::Built(header)
    }
}

impl From<HeaderLiteral> for HeaderInput {
    fn from(literal: HeaderLiteral) -> Self {
        Self::Literal(literal)
    }
}

impl From<WhmApiTokenHeader> for HeaderInput {
    fn from(header: WhmApiTokenHeader) -> Self {
        Self::Built(header.into_header())
    }
}

impl From<CpanelApiTokenHeader> for HeaderInput {
    fn from(header: CpanelApiTokenHeader) -> Self {
        Self::Built(header.into_header())
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for HeaderInput {
    fn from((name, value): (N, V)) -> Self {
        Self::Literal(HeaderLiteral {
            name: name.into(),
            value: value.into(),
        })
    }
}

// ── Headers ──────────────────────────────────────────────────────────

/// Ordered header collection. Duplicates are kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: Header) {
        self.0.push(header);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy out as `(name, value)` pairs.
    pub fn to_vec(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect()
    }

    /// Collapse into a map. The last header with a given name wins.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::with_capacity(self.0.len());
        for header in &self.0 {
            map.insert(header.name.clone(), header.value.clone());
        }
        map
    }

    /// First header with `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.0.iter().find(|h| h.name.eq_ignore_ascii_case(name))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn to_map_keeps_last_value() {
        let headers: Headers = [
            Header::new("X-One", "a").unwrap(),
            Header::new("X-Two", "b").unwrap(),
            Header::new("X-One", "c").unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 3);
        let map = headers.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["X-One"], "c");
        assert_eq!(
            headers.to_vec()[2],
            ("X-One".to_owned(), "c".to_owned())
        );
    }

    #[test]
    fn whm_token_with_user() {
        let header = WhmApiTokenHeader::new(&secret("ABC123"), Some("root"))
            .unwrap()
            .into_header();
        assert_eq!(header.name(), "Authorization");
        assert_eq!(header.value(), "whm root:ABC123");
        assert_eq!(header.kind(), HeaderKind::WhmApiToken);
    }

    #[test]
    fn whm_token_with_embedded_user() {
        let header = WhmApiTokenHeader::new(&secret("root:ABC123"), None)
            .unwrap()
            .into_header();
        assert_eq!(header.value(), "whm root:ABC123");
    }

    #[test]
    fn token_validation() {
        assert!(matches!(
            WhmApiTokenHeader::new(&secret(""), Some("root")),
            Err(Error::InvalidApiToken { .. })
        ));
        assert!(matches!(
            WhmApiTokenHeader::new(&secret("ABC123"), None),
            Err(Error::InvalidApiToken { .. })
        ));
        assert!(matches!(
            CpanelApiTokenHeader::new(&secret("bob:"), None),
            Err(Error::InvalidApiToken { .. })
        ));
    }

    #[test]
    fn token_headers_redact_debug_output() {
        let header = CpanelApiTokenHeader::new(&secret("s3cret"), Some("bob"))
            .unwrap()
            .into_header();
        let debug = format!("{header:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("REDACTED"));
    }
}
