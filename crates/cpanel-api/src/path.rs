// cPanel application paths
//
// Works out which cPanel service a URL belongs to and where its session
// token and theme live, so relative API and page paths can be joined the way
// the server expects:
//
//   https://host:2083/cpsess0123456789/frontend/jupiter/index.html
//   └── root ───────┘└── token ───────┘└── theme path ──┘

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::Error;

/// The cPanel service behind a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
    Whostmgr,
    Cpanel,
    Webmail,
    Unittest,
    Other,
}

impl Application {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whostmgr => "whostmgr",
            Self::Cpanel => "cpanel",
            Self::Webmail => "webmail",
            Self::Unittest => "unittest",
            Self::Other => "other",
        }
    }

    fn from_port(port: u16) -> Option<Self> {
        match port {
            80 | 443 => Some(Self::Other),
            2082 | 2083 => Some(Self::Cpanel),
            2086 | 2087 => Some(Self::Whostmgr),
            2095 | 2096 => Some(Self::Webmail),
            9876..=9879 => Some(Self::Unittest),
            _ => None,
        }
    }

    fn from_folder(folder: &str) -> Option<Self> {
        match folder {
            "frontend" => Some(Self::Cpanel),
            "webmail" => Some(Self::Webmail),
            _ => None,
        }
    }

    fn from_subdomain(host: &str) -> Option<Self> {
        if host.starts_with("whm.") {
            Some(Self::Whostmgr)
        } else if host.starts_with("cpanel.") {
            Some(Self::Cpanel)
        } else if host.starts_with("webmail.") {
            Some(Self::Webmail)
        } else {
            None
        }
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pages reachable without a session token.
const UNPROTECTED_PATHS: &[&str] = &["/resetpass", "/invitation"];

/// A parsed cPanel page or API URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationPath {
    /// Scheme with trailing colon, e.g. `https:`.
    pub protocol: String,
    pub domain: String,
    pub port: u16,
    pub path: String,
    pub application: Application,
    /// `/cpsessNNN`, or empty.
    pub security_token: String,
    /// `path` with the security token removed.
    pub application_path: String,
    pub theme: String,
    /// Prefix for theme-relative paths, always ending in `/`.
    pub theme_path: String,
    pub root_url: String,
}

impl ApplicationPath {
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::from_url(&Url::parse(input)?)
    }

    pub fn from_url(url: &Url) -> Result<Self, Error> {
        let protocol = format!("{}:", url.scheme());
        let domain = url
            .host_str()
            .ok_or_else(|| Error::invalid_argument(format!("URL has no host: {url}")))?
            .to_owned();
        let port = url.port_or_known_default().ok_or_else(|| {
            Error::invalid_argument(format!("cannot determine a port for {url}"))
        })?;
        let path = url.path().to_owned();

        let (security_token, rest) = split_security_token(&path);
        let mut folders = rest.trim_start_matches('/').split('/');
        let first_folder = folders.next().filter(|s| !s.is_empty());
        // Theme is the folder after `frontend/` or `webmail/`.
        let theme_folder = folders.next().unwrap_or_default().to_owned();

        let application = Application::from_subdomain(&domain)
            .or_else(|| Application::from_port(port))
            .or_else(|| first_folder.and_then(Application::from_folder))
            .unwrap_or(Application::Whostmgr);

        let application_path = if security_token.is_empty() {
            path.clone()
        } else {
            path.replacen(&security_token, "", 1)
        };

        let mut parsed = Self {
            root_url: format!("{protocol}//{domain}:{port}"),
            protocol,
            domain,
            port,
            path,
            application,
            security_token,
            application_path,
            theme: String::new(),
            theme_path: String::new(),
        };

        if !parsed.is_unprotected() && (parsed.is_cpanel() || parsed.is_webmail()) {
            parsed.theme = theme_folder;
        }

        parsed.theme_path = if parsed.is_unprotected() || parsed.is_other() {
            "/".to_owned()
        } else if parsed.is_cpanel() {
            format!("{}/frontend/{}/", parsed.security_token, parsed.theme)
        } else if parsed.is_webmail() {
            format!("{}/webmail/{}/", parsed.security_token, parsed.theme)
        } else {
            format!("{}/", parsed.security_token)
        };

        Ok(parsed)
    }

    pub fn is_cpanel(&self) -> bool {
        self.application == Application::Cpanel
    }

    pub fn is_whm(&self) -> bool {
        self.application == Application::Whostmgr
    }

    pub fn is_webmail(&self) -> bool {
        self.application == Application::Webmail
    }

    pub fn is_other(&self) -> bool {
        self.application == Application::Other
    }

    /// A page that does not need a session (password reset, invitations).
    pub fn is_unprotected(&self) -> bool {
        let trimmed = self
            .application_path
            .strip_suffix('/')
            .unwrap_or(&self.application_path);
        self.security_token.is_empty() && UNPROTECTED_PATHS.contains(&trimmed)
    }

    /// Theme-relative path, e.g. `/cpsess1/frontend/jupiter/` + `relative`.
    pub fn build_path(&self, relative: &str) -> String {
        format!("{}{relative}", self.theme_path)
    }

    /// [`build_path`](Self::build_path) with scheme, host and port.
    pub fn build_full_path(&self, relative: &str) -> String {
        format!("{}{}", self.root_url, self.build_path(relative))
    }

    /// Root plus security token plus `relative`. This is where
    /// `/execute/...` API paths go.
    pub fn build_token_path(&self, relative: &str) -> String {
        format!("{}{}{relative}", self.root_url, self.security_token)
    }
}

/// Split a leading `/cpsess<digits>` segment off `path`.
fn split_security_token(path: &str) -> (String, &str) {
    let Some(after) = path.strip_prefix("/cpsess") else {
        return (String::new(), path);
    };
    let digits = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    if digits == 0 {
        return (String::new(), path);
    }
    let token_len = "/cpsess".len() + digits;
    match (path.get(..token_len), path.get(token_len..)) {
        (Some(token), Some(rest)) if rest.is_empty() || rest.starts_with('/') => {
            (token.to_owned(), rest)
        }
        _ => (String::new(), path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cpanel_session_url() {
        let url = "https://example.com:2083/cpsess1234567890/frontend/jupiter/index.html";
        let path = ApplicationPath::parse(url).unwrap();
        assert_eq!(path.application, Application::Cpanel);
        assert_eq!(path.security_token, "/cpsess1234567890");
        assert_eq!(path.application_path, "/frontend/jupiter/index.html");
        assert_eq!(path.theme, "jupiter");
        assert_eq!(path.theme_path, "/cpsess1234567890/frontend/jupiter/");
        assert_eq!(path.root_url, "https://example.com:2083");
        assert_eq!(
            path.build_token_path("/execute/Email/list_pops"),
            "https://example.com:2083/cpsess1234567890/execute/Email/list_pops"
        );
        assert_eq!(
            path.build_full_path("email/index.html"),
            "https://example.com:2083/cpsess1234567890/frontend/jupiter/email/index.html"
        );
    }

    #[test]
    fn webmail_and_whm_by_port() {
        let path =
            ApplicationPath::parse("https://example.com:2096/cpsess1/webmail/jupiter/").unwrap();
        assert!(path.is_webmail());
        assert_eq!(path.build_path("x"), "/cpsess1/webmail/jupiter/x");

        let path =
            ApplicationPath::parse("https://example.com:2087/cpsess1/scripts/command").unwrap();
        assert!(path.is_whm());
        assert_eq!(path.theme, "");
        assert_eq!(path.theme_path, "/cpsess1/");
    }

    #[test]
    fn proxy_subdomains_win_over_port() {
        let path =
            ApplicationPath::parse("https://cpanel.example.com/cpsess9/frontend/jupiter/").unwrap();
        assert_eq!(path.port, 443);
        assert!(path.is_cpanel());

        let path = ApplicationPath::parse("http://whm.example.com/").unwrap();
        assert_eq!(path.port, 80);
        assert!(path.is_whm());
    }

    #[test]
    fn standard_ports_are_other() {
        let path = ApplicationPath::parse("https://example.com/frontend/jupiter/").unwrap();
        assert!(path.is_other());
        assert_eq!(path.theme_path, "/");
    }

    #[test]
    fn unknown_port_falls_back_to_folder_then_whm() {
        let path = ApplicationPath::parse("https://example.com:8443/webmail/jupiter/").unwrap();
        assert!(path.is_webmail());
        let path = ApplicationPath::parse("https://example.com:8443/somewhere").unwrap();
        assert!(path.is_whm());
    }

    #[test]
    fn unprotected_pages() {
        let path = ApplicationPath::parse("https://example.com:2083/resetpass/").unwrap();
        assert!(path.is_unprotected());
        assert_eq!(path.theme_path, "/");
        assert_eq!(path.theme, "");
    }

    #[test]
    fn token_must_be_a_whole_segment() {
        assert_eq!(split_security_token("/cpsess12/x"), ("/cpsess12".to_owned(), "/x"));
        assert_eq!(split_security_token("/cpsess12"), ("/cpsess12".to_owned(), ""));
        assert_eq!(split_security_token("/cpsessx"), (String::new(), "/cpsessx"));
        assert_eq!(split_security_token("/cpsess12abc"), (String::new(), "/cpsess12abc"));
    }
}
