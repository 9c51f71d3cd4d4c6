use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use engine_logging::{engine_debug, engine_info};

use crate::fetch::{build_client, map_reqwest_error, FetchSettings, Session};
use crate::site::{is_signin_url, SiteUrls};
use crate::FetchError;

/// Marker the Vine landing page only shows to logged-in members.
const LOGGED_IN_MARKER: &str = "Vine Help";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no cookies found for {domain}")]
    MissingCookies { domain: String },
    #[error("could not read cookie file {path:?}: {source}")]
    CookieFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("request failed: {0}")]
    Transport(#[from] FetchError),
    #[error("not logged in: {0}")]
    NotLoggedIn(String),
}

/// Where the account cookies come from. Read again on every authentication
/// attempt, so refreshing the file or variable is enough to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    /// A ready-made `Cookie` header value (`name=value; name2=value2`).
    Header(String),
    /// A Netscape `cookies.txt` export from a logged-in browser.
    NetscapeFile(PathBuf),
}

impl CookieSource {
    /// Returns the `Cookie` header value to send to `host`.
    pub fn load(&self, host: &str) -> Result<String, AuthError> {
        let header = match self {
            CookieSource::Header(raw) => raw.trim().to_string(),
            CookieSource::NetscapeFile(path) => {
                let text = fs::read_to_string(path).map_err(|source| AuthError::CookieFile {
                    path: path.clone(),
                    source,
                })?;
                cookie_header_from_netscape(&text, host, Utc::now().timestamp())
            }
        };
        if header.is_empty() {
            return Err(AuthError::MissingCookies {
                domain: host.to_string(),
            });
        }
        Ok(header)
    }
}

/// Collects unexpired cookies whose domain covers `host` from a Netscape
/// cookie jar into a single `Cookie` header value.
pub fn cookie_header_from_netscape(text: &str, host: &str, now_unix: i64) -> String {
    let mut pairs = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        // curl and browser exporters mark HttpOnly cookies with this prefix.
        let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [domain, _subdomains, _path, _secure, expires, name, value] = fields[..] else {
            continue;
        };
        if !domain_matches(domain, host) {
            continue;
        }
        let expires = expires.parse::<i64>().unwrap_or(0);
        if expires != 0 && expires < now_unix {
            continue;
        }
        pairs.push(format!("{name}={value}"));
    }
    pairs.join("; ")
}

fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Produces a fresh logged-in [`Session`].
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<Session, AuthError>;
}

/// Logs in by replaying browser cookies and probing the Vine landing page.
#[derive(Debug, Clone)]
pub struct CookieAuthenticator {
    site: SiteUrls,
    settings: FetchSettings,
    cookies: CookieSource,
}

impl CookieAuthenticator {
    pub fn new(site: SiteUrls, settings: FetchSettings, cookies: CookieSource) -> Self {
        Self {
            site,
            settings,
            cookies,
        }
    }
}

#[async_trait::async_trait]
impl Authenticator for CookieAuthenticator {
    async fn authenticate(&self) -> Result<Session, AuthError> {
        let cookie = self.cookies.load(&self.site.host())?;
        let client = build_client(&self.settings, Some(&cookie))?;

        engine_info!("Connecting to Amazon Vine...");
        let landing = self.site.landing_url();
        let response = client
            .get(&landing)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let final_url = response.url().to_string();
        if is_signin_url(&final_url) {
            return Err(AuthError::NotLoggedIn(
                "redirected to sign-in page on initial connection".to_string(),
            ));
        }
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::NotLoggedIn(format!(
                "landing page answered HTTP {}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        if !body.contains(LOGGED_IN_MARKER) {
            return Err(AuthError::NotLoggedIn(format!(
                "\"{LOGGED_IN_MARKER}\" not found on {landing}"
            )));
        }

        engine_debug!("Landing page probe succeeded at {}", final_url);
        engine_info!("Successfully logged in with browser cookies.");
        Ok(Session::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAR: &str = "# Netscape HTTP Cookie File\n\
.amazon.com\tTRUE\t/\tTRUE\t0\tsession-id\t123-456\n\
#HttpOnly_.amazon.com\tTRUE\t/\tTRUE\t4102444800\tat-main\tsecret\n\
.amazon.com\tTRUE\t/\tTRUE\t1000\tstale\told\n\
.amazon.co.uk\tTRUE\t/\tTRUE\t0\tuk-only\tx\n\
malformed line\n";

    #[test]
    fn netscape_jar_keeps_matching_live_cookies() {
        let header = cookie_header_from_netscape(JAR, "www.amazon.com", 2_000_000_000);
        assert_eq!(header, "session-id=123-456; at-main=secret");
    }

    #[test]
    fn domain_match_requires_label_boundary() {
        assert!(domain_matches(".amazon.com", "www.amazon.com"));
        assert!(domain_matches("amazon.com", "amazon.com"));
        assert!(!domain_matches(".amazon.com", "www.notamazon.com"));
    }

    #[test]
    fn blank_header_source_is_missing_cookies() {
        let err = CookieSource::Header("   ".into()).load("www.amazon.com").unwrap_err();
        assert!(matches!(err, AuthError::MissingCookies { .. }));
    }
}
