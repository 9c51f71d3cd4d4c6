use url::Url;
use vine_core::QueueId;

const DEFAULT_BASE: &str = "https://www.amazon.com";

/// URL layout of the Vine site for one marketplace (`amazon.com`, `amazon.co.uk`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: String,
}

impl SiteUrls {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base)?;
        if parsed.host_str().is_none() {
            return Err(url::ParseError::EmptyHost);
        }
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn host(&self) -> String {
        Url::parse(&self.base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Landing page used to probe whether a session is logged in.
    pub fn landing_url(&self) -> String {
        format!("{}/vine/", self.base)
    }

    pub fn queue_url(&self, queue: QueueId, page: u32) -> String {
        let first = format!("{}/vine/vine-items?queue={}", self.base, queue.query_value());
        if page <= 1 {
            first
        } else {
            format!("{first}&pn=&cn=&page={page}")
        }
    }

    pub fn search_url(&self, term: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        format!("{}/vine/vine-items?search={encoded}", self.base)
    }
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
        }
    }
}

/// True when a response landed on the sign-in flow instead of the requested page.
pub fn is_signin_url(url: &str) -> bool {
    url.contains("ap/signin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_urls_follow_vine_layout() {
        let site = SiteUrls::new("https://www.amazon.co.uk/").unwrap();
        assert_eq!(
            site.queue_url(QueueId::Recommended, 1),
            "https://www.amazon.co.uk/vine/vine-items?queue=potluck"
        );
        assert_eq!(
            site.queue_url(QueueId::Additional, 3),
            "https://www.amazon.co.uk/vine/vine-items?queue=encore&pn=&cn=&page=3"
        );
        assert_eq!(site.landing_url(), "https://www.amazon.co.uk/vine/");
        assert_eq!(site.host(), "www.amazon.co.uk");
    }

    #[test]
    fn search_terms_are_form_encoded() {
        let site = SiteUrls::default();
        assert_eq!(
            site.search_url("USB C Hub"),
            "https://www.amazon.com/vine/vine-items?search=USB+C+Hub"
        );
    }

    #[test]
    fn rejects_urls_without_host() {
        assert!(SiteUrls::new("not a url").is_err());
    }

    #[test]
    fn detects_signin_redirects() {
        assert!(is_signin_url("https://www.amazon.com/ap/signin?openid.return_to=x"));
        assert!(!is_signin_url("https://www.amazon.com/vine/vine-items"));
    }
}
