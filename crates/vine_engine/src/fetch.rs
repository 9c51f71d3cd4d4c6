use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::StatusCode;
use vine_core::QueueId;

use crate::decode::decode_page;
use crate::site::{is_signin_url, SiteUrls};
use crate::{FailureKind, FetchError, Page};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(20),
            redirect_limit: 10,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// An authenticated HTTP session: a client carrying the account cookies.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Builds the HTTP client behind a [`Session`]. `cookie` is sent verbatim as
/// the `Cookie` header on every request.
pub fn build_client(settings: &FetchSettings, cookie: Option<&str>) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value(&settings.user_agent)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&settings.accept_language)?);
    if let Some(cookie) = cookie {
        let mut value = header_value(cookie)?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .default_headers(headers)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

fn header_value(raw: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(raw)
        .map_err(|err| FetchError::new(FailureKind::InvalidHeader, err.to_string()))
}

/// Transport for single queue pages.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        session: &Session,
        queue: QueueId,
        page: u32,
    ) -> Result<Page, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestPageSource {
    site: SiteUrls,
    settings: FetchSettings,
}

impl ReqwestPageSource {
    pub fn new(site: SiteUrls, settings: FetchSettings) -> Self {
        Self { site, settings }
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait::async_trait]
impl PageSource for ReqwestPageSource {
    async fn fetch_page(
        &self,
        session: &Session,
        queue: QueueId,
        page: u32,
    ) -> Result<Page, FetchError> {
        let url = self.site.queue_url(queue, page);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = session
            .client()
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let final_url = response.url().to_string();
        if is_signin_url(&final_url) {
            return Err(FetchError::new(
                FailureKind::SessionInvalid,
                format!("redirected to sign-in page when accessing {url}"),
            ));
        }

        let status = response.status();
        if is_session_refusal(status) {
            return Err(FetchError::new(
                FailureKind::SessionInvalid,
                format!("received HTTP {} for {url}", status.as_u16()),
            ));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let html = decode_page(&bytes, content_type.as_deref())?;
        Ok(Page {
            queue,
            number: page,
            final_url,
            html,
            body: bytes,
        })
    }
}

/// Vine answers expired sessions with these rather than a redirect.
fn is_session_refusal(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
