//! Remote listing provider for plain HTTP servers
//!
//! Lists a URL by fetching it with GET and reading the body either as a
//! newline-separated plain-text listing or as an auto-index HTML page.
//! HTML pages are not parsed. Every double-quoted string in the page is
//! taken as a candidate entry, which is enough for server-generated
//! `href="..."` indexes.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;

use crate::fs::Entry;
use crate::location::Location;
use super::{Enumerator, ListContext, ProviderError, ProviderResult};

/// Accept header sent with every listing request
pub const ACCEPT_LISTING: &str = "text/plain, text/html; q=0.9, */*; q=0.8";

/// Number of connection attempts per listing
pub const CONNECT_ATTEMPTS: u32 = 2;

/// Connect timeout per attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on a whole request, body included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const READ_CHUNK: usize = 16 * 1024;

/// How often a waiting fetch looks at the cancel flag
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// How a listing body is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    /// One entry per line
    PlainText,
    /// Auto-index page; entries are the quoted strings in the markup
    Html,
}

impl ListingFormat {
    /// Classify a Content-Type value by prefix, ignoring case and surrounding whitespace
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let value = content_type.trim().to_ascii_lowercase();
        if value.starts_with("text/plain") {
            Some(ListingFormat::PlainText)
        } else if value.starts_with("text/html") {
            Some(ListingFormat::Html)
        } else {
            None
        }
    }
}

/// Provider for HTTP directory listings
pub struct HttpProvider {
    client: Option<Client>,
    connect_attempts: u32,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpProvider {
    /// Create a provider with the standard retry budget
    pub fn new() -> Self {
        Self::with_limits(CONNECT_ATTEMPTS, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// Create a provider with a custom retry budget
    pub fn with_limits(
        connect_attempts: u32,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: None,
            connect_attempts: connect_attempts.max(1),
            connect_timeout,
            request_timeout,
        }
    }

    /// Build the HTTP client on first use
    fn client(&mut self) -> ProviderResult<&Client> {
        if self.client.is_none() {
            let client = Client::builder()
                .connect_timeout(self.connect_timeout)
                .timeout(self.request_timeout)
                .build()
                .map_err(|e| {
                    ProviderError::Transport(format!("Failed to create HTTP client: {}", e))
                })?;
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::Transport("HTTP client unavailable".to_string()))
    }

    /// Fetch and parse the listing at `url`.
    ///
    /// The blocking request runs on a helper thread so the cancel flag is
    /// seen while connecting or reading. A canceled fetch is abandoned; the
    /// helper notices at its next check or when the request times out.
    fn fetch(&mut self, url: &Url, ctx: &ListContext<'_>) -> ProviderResult<Vec<Entry>> {
        ctx.check_canceled()?;

        let job = FetchJob {
            client: self.client()?.clone(),
            url: url.clone(),
            user_agent: ctx.user_agent.to_string(),
            attempts: self.connect_attempts,
            abandoned: Arc::new(AtomicBool::new(false)),
        };
        let abandoned = Arc::clone(&job.abandoned);

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("PathBrowser-fetch".to_string())
            .spawn(move || {
                // The receiver is gone when the fetch was abandoned
                let _ = tx.send(job.run());
            })?;

        let (format, body) = loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(result) => break result?,
                Err(RecvTimeoutError::Timeout) => {
                    if ctx.is_canceled() {
                        tracing::debug!("abandoning fetch of {}", url);
                        abandoned.store(true, Ordering::Relaxed);
                        return Err(ProviderError::Canceled);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ProviderError::Transport(format!("GET {}: fetch thread exited", url)));
                }
            }
        };
        ctx.check_canceled()?;

        let entries = parse_listing(&body, format, url);
        if entries.is_empty() {
            return Err(ProviderError::EmptyResult(url.to_string()));
        }

        tracing::debug!("{} entries from {}", entries.len(), url);
        Ok(entries)
    }
}

/// One GET, owned by the helper thread that performs it
struct FetchJob {
    client: Client,
    url: Url,
    user_agent: String,
    attempts: u32,
    /// Raised when the caller stopped waiting for this job
    abandoned: Arc<AtomicBool>,
}

impl FetchJob {
    fn check_abandoned(&self) -> ProviderResult<()> {
        if self.abandoned.load(Ordering::Relaxed) {
            Err(ProviderError::Canceled)
        } else {
            Ok(())
        }
    }

    fn run(self) -> ProviderResult<(ListingFormat, String)> {
        let response = self.send()?;
        self.check_abandoned()?;

        if response.status() != StatusCode::OK {
            return Err(ProviderError::Protocol(format!(
                "GET {} returned {}",
                self.url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        let Some(format) = ListingFormat::from_content_type(&content_type) else {
            tracing::warn!("Unsupported Content-Type from {}: {:?}", self.url, content_type);
            return Err(ProviderError::Protocol(format!(
                "Unsupported Content-Type: {}",
                content_type
            )));
        };

        let body = self.read_body(response)?;
        Ok((format, body))
    }

    /// Send the listing GET, retrying connection failures
    fn send(&self) -> ProviderResult<Response> {
        for attempt in 1..=self.attempts {
            self.check_abandoned()?;

            let mut request = self
                .client
                .get(self.url.clone())
                .header(ACCEPT, ACCEPT_LISTING);
            if !self.user_agent.is_empty() {
                request = request.header(USER_AGENT, self.user_agent.as_str());
            }

            match request.send() {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < self.attempts => {
                    tracing::debug!("connect to {} failed (attempt {}): {}", self.url, attempt, e);
                }
                Err(e) => {
                    return Err(ProviderError::Transport(format!("GET {} failed: {}", self.url, e)));
                }
            }
        }

        Err(ProviderError::Transport(format!("GET {}: out of connection attempts", self.url)))
    }

    /// Read the whole body, stopping early once abandoned
    fn read_body(&self, mut response: Response) -> ProviderResult<String> {
        let mut body = Vec::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            self.check_abandoned()?;
            let n = response
                .read(&mut buf)
                .map_err(|e| ProviderError::Transport(format!("Failed to read response: {}", e)))?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl Enumerator for HttpProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn list_directory(
        &mut self,
        location: &Location,
        ctx: &ListContext<'_>,
    ) -> ProviderResult<Vec<Entry>> {
        let Location::Remote(raw) = location else {
            return Err(ProviderError::InvalidLocation(format!("'{}' is not a URL", location)));
        };

        let url = Url::parse(raw)
            .map_err(|e| ProviderError::InvalidLocation(format!("{}: {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::InvalidLocation(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        self.fetch(&url, ctx)
    }
}

/// Turn a listing body into entries resolved against `base`.
///
/// Empty items and the link back to `base` itself (raw or percent-encoded)
/// are dropped.
pub fn parse_listing(body: &str, format: ListingFormat, base: &Url) -> Vec<Entry> {
    let items: Vec<&str> = match format {
        ListingFormat::PlainText => body.split('\n').collect(),
        ListingFormat::Html => quoted_strings(body),
    };
    let resource = base.path();

    items
        .into_iter()
        .filter_map(|item| {
            let item = item.strip_suffix('\r').unwrap_or(item);
            if item.is_empty() || item == resource {
                return None;
            }
            match base.join(item) {
                // "/my games/" names the same resource as "/my%20games/"
                Ok(url) if item.starts_with('/') && url.path() == resource => None,
                Ok(url) => Some(Entry::remote(item, Location::Remote(url.to_string()))),
                Err(e) => {
                    tracing::debug!("skipping listing item {:?}: {}", item, e);
                    None
                }
            }
        })
        .collect()
}

/// Every complete double-quoted substring, in order of appearance
pub fn quoted_strings(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut parts = text.split('"');
    // Text before the first quote is never inside a pair
    parts.next();
    while let Some(inside) = parts.next() {
        // A closing quote always leaves another (possibly empty) part behind it
        if parts.next().is_none() {
            break;
        }
        found.push(inside);
    }
    found
}
