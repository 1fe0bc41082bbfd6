use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use urlencoding::encode;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Result of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with the body as received.
    Page(String),
    /// Any non-success status: the search has no more pages to give.
    Exhausted { status: u16 },
    /// The request never produced a response (timeout, refused connection, ...).
    TransientError(String),
}

pub struct PageFetcher {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl PageFetcher {
    pub fn new(base_url: String, page_size: usize, timeout_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    /// `<base>/?term=<author>[author]&format=pubmed&size=<n>&page=<p>`, with
    /// spaces in the author written as `+` and commas left literal.
    pub fn search_url(&self, author: &str, page: u32) -> String {
        let term = encode(author).replace("%20", "+").replace("%2C", ",");
        format!(
            "{}/?term={}%5Bauthor%5D&format=pubmed&size={}&page={}",
            self.base_url, term, self.page_size, page
        )
    }

    pub async fn fetch_page(&self, author: &str, page: u32) -> FetchOutcome {
        let url = self.search_url(author, page);
        debug!("GET {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Request for page {} failed: {}", page, e);
                return FetchOutcome::TransientError(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("Page {} answered HTTP {}", page, status);
            return FetchOutcome::Exhausted {
                status: status.as_u16(),
            };
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Page(body),
            Err(e) => {
                warn!("Reading body of page {} failed: {}", page, e);
                FetchOutcome::TransientError(e.to_string())
            }
        }
    }
}
