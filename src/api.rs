use reqwest::{header, Url};

use crate::error::SearchError;
use crate::models::SearchResult;
use crate::query::SearchQuery;

pub const DEFAULT_API_BASE: &str = "https://wallhaven.cc/api/v1";

pub(crate) const USER_AGENT: &str = concat!("wallhaven-client/", env!("CARGO_PKG_VERSION"));

/// Client for the `/search` endpoint.
///
/// Holds the connection pool and the API base only. The API key is passed
/// to each call, so one client can serve several keys and holds no state
/// between calls. Cloning is cheap and clones share the pool.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base: Url,
}

impl SearchClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base: default_base(),
        }
    }

    /// Point the client at another API root, e.g. `http://127.0.0.1:8080/api/v1`.
    pub fn with_base(base: &str) -> Result<Self, SearchError> {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Result<Self, SearchError> {
        Ok(Self {
            http,
            base: parse_base(base)?,
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build the request URL for `query`. `apikey` is appended last and only
    /// when `api_key` is non-empty.
    pub fn search_url(&self, query: &SearchQuery, api_key: Option<&str>) -> Result<Url, SearchError> {
        if query.page == 0 {
            return Err(SearchError::InvalidPage(query.page));
        }

        let mut url = self
            .base
            .join("search")
            .map_err(|_| SearchError::InvalidBase(self.base.to_string()))?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());

        log::debug!("search url: {}", url);

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            url.query_pairs_mut().append_pair("apikey", key);
        }

        Ok(url)
    }

    /// Run one search. Exactly one GET is issued; nothing is retried.
    pub async fn search(
        &self,
        query: &SearchQuery,
        api_key: Option<&str>,
    ) -> Result<SearchResult, SearchError> {
        let url = self.search_url(query, api_key)?;

        let response = self
            .http
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        let result = decode_response(&body)?;

        log::info!(
            "search {:?}: page {}/{} with {} results ({} total)",
            query.query,
            result.meta.current_page,
            result.meta.last_page,
            result.data.len(),
            result.meta.total
        );

        Ok(result)
    }
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a response body as a whole. Empty bodies are `NoData`, anything
/// that does not match the response shape is `Decode`.
pub fn decode_response(body: &[u8]) -> Result<SearchResult, SearchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(SearchError::NoData);
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_base(base: &str) -> Result<Url, SearchError> {
    // `join` replaces the last segment unless the base ends with '/'.
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };

    let url = Url::parse(&normalized).map_err(|_| SearchError::InvalidBase(base.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::InvalidBase(base.to_string()));
    }
    Ok(url)
}

fn default_base() -> Url {
    match parse_base(DEFAULT_API_BASE) {
        Ok(url) => url,
        Err(_) => unreachable!("DEFAULT_API_BASE is a valid url"),
    }
}
