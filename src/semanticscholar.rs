//! Semantic Scholar API Client
//!
//! Looks up a single abstract for a paper, either by DOI or by title search.
//!
//! API Details:
//! - DOI endpoint: GET /graph/v1/paper/DOI:<doi>?fields=title,abstract
//! - Search endpoint: GET /graph/v1/paper/search?query=<title>&limit=1&fields=title,abstract
//! - Rate limit: ~1 req/s (unauthenticated), higher with API key
//!
//! A missing abstract is `Ok(None)`. A lookup that could not be completed is an
//! error, so the caller never stores a blank abstract for it.

use crate::error::{HarvestError, Result};
use crate::http;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Semantic Scholar API base URL
pub const SS_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

#[derive(Debug, Deserialize)]
struct SSPaper {
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SSSearchResponse {
    #[serde(default)]
    data: Vec<SSPaper>,
}

/// Semantic Scholar abstract lookup client
pub struct SemanticScholarClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarClient {
    /// Create a client against `base_url` (normally [`SS_API_BASE`]).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http::default_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Fetch an abstract by DOI, or by title when no DOI is given.
    ///
    /// Returns `Ok(None)` without a request when neither is given, and for any
    /// status other than 200, a missing field, or an empty search. Does not
    /// fall back from DOI to title; callers decide that.
    ///
    /// # Errors
    ///
    /// Transport failures and 200 responses whose body is not the expected
    /// JSON. These are not "no abstract" and must not be recorded as such.
    pub async fn fetch_abstract(
        &self,
        doi: Option<&str>,
        title: Option<&str>,
    ) -> Result<Option<String>> {
        let doi = doi.filter(|d| !d.is_empty());
        let title = title.filter(|t| !t.is_empty());

        let result = match (doi, title) {
            (Some(doi), _) => self.lookup_by_doi(doi).await,
            (None, Some(title)) => self.search_by_title(title).await,
            (None, None) => return Ok(None),
        };

        if let Err(e) = &result {
            warn!(doi = ?doi, title = ?title, error = %e, "Abstract lookup failed");
        }
        result
    }

    async fn lookup_by_doi(&self, doi: &str) -> Result<Option<String>> {
        let url = format!("{}/paper/DOI:{}?fields=title,abstract", self.base_url, doi);

        let Some(body) = self.get_ok(&url).await? else {
            return Ok(None);
        };
        let paper: SSPaper = parse_body(&body)?;
        Ok(paper.abstract_text)
    }

    async fn search_by_title(&self, title: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/paper/search?query={}&limit=1&fields=title,abstract",
            self.base_url,
            urlencoding::encode(title)
        );

        let Some(body) = self.get_ok(&url).await? else {
            return Ok(None);
        };
        let search: SSSearchResponse = parse_body(&body)?;
        Ok(search.data.into_iter().next().and_then(|p| p.abstract_text))
    }

    /// GET `url` and return the body, or `None` for any status other than 200.
    async fn get_ok(&self, url: &str) -> Result<Option<String>> {
        debug!(url = %url, "Querying Semantic Scholar");

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "No abstract (non-OK status)");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        HarvestError::Parse(format!("Failed to parse Semantic Scholar response: {}", e))
    })
}
