//! DBLP publication search client.
//!
//! One request per keyword against the public search API:
//! - Endpoint: GET /search/publ/api?q=<query>&h=<max hits>&format=json
//! - Hits live under `result.hits.hit[*].info`
//! - DBLP does not publish abstracts, so every record starts without one

use crate::error::{HarvestError, Result};
use crate::http;
use crate::record::PaperRecord;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// DBLP API base URL
pub const DBLP_API_BASE: &str = "https://dblp.org";

/// DBLP search client
pub struct DblpClient {
    client: Client,
    base_url: String,
}

// === DBLP API Response Types ===

#[derive(Debug, Deserialize)]
struct DblpResponse {
    result: DblpResult,
}

#[derive(Debug, Deserialize)]
struct DblpResult {
    hits: DblpHits,
}

#[derive(Debug, Deserialize)]
struct DblpHits {
    // Omitted entirely when the query matched nothing.
    #[serde(default)]
    hit: Vec<DblpHit>,
}

#[derive(Debug, Deserialize)]
struct DblpHit {
    info: DblpInfo,
}

#[derive(Debug, Deserialize)]
struct DblpInfo {
    title: Option<String>,
    year: Option<String>,
    doi: Option<String>,
    ee: Option<OneOrMany<String>>,
    authors: Option<DblpAuthors>,
}

#[derive(Debug, Deserialize)]
struct DblpAuthors {
    author: Option<OneOrMany<DblpAuthor>>,
}

#[derive(Debug, Deserialize)]
struct DblpAuthor {
    #[serde(default)]
    text: String,
}

/// DBLP collapses single-element lists into a bare value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

impl DblpClient {
    /// Create a client against `base_url` (normally [`DBLP_API_BASE`]).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::default_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Search DBLP for `keyword`, returning at most `max_results` records.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-success status or undecodable body. Nothing
    /// is retried and no partial result is returned.
    pub async fn fetch(&self, keyword: &str, max_results: usize) -> Result<Vec<PaperRecord>> {
        let url = build_search_url(&self.base_url, keyword, max_results);
        debug!(url = %url, "Querying DBLP");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(HarvestError::api(status, "DBLP", &body));
        }

        let papers = parse_response(&body)?;
        info!(keyword = keyword, count = papers.len(), "DBLP search complete");
        Ok(papers)
    }
}

/// Build the search URL. Spaces in the keyword become `%20`.
fn build_search_url(base_url: &str, keyword: &str, max_results: usize) -> String {
    format!(
        "{}/search/publ/api?q={}&h={}&format=json",
        base_url,
        urlencoding::encode(keyword),
        max_results
    )
}

/// Parse a DBLP search response body into paper records
fn parse_response(json_str: &str) -> Result<Vec<PaperRecord>> {
    let response: DblpResponse = serde_json::from_str(json_str)
        .map_err(|e| HarvestError::Parse(format!("Failed to parse DBLP response: {}", e)))?;

    Ok(response
        .result
        .hits
        .hit
        .into_iter()
        .map(|hit| parse_info(hit.info))
        .collect())
}

fn parse_info(info: DblpInfo) -> PaperRecord {
    let authors = info
        .authors
        .and_then(|a| a.author)
        .map(|a| {
            a.into_vec()
                .into_iter()
                .map(|author| author.text)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let ee = info
        .ee
        .and_then(|ee| ee.into_vec().into_iter().next())
        .unwrap_or_default();

    PaperRecord {
        title: info.title.unwrap_or_default(),
        authors,
        year: info.year.unwrap_or_default(),
        doi: info.doi.unwrap_or_default(),
        ee,
        abstract_text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn two_hit_fixture() -> String {
        json!({
            "result": {
                "hits": {
                    "@total": "2",
                    "hit": [
                        {
                            "info": {
                                "authors": {"author": [
                                    {"@pid": "1", "text": "Ada Lovelace"},
                                    {"@pid": "2", "text": "Alan Turing"}
                                ]},
                                "title": "Learnable Item Tokenization.",
                                "year": "2024",
                                "doi": "10.1145/ABC.123",
                                "ee": "https://doi.org/10.1145/ABC.123"
                            }
                        },
                        {
                            "info": {
                                "title": "  Generative Retrieval Without DOI ",
                                "year": "2023"
                            }
                        }
                    ]
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_build_search_url() {
        let url = build_search_url(DBLP_API_BASE, "learnable item tokenization", 50);
        assert_eq!(
            url,
            "https://dblp.org/search/publ/api?q=learnable%20item%20tokenization&h=50&format=json"
        );
    }

    #[test]
    fn test_parse_defaults_missing_fields() -> Result<()> {
        let papers = parse_response(&two_hit_fixture())?;
        assert_eq!(papers.len(), 2);

        assert_eq!(papers[0].authors, "Ada Lovelace, Alan Turing");
        assert_eq!(papers[0].ee, "https://doi.org/10.1145/ABC.123");
        assert_eq!(papers[0].abstract_text, None);

        assert_eq!(papers[1].authors, "");
        assert_eq!(papers[1].doi, "");
        assert_eq!(papers[1].ee, "");
        assert_eq!(papers[1].abstract_text, None);
        Ok(())
    }

    #[test]
    fn test_parse_single_author_and_multiple_ee() -> Result<()> {
        let body = json!({
            "result": {"hits": {"hit": [{"info": {
                "title": "Solo",
                "authors": {"author": {"@pid": "9", "text": "Grace Hopper"}},
                "ee": ["https://a.example/1", "https://b.example/2"]
            }}]}}
        })
        .to_string();

        let papers = parse_response(&body)?;
        assert_eq!(papers[0].authors, "Grace Hopper");
        assert_eq!(papers[0].ee, "https://a.example/1");
        Ok(())
    }

    #[test]
    fn test_parse_empty_author_list() -> Result<()> {
        let body = json!({
            "result": {"hits": {"hit": [{"info": {"title": "X", "authors": {"author": []}}}]}}
        })
        .to_string();
        assert_eq!(parse_response(&body)?[0].authors, "");
        Ok(())
    }

    #[test]
    fn test_parse_no_hits() -> Result<()> {
        let body = json!({"result": {"hits": {"@total": "0", "@sent": "0"}}}).to_string();
        assert!(parse_response(&body)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_response("<html>busy</html>");
        assert!(matches!(err, Err(HarvestError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_two_hits_keys() -> Result<()> {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "foo".into()),
                Matcher::UrlEncoded("h".into(), "2".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(two_hit_fixture())
            .expect(1)
            .create_async()
            .await;

        let client = DblpClient::new(server.url())?;
        let papers = client.fetch("foo", 2).await?;

        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].dedup_key(), "10.1145/abc.123");
        assert_eq!(papers[1].dedup_key(), "generative retrieval without doi");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_fatal() -> Result<()> {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = DblpClient::new(server.url())?;
        assert!(matches!(
            client.fetch("foo", 5).await,
            Err(HarvestError::Parse(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_fatal() -> Result<()> {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let client = DblpClient::new(server.url())?;
        assert!(matches!(
            client.fetch("foo", 5).await,
            Err(HarvestError::Api { code: 500, .. })
        ));
        Ok(())
    }
}
