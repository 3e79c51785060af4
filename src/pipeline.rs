//! Harvest orchestration.
//!
//! For each keyword: search the index, keep papers not seen before, enrich
//! only those with abstracts, accumulate. Then merge, save, and optionally
//! publish. Every remote call is awaited one at a time and followed by a fixed
//! pause.

use crate::config::HarvestConfig;
use crate::dblp::DblpClient;
use crate::dedup::merge_deduplicate;
use crate::error::{HarvestError, Result};
use crate::record::PaperRecord;
use crate::semanticscholar::SemanticScholarClient;
use crate::sheets::{PublishSummary, SheetsPublisher};
use crate::store;
use futures::future::BoxFuture;
use std::collections::HashSet;
use tracing::{debug, info};

/// Source of bibliographic records for a keyword
pub trait IndexSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        keyword: &'a str,
        max_results: usize,
    ) -> BoxFuture<'a, Result<Vec<PaperRecord>>>;
}

/// Abstract lookup. `Ok(None)` means no abstract is known; `Err` means the
/// lookup itself failed.
pub trait AbstractSource: Send + Sync {
    fn fetch_abstract<'a>(
        &'a self,
        doi: Option<&'a str>,
        title: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<String>>>;
}

impl IndexSource for DblpClient {
    fn fetch<'a>(
        &'a self,
        keyword: &'a str,
        max_results: usize,
    ) -> BoxFuture<'a, Result<Vec<PaperRecord>>> {
        Box::pin(DblpClient::fetch(self, keyword, max_results))
    }
}

impl AbstractSource for SemanticScholarClient {
    fn fetch_abstract<'a>(
        &'a self,
        doi: Option<&'a str>,
        title: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(SemanticScholarClient::fetch_abstract(self, doi, title))
    }
}

/// Per-keyword counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordStats {
    pub keyword: String,
    pub fetched: usize,
    pub new: usize,
}

/// Outcome of a harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Records loaded from the store at start
    pub existing: usize,
    pub keywords: Vec<KeywordStats>,
    /// Records written after the final merge
    pub total: usize,
    pub published: Option<PublishSummary>,
}

/// Runs one harvest over the configured keywords
pub struct Harvester<'a> {
    config: &'a HarvestConfig,
    index: &'a dyn IndexSource,
    abstracts: &'a dyn AbstractSource,
    publisher: Option<&'a SheetsPublisher>,
}

impl<'a> Harvester<'a> {
    pub fn new(
        config: &'a HarvestConfig,
        index: &'a dyn IndexSource,
        abstracts: &'a dyn AbstractSource,
    ) -> Self {
        Self {
            config,
            index,
            abstracts,
            publisher: None,
        }
    }

    /// Publisher used when `publish_to_sheet` is enabled
    pub fn with_publisher(mut self, publisher: &'a SheetsPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Execute the full pipeline and persist the result.
    ///
    /// # Errors
    ///
    /// Index and abstract lookup failures abort the run before anything is
    /// written, as does enabling `publish_to_sheet` without a publisher.
    pub async fn run(&self) -> Result<HarvestSummary> {
        if self.config.publish_to_sheet && self.publisher.is_none() {
            return Err(HarvestError::Config(
                "publish_to_sheet enabled but no publisher configured".to_string(),
            ));
        }

        let existing = store::load_existing(&self.config.output_file)?;
        let mut known: HashSet<String> = existing.iter().map(PaperRecord::dedup_key).collect();
        let existing_count = existing.len();

        info!(
            existing = existing_count,
            keywords = self.config.keywords.len(),
            "Starting harvest"
        );

        let mut all_papers = existing;
        let mut keyword_stats = Vec::with_capacity(self.config.keywords.len());

        for keyword in &self.config.keywords {
            info!(keyword = %keyword, "Searching keyword");

            let papers = self
                .index
                .fetch(keyword, self.config.max_results_per_keyword)
                .await?;
            tokio::time::sleep(self.config.index_delay()).await;

            let fetched = papers.len();
            let mut new_papers: Vec<PaperRecord> = papers
                .into_iter()
                .filter(|p| !known.contains(&p.dedup_key()))
                .collect();

            for paper in &mut new_papers {
                // A duplicate within the same result page was already enriched.
                if !known.insert(paper.dedup_key()) {
                    debug!(title = %paper.title, "Skipping in-page duplicate");
                    continue;
                }
                paper.abstract_text = self.enrich(paper).await?;
                tokio::time::sleep(self.config.abstract_delay()).await;
            }

            info!(
                keyword = %keyword,
                fetched = fetched,
                new = new_papers.len(),
                "Keyword complete"
            );
            keyword_stats.push(KeywordStats {
                keyword: keyword.clone(),
                fetched,
                new: new_papers.len(),
            });
            all_papers.extend(new_papers);
        }

        let all_papers = merge_deduplicate(all_papers);
        store::save_all(&all_papers, &self.config.output_file)?;

        let published = match self.publisher.filter(|_| self.config.publish_to_sheet) {
            Some(publisher) => Some(publisher.publish(&all_papers, &self.config.sheet_name).await?),
            None => None,
        };

        info!(total = all_papers.len(), "Harvest complete");

        Ok(HarvestSummary {
            existing: existing_count,
            keywords: keyword_stats,
            total: all_papers.len(),
            published,
        })
    }

    /// DOI lookup first, then title search when that produced nothing.
    async fn enrich(&self, paper: &PaperRecord) -> Result<Option<String>> {
        let mut found = None;
        if !paper.doi.is_empty() {
            found = self.abstracts.fetch_abstract(Some(paper.doi.as_str()), None).await?;
        }
        if found.as_deref().map_or(true, str::is_empty) {
            found = self.abstracts.fetch_abstract(None, Some(paper.title.as_str())).await?;
        }
        Ok(found)
    }
}
