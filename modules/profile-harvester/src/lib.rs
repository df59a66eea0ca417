pub mod error;

use profile_common::{classify_input_kind, ContentKind, Evidence, InputKind};
use scraper_client::{ScraperClient, ScraperRecord};
use serde::Serialize;
use tracing::warn;

pub use error::{HarvestError, Result};

/// Cap on additional profile scrapes fanned out from a search's result list,
/// independent of whatever budget remains (§4.4 step iii).
pub const MAX_ADDITIONAL_PROFILE_SCRAPES: usize = 5;

/// One hit from the web-search collaborator, used only as context evidence
/// (§4.4 step i) — never itself a profile record.
#[derive(Debug, Clone, Serialize)]
pub struct WebSearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// The web-search collaborator. Kept as a separate trait from
/// [`scraper_client::ScraperClient`] because it isn't part of the scraper
/// provider's trigger/snapshot protocol (§4.1) — it's a single synchronous
/// search call against an unrelated provider, used only for context evidence.
#[async_trait::async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<WebSearchResult>>;
}

/// Tavily-backed [`WebSearcher`]. Grounded on the teacher's `TavilySearcher`:
/// same endpoint, same bearer-auth request shape, same response decoding.
pub struct TavilySearcher {
    api_key: String,
    client: reqwest::Client,
}

impl TavilySearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), client: reqwest::Client::new() }
    }
}

#[async_trait::async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<WebSearchResult>> {
        let body = serde_json::json!({
            "query": query,
            "max_results": 5,
            "search_depth": "advanced",
            "include_answer": false,
        });

        let resp = self
            .client
            .post("https://api.tavily.com/search")
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let data: serde_json::Value = resp.json().await?;

        let results = data["results"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|r| {
                        let url = r["url"].as_str()?.to_string();
                        let title = r["title"].as_str().unwrap_or("").to_string();
                        let snippet = r["content"].as_str().unwrap_or("").to_string();
                        Some(WebSearchResult { url, title, snippet })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }
}

/// C4, the budget-bounded harvester (§4.4). Calls out to the scraper
/// provider (C1) and a web-search collaborator; never touches C2/C3 itself —
/// the orchestrator persists whatever evidence comes back.
pub struct Harvester<S: WebSearcher> {
    scraper: ScraperClient,
    searcher: S,
}

impl<S: WebSearcher> Harvester<S> {
    pub fn new(scraper: ScraperClient, searcher: S) -> Self {
        Self { scraper, searcher }
    }

    /// `Harvest(subject, budget) -> [Evidence]` (§4.4). The effective input
    /// kind is re-derived from the subject string itself, not trusted from a
    /// caller's hint (§6), so this agrees with whatever `intake` persisted.
    pub async fn harvest(&self, subject: &str, budget: u32) -> Result<Vec<Evidence>> {
        let mut evidence = Vec::new();

        match classify_input_kind(subject) {
            InputKind::DirectUrl => {
                if budget == 0 {
                    return Ok(evidence);
                }
                self.scrape_profile_into(subject, subject, &mut evidence).await;
            }
            InputKind::SearchQuery => {
                let tokens: Vec<&str> = subject.split_whitespace().collect();
                if tokens.len() < 2 {
                    return Err(HarvestError::InputInvalid(subject.to_string()));
                }
                let first = tokens[0];
                let last = tokens[tokens.len() - 1];

                let mut remaining = budget;
                if remaining == 0 {
                    return Ok(evidence);
                }

                remaining -= 1;
                self.web_search_into(subject, &mut evidence).await;

                if remaining == 0 {
                    return Ok(evidence);
                }
                remaining -= 1;
                let urls = self.search_profiles_into(subject, first, last, &mut evidence).await;

                let additional = urls.len().min(MAX_ADDITIONAL_PROFILE_SCRAPES).min(remaining as usize);
                for url in urls.into_iter().take(additional) {
                    self.scrape_profile_into(&url, subject, &mut evidence).await;
                }
            }
        }

        Ok(evidence)
    }

    async fn scrape_profile_into(&self, url: &str, subject: &str, evidence: &mut Vec<Evidence>) {
        match self.scraper.scrape_profile(url).await {
            Ok(record) => match record_to_evidence(subject, url, record) {
                Ok(ev) => evidence.push(ev),
                Err(e) => warn!(url, error = %e, "failed to encode profile evidence, skipping"),
            },
            Err(e) => warn!(url, error = %e, "profile scrape failed, skipping"),
        }
    }

    async fn web_search_into(&self, subject: &str, evidence: &mut Vec<Evidence>) {
        match self.searcher.search(subject).await {
            Ok(results) => match serde_json::to_string(&results) {
                Ok(content) => evidence.push(Evidence::new(subject, "provider://search", content, ContentKind::Json)),
                Err(e) => warn!(subject, error = %e, "failed to encode web search results, skipping"),
            },
            Err(e) => warn!(subject, error = %e, "web search failed, skipping"),
        }
    }

    /// Returns the profile URLs surfaced by the search, for the caller to
    /// fan out over (§4.4 step iii).
    async fn search_profiles_into(&self, subject: &str, first: &str, last: &str, evidence: &mut Vec<Evidence>) -> Vec<String> {
        match self.scraper.search_profiles(first, last).await {
            Ok(record) => {
                let urls = record_urls(&record);
                match record_to_evidence(subject, "provider://search_profiles", record) {
                    Ok(ev) => evidence.push(ev),
                    Err(e) => warn!(subject, error = %e, "failed to encode search-profiles evidence, skipping"),
                }
                urls
            }
            Err(e) => {
                warn!(subject, error = %e, "profile search failed, skipping");
                Vec::new()
            }
        }
    }
}

fn record_urls(record: &ScraperRecord) -> Vec<String> {
    match record {
        ScraperRecord::Single(p) => p.url.clone().or_else(|| p.input_url.clone()).into_iter().collect(),
        ScraperRecord::Many(ps) => ps.iter().filter_map(|p| p.url.clone().or_else(|| p.input_url.clone())).collect(),
    }
}

/// Every successful provider call yields one Evidence record: content is the
/// full decoded JSON re-serialized as a string, kind is always `json` (§4.4).
fn record_to_evidence(subject: &str, source: &str, record: ScraperRecord) -> Result<Evidence> {
    let value = match record {
        ScraperRecord::Single(profile) => serde_json::to_value(profile)?,
        ScraperRecord::Many(profiles) => serde_json::to_value(profiles)?,
    };
    let content = serde_json::to_string(&value)?;
    Ok(Evidence::new(subject, source, content, ContentKind::Json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additional_scrape_count_is_capped_by_all_three_limits() {
        assert_eq!(10usize.min(MAX_ADDITIONAL_PROFILE_SCRAPES).min(3), 3);
        assert_eq!(2usize.min(MAX_ADDITIONAL_PROFILE_SCRAPES).min(10), 2);
        assert_eq!(10usize.min(MAX_ADDITIONAL_PROFILE_SCRAPES).min(10), 5);
    }
}
