pub mod error;
pub mod types;

pub use error::{Result, ScraperError};
pub use types::{EducationEntry, ExperienceEntry, NameInput, ProfileRecord, ScraperRecord, UrlInput};

use std::time::Duration;
use types::TriggerResponse;

/// Wait before the first poll — the provider is known to need warm-up
/// (§4.1 step 3).
pub const INITIAL_DELAY: Duration = Duration::from_secs(15);
/// Interval between polls once warmed up (§4.1 step 4).
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Total time budget for one trigger+poll cycle before declaring a timeout
/// (§4.1 step 4).
pub const POLL_BUDGET: Duration = Duration::from_secs(15 * 60);

/// Trigger/snapshot/wait client for the profile scraping provider (C1, §4.1,
/// §6). Exposes no global mutex — callers (the harvester) are responsible
/// for bounding fan-out.
pub struct ScraperClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    dataset_id: String,
    initial_delay: Duration,
    poll_interval: Duration,
    poll_budget: Duration,
}

impl ScraperClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            dataset_id: dataset_id.into(),
            initial_delay: INITIAL_DELAY,
            poll_interval: POLL_INTERVAL,
            poll_budget: POLL_BUDGET,
        }
    }

    /// Override the poll timings — used by tests to compress the 15s/30s/15m
    /// schedule against a mock server.
    pub fn with_timings(mut self, initial_delay: Duration, poll_interval: Duration, poll_budget: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.poll_interval = poll_interval;
        self.poll_budget = poll_budget;
        self
    }

    /// `ScrapeProfile(url)` (§4.1).
    pub async fn scrape_profile(&self, url: &str) -> Result<ScraperRecord> {
        let body = serde_json::to_value(vec![UrlInput { url: url.to_string() }])?;
        let data = self.trigger_and_wait(body).await?;
        decode_record(data)
    }

    /// `ScrapeCompany(url)` (§4.1) — same wire shape as `ScrapeProfile`, a
    /// distinct operation at the contract level per §4.1's three-operation
    /// surface.
    pub async fn scrape_company(&self, url: &str) -> Result<ScraperRecord> {
        self.scrape_profile(url).await
    }

    /// `SearchProfiles(firstName, lastName)` (§4.1).
    pub async fn search_profiles(&self, first_name: &str, last_name: &str) -> Result<ScraperRecord> {
        let body = serde_json::to_value(vec![NameInput {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }])?;
        let data = self.trigger_and_wait(body).await?;
        decode_record(data)
    }

    async fn trigger_and_wait(&self, body: serde_json::Value) -> Result<serde_json::Value> {
        let snapshot_id = self.trigger(body).await?;
        self.poll(&snapshot_id).await
    }

    async fn trigger(&self, body: serde_json::Value) -> Result<String> {
        let url = format!(
            "{}/datasets/v3/trigger?dataset_id={}&include_errors=true",
            self.base_url, self.dataset_id
        );
        let resp = self.http.post(&url).bearer_auth(&self.token).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "scraper trigger failed");
            return Err(ScraperError::Unavailable {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TriggerResponse = resp.json().await?;
        if let Some(error) = parsed.error {
            return Err(ScraperError::Unavailable { status: status.as_u16(), message: error });
        }
        parsed
            .snapshot_id
            .ok_or_else(|| ScraperError::Malformed("trigger response missing snapshot_id".to_string()))
    }

    async fn poll(&self, snapshot_id: &str) -> Result<serde_json::Value> {
        tokio::time::sleep(self.initial_delay).await;

        let url = format!("{}/datasets/v3/snapshot/{}", self.base_url, snapshot_id);
        let deadline = tokio::time::Instant::now() + self.poll_budget;

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(ScraperError::Timeout(self.poll_budget));
            }

            let resp = match self.http.get(&url).bearer_auth(&self.token).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::warn!(%err, "scraper poll request failed, retrying");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            if !resp.status().is_success() {
                tracing::warn!(status = resp.status().as_u16(), "scraper poll returned non-2xx, retrying");
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let raw: serde_json::Value = match resp.json().await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(%err, "scraper poll body unparseable, retrying");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            match classify_poll_body(&raw) {
                PollOutcome::Completed(data) => return Ok(data),
                PollOutcome::Failed(message) => return Err(ScraperError::JobFailed(message)),
                PollOutcome::Pending => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

enum PollOutcome {
    Completed(serde_json::Value),
    Failed(String),
    Pending,
}

/// Classify one poll response body per §4.1 step 4 / §8 boundary behaviors:
/// - `{status: "completed", data}` → completed with `data`.
/// - `{status: "failed", error?}` → terminal failure.
/// - `{status: "running"|"pending", ...}` → still pending.
/// - no `status` field but a non-empty object/array body → treat as
///   completed, the body *is* the data.
/// - an empty object (`{}`) with no `status` → still pending (an empty body
///   is not data, it's "nothing yet").
/// - a bare empty array (`[]`) → completed with empty data.
fn classify_poll_body(raw: &serde_json::Value) -> PollOutcome {
    if let Some(obj) = raw.as_object() {
        if let Some(status) = obj.get("status").and_then(|v| v.as_str()) {
            return match status {
                "completed" => PollOutcome::Completed(obj.get("data").cloned().unwrap_or(serde_json::Value::Null)),
                "failed" => {
                    let message = obj
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("scraper reported failure")
                        .to_string();
                    PollOutcome::Failed(message)
                }
                _ => PollOutcome::Pending,
            };
        }
        if obj.is_empty() {
            return PollOutcome::Pending;
        }
        return PollOutcome::Completed(raw.clone());
    }

    if let Some(arr) = raw.as_array() {
        if arr.is_empty() {
            return PollOutcome::Completed(serde_json::Value::Array(vec![]));
        }
        return PollOutcome::Completed(raw.clone());
    }

    PollOutcome::Pending
}

/// Decode a completed poll's `data` into a `ScraperRecord`. Accepts a bare
/// object (single profile), a one-element array (single profile, wrapped),
/// or a multi-element array (search results) (§4.1 step 5).
fn decode_record(data: serde_json::Value) -> Result<ScraperRecord> {
    match data {
        serde_json::Value::Array(items) => {
            let records: Vec<ProfileRecord> = items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<_, _>>()?;
            if records.len() == 1 {
                Ok(ScraperRecord::Single(records.into_iter().next().unwrap()))
            } else {
                Ok(ScraperRecord::Many(records))
            }
        }
        serde_json::Value::Object(_) => {
            let record: ProfileRecord = serde_json::from_value(data)?;
            Ok(ScraperRecord::Single(record))
        }
        serde_json::Value::Null => Ok(ScraperRecord::Many(vec![])),
        other => Err(ScraperError::Malformed(format!("unexpected data shape: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_completed_with_data() {
        let body = json!({"status": "completed", "data": {"name": "Alice"}});
        assert!(matches!(classify_poll_body(&body), PollOutcome::Completed(_)));
    }

    #[test]
    fn classify_bare_array_treated_as_data() {
        let body = json!([{"name": "Alice"}]);
        match classify_poll_body(&body) {
            PollOutcome::Completed(v) => assert!(v.is_array()),
            _ => panic!("expected completed"),
        }
    }

    #[test]
    fn classify_empty_array_is_completed_empty() {
        let body = json!([]);
        match classify_poll_body(&body) {
            PollOutcome::Completed(v) => assert_eq!(v, json!([])),
            _ => panic!("expected completed"),
        }
    }

    #[test]
    fn classify_empty_object_is_pending() {
        let body = json!({});
        assert!(matches!(classify_poll_body(&body), PollOutcome::Pending));
    }

    #[test]
    fn classify_running_is_pending() {
        let body = json!({"status": "running"});
        assert!(matches!(classify_poll_body(&body), PollOutcome::Pending));
    }

    #[test]
    fn classify_failed_is_failed() {
        let body = json!({"status": "failed", "error": "provider exploded"});
        match classify_poll_body(&body) {
            PollOutcome::Failed(msg) => assert_eq!(msg, "provider exploded"),
            _ => panic!("expected failed"),
        }
    }

    #[test]
    fn decode_single_profile_object() {
        let data = json!({"name": "Alice", "current_company_name": "Acme"});
        match decode_record(data).unwrap() {
            ScraperRecord::Single(p) => assert_eq!(p.name.as_deref(), Some("Alice")),
            _ => panic!("expected single"),
        }
    }

    #[test]
    fn decode_wrapped_single_profile_array() {
        let data = json!([{"name": "Alice"}]);
        match decode_record(data).unwrap() {
            ScraperRecord::Single(p) => assert_eq!(p.name.as_deref(), Some("Alice")),
            _ => panic!("expected single"),
        }
    }

    #[test]
    fn decode_many_profiles() {
        let data = json!([{"name": "Alice"}, {"name": "Bob"}]);
        match decode_record(data).unwrap() {
            ScraperRecord::Many(records) => assert_eq!(records.len(), 2),
            _ => panic!("expected many"),
        }
    }
}
