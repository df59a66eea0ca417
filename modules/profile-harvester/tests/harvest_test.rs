use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use profile_harvester::{HarvestError, Harvester, WebSearchResult, WebSearcher};
use scraper_client::ScraperClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic stand-in for `TavilySearcher` — the real one hits a
/// hardcoded host, so tests exercise the `WebSearcher` seam directly.
struct FakeSearcher {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl WebSearcher for FakeSearcher {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<WebSearchResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![WebSearchResult {
            url: "https://www.linkedin.com/in/alice".to_string(),
            title: "Alice Example".to_string(),
            snippet: "Engineer".to_string(),
        }])
    }
}

fn fast_client(base_url: String) -> ScraperClient {
    ScraperClient::new(base_url, "token", "ds1").with_timings(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn direct_url_makes_exactly_one_trigger_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": {"name": "Alice", "current_company_name": "Acme"}
        })))
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let harvester = Harvester::new(fast_client(server.uri()), FakeSearcher { calls: calls.clone() });

    let evidence = harvester.harvest("https://www.linkedin.com/in/alice", 1).await.unwrap();

    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].source, "https://www.linkedin.com/in/alice");
    assert_eq!(calls.load(Ordering::SeqCst), 0, "direct-url harvest must never call the web searcher");
    server.verify().await;
}

#[tokio::test]
async fn search_happy_path_makes_four_calls_total() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-2"})))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": [
                {"name": "Alice", "url": "https://www.linkedin.com/in/alice"},
                {"name": "Alice B", "url": "https://www.linkedin.com/in/alice-b"}
            ]
        })))
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let harvester = Harvester::new(fast_client(server.uri()), FakeSearcher { calls: calls.clone() });

    let evidence = harvester.harvest("Alice Example", 5).await.unwrap();

    // 1 web search + 1 search_profiles + 2 profile scrapes = 4 evidence records.
    assert_eq!(evidence.len(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    server.verify().await;
}

#[tokio::test]
async fn budget_exhaustion_caps_additional_scrapes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-3"})))
        .expect(2)
        .mount(&server)
        .await;

    let many_urls: Vec<_> = (0..10)
        .map(|i| json!({"name": format!("Person {i}"), "url": format!("https://www.linkedin.com/in/person-{i}")}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": many_urls
        })))
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let harvester = Harvester::new(fast_client(server.uri()), FakeSearcher { calls });

    // budget=3: 1 web search + 1 search_profiles + 1 additional profile scrape = 3 total calls.
    let evidence = harvester.harvest("Alice Example", 3).await.unwrap();

    assert_eq!(evidence.len(), 3);
    server.verify().await;
}

#[tokio::test]
async fn single_token_search_is_input_invalid_with_no_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-4"})))
        .expect(0)
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let harvester = Harvester::new(fast_client(server.uri()), FakeSearcher { calls: calls.clone() });

    let err = harvester.harvest("Alice", 5).await.unwrap_err();
    assert!(matches!(err, HarvestError::InputInvalid(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    server.verify().await;
}

#[tokio::test]
async fn failed_profile_scrape_is_absorbed_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let harvester = Harvester::new(fast_client(server.uri()), FakeSearcher { calls });

    let evidence = harvester.harvest("https://www.linkedin.com/in/alice", 1).await.unwrap();
    assert!(evidence.is_empty());
}
