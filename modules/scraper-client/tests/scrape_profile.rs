use scraper_client::{ScraperClient, ScraperRecord};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn scrape_profile_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-1"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": [{"name": "Alice", "current_company_name": "Acme", "followers": 5000}]
        })))
        .mount(&server)
        .await;

    let client = ScraperClient::new(server.uri(), "token", "ds1").with_timings(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_secs(5),
    );

    let record = client.scrape_profile("https://example.com/in/alice").await.unwrap();
    match record {
        ScraperRecord::Single(profile) => {
            assert_eq!(profile.name.as_deref(), Some("Alice"));
            assert_eq!(profile.followers, Some(5000));
        }
        ScraperRecord::Many(_) => panic!("expected a single profile"),
    }
}

#[tokio::test]
async fn scrape_profile_polls_until_completed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-2"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "data": {"name": "Bob"}
        })))
        .mount(&server)
        .await;

    let client = ScraperClient::new(server.uri(), "token", "ds1").with_timings(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_secs(5),
    );

    let record = client.scrape_profile("https://example.com/in/bob").await.unwrap();
    match record {
        ScraperRecord::Single(profile) => assert_eq!(profile.name.as_deref(), Some("Bob")),
        ScraperRecord::Many(_) => panic!("expected a single profile"),
    }
}

#[tokio::test]
async fn trigger_failure_surfaces_as_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let client = ScraperClient::new(server.uri(), "token", "ds1");
    let err = client.scrape_profile("https://example.com/in/carol").await.unwrap_err();
    assert!(matches!(err, scraper_client::ScraperError::Unavailable { status: 500, .. }));
}

#[tokio::test]
async fn poll_timeout_surfaces_as_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datasets/v3/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "snap-3"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/datasets/v3/snapshot/snap-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .mount(&server)
        .await;

    let client = ScraperClient::new(server.uri(), "token", "ds1").with_timings(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_millis(20),
    );

    let err = client.scrape_profile("https://example.com/in/dave").await.unwrap_err();
    assert!(matches!(err, scraper_client::ScraperError::Timeout(_)));
}
