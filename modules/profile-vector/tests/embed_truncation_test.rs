use std::sync::Arc;

use ai_client::OpenAi;
use profile_vector::{VectorStore, MAX_EMBED_CHARS};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn embed_truncates_before_calling_the_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(move |req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap();
            let input = body["input"].as_str().unwrap();
            assert!(input.chars().count() <= MAX_EMBED_CHARS);
            ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": vec![0.1_f32; 768]}]
            }))
        })
        .mount(&server)
        .await;

    let embedder = Arc::new(OpenAi::new("test-key", "voyage-3-large").with_base_url(server.uri()));
    let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/unused").unwrap();
    let store = VectorStore::new(pool, embedder);

    let long_text = "a".repeat(MAX_EMBED_CHARS * 2);
    let vector = store.embed(&long_text).await.unwrap();
    assert_eq!(vector.len(), 768);
}
