mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use anyhow::{anyhow, Result};

use client::OpenAiClient;

/// An OpenAI-compatible embedding client (C3 §4.3). The provider backing
/// this is configurable — the teacher points it at Voyage's
/// OpenAI-compatible surface; any `{data: [[...]]}`-shaped embedding API
/// works.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    embedding_model: String,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
            base_url: None,
        }
    }

    pub fn from_env(embedding_model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("EMBEDDING_API_KEY")
            .map_err(|_| anyhow!("EMBEDDING_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, embedding_model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client().embed(&self.embedding_model, text).await
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client().embed_batch(&self.embedding_model, texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "voyage-3-large");
        assert_eq!(ai.embedding_model, "voyage-3-large");
        assert_eq!(ai.api_key, "sk-test");
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "voyage-3-large").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }
}
