use std::env;

/// Process-wide configuration loaded from environment variables. This is a
/// thin loader, not a configuration system: the orchestrator binary needs to
/// construct its collaborators somehow, and this is how the teacher's
/// pipeline binaries do it.
#[derive(Debug, Clone)]
pub struct Config {
    // Scraper provider (C1)
    pub scraper_base_url: String,
    pub scraper_api_token: String,
    pub scraper_dataset_id: String,

    // LLM provider (C5/C6/C7)
    pub anthropic_api_key: String,

    // Embedding provider (C3)
    pub embedding_api_key: String,
    pub embedding_base_url: String,
    pub embedding_model: String,

    // Web search provider (C4)
    pub search_api_key: String,

    // Canonical + vector store (C2/C3), one Postgres database
    pub database_url: String,

    /// Default per-run budget when the caller does not supply one.
    pub default_budget: u32,
}

impl Config {
    /// Load configuration from environment variables. Panics with a clear
    /// message if a required var is missing — there is no sensible default
    /// for a credential.
    pub fn from_env() -> Self {
        Self {
            scraper_base_url: env::var("SCRAPER_BASE_URL")
                .unwrap_or_else(|_| "https://api.brightdata.com".to_string()),
            scraper_api_token: required_env("SCRAPER_API_TOKEN"),
            scraper_dataset_id: required_env("SCRAPER_DATASET_ID"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            embedding_api_key: env::var("EMBEDDING_API_KEY").unwrap_or_default(),
            embedding_base_url: env::var("EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| "https://api.voyageai.com/v1".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "voyage-3-large".to_string()),
            search_api_key: env::var("SEARCH_API_KEY").unwrap_or_default(),
            database_url: required_env("DATABASE_URL"),
            default_budget: env::var("DEFAULT_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    /// Log the presence (and length, never the value) of each sensitive var.
    pub fn log_redacted(&self) {
        let vars = [
            ("SCRAPER_API_TOKEN", &self.scraper_api_token),
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("EMBEDDING_API_KEY", &self.embedding_api_key),
            ("SEARCH_API_KEY", &self.search_api_key),
            ("DATABASE_URL", &self.database_url),
        ];
        for (name, value) in vars {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
