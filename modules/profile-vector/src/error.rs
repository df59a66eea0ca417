use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorError>;

/// C3's error surface. Per §4.3's best-effort rule, none of these are meant
/// to abort a run — callers (the orchestrator's `upsert` stage) log and
/// swallow every variant.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("embedding provider error: {0}")]
    Embedding(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
