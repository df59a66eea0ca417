use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// C2's error surface. Every variant here is, per §7, on the authoritative
/// write path: the orchestrator propagates any of these as `StoreWriteFailed`
/// and aborts the run into `error`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("run not found: {0}")]
    RunNotFound(uuid::Uuid),

    #[error("run {0} already moved to error, refusing to resume it")]
    RunCancelled(uuid::Uuid),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
