use thiserror::Error;

/// The error taxonomy from the orchestrator's point of view (§7). Per-item
/// failures inside a stage are logged and absorbed there — they never reach
/// this enum. Only failures that change a run's trajectory do.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("scraper provider unavailable: {0}")]
    ScraperUnavailable(String),

    #[error("scraper poll budget exceeded")]
    ScraperTimeout,

    #[error("scraper returned malformed data: {0}")]
    ScraperMalformed(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("claim rejected: {0}")]
    ClaimRejected(String),

    #[error("canonical store write failed: {0}")]
    StoreWriteFailed(String),

    #[error("vector store write failed: {0}")]
    VectorWriteFailed(String),

    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
