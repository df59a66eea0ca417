use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Error taxonomy for C1, matching §7: `ScraperUnavailable` / `ScraperTimeout`
/// / `ScraperMalformed`. Callers (the harvester) absorb every variant into a
/// skipped evidence item — none of these are meant to propagate past C4.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("scraper provider unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("scraper provider unreachable: {0}")]
    Network(String),

    #[error("scraper poll budget of {0:?} exceeded")]
    Timeout(std::time::Duration),

    #[error("scraper returned malformed data: {0}")]
    Malformed(String),

    #[error("scraper job failed: {0}")]
    JobFailed(String),
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        ScraperError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        ScraperError::Malformed(err.to_string())
    }
}
