use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// C4's error surface. Per §7, this is the only variant that propagates past
/// the harvester — every provider-call failure (scraper or web search) is
/// absorbed per-call and simply shortens the returned evidence list.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("search subject must contain at least two tokens (first and last name), got: {0:?}")]
    InputInvalid(String),

    #[error("failed to encode evidence content: {0}")]
    Serde(#[from] serde_json::Error),
}
