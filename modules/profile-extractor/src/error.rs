use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// C5's error surface. Per §4.5/§7, none of these propagate past a single
/// evidence's extraction — the extractor catches them itself and yields an
/// empty claim list for that evidence, logging as it goes.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("LLM extraction call failed: {0}")]
    Llm(#[from] anyhow::Error),

    #[error("LLM output did not match the expected {{entities, claims}} shape: {0}")]
    Malformed(String),

    #[error("failed to persist extraction onto evidence {0}")]
    AttachFailed(uuid::Uuid),
}
