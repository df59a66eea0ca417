use thiserror::Error;

pub type Result<T> = std::result::Result<T, SynthesisError>;

/// C7's internal error surface. Never escapes
/// [`crate::Synthesizer::synthesize`] — any failure on the LLM path falls
/// through to the deterministic fallback (§4.7/§7), so a report is always
/// produced.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("LLM synthesis call failed: {0}")]
    Llm(#[from] anyhow::Error),

    #[error("LLM output did not match the report shape: {0}")]
    Malformed(String),
}
