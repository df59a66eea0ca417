use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerifyError>;

/// C6's internal error surface. Never propagates out of
/// [`crate::Verifier::verify`] — a failed deterministic check is turned into
/// a rejected claim with a `verification_failed` reason (§4.6/§7), not an
/// `Err` the orchestrator has to handle.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("deterministic verification rule failed: {0}")]
    RuleFailed(String),
}
