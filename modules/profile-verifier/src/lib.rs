pub mod error;

use ai_client::Claude;
use profile_common::safety::{detect_pii, redact_email, redact_generic, redact_phone, SensitiveCategory};
use profile_common::{Claim, ConsentFlags};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use error::{Result, VerifyError};

/// Predicates treated as sensitive regardless of what `detect_pii` finds in
/// the object text — §4.6/§8 name `has_email`/`has_phone` explicitly as the
/// predicates that must never be stored unredacted without consent.
const SENSITIVE_PREDICATES: &[(&str, SensitiveCategory)] = &[("has_email", SensitiveCategory::Email), ("has_phone", SensitiveCategory::Phone)];

/// Free-text markers in a predicate or object that mark a claim sensitive
/// even when no structured PII pattern matches (§4.6: "personal/private/
/// confidential").
const SENSITIVE_KEYWORDS: &[&str] = &["personal", "private", "confidential"];

/// The outcome of verifying one claim (§4.6 contract). `claim` carries the
/// final object (redacted if applicable) and the full policy tag set,
/// whether or not it was approved — callers only persist it when `approved`.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub claim: Claim,
    pub approved: bool,
    pub reason: Option<String>,
}

/// What the optional LLM overlay may return. Per §4.6 it is advisory and can
/// only tighten a decision: `reject` can flip an approval to a rejection,
/// `additional_tags` are merged in, but nothing here can undo a deterministic
/// rejection or remove a tag already attached.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsistencyReview {
    pub reject: bool,
    pub reason: Option<String>,
    #[serde(default)]
    pub additional_tags: Vec<String>,
}

/// C6, the verifier (§4.6). Deterministic pre-checks always run; the LLM
/// overlay is consulted only when a `Claude` client is configured and only
/// ever tightens what the deterministic pass already decided.
pub struct Verifier {
    llm: Option<Claude>,
}

impl Verifier {
    pub fn new() -> Self {
        Self { llm: None }
    }

    /// Enable the optional LLM consistency overlay (§4.6).
    pub fn with_llm_overlay(mut self, claude: Claude) -> Self {
        self.llm = Some(claude);
        self
    }

    /// `Verify(claim, consentFlags, existingClaims) -> {approved, redacted?,
    /// tags, reason}` (§4.6).
    pub async fn verify(&self, claim: Claim, consent: &ConsentFlags, existing_claims: &[Claim]) -> VerifyOutcome {
        let mut outcome = match deterministic_verify(claim, consent) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "deterministic verification rule failed, rejecting claim");
                return VerifyOutcome {
                    claim: err_claim_placeholder(),
                    approved: false,
                    reason: Some("verification_failed".to_string()),
                };
            }
        };

        if let Some(claude) = &self.llm {
            if let Some(review) = consult_llm_overlay(claude, &outcome.claim, existing_claims).await {
                apply_overlay(&mut outcome, review);
            }
        }

        outcome
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

/// The deterministic pre-checks of §4.6, run before any LLM overlay.
fn deterministic_verify(mut claim: Claim, consent: &ConsentFlags) -> Result<VerifyOutcome> {
    let category = sensitive_category(&claim);
    let verified_tag = verified_tag_for_confidence(claim.confidence);
    let source_tag = source_tag_for(&claim.provenance.source);

    let outcome = match category {
        Some(category) => {
            let consented = consent_for(category, consent);
            if !consented {
                claim.policy_tags.push(category.policy_tag().to_string());
                let reason = format!("{} claim withheld: consent not granted", category_label(category));
                VerifyOutcome { claim, approved: false, reason: Some(reason) }
            } else {
                claim.object = redact_object(category, &claim.object);
                claim.policy_tags.push(category.policy_tag().to_string());
                claim.policy_tags.push(consent_tag_for(category));
                claim.policy_tags.push(verified_tag.to_string());
                claim.policy_tags.push(source_tag.to_string());
                VerifyOutcome { claim, approved: true, reason: None }
            }
        }
        None => {
            claim.policy_tags.push(verified_tag.to_string());
            claim.policy_tags.push(source_tag.to_string());
            claim.policy_tags.push("consent:public_data".to_string());
            VerifyOutcome { claim, approved: true, reason: None }
        }
    };

    Ok(dedup_tags(outcome))
}

fn dedup_tags(mut outcome: VerifyOutcome) -> VerifyOutcome {
    let mut seen = std::collections::HashSet::new();
    outcome.claim.policy_tags.retain(|t| seen.insert(t.clone()));
    outcome
}

/// Classify a claim's sensitivity from its predicate first, then its object
/// text (§4.6).
fn sensitive_category(claim: &Claim) -> Option<SensitiveCategory> {
    for (predicate, category) in SENSITIVE_PREDICATES {
        if claim.predicate == *predicate {
            return Some(*category);
        }
    }

    if SENSITIVE_KEYWORDS.iter().any(|kw| claim.predicate.to_lowercase().contains(kw) || claim.object.to_lowercase().contains(kw)) {
        return Some(SensitiveCategory::Address);
    }

    detect_pii(&claim.object).into_iter().next()
}

/// Which consent flag gates a category. SSN/address have no dedicated flag
/// in the consent model (§9's data-driven design only names `profile` and
/// `email`, with `phone` added for symmetry) — they are never approved.
fn consent_for(category: SensitiveCategory, consent: &ConsentFlags) -> bool {
    match category {
        SensitiveCategory::Email => consent.email,
        SensitiveCategory::Phone => consent.phone,
        SensitiveCategory::Ssn | SensitiveCategory::Address => false,
    }
}

fn consent_tag_for(category: SensitiveCategory) -> String {
    match category {
        SensitiveCategory::Email => "consent:email_shared".to_string(),
        SensitiveCategory::Phone => "consent:phone_shared".to_string(),
        SensitiveCategory::Ssn | SensitiveCategory::Address => "consent:public_data".to_string(),
    }
}

fn category_label(category: SensitiveCategory) -> &'static str {
    match category {
        SensitiveCategory::Email => "email",
        SensitiveCategory::Phone => "phone",
        SensitiveCategory::Ssn => "SSN",
        SensitiveCategory::Address => "address",
    }
}

fn redact_object(category: SensitiveCategory, object: &str) -> String {
    match category {
        SensitiveCategory::Email => redact_email(object),
        SensitiveCategory::Phone => redact_phone(object),
        SensitiveCategory::Ssn | SensitiveCategory::Address => redact_generic(object),
    }
}

/// `verified:{high|medium|low}` from claim confidence (§4.6).
fn verified_tag_for_confidence(confidence: f64) -> &'static str {
    if confidence >= 0.9 {
        "verified:high"
    } else if confidence >= 0.6 {
        "verified:medium"
    } else {
        "verified:low"
    }
}

/// One or more source tags derived from provenance (§4.6 example:
/// `source:linkedin_scraping`).
fn source_tag_for(source: &str) -> &'static str {
    if source.contains("linkedin.com") {
        "source:linkedin_scraping"
    } else if source.contains("search") {
        "source:web_search"
    } else {
        "source:scraper"
    }
}

/// Consult the optional LLM overlay. Failures are swallowed — the overlay is
/// advisory, and per §4.6 a failed overlay call falls back to the
/// deterministic decision untouched.
async fn consult_llm_overlay(claude: &Claude, claim: &Claim, existing_claims: &[Claim]) -> Option<ConsistencyReview> {
    let existing_summary: Vec<String> = existing_claims.iter().take(20).map(|c| format!("{} {} (confidence {:.2})", c.predicate, c.object, c.confidence)).collect();

    let user_prompt = format!(
        "Candidate claim: {} {} (confidence {:.2})\n\nExisting claims for this subject:\n{}\n\nDoes the candidate claim contradict or conflict with the existing claims? If so, recommend rejection.",
        claim.predicate,
        claim.object,
        claim.confidence,
        existing_summary.join("\n"),
    );

    match claude
        .extract::<ConsistencyReview>(
            "You are a consistency reviewer for extracted professional-profile claims. You may only recommend tightening an existing decision: reject a claim you find inconsistent, or add cautionary tags. You may never approve a claim that was already rejected.",
            user_prompt,
            0.0,
            256,
        )
        .await
    {
        Ok(review) => Some(review),
        Err(err) => {
            warn!(error = %err, "verifier LLM overlay failed, keeping deterministic decision");
            None
        }
    }
}

/// Apply the overlay's advisory verdict: may reject an approved claim and
/// may add tags, never the reverse (§4.6).
fn apply_overlay(outcome: &mut VerifyOutcome, review: ConsistencyReview) {
    if review.reject && outcome.approved {
        outcome.approved = false;
        outcome.reason = review.reason.or_else(|| Some("rejected by consistency overlay".to_string()));
    }
    for tag in review.additional_tags {
        if !outcome.claim.policy_tags.contains(&tag) {
            outcome.claim.policy_tags.push(tag);
        }
    }
}

fn err_claim_placeholder() -> Claim {
    use chrono::Utc;
    use profile_common::Provenance;
    use uuid::Uuid;

    let now = Utc::now();
    Claim {
        id: Uuid::new_v4(),
        subject: String::new(),
        predicate: String::new(),
        object: String::new(),
        confidence: 0.0,
        first_seen_at: now,
        last_verified_at: now,
        provenance: Provenance { source: String::new(), evidence_id: Uuid::nil(), extracted_at: now },
        policy_tags: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use profile_common::Provenance;
    use uuid::Uuid;

    fn claim(predicate: &str, object: &str, confidence: f64) -> Claim {
        let now = Utc::now();
        Claim {
            id: Uuid::new_v4(),
            subject: "Alice Example".to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            confidence,
            first_seen_at: now,
            last_verified_at: now,
            provenance: Provenance { source: "https://www.linkedin.com/in/alice".to_string(), evidence_id: Uuid::new_v4(), extracted_at: now },
            policy_tags: vec!["extracted:ai".to_string()],
        }
    }

    #[tokio::test]
    async fn email_claim_rejected_by_default_consent() {
        let verifier = Verifier::new();
        let outcome = verifier.verify(claim("has_email", "alice@example.com", 0.9), &ConsentFlags::default(), &[]).await;
        assert!(!outcome.approved);
        assert!(outcome.claim.policy_tags.contains(&"sensitive:contact".to_string()));
    }

    #[tokio::test]
    async fn email_claim_approved_and_redacted_with_consent() {
        let consent = ConsentFlags { profile: true, email: true, phone: false };
        let verifier = Verifier::new();
        let outcome = verifier.verify(claim("has_email", "jane.doe@acme.com", 0.9), &consent, &[]).await;
        assert!(outcome.approved);
        assert_eq!(outcome.claim.object, "j***@acme.com");
        assert!(outcome.claim.policy_tags.contains(&"sensitive:pii".to_string()));
        assert!(outcome.claim.policy_tags.contains(&"consent:email_shared".to_string()));
    }

    #[tokio::test]
    async fn plain_claim_approved_with_verified_and_source_tags() {
        let verifier = Verifier::new();
        let outcome = verifier.verify(claim("works_at", "Acme", 0.95), &ConsentFlags::default(), &[]).await;
        assert!(outcome.approved);
        assert!(outcome.claim.policy_tags.contains(&"verified:high".to_string()));
        assert!(outcome.claim.policy_tags.contains(&"source:linkedin_scraping".to_string()));
        assert!(outcome.claim.policy_tags.contains(&"consent:public_data".to_string()));
    }

    #[tokio::test]
    async fn medium_and_low_confidence_verified_tags() {
        let verifier = Verifier::new();
        let medium = verifier.verify(claim("has_skill", "Rust", 0.7), &ConsentFlags::default(), &[]).await;
        assert!(medium.claim.policy_tags.contains(&"verified:medium".to_string()));

        let low = verifier.verify(claim("has_skill", "Rust", 0.3), &ConsentFlags::default(), &[]).await;
        assert!(low.claim.policy_tags.contains(&"verified:low".to_string()));
    }

    #[tokio::test]
    async fn ssn_is_never_approved_regardless_of_consent() {
        let consent = ConsentFlags { profile: true, email: true, phone: true };
        let verifier = Verifier::new();
        let outcome = verifier.verify(claim("has_about", "SSN: 123-45-6789", 0.9), &consent, &[]).await;
        assert!(!outcome.approved);
    }
}
