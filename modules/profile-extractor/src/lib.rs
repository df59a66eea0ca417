pub mod error;

use ai_client::Claude;
use chrono::Utc;
use profile_common::{Claim, ClaimCandidate, ContentKind, Evidence, Extraction, Provenance};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub use error::{ExtractError, Result};

/// Temperature ceiling for extraction calls (§4.5): conservatism is a
/// requirement, not a tuning choice.
pub const MAX_TEMPERATURE: f32 = 0.1;
/// Token cap for extraction calls (§6).
pub const MAX_TOKENS: u32 = 1_000;

/// What the LLM returns for one claim candidate (§4.5 step 2).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClaimCandidateResponse {
    pub predicate: String,
    pub object: String,
    pub confidence: f64,
}

/// The full `{entities, claims}` shape required of the extraction LLM call
/// (§4.5 step 2 / §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResponse {
    pub entities: Vec<String>,
    pub claims: Vec<ClaimCandidateResponse>,
}

/// The outcome of extracting one evidence record. `extraction` is `Some`
/// only when the LLM was actually called — the orchestrator persists it back
/// onto the evidence via C2's in-place update (§4.5 step 3). When the
/// evidence already carried a prior extraction, `extraction` is `None`
/// because there is nothing new to persist (§9's double-write resolution:
/// exactly one authoritative write per artifact).
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub claims: Vec<Claim>,
    pub extraction: Option<Extraction>,
}

/// C5, the claim extractor (§4.5). Falls back to zero claims, never an
/// error, when the LLM call or its output shape fails — only a prior bug in
/// evidence construction (not reachable from this crate) would surface as an
/// `Err` from [`Extractor::extract`].
pub struct Extractor {
    claude: Claude,
}

impl Extractor {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    /// `Extract(evidence) -> [Claim]` (§4.5).
    pub async fn extract(&self, subject: &str, evidence: &Evidence) -> ExtractOutcome {
        if let Some(prior) = &evidence.extraction {
            let claims = candidates_to_claims(subject, evidence, &prior.claims);
            return ExtractOutcome { claims, extraction: None };
        }

        match self.extract_via_llm(subject, evidence).await {
            Ok(response) => {
                let extraction = Extraction { entities: response.entities, claims: response.claims.iter().map(to_candidate).collect() };
                let claims = candidates_to_claims(subject, evidence, &extraction.claims);
                ExtractOutcome { claims, extraction: Some(extraction) }
            }
            Err(err) => {
                warn!(evidence_id = %evidence.id, source = %evidence.source, error = %err, "extraction failed, yielding zero claims");
                ExtractOutcome { claims: Vec::new(), extraction: None }
            }
        }
    }

    async fn extract_via_llm(&self, subject: &str, evidence: &Evidence) -> anyhow::Result<ExtractionResponse> {
        let body = match evidence.content_kind {
            ContentKind::Json => evidence.content.clone(),
            ContentKind::Html | ContentKind::Text => ai_client::util::truncate_to_char_boundary(&evidence.content, 8_000).to_string(),
        };

        let user_prompt = format!(
            "Subject: {subject}\nSource: {source}\nContent kind: {kind}\n\n---\n\n{body}",
            source = evidence.source,
            kind = content_kind_label(evidence.content_kind),
        );

        self.claude
            .extract::<ExtractionResponse>(SYSTEM_PROMPT, user_prompt, MAX_TEMPERATURE, MAX_TOKENS)
            .await
    }
}

fn to_candidate(r: &ClaimCandidateResponse) -> ClaimCandidate {
    ClaimCandidate { predicate: r.predicate.clone(), object: r.object.clone(), confidence: r.confidence }
}

/// Convert candidates (freshly extracted or re-derived from a prior
/// extraction) into stored-shape Claims, with provenance tagged to this
/// evidence and an initial `extracted:ai` policy tag (§4.5 step 4).
fn candidates_to_claims(subject: &str, evidence: &Evidence, candidates: &[ClaimCandidate]) -> Vec<Claim> {
    let now = Utc::now();
    candidates
        .iter()
        .map(|c| Claim {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            predicate: c.predicate.clone(),
            object: c.object.clone(),
            confidence: c.confidence,
            first_seen_at: now,
            last_verified_at: now,
            provenance: Provenance { source: evidence.source.clone(), evidence_id: evidence.id, extracted_at: now },
            policy_tags: vec!["extracted:ai".to_string()],
        })
        .collect()
}

fn content_kind_label(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Json => "json",
        ContentKind::Html => "html",
        ContentKind::Text => "text",
    }
}

const SYSTEM_PROMPT: &str = r#"You are a claim extractor for professional profile evidence.

Given one piece of evidence about a subject (a scraped profile record, a search result, or other text), extract typed claims: short predicate/object pairs backed directly by the evidence.

Preferred predicates (use these when they fit; you may use others if nothing above fits): has_name, works_at, has_title, located_in, has_about, graduated_from, has_degree, has_skill, has_followers, has_connections, graduation_year.

Rules:
- Only extract what the evidence actually states. Never infer or guess.
- confidence is in [0, 1]: 1.0 for an explicit structured field, lower for something paraphrased or ambiguous.
- entities is a short list of named things mentioned (people, companies, schools).
- If the evidence has nothing extractable, return empty arrays for both fields.
- Be conservative: when in doubt, omit the claim rather than invent it."#;

#[cfg(test)]
mod tests {
    use super::*;
    use profile_common::ContentKind;

    fn sample_evidence_with_prior() -> Evidence {
        let mut ev = Evidence::new("Alice Example", "https://example.com/in/alice", "{}".to_string(), ContentKind::Json);
        ev.extraction = Some(Extraction {
            entities: vec!["Acme".to_string()],
            claims: vec![ClaimCandidate { predicate: "works_at".to_string(), object: "Acme".to_string(), confidence: 0.95 }],
        });
        ev
    }

    #[tokio::test]
    async fn prior_extraction_short_circuits_the_llm() {
        let extractor = Extractor::new(Claude::new("sk-ant-unused", "claude-haiku-4-5-20251001"));
        let evidence = sample_evidence_with_prior();
        let outcome = extractor.extract("Alice Example", &evidence).await;

        assert_eq!(outcome.claims.len(), 1);
        assert_eq!(outcome.claims[0].predicate, "works_at");
        assert_eq!(outcome.claims[0].provenance.evidence_id, evidence.id);
        assert!(outcome.extraction.is_none(), "no new extraction to persist when reusing a prior one");
    }

    #[test]
    fn candidates_to_claims_tags_extracted_ai() {
        let ev = Evidence::new("Alice", "provider://search", "{}".to_string(), ContentKind::Json);
        let candidates = vec![ClaimCandidate { predicate: "has_title".to_string(), object: "Engineer".to_string(), confidence: 0.8 }];
        let claims = candidates_to_claims("Alice", &ev, &candidates);
        assert_eq!(claims[0].policy_tags, vec!["extracted:ai".to_string()]);
        assert_eq!(claims[0].provenance.source, "provider://search");
    }
}
