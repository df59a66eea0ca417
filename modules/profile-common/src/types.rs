use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a run's subject was supplied. Overridden by the URL-pattern test on
/// the subject string itself (§6): a caller's hint never wins over the
/// pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    DirectUrl,
    SearchQuery,
}

/// The URL-pattern test of §4.4/§6: a subject is a direct profile URL only if
/// it names the known host under `/in/` or `/company/`. Anything else —
/// including a bare name or an unrecognized URL — is a search query. This is
/// the single source of truth both `intake` (to persist `input_kind`) and the
/// harvester (to decide which provider calls to make) must agree on.
pub fn classify_input_kind(subject: &str) -> InputKind {
    let is_direct_url = subject.contains("linkedin.com") && (subject.contains("/in/") || subject.contains("/company/"));
    if is_direct_url {
        InputKind::DirectUrl
    } else {
        InputKind::SearchQuery
    }
}

/// The nine lifecycle states of a run (§4.8): the eight linear states plus
/// the absorbing `error` state reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Intake,
    Discover,
    Fetch,
    Normalize,
    Extract,
    Verify,
    Upsert,
    Synthesize,
    Publish,
    Completed,
    Error,
}

impl RunStatus {
    /// The state this one advances to under success. `None` for the two
    /// terminal states.
    pub fn next(self) -> Option<RunStatus> {
        use RunStatus::*;
        match self {
            Intake => Some(Discover),
            Discover => Some(Fetch),
            Fetch => Some(Normalize),
            Normalize => Some(Extract),
            Extract => Some(Verify),
            Verify => Some(Upsert),
            Upsert => Some(Synthesize),
            Synthesize => Some(Publish),
            Publish => Some(Completed),
            Completed | Error => None,
        }
    }
}

/// One analysis of one subject (§3 Run). Mutated only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub subject: String,
    pub input_kind: InputKind,
    pub status: RunStatus,
    pub evidence_count: u32,
    pub claims_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error_message: Option<String>,
    pub budget: u32,
}

/// The shape of a content-bearing evidence record (§3 Evidence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Json,
    Html,
    Text,
}

/// One candidate claim surfaced by extraction, either freshly produced by
/// the LLM or re-derived from a prior extraction already attached to the
/// evidence (§4.5 step 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimCandidate {
    pub predicate: String,
    pub object: String,
    pub confidence: f64,
}

/// The result of running the extractor over one evidence record, persisted
/// back onto the evidence in place (§4.2 `CreateEvidence`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<String>,
    pub claims: Vec<ClaimCandidate>,
}

/// One raw record returned by the scraper, paired with metadata (§3
/// Evidence). `hash` is always `SHA-256(content)` in hex — enforced at
/// construction, not trusted from callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub subject: String,
    pub source: String,
    pub collected_at: DateTime<Utc>,
    pub content: String,
    pub content_kind: ContentKind,
    pub hash: String,
    pub extraction: Option<Extraction>,
}

impl Evidence {
    /// Build a new evidence record, computing its content hash. `id` and
    /// `collected_at` are assigned here rather than by the store, since
    /// dedup-by-hash within a run (§3 Evidence invariant) depends on the
    /// hash existing before the record ever reaches C2.
    pub fn new(subject: impl Into<String>, source: impl Into<String>, content: String, content_kind: ContentKind) -> Self {
        use sha2::{Digest, Sha256};
        let hash = hex::encode(Sha256::digest(content.as_bytes()));
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            source: source.into(),
            collected_at: Utc::now(),
            content,
            content_kind,
            hash,
            extraction: None,
        }
    }
}

/// A structured reference to the evidence a claim was extracted from (§3
/// Claim provenance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub evidence_id: Uuid,
    pub extracted_at: DateTime<Utc>,
}

/// One typed predicate-object assertion extracted from evidence (§3 Claim).
/// Every claim that reaches C2 has been approved by the verifier and carries
/// at least a `verified:*` tag and a source tag (§8 invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub confidence: f64,
    pub first_seen_at: DateTime<Utc>,
    pub last_verified_at: DateTime<Utc>,
    pub provenance: Provenance,
    pub policy_tags: Vec<String>,
}

/// The small, data-driven consent model (§9): an enum-backed struct instead
/// of a stringly-typed map, so the compiler — not a runtime lookup — is what
/// enforces the flag set. Default matches §9's "web-scraped, no-user-session"
/// default: `profile = true`, everything else withheld.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub profile: bool,
    pub email: bool,
    pub phone: bool,
}

impl Default for ConsentFlags {
    fn default() -> Self {
        Self {
            profile: true,
            email: false,
            phone: false,
        }
    }
}

/// One timeline entry in a synthesized report (§4.7 report shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: String,
    pub event: String,
    pub source: String,
}

/// `keyword_optimization` sub-object of the LinkedIn profile analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordOptimization {
    pub score: f64,
    pub identified_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// `engagement_metrics` sub-object of the LinkedIn profile analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub followers: u64,
    pub connections: u64,
    pub traction_rating: String,
    pub analysis: String,
}

/// Feedback on one section of the profile, used inside `profile_sections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionFeedback {
    pub present: bool,
    pub quality: String,
    pub feedback: String,
}

/// `profile_sections` sub-object of the LinkedIn profile analysis. Education
/// carries a count rather than a presence flag, per §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSections {
    pub headline: SectionFeedback,
    pub about: SectionFeedback,
    pub experience: SectionFeedback,
    pub education: EducationFeedback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationFeedback {
    pub count: usize,
    pub quality: String,
    pub feedback: String,
}

/// The optional `linkedin_profile_analysis` block, present whenever the
/// synthesizer located profile-shaped evidence (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedinProfileAnalysis {
    pub completeness_score: f64,
    pub profile_strength: String,
    pub keyword_optimization: KeywordOptimization,
    pub engagement_metrics: EngagementMetrics,
    pub profile_sections: ProfileSections,
    pub recommendations: Vec<String>,
}

/// The report shape produced by both the LLM path and the deterministic
/// fallback (§4.7). Ephemeral — never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub summary: String,
    pub key_roles: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    pub consent_badges: Vec<String>,
    pub confidence_score: f64,
    pub linkedin_profile_analysis: Option<LinkedinProfileAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_profile_url_is_direct() {
        assert_eq!(classify_input_kind("https://www.linkedin.com/in/alice"), InputKind::DirectUrl);
    }

    #[test]
    fn classify_company_url_is_direct() {
        assert_eq!(classify_input_kind("https://www.linkedin.com/company/acme"), InputKind::DirectUrl);
    }

    #[test]
    fn classify_free_text_name_is_search() {
        assert_eq!(classify_input_kind("Alice Example"), InputKind::SearchQuery);
    }

    #[test]
    fn classify_unrelated_url_is_search() {
        assert_eq!(classify_input_kind("https://example.com/in/alice"), InputKind::SearchQuery);
    }
}
