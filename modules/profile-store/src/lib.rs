pub mod error;

use chrono::{DateTime, Utc};
use profile_common::{Claim, ContentKind, Evidence, Extraction, InputKind, Provenance, Run, RunStatus};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub use error::{Result, StoreError};

/// C2, the canonical store: the authoritative durable record of Runs,
/// Evidence, and Claims (§3 Ownership, §4.2). Backed by Postgres, queried
/// with explicit SQL rather than a query builder, matching the teacher's
/// `rootsignal-archive::ArchiveStore` shape.
#[derive(Clone)]
pub struct CanonicalStore {
    pool: PgPool,
}

impl CanonicalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations (§6 persistent state layout).
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// `CreateRun(subject, input kind, budget) -> Run` (§4.2). Assigns id and
    /// timestamps; starts in `intake`.
    pub async fn create_run(&self, subject: &str, input_kind: InputKind, budget: u32) -> Result<Run> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let input_kind_str = input_kind_to_str(input_kind);
        let status_str = run_status_to_str(RunStatus::Intake);

        sqlx::query(
            r#"
            INSERT INTO runs (id, subject, input_kind, status, evidence_count, claims_count, budget, created_at, updated_at, error_message)
            VALUES ($1, $2, $3, $4, 0, 0, $5, $6, $6, NULL)
            "#,
        )
        .bind(id)
        .bind(subject)
        .bind(input_kind_str)
        .bind(status_str)
        .bind(budget as i32)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Run {
            id,
            subject: subject.to_string(),
            input_kind,
            status: RunStatus::Intake,
            evidence_count: 0,
            claims_count: 0,
            created_at: now,
            updated_at: now,
            error_message: None,
            budget,
        })
    }

    /// `GetRun(id) -> Run | not-found` (§4.2).
    pub async fn get_run(&self, id: Uuid) -> Result<Run> {
        let row = sqlx::query_as::<_, StoredRun>(
            r#"SELECT id, subject, input_kind, status, evidence_count, claims_count, budget, created_at, updated_at, error_message
               FROM runs WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(stored_run_to_run).transpose()?.ok_or(StoreError::RunNotFound(id))
    }

    /// `UpdateRunStatus(id, status, evidenceCount?, claimsCount?, errorMessage?)`
    /// — a partial update that always bumps `updated_at` (§4.2). This is the
    /// write the orchestrator makes before entering every stage (§4.8), so
    /// any observer reading the row sees the state just entered.
    ///
    /// Guarded with `status <> 'error'` (§5, §8): once a run has been moved
    /// to `error` — whether by this orchestrator or an external cancellation
    /// observed mid-stage — no later transition may clobber it back to a
    /// live status. A run stuck mid-`fetch` for its 15-minute poll budget
    /// must still honor a cancellation recorded while it was blocked.
    pub async fn update_run_status(
        &self,
        id: Uuid,
        status: RunStatus,
        evidence_count: Option<u32>,
        claims_count: Option<u32>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let status_str = run_status_to_str(status);
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET status = $1,
                evidence_count = COALESCE($2, evidence_count),
                claims_count = COALESCE($3, claims_count),
                error_message = COALESCE($4, error_message),
                updated_at = $5
            WHERE id = $6 AND status <> 'error'
            "#,
        )
        .bind(status_str)
        .bind(evidence_count.map(|v| v as i32))
        .bind(claims_count.map(|v| v as i32))
        .bind(error_message)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM runs WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            return Err(if exists { StoreError::RunCancelled(id) } else { StoreError::RunNotFound(id) });
        }
        Ok(())
    }

    // =========================================================================
    // Evidence
    // =========================================================================

    /// `CreateEvidence(ev)` (§4.2). Idempotent on `(subject, hash)` — a
    /// second write of the same content is a no-op, matching §3's dedup
    /// invariant. Does not set `extraction`; see [`Self::attach_extraction`]
    /// for that in-place update, resolving §9's double-write open question
    /// into one authoritative write path per artifact.
    pub async fn create_evidence(&self, ev: &Evidence) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO evidence (id, subject_id, source_url, collected_at, content_text, content_type, hash, extraction_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (subject_id, hash) DO NOTHING
            "#,
        )
        .bind(ev.id)
        .bind(&ev.subject)
        .bind(&ev.source)
        .bind(ev.collected_at)
        .bind(&ev.content)
        .bind(content_kind_to_str(ev.content_kind))
        .bind(&ev.hash)
        .bind(ev.extraction.as_ref().map(|e| serde_json::to_value(e)).transpose()?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist an extraction result onto an already-stored evidence row, by
    /// id (§4.5 step 3). The sole in-place mutation evidence ever undergoes.
    pub async fn attach_extraction(&self, evidence_id: Uuid, extraction: &Extraction) -> Result<()> {
        let value = serde_json::to_value(extraction)?;
        sqlx::query("UPDATE evidence SET extraction_json = $1 WHERE id = $2")
            .bind(value)
            .bind(evidence_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `GetEvidenceBySubject(subject) -> [Evidence]`, newest first (§4.2).
    pub async fn get_evidence_by_subject(&self, subject: &str) -> Result<Vec<Evidence>> {
        let rows = sqlx::query_as::<_, StoredEvidence>(
            r#"
            SELECT id, subject_id, source_url, collected_at, content_text, content_type, hash, extraction_json
            FROM evidence
            WHERE subject_id = $1
            ORDER BY collected_at DESC
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(stored_evidence_to_evidence).collect()
    }

    // =========================================================================
    // Claims
    // =========================================================================

    /// `CreateClaim(claim)` — no dedup at this layer (§4.2).
    pub async fn create_claim(&self, claim: &Claim) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO claims (id, subject_id, predicate, object, confidence, first_seen_at, last_verified_at, provenance_json, policy_tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(claim.id)
        .bind(&claim.subject)
        .bind(&claim.predicate)
        .bind(&claim.object)
        .bind(claim.confidence)
        .bind(claim.first_seen_at)
        .bind(claim.last_verified_at)
        .bind(serde_json::to_value(&claim.provenance)?)
        .bind(&claim.policy_tags)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// `GetClaimsBySubject(subject) -> [Claim]`, most recently verified first
    /// (§4.2).
    pub async fn get_claims_by_subject(&self, subject: &str) -> Result<Vec<Claim>> {
        let rows = sqlx::query_as::<_, StoredClaim>(
            r#"
            SELECT id, subject_id, predicate, object, confidence, first_seen_at, last_verified_at, provenance_json, policy_tags
            FROM claims
            WHERE subject_id = $1
            ORDER BY last_verified_at DESC
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(stored_claim_to_claim).collect()
    }
}

// =============================================================================
// Row shapes — the DB schema (§6) uses different column names than the
// domain types (`subject_id` vs `subject`, `content_type` vs `content_kind`),
// so these map between the two rather than deriving FromRow on the domain
// types directly.
// =============================================================================

#[derive(sqlx::FromRow)]
struct StoredRun {
    id: Uuid,
    subject: String,
    input_kind: String,
    status: String,
    evidence_count: i32,
    claims_count: i32,
    budget: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    error_message: Option<String>,
}

fn stored_run_to_run(row: StoredRun) -> Result<Run> {
    Ok(Run {
        id: row.id,
        subject: row.subject,
        input_kind: str_to_input_kind(&row.input_kind)?,
        status: str_to_run_status(&row.status)?,
        evidence_count: row.evidence_count as u32,
        claims_count: row.claims_count as u32,
        created_at: row.created_at,
        updated_at: row.updated_at,
        error_message: row.error_message,
        budget: row.budget as u32,
    })
}

#[derive(sqlx::FromRow)]
struct StoredEvidence {
    id: Uuid,
    subject_id: String,
    source_url: String,
    collected_at: DateTime<Utc>,
    content_text: String,
    content_type: String,
    hash: String,
    extraction_json: Option<serde_json::Value>,
}

fn stored_evidence_to_evidence(row: StoredEvidence) -> Result<Evidence> {
    let extraction: Option<Extraction> = row.extraction_json.map(serde_json::from_value).transpose()?;

    Ok(Evidence {
        id: row.id,
        subject: row.subject_id,
        source: row.source_url,
        collected_at: row.collected_at,
        content: row.content_text,
        content_kind: str_to_content_kind(&row.content_type)?,
        hash: row.hash,
        extraction,
    })
}

#[derive(sqlx::FromRow)]
struct StoredClaim {
    id: Uuid,
    subject_id: String,
    predicate: String,
    object: String,
    confidence: f64,
    first_seen_at: DateTime<Utc>,
    last_verified_at: DateTime<Utc>,
    provenance_json: serde_json::Value,
    policy_tags: Vec<String>,
}

fn stored_claim_to_claim(row: StoredClaim) -> Result<Claim> {
    let provenance: Provenance = serde_json::from_value(row.provenance_json)?;

    Ok(Claim {
        id: row.id,
        subject: row.subject_id,
        predicate: row.predicate,
        object: row.object,
        confidence: row.confidence,
        first_seen_at: row.first_seen_at,
        last_verified_at: row.last_verified_at,
        provenance,
        policy_tags: row.policy_tags,
    })
}

fn input_kind_to_str(k: InputKind) -> &'static str {
    match k {
        InputKind::DirectUrl => "direct-url",
        InputKind::SearchQuery => "search-query",
    }
}

fn str_to_input_kind(s: &str) -> Result<InputKind> {
    match s {
        "direct-url" => Ok(InputKind::DirectUrl),
        "search-query" => Ok(InputKind::SearchQuery),
        other => Err(StoreError::Other(anyhow::anyhow!("unknown input_kind: {other}"))),
    }
}

fn run_status_to_str(s: RunStatus) -> &'static str {
    match s {
        RunStatus::Intake => "intake",
        RunStatus::Discover => "discover",
        RunStatus::Fetch => "fetch",
        RunStatus::Normalize => "normalize",
        RunStatus::Extract => "extract",
        RunStatus::Verify => "verify",
        RunStatus::Upsert => "upsert",
        RunStatus::Synthesize => "synthesize",
        RunStatus::Publish => "publish",
        RunStatus::Completed => "completed",
        RunStatus::Error => "error",
    }
}

fn str_to_run_status(s: &str) -> Result<RunStatus> {
    Ok(match s {
        "intake" => RunStatus::Intake,
        "discover" => RunStatus::Discover,
        "fetch" => RunStatus::Fetch,
        "normalize" => RunStatus::Normalize,
        "extract" => RunStatus::Extract,
        "verify" => RunStatus::Verify,
        "upsert" => RunStatus::Upsert,
        "synthesize" => RunStatus::Synthesize,
        "publish" => RunStatus::Publish,
        "completed" => RunStatus::Completed,
        "error" => RunStatus::Error,
        other => return Err(StoreError::Other(anyhow::anyhow!("unknown run status: {other}"))),
    })
}

fn content_kind_to_str(k: ContentKind) -> &'static str {
    match k {
        ContentKind::Json => "json",
        ContentKind::Html => "html",
        ContentKind::Text => "text",
    }
}

fn str_to_content_kind(s: &str) -> Result<ContentKind> {
    Ok(match s {
        "json" => ContentKind::Json,
        "html" => ContentKind::Html,
        "text" => ContentKind::Text,
        other => return Err(StoreError::Other(anyhow::anyhow!("unknown content kind: {other}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_round_trips_through_its_string_form() {
        for status in [
            RunStatus::Intake,
            RunStatus::Discover,
            RunStatus::Fetch,
            RunStatus::Normalize,
            RunStatus::Extract,
            RunStatus::Verify,
            RunStatus::Upsert,
            RunStatus::Synthesize,
            RunStatus::Publish,
            RunStatus::Completed,
            RunStatus::Error,
        ] {
            let round_tripped = str_to_run_status(run_status_to_str(status)).unwrap();
            assert_eq!(round_tripped, status);
        }
    }

    #[test]
    fn content_kind_round_trips() {
        for kind in [ContentKind::Json, ContentKind::Html, ContentKind::Text] {
            assert_eq!(str_to_content_kind(content_kind_to_str(kind)).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_run_status_is_an_error() {
        assert!(str_to_run_status("sideways").is_err());
    }
}
