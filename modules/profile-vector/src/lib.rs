pub mod error;

use std::sync::Arc;

use ai_client::OpenAi;
use chrono::Utc;
use pgvector::Vector;
use profile_common::{Claim, Evidence};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use error::{Result, VectorError};

/// Fixed embedding dimension (§4.3). Every vector written or queried must
/// have exactly this many components.
pub const EMBEDDING_DIM: usize = 768;
/// Text is truncated to this many characters before embedding (§4.3).
pub const MAX_EMBED_CHARS: usize = 5_000;

/// Which canonical record a vector row mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Evidence,
    Claim,
}

impl VectorKind {
    fn as_str(self) -> &'static str {
        match self {
            VectorKind::Evidence => "evidence",
            VectorKind::Claim => "claim",
        }
    }
}

/// Optional narrowing for [`VectorStore::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub subject: Option<String>,
    pub kind: Option<VectorKind>,
}

/// One similarity match, score in `[0, 1]` (§4.3).
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub key: String,
    pub score: f64,
    pub metadata: serde_json::Value,
}

/// C3, the best-effort embedding index (§3 Ownership, §4.3). Never
/// authoritative: losing this store must never corrupt the system, and
/// every method here is meant to be logged-and-swallowed by callers rather
/// than allowed to abort a run.
#[derive(Clone)]
pub struct VectorStore {
    pool: PgPool,
    embedder: Arc<OpenAi>,
}

impl VectorStore {
    pub fn new(pool: PgPool, embedder: Arc<OpenAi>) -> Self {
        Self { pool, embedder }
    }

    pub async fn connect(database_url: &str, embedder: Arc<OpenAi>) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
        Ok(Self::new(pool, embedder))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// `Embed(text) -> vector` (§4.3). Truncates to [`MAX_EMBED_CHARS`]
    /// before calling the embedding provider.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let truncated = ai_client::util::truncate_to_char_boundary(text, MAX_EMBED_CHARS);
        self.embedder.embed(truncated).await.map_err(VectorError::Embedding)
    }

    /// `UpsertEvidence(evidence, vector)` (§4.3): keyed by `evidence_{id}`,
    /// metadata mirrors the canonical record's identifying fields.
    pub async fn upsert_evidence(&self, evidence: &Evidence, vector: Vec<f32>) -> Result<()> {
        let metadata = serde_json::json!({
            "subject": evidence.subject,
            "source": evidence.source,
            "content_kind": content_kind_str(evidence.content_kind),
        });
        self.upsert(&format!("evidence_{}", evidence.id), VectorKind::Evidence, &evidence.subject, metadata, vector)
            .await
    }

    /// `UpsertClaim(claim, vector)` (§4.3): keyed by `claim_{id}`.
    pub async fn upsert_claim(&self, claim: &Claim, vector: Vec<f32>) -> Result<()> {
        let metadata = serde_json::json!({
            "subject": claim.subject,
            "predicate": claim.predicate,
            "object": claim.object,
        });
        self.upsert(&format!("claim_{}", claim.id), VectorKind::Claim, &claim.subject, metadata, vector).await
    }

    async fn upsert(
        &self,
        key: &str,
        kind: VectorKind,
        subject: &str,
        metadata: serde_json::Value,
        vector: Vec<f32>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vectors (key, kind, subject, metadata, embedding, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (key) DO UPDATE SET metadata = EXCLUDED.metadata, embedding = EXCLUDED.embedding
            "#,
        )
        .bind(key)
        .bind(kind.as_str())
        .bind(subject)
        .bind(metadata)
        .bind(Vector::from(vector))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// `Query(vector, filter, topK)` (§4.3). Uses pgvector's cosine distance
    /// operator; score is `1 - distance` so results land in `[0, 1]`.
    pub async fn query(&self, vector: Vec<f32>, filter: &QueryFilter, top_k: u32) -> Result<Vec<VectorMatch>> {
        let embedding = Vector::from(vector);

        let rows = sqlx::query_as::<_, (String, serde_json::Value, f64)>(
            r#"
            SELECT key, metadata, (embedding <=> $1) AS distance
            FROM vectors
            WHERE ($2::text IS NULL OR subject = $2)
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY embedding <=> $1
            LIMIT $4
            "#,
        )
        .bind(embedding)
        .bind(filter.subject.as_deref())
        .bind(filter.kind.map(VectorKind::as_str))
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, metadata, distance)| VectorMatch { key, score: (1.0 - distance).clamp(0.0, 1.0), metadata })
            .collect())
    }
}

fn content_kind_str(kind: profile_common::ContentKind) -> &'static str {
    match kind {
        profile_common::ContentKind::Json => "json",
        profile_common::ContentKind::Html => "html",
        profile_common::ContentKind::Text => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_kind_as_str() {
        assert_eq!(VectorKind::Evidence.as_str(), "evidence");
        assert_eq!(VectorKind::Claim.as_str(), "claim");
    }
}
