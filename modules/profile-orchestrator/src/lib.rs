pub mod error;

use profile_common::{classify_input_kind, Claim, ConsentFlags, Evidence, InputKind, PipelineError, Report, Run, RunStatus};
use profile_extractor::Extractor;
use profile_harvester::{Harvester, HarvestError, WebSearcher};
use profile_store::CanonicalStore;
use profile_synthesizer::Synthesizer;
use profile_vector::VectorStore;
use profile_verifier::Verifier;
use tracing::{info, warn};
use uuid::Uuid;

pub use error::Result;

/// C8, the run orchestrator (§4.8). Holds every stage collaborator,
/// constructed once, and drives one run at a time through the linear state
/// machine `intake -> discover -> fetch -> normalize -> extract -> verify ->
/// upsert -> synthesize -> publish -> completed`, with `error` reachable
/// from any stage. Grounded on the teacher's `Scout`: a struct holding all
/// stage collaborators, with a single `run()` sequencing them.
pub struct Orchestrator<S: WebSearcher> {
    store: CanonicalStore,
    vector: VectorStore,
    harvester: Harvester<S>,
    extractor: Extractor,
    verifier: Verifier,
    synthesizer: Synthesizer,
}

impl<S: WebSearcher> Orchestrator<S> {
    pub fn new(store: CanonicalStore, vector: VectorStore, harvester: Harvester<S>, extractor: Extractor, verifier: Verifier, synthesizer: Synthesizer) -> Self {
        Self { store, vector, harvester, extractor, verifier, synthesizer }
    }

    /// `StartRun(subject, inputKindHint?, maxCalls?) -> runId` followed by
    /// running the pipeline to completion (§6). The caller's `inputKindHint`
    /// is accepted by the external contract but never trusted — `intake`
    /// re-derives the kind from the subject string itself, matching the
    /// harvester (§6, §4.4).
    pub async fn run(&self, subject: &str, budget: u32, consent: ConsentFlags) -> Result<Run> {
        let input_kind = classify_input_kind(subject);
        let run = self.store.create_run(subject, input_kind, budget).await.map_err(store_failure)?;
        info!(run_id = %run.id, subject, ?input_kind, budget, "run created");

        if let Err(err) = self.execute(&run, subject, budget, &consent).await {
            warn!(run_id = %run.id, error = %err, "run aborted");
            let _ = self.store.update_run_status(run.id, RunStatus::Error, None, None, Some(&err.to_string())).await;
        }

        self.store.get_run(run.id).await.map_err(store_failure)
    }

    /// `GetStatus(runId) -> Run` (§6).
    pub async fn get_status(&self, run_id: Uuid) -> Result<Run> {
        self.store.get_run(run_id).await.map_err(store_failure)
    }

    /// `GetReport(runId) -> {run, report, evidence, claims}` (§6). Decoupled
    /// from the state machine: synthesis is performed lazily here, reading
    /// whatever Run/Evidence/Claims are currently in C2, rather than being
    /// persisted by the `synthesize` stage (§4.8).
    pub async fn get_report(&self, run_id: Uuid, consent: &ConsentFlags) -> Result<(Run, Report, Vec<Evidence>, Vec<Claim>)> {
        let run = self.store.get_run(run_id).await.map_err(store_failure)?;
        let evidence = self.store.get_evidence_by_subject(&run.subject).await.map_err(store_failure)?;
        let claims = self.store.get_claims_by_subject(&run.subject).await.map_err(store_failure)?;
        let report = self.synthesizer.synthesize(&run.subject, &evidence, &claims, consent).await;
        Ok((run, report, evidence, claims))
    }

    /// Drives one run through every stage. Returns `Err` the moment a stage
    /// hits a condition the orchestrator cannot proceed past; the caller
    /// turns that into the run's `error_message` (§4.8/§9).
    async fn execute(&self, run: &Run, subject: &str, budget: u32, consent: &ConsentFlags) -> Result<()> {
        if let InputKind::SearchQuery = run.input_kind {
            if subject.split_whitespace().count() < 2 {
                return Err(PipelineError::InputInvalid(format!("search query must contain at least two tokens (first and last name): {subject:?}")));
            }
        }

        // discover: no external I/O in this core spec, reserved for future
        // source discovery.
        self.write_status(run.id, RunStatus::Discover, None, None).await?;

        self.write_status(run.id, RunStatus::Fetch, None, None).await?;
        let evidence = self.harvester.harvest(subject, budget).await.map_err(harvest_failure)?;
        for ev in &evidence {
            self.store.create_evidence(ev).await.map_err(store_failure)?;
        }
        self.write_status(run.id, RunStatus::Fetch, Some(evidence.len() as u32), None).await?;

        // normalize: no-op pass reserved for schema normalization across
        // heterogeneous sources.
        self.write_status(run.id, RunStatus::Normalize, None, None).await?;

        self.write_status(run.id, RunStatus::Extract, None, None).await?;
        let claims = self.extract_all(subject, &evidence).await?;
        self.write_status(run.id, RunStatus::Extract, None, Some(claims.len() as u32)).await?;

        self.write_status(run.id, RunStatus::Verify, None, None).await?;
        let approved = self.verify_all(claims, consent).await;

        self.write_status(run.id, RunStatus::Upsert, None, None).await?;
        for claim in &approved {
            self.store.create_claim(claim).await.map_err(store_failure)?;
        }
        self.write_status(run.id, RunStatus::Upsert, None, Some(approved.len() as u32)).await?;
        self.best_effort_index(&evidence, &approved).await;

        // synthesize: no-op persist; the report itself is produced lazily by
        // get_report, using the state just persisted.
        self.write_status(run.id, RunStatus::Synthesize, None, None).await?;
        self.write_status(run.id, RunStatus::Publish, None, None).await?;
        self.write_status(run.id, RunStatus::Completed, None, None).await?;

        Ok(())
    }

    async fn extract_all(&self, subject: &str, evidence: &[Evidence]) -> Result<Vec<Claim>> {
        let mut claims = Vec::new();
        for ev in evidence {
            let outcome = self.extractor.extract(subject, ev).await;
            if let Some(extraction) = &outcome.extraction {
                self.store.attach_extraction(ev.id, extraction).await.map_err(store_failure)?;
            }
            claims.extend(outcome.claims);
        }
        Ok(claims)
    }

    /// Verifies claims one at a time, growing the `existing` context with
    /// every claim already decided on — not just the ones approved — so the
    /// consistency overlay (§4.6) sees the full batch seen so far.
    async fn verify_all(&self, claims: Vec<Claim>, consent: &ConsentFlags) -> Vec<Claim> {
        let mut seen = Vec::with_capacity(claims.len());
        let mut approved = Vec::new();
        for claim in claims {
            let outcome = self.verifier.verify(claim, consent, &seen).await;
            seen.push(outcome.claim.clone());
            if outcome.approved {
                approved.push(outcome.claim);
            }
        }
        approved
    }

    /// `upsert`'s best-effort half (§4.8): index evidence and approved
    /// claims into C3. A failure here is logged and swallowed, never
    /// aborting the run (§3 Ownership, §9).
    async fn best_effort_index(&self, evidence: &[Evidence], claims: &[Claim]) {
        for ev in evidence {
            match self.vector.embed(&ev.content).await {
                Ok(vector) => {
                    if let Err(e) = self.vector.upsert_evidence(ev, vector).await {
                        warn!(evidence_id = %ev.id, error = %e, "vector upsert failed, continuing");
                    }
                }
                Err(e) => warn!(evidence_id = %ev.id, error = %e, "embedding failed, skipping vector index"),
            }
        }
        for claim in claims {
            let text = format!("{} {}", claim.predicate, claim.object);
            match self.vector.embed(&text).await {
                Ok(vector) => {
                    if let Err(e) = self.vector.upsert_claim(claim, vector).await {
                        warn!(claim_id = %claim.id, error = %e, "vector upsert failed, continuing");
                    }
                }
                Err(e) => warn!(claim_id = %claim.id, error = %e, "embedding failed, skipping vector index"),
            }
        }
    }

    /// Writes a status transition to C2. Per §4.8, this write always
    /// precedes the stage's own work, so any observer reading the run sees
    /// the state just entered; a write failure here is `StoreWriteFailed`,
    /// which always aborts the run (§9).
    async fn write_status(&self, run_id: Uuid, status: RunStatus, evidence_count: Option<u32>, claims_count: Option<u32>) -> Result<()> {
        self.store.update_run_status(run_id, status, evidence_count, claims_count, None).await.map_err(store_failure)
    }
}

fn store_failure(err: profile_store::StoreError) -> PipelineError {
    PipelineError::StoreWriteFailed(err.to_string())
}

fn harvest_failure(err: HarvestError) -> PipelineError {
    match err {
        HarvestError::InputInvalid(subject) => PipelineError::InputInvalid(subject),
        HarvestError::Serde(e) => PipelineError::ScraperMalformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token_subject_is_rejected_before_any_stage_write() {
        let subject = "Alice";
        assert!(subject.split_whitespace().count() < 2);
        assert_eq!(classify_input_kind(subject), InputKind::SearchQuery);
    }

    #[test]
    fn two_token_subject_passes_the_intake_check() {
        let subject = "Alice Example";
        assert!(subject.split_whitespace().count() >= 2);
    }

    #[test]
    fn harvest_input_invalid_maps_to_pipeline_input_invalid() {
        let err = harvest_failure(HarvestError::InputInvalid("x".into()));
        assert!(matches!(err, PipelineError::InputInvalid(_)));
    }

    #[test]
    fn harvest_serde_error_maps_to_scraper_malformed() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = harvest_failure(HarvestError::Serde(bad_json));
        assert!(matches!(err, PipelineError::ScraperMalformed(_)));
    }
}
