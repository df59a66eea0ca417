use std::sync::Arc;

use ai_client::{Claude, OpenAi};
use clap::{Parser, Subcommand};
use profile_common::{Config, ConsentFlags};
use profile_extractor::Extractor;
use profile_harvester::{Harvester, TavilySearcher};
use profile_orchestrator::Orchestrator;
use profile_store::CanonicalStore;
use profile_synthesizer::Synthesizer;
use profile_vector::VectorStore;
use profile_verifier::Verifier;
use scraper_client::ScraperClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// External caller contract of §6: start a run, check its status, or read
/// its synthesized report.
#[derive(Parser)]
#[command(name = "profile-orchestrator", about = "Run orchestrator for the professional-profile analysis pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// `StartRun(subject, inputKindHint?, maxCalls?) -> runId` (§6).
    StartRun {
        subject: String,
        #[arg(long)]
        max_calls: Option<u32>,
        #[arg(long)]
        consent_email: bool,
        #[arg(long)]
        consent_phone: bool,
    },
    /// `GetStatus(runId) -> Run` (§6).
    GetStatus { run_id: Uuid },
    /// `GetReport(runId) -> Report` (§6).
    GetReport { run_id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive("profile=info".parse()?)).init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let store = CanonicalStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let embedder = Arc::new(OpenAi::new(config.embedding_api_key.clone(), config.embedding_model.clone()).with_base_url(config.embedding_base_url.clone()));
    let vector = VectorStore::connect(&config.database_url, embedder).await?;
    vector.migrate().await?;

    let scraper = ScraperClient::new(config.scraper_base_url.clone(), config.scraper_api_token.clone(), config.scraper_dataset_id.clone());
    let searcher = TavilySearcher::new(config.search_api_key.clone());
    let harvester = Harvester::new(scraper, searcher);

    let claude = Claude::new(config.anthropic_api_key.clone(), "claude-haiku-4-5-20251001");
    let extractor = Extractor::new(claude.clone());
    let verifier = Verifier::new().with_llm_overlay(claude.clone());
    let synthesizer = Synthesizer::new(claude);

    let orchestrator = Orchestrator::new(store, vector, harvester, extractor, verifier, synthesizer);

    match cli.command {
        Command::StartRun { subject, max_calls, consent_email, consent_phone } => {
            let budget = max_calls.unwrap_or(config.default_budget);
            let consent = ConsentFlags { profile: true, email: consent_email, phone: consent_phone };
            let run = orchestrator.run(&subject, budget, consent).await?;
            info!(run_id = %run.id, status = ?run.status, "run finished");
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::GetStatus { run_id } => {
            let run = orchestrator.get_status(run_id).await?;
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::GetReport { run_id } => {
            let (run, report, evidence, claims) = orchestrator.get_report(run_id, &ConsentFlags::default()).await?;
            let body = serde_json::json!({ "run": run, "report": report, "evidence": evidence, "claims": claims });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
