//! Results stage binary: the pipeline's last worker. Reads the raw
//! query-engine verdict a job produced, parses out its (single) finding if
//! any, renders the SARIF document or debug envelope, and advances the job
//! to its terminal status. Grounded on `workers/results/main.py`.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus, Language};
use dhscanner_sarif::generate_from_query_engine_output;
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct ResultsWorker {
    store: ArtifactStore,
    logger: Logger,
    sarif_description: String,
}

#[async_trait]
impl Worker for ResultsWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let started = Instant::now();

        let Some(results_id) = self.store.latest_results_id(job_id).await? else {
            // No query-engine output was ever produced for this job (e.g.
            // an empty upload set) — still render the debug envelope so
            // `/results` has something to serve once the job finishes.
            let output = generate_from_query_engine_output("", &self.sarif_description);
            self.store.save_output(job_id, &output.into_bytes()).await?;
            self.logger
                .info(LogMessage::new(
                    job_id.as_str(),
                    Context::ResultsSucceeded,
                    "*",
                    Language::All,
                    started.elapsed(),
                ))
                .await;
            return Ok(());
        };

        let content = match self.store.load(job_id, &ArtifactKind::Results, results_id).await? {
            Some(bytes) => String::from_utf8_lossy(&bytes).to_string(),
            None => String::new(),
        };

        let output = generate_from_query_engine_output(&content, &self.sarif_description);
        self.store.save_output(job_id, &output.into_bytes()).await?;

        self.logger
            .info(LogMessage::new(
                job_id.as_str(),
                Context::ResultsSucceeded,
                "*",
                Language::All,
                started.elapsed(),
            ))
            .await;

        self.store.delete_results(job_id, results_id).await?;
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForResultsGeneration
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dhscanner=info".parse()?))
        .init();

    let config = Config::worker_from_env();
    config.log_redacted();

    let store = ArtifactStore::connect(&config.db_path, &config.artifact_root).await?;
    let coordinator = StatusCoordinator::connect(&config.redis_url).await?;
    let logger = Logger::new(config.log_sink_url.clone());

    let worker = ResultsWorker {
        store,
        logger,
        sarif_description: config.sarif_description.clone(),
    };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
