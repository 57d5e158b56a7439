//! Query-engine stage binary: flattens every fact blob belonging to a job
//! into one deduplicated knowledge base, evaluates it against itself, and
//! stores the raw textual verdict for the results stage to parse.
//! Grounded on `workers/queryengine/main.py`.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus, Language};
use dhscanner_stageclients::{build_kb, QueryengineClient};
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct QueryengineWorker {
    store: ArtifactStore,
    client: QueryengineClient,
    logger: Logger,
}

#[async_trait]
impl Worker for QueryengineWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let started = Instant::now();
        let facts_records = self.store.list_facts(job_id).await?;

        let mut fact_lines = Vec::new();
        for record in &facts_records {
            if let Some(bytes) = self.store.load(job_id, &ArtifactKind::Facts(record.index as usize), record.id).await? {
                let text = String::from_utf8_lossy(&bytes).to_string();
                fact_lines.extend(text.lines().map(|l| l.trim().to_string()));
            }
        }
        let kb = build_kb(fact_lines);
        let outcome = self.client.check(&kb).await;

        // The facts consumed by this call are deleted whether or not the
        // query engine could be reached, matching every other stage's
        // "delete the input regardless of outcome" cleanup.
        for record in &facts_records {
            self.store.delete_facts(job_id, record.id).await?;
        }

        match outcome {
            Ok(content) => {
                self.store.save_results(job_id, content.as_bytes()).await?;
                self.logger
                    .info(LogMessage::new(
                        job_id.as_str(),
                        Context::QueryengineSucceeded,
                        "*",
                        Language::All,
                        started.elapsed(),
                    ))
                    .await;
            }
            Err(e) => {
                // Transient failure: logged, no Results artifact is
                // written, but the job still advances — the results
                // stage renders the debug envelope for a job with no
                // Results blob, matching §7's "job advances without this
                // unit's output" contract.
                self.logger
                    .info(LogMessage::new(
                        job_id.as_str(),
                        Context::QueryengineFailed,
                        "*",
                        Language::All,
                        started.elapsed(),
                    ).with_more_details(e.to_string()))
                    .await;
            }
        }
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForQueryengine
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
    let client = QueryengineClient::new(config.queryengine_url.clone());

    let worker = QueryengineWorker { store, client, logger };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
