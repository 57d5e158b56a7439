//! Knowledge-base generation stage binary: turns every callable into its
//! knowledge-base fact lines, then deletes the consumed callable (the
//! callable's job is done once its facts exist). Grounded on
//! `workers/kbgen/main.py`.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus, Language};
use dhscanner_stageclients::KbgenClient;
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct KbgenWorker {
    store: ArtifactStore,
    client: KbgenClient,
    logger: Logger,
}

#[async_trait]
impl Worker for KbgenWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let callables = self.store.list_callables(job_id).await?;
        for callable in callables {
            let started = Instant::now();
            let source = match self.store.load(job_id, &ArtifactKind::Callable(callable.index as usize), callable.id).await? {
                Some(bytes) => bytes,
                None => continue,
            };
            let file = self.store.get_file(callable.file_id).await?;
            let (original_filename, language) = file
                .map(|f| (f.original_filename, f.language))
                .unwrap_or_else(|| (String::new(), Language::Unknown));

            match self.client.generate(&original_filename, &source).await? {
                Some(facts) => {
                    for (i, fact) in facts.iter().enumerate() {
                        self.store.save_facts(job_id, callable.id, i, fact.as_bytes()).await?;
                    }
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::KbgenSucceeded,
                            &original_filename,
                            language,
                            started.elapsed(),
                        ))
                        .await;
                }
                None => {
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::KbgenFailed,
                            &original_filename,
                            language,
                            started.elapsed(),
                        ))
                        .await;
                }
            }

            self.store.delete_callable(job_id, callable.id).await?;
        }
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForKbgen
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
    let client = KbgenClient::new(config.kbgen_url.clone());

    let worker = KbgenWorker { store, client, logger };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
