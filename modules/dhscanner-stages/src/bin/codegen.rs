//! Codegen stage binary: turns every dhscanner AST into its list of
//! "actual callables" (call-graph units the knowledge-base generator can
//! later process one at a time). Grounded on `workers/codegen/main.py`.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus, Language};
use dhscanner_stageclients::CodegenClient;
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct CodegenWorker {
    store: ArtifactStore,
    client: CodegenClient,
    logger: Logger,
}

#[async_trait]
impl Worker for CodegenWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let dhscanner_asts = self.store.list_dhscanner_asts(job_id).await?;
        for ast in dhscanner_asts {
            let started = Instant::now();
            let content = match self.store.load(job_id, &ArtifactKind::DhscannerAst, ast.id).await? {
                Some(bytes) => bytes,
                None => continue,
            };
            let file = self.store.get_file(ast.file_id).await?;
            let (original_filename, language) = file
                .map(|f| (f.original_filename, f.language))
                .unwrap_or_else(|| (String::new(), Language::Unknown));

            match self.client.generate(&original_filename, &content).await? {
                Some(callables) => {
                    for (i, callable) in callables.iter().enumerate() {
                        let bytes = serde_json::to_vec(callable)?;
                        self.store.save_callable(job_id, ast.file_id, i, None, &bytes).await?;
                    }
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::CodegenSucceeded,
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
                            Context::CodegenFailed,
                            &original_filename,
                            language,
                            started.elapsed(),
                        ))
                        .await;
                }
            }

            self.store.delete_dhscanner_ast(job_id, ast.id).await?;
        }
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForCodegen
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
    let client = CodegenClient::new(config.codegen_url.clone());

    let worker = CodegenWorker { store, client, logger };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
