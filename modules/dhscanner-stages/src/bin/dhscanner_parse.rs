//! Dhscanner-AST stage binary: normalizes every native AST produced by the
//! previous stage into the dhscanner-AST format. Grounded on
//! `workers/dhscanner_parser/main.py`.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{ArtifactKind, Context, JobId, JobStatus};
use dhscanner_stageclients::{DhscannerParseOutcome, DhscannerParserClient};
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct DhscannerParseWorker {
    store: ArtifactStore,
    client: DhscannerParserClient,
    logger: Logger,
}

#[async_trait]
impl Worker for DhscannerParseWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let native_asts = self.store.list_native_asts(job_id).await?;
        for ast in native_asts {
            let started = Instant::now();
            let native_ast = match self.store.load(job_id, &ArtifactKind::NativeAst, ast.id).await? {
                Some(bytes) => bytes,
                None => continue,
            };
            let file = self.store.get_file(ast.file_id).await?;
            let original_filename = file.as_ref().map(|f| f.original_filename.as_str()).unwrap_or("");

            match self.client.parse(ast.language, original_filename, &native_ast).await? {
                DhscannerParseOutcome::Success(dhscanner_ast) => {
                    self.store.save_dhscanner_ast(job_id, ast.file_id, &dhscanner_ast).await?;
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::DhscannerParsingSucceeded,
                            original_filename,
                            ast.language,
                            started.elapsed(),
                        ))
                        .await;
                }
                // A domain-level parse failure is logged with the
                // normalizer's reported location, not a system error — the
                // job still advances.
                DhscannerParseOutcome::DomainFailure(location) => {
                    let mut message = LogMessage::new(
                        job_id.as_str(),
                        Context::DhscannerParsingFailed,
                        original_filename,
                        ast.language,
                        started.elapsed(),
                    );
                    if let Some(location) = location {
                        message = message.with_more_details(location.format());
                    }
                    self.logger.info(message).await;
                }
                DhscannerParseOutcome::Unavailable => {
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::DhscannerParsingFailed,
                            original_filename,
                            ast.language,
                            started.elapsed(),
                        ))
                        .await;
                }
            }

            self.store.delete_native_ast(job_id, ast.id).await?;
        }
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForDhscannerParsing
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
    let client = DhscannerParserClient::new(config.dhscanner_parser_url.clone());

    let worker = DhscannerParseWorker { store, client, logger };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
