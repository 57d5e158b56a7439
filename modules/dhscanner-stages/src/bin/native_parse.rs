//! Native-parser stage binary: for every job waiting for native parsing,
//! fan out one request per uploaded source file to the per-language
//! native-parser service and store whatever AST comes back. Grounded on
//! `native_parser.py`'s top-level dispatch loop.

use std::time::Instant;

use async_trait::async_trait;
use dhscanner_common::Config;
use dhscanner_coordinator::StatusCoordinator;
use dhscanner_logsink::{LogMessage, Logger};
use dhscanner_model::{Context, JobId, JobStatus};
use dhscanner_stageclients::{NativeParserClient, NativeParserEndpoints};
use dhscanner_store::ArtifactStore;
use dhscanner_worker::{run_worker_loop, Worker, DEFAULT_CONCURRENCY};
use tracing_subscriber::EnvFilter;

struct NativeParseWorker {
    store: ArtifactStore,
    client: NativeParserClient,
    logger: Logger,
}

#[async_trait]
impl Worker for NativeParseWorker {
    async fn process(&self, job_id: &JobId) -> anyhow::Result<()> {
        let files = self.store.list_source_files(job_id).await?;
        for file in files {
            let started = Instant::now();
            let source = match self.store.load(job_id, &dhscanner_model::ArtifactKind::SourceFile, file.id).await? {
                Some(bytes) => bytes,
                None => continue,
            };

            match self.client.parse(file.language, &file.original_filename, &source).await? {
                Some(ast) => {
                    self.store
                        .save_native_ast(job_id, file.id, file.language, file.go_module_name.as_deref(), &ast)
                        .await?;
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::NativeParsingSucceeded,
                            &file.original_filename,
                            file.language,
                            started.elapsed(),
                        ))
                        .await;
                }
                None => {
                    self.logger
                        .info(LogMessage::new(
                            job_id.as_str(),
                            Context::NativeParsingFailed,
                            &file.original_filename,
                            file.language,
                            started.elapsed(),
                        ))
                        .await;
                }
            }

            self.store.delete_source_file(job_id, file.id).await?;
        }
        Ok(())
    }

    fn waiting_status(&self) -> JobStatus {
        JobStatus::WaitingForNativeParsing
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
    let client = NativeParserClient::new(NativeParserEndpoints {
        frontjs_url: config.frontjs_url.clone(),
        frontts_url: config.frontts_url.clone(),
        frontphp_url: config.frontphp_url.clone(),
        frontpy_url: config.frontpy_url.clone(),
        frontrb_url: config.frontrb_url.clone(),
        frontcs_url: config.frontcs_url.clone(),
        frontgo_url: config.frontgo_url.clone(),
    });

    let worker = NativeParseWorker { store, client, logger };
    run_worker_loop(coordinator, worker, DEFAULT_CONCURRENCY).await
}
