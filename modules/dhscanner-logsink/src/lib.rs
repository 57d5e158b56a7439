//! HTTP client for the external log sink. Every stage, the coordinator, and
//! the ingress API emit structured lifecycle records here; the sink itself
//! is out of scope (grounded on `logger/client.py` and `logger/models.py`).

use std::time::Duration;

use dhscanner_model::{Context, Language};
use serde::Serialize;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

/// One lifecycle record. `duration` is the wall-clock time the logged
/// operation took, serialized as fractional seconds. `more_details` and
/// `corresponding_byte_size` are the two fields the original's ~10-field
/// event record carries beyond the common core — optional because most
/// contexts (success/failure with no extra payload) have nothing to put
/// there.
#[derive(Debug, Clone, Serialize)]
pub struct LogMessage {
    pub file_unique_id: String,
    pub job_id: String,
    pub context: Context,
    pub original_filename: String,
    pub language: Language,
    pub duration_secs: f64,
    pub more_details: Option<String>,
    pub corresponding_byte_size: Option<u64>,
}

impl LogMessage {
    pub fn new(
        job_id: impl Into<String>,
        context: Context,
        original_filename: impl Into<String>,
        language: Language,
        duration: Duration,
    ) -> Self {
        LogMessage {
            file_unique_id: uuid::Uuid::new_v4().to_string(),
            job_id: job_id.into(),
            context,
            original_filename: original_filename.into(),
            language,
            duration_secs: duration.as_secs_f64(),
            more_details: None,
            corresponding_byte_size: None,
        }
    }

    /// Attach free-text detail, e.g. the `[L1:C1-L2:C2]` location of a
    /// dhscanner domain-parse failure.
    pub fn with_more_details(mut self, details: impl Into<String>) -> Self {
        self.more_details = Some(details.into());
        self
    }

    /// Attach the byte size of the artifact the logged operation produced
    /// or consumed.
    pub fn with_byte_size(mut self, size: u64) -> Self {
        self.corresponding_byte_size = Some(size);
        self
    }
}

/// Best-effort log client. A failed delivery is retried up to three times
/// with the delay doubling between attempts (0.5s, 1.0s, 2.0s); after the
/// final attempt the record is dropped and a warning is logged locally —
/// the pipeline never blocks on logging.
#[derive(Clone)]
pub struct Logger {
    client: reqwest::Client,
    base_url: String,
}

impl Logger {
    pub fn new(base_url: impl Into<String>) -> Self {
        Logger {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn send_attempt(&self, message: &LogMessage, level: Level) -> bool {
        let url = format!("{}/{}", self.base_url, level_path(level));
        match self.client.post(&url).json(message).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn send(&self, message: LogMessage, level: Level) {
        let mut delay = RETRY_DELAY;
        for attempt in 0..MAX_RETRIES {
            if self.send_attempt(&message, level).await {
                return;
            }
            if attempt + 1 < MAX_RETRIES {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
        warn!(
            job_id = %message.job_id,
            context = %message.context,
            "failed to deliver log record after {MAX_RETRIES} attempts"
        );
    }

    pub async fn debug(&self, message: LogMessage) {
        self.send(message, Level::Debug).await;
    }

    pub async fn info(&self, message: LogMessage) {
        self.send(message, Level::Info).await;
    }

    pub async fn warning(&self, message: LogMessage) {
        self.send(message, Level::Warning).await;
    }

    pub async fn error(&self, message: LogMessage) {
        self.send(message, Level::Error).await;
    }
}

fn level_path(level: Level) -> &'static str {
    match level {
        Level::Debug => "DEBUG",
        Level::Info => "INFO",
        Level::Warning => "WARNING",
        Level::Error => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_paths_match_original_case() {
        assert_eq!(level_path(Level::Debug), "DEBUG");
        assert_eq!(level_path(Level::Error), "ERROR");
    }

    #[test]
    fn log_message_duration_round_trips_as_seconds() {
        let msg = LogMessage::new(
            "job-1",
            Context::UploadFile,
            "main.py",
            Language::Py,
            Duration::from_millis(1500),
        );
        assert!((msg.duration_secs - 1.5).abs() < f64::EPSILON);
    }
}
