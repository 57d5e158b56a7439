//! Redis-backed job status map. Grounded on `coordinator/redis.py`: one key
//! per job, value a small JSON envelope `{"status": "..."}`. Listing jobs
//! waiting for a status is a full key scan filtered client-side — accepted
//! at this scale, same as the original. Unlike the original's blocking
//! `KEYS *`, this uses `SCAN`, which does not stall the single-threaded
//! Redis event loop while the coordinator iterates.

use anyhow::Result;
use dhscanner_model::{JobId, JobStatus};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct StatusEnvelope {
    status: String,
}

#[derive(Clone)]
pub struct StatusCoordinator {
    manager: redis::aio::ConnectionManager,
}

impl StatusCoordinator {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(StatusCoordinator { manager })
    }

    pub async fn get_status(&self, job_id: &JobId) -> Result<Option<JobStatus>> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(job_id.as_str()).await?;
        Ok(raw
            .and_then(|s| serde_json::from_str::<StatusEnvelope>(&s).ok())
            .and_then(|env| JobStatus::from_raw_str(&env.status)))
    }

    pub async fn set_status(&self, job_id: &JobId, status: JobStatus) -> Result<()> {
        let mut conn = self.manager.clone();
        let envelope = StatusEnvelope { status: status.as_str().to_string() };
        let payload = serde_json::to_string(&envelope)?;
        conn.set::<_, _, ()>(job_id.as_str(), payload).await?;
        Ok(())
    }

    /// List every job currently waiting for `desired`. On a Redis error,
    /// this logs a warning and returns an empty list rather than failing —
    /// a worker tick with nothing to do is harmless; a worker tick that
    /// panics on a transient Redis blip is not.
    pub async fn list_waiting_for(&self, desired: JobStatus) -> Vec<JobId> {
        let mut conn = self.manager.clone();
        let mut job_ids = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let scan_result: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await;

            let (next_cursor, keys) = match scan_result {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "coordinator not responding to SCAN");
                    return Vec::new();
                }
            };

            for key in keys {
                let job_id = JobId::from_raw(key);
                if let Ok(Some(status)) = self.get_status(&job_id).await {
                    if status == desired {
                        job_ids.push(job_id);
                    }
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        job_ids
    }

    /// Advance every listed job from `from_status` to its successor status.
    /// Best-effort per job: one failure is logged and does not block the
    /// rest of the batch.
    pub async fn mark_jobs_finished(&self, job_ids: &[JobId], from_status: JobStatus) {
        let Some(next) = from_status.next() else {
            warn!(status = from_status.as_str(), "attempted to advance past the terminal status");
            return;
        };
        for job_id in job_ids {
            if let Err(e) = self.set_status(job_id, next).await {
                warn!(job_id = %job_id, error = %e, "failed to advance job status");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_envelope_round_trips_through_json() {
        let env = StatusEnvelope { status: JobStatus::WaitingForCodegen.as_str().to_string() };
        let json = serde_json::to_string(&env).unwrap();
        let decoded: StatusEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(JobStatus::from_raw_str(&decoded.status), Some(JobStatus::WaitingForCodegen));
    }
}
