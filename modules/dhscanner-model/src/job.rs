use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque job identifier: 32 lowercase hex characters, matching the width
/// (but not necessarily the entropy source) of the original's
/// `secrets.token_hex(16)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        JobId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        JobId(raw.into())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The artifact kinds the store persists. `Callables` and `Facts` are
/// indexed — codegen emits one callable per detected function, kbgen emits
/// one facts blob per callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    SourceFile,
    NativeAst,
    DhscannerAst,
    Callable(usize),
    Facts(usize),
    Results,
    Output,
}

impl ArtifactKind {
    /// Filesystem suffix this artifact kind is stored under, matching the
    /// one-file-per-instance layout of the original local storage backend.
    pub fn file_suffix(&self) -> String {
        match self {
            ArtifactKind::SourceFile => ".src".to_string(),
            ArtifactKind::NativeAst => ".native.ast".to_string(),
            ArtifactKind::DhscannerAst => ".dhscanner.ast.json".to_string(),
            ArtifactKind::Callable(i) => format!(".callable.{i}.json"),
            ArtifactKind::Facts(i) => format!(".facts.{i}.txt"),
            ArtifactKind::Results => ".results.txt".to_string(),
            ArtifactKind::Output => ".output.sarif.json".to_string(),
        }
    }
}

/// The fixed pipeline status sequence. Each variant names the stage the job
/// is *waiting for*; the terminal variant means SARIF generation finished.
/// Status only ever moves forward — there is no status rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    WaitingForNativeParsing,
    WaitingForDhscannerParsing,
    WaitingForCodegen,
    WaitingForKbgen,
    WaitingForQueryengine,
    WaitingForResultsGeneration,
    Finished,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::WaitingForNativeParsing,
        JobStatus::WaitingForDhscannerParsing,
        JobStatus::WaitingForCodegen,
        JobStatus::WaitingForKbgen,
        JobStatus::WaitingForQueryengine,
        JobStatus::WaitingForResultsGeneration,
        JobStatus::Finished,
    ];

    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::WaitingForNativeParsing => 0,
            JobStatus::WaitingForDhscannerParsing => 1,
            JobStatus::WaitingForCodegen => 2,
            JobStatus::WaitingForKbgen => 3,
            JobStatus::WaitingForQueryengine => 4,
            JobStatus::WaitingForResultsGeneration => 5,
            JobStatus::Finished => 6,
        }
    }

    /// The status a job advances to once the stage it is currently waiting
    /// for finishes. `None` for the terminal status.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::WaitingForNativeParsing => Some(JobStatus::WaitingForDhscannerParsing),
            JobStatus::WaitingForDhscannerParsing => Some(JobStatus::WaitingForCodegen),
            JobStatus::WaitingForCodegen => Some(JobStatus::WaitingForKbgen),
            JobStatus::WaitingForKbgen => Some(JobStatus::WaitingForQueryengine),
            JobStatus::WaitingForQueryengine => Some(JobStatus::WaitingForResultsGeneration),
            JobStatus::WaitingForResultsGeneration => Some(JobStatus::Finished),
            JobStatus::Finished => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::WaitingForNativeParsing => "WaitingForNativeParsing",
            JobStatus::WaitingForDhscannerParsing => "WaitingForDhscannerParsing",
            JobStatus::WaitingForCodegen => "WaitingForCodegen",
            JobStatus::WaitingForKbgen => "WaitingForKbgen",
            JobStatus::WaitingForQueryengine => "WaitingForQueryengine",
            JobStatus::WaitingForResultsGeneration => "WaitingForResultsGeneration",
            JobStatus::Finished => "Finished",
        }
    }

    pub fn from_raw_str(raw: &str) -> Option<JobStatus> {
        JobStatus::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_is_32_hex_chars() {
        let id = JobId::new();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn status_advances_monotonically_to_terminal() {
        let mut status = JobStatus::WaitingForNativeParsing;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            assert!(next.rank() > status.rank());
            status = next;
            seen.push(status);
        }
        assert_eq!(status, JobStatus::Finished);
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in JobStatus::ALL {
            assert_eq!(JobStatus::from_raw_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn only_terminal_status_has_no_next() {
        assert_eq!(JobStatus::Finished.next(), None);
    }
}
