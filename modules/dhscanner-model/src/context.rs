use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// The closed set of lifecycle events the log sink accepts. Expands the
/// original ten-event vocabulary with an explicit success/failure/skip
/// variant for every branch a stage can actually take, plus coordinator,
/// store, and ingress events the distilled event list never named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    UploadFile,
    GetJobId,
    ReadSourceFileSucceeded,
    ReadSourceFileFailed,

    NativeParsingSucceeded,
    NativeParsingFailed,
    NativeParsingSkipped,

    DhscannerParsingSucceeded,
    DhscannerParsingFailed,

    CodegenSucceeded,
    CodegenFailed,

    KbgenSucceeded,
    KbgenFailed,

    QueryengineSucceeded,
    QueryengineFailed,

    ResultsSucceeded,
    ResultsFailed,

    CoordinatorNotResponding,

    ArtifactLoadAbsent,
    ArtifactSaveFailed,
    ArtifactDeleteFailed,

    WorkerTickStarted,
    WorkerTickCompleted,

    JobCreated,
    JobStatusAdvanced,

    AuthRejected,
    RateLimited,

    IngressUploadRejected,
    IngressAnalyzeRequested,
    IngressStatusRequested,
    IngressResultsRequested,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::UploadFile => "UPLOAD_FILE",
            Context::GetJobId => "GET_JOB_ID",
            Context::ReadSourceFileSucceeded => "READ_SOURCE_FILE_SUCCEEDED",
            Context::ReadSourceFileFailed => "READ_SOURCE_FILE_FAILED",
            Context::NativeParsingSucceeded => "NATIVE_PARSING_SUCCEEDED",
            Context::NativeParsingFailed => "NATIVE_PARSING_FAILED",
            Context::NativeParsingSkipped => "NATIVE_PARSING_SKIPPED",
            Context::DhscannerParsingSucceeded => "DHSCANNER_PARSING_SUCCEEDED",
            Context::DhscannerParsingFailed => "DHSCANNER_PARSING_FAILED",
            Context::CodegenSucceeded => "CODEGEN_SUCCEEDED",
            Context::CodegenFailed => "CODEGEN_FAILED",
            Context::KbgenSucceeded => "KBGEN_SUCCEEDED",
            Context::KbgenFailed => "KBGEN_FAILED",
            Context::QueryengineSucceeded => "QUERYENGINE_SUCCEEDED",
            Context::QueryengineFailed => "QUERYENGINE_FAILED",
            Context::ResultsSucceeded => "RESULTS_SUCCEEDED",
            Context::ResultsFailed => "RESULTS_FAILED",
            Context::CoordinatorNotResponding => "COORDINATOR_NOT_RESPONDING",
            Context::ArtifactLoadAbsent => "ARTIFACT_LOAD_ABSENT",
            Context::ArtifactSaveFailed => "ARTIFACT_SAVE_FAILED",
            Context::ArtifactDeleteFailed => "ARTIFACT_DELETE_FAILED",
            Context::WorkerTickStarted => "WORKER_TICK_STARTED",
            Context::WorkerTickCompleted => "WORKER_TICK_COMPLETED",
            Context::JobCreated => "JOB_CREATED",
            Context::JobStatusAdvanced => "JOB_STATUS_ADVANCED",
            Context::AuthRejected => "AUTH_REJECTED",
            Context::RateLimited => "RATE_LIMITED",
            Context::IngressUploadRejected => "INGRESS_UPLOAD_REJECTED",
            Context::IngressAnalyzeRequested => "INGRESS_ANALYZE_REQUESTED",
            Context::IngressStatusRequested => "INGRESS_STATUS_REQUESTED",
            Context::IngressResultsRequested => "INGRESS_RESULTS_REQUESTED",
        }
    }

    pub fn from_raw_str(raw: &str) -> Option<Context> {
        Some(match raw {
            "UPLOAD_FILE" => Context::UploadFile,
            "GET_JOB_ID" => Context::GetJobId,
            "READ_SOURCE_FILE_SUCCEEDED" => Context::ReadSourceFileSucceeded,
            "READ_SOURCE_FILE_FAILED" => Context::ReadSourceFileFailed,
            "NATIVE_PARSING_SUCCEEDED" => Context::NativeParsingSucceeded,
            "NATIVE_PARSING_FAILED" => Context::NativeParsingFailed,
            "NATIVE_PARSING_SKIPPED" => Context::NativeParsingSkipped,
            "DHSCANNER_PARSING_SUCCEEDED" => Context::DhscannerParsingSucceeded,
            "DHSCANNER_PARSING_FAILED" => Context::DhscannerParsingFailed,
            "CODEGEN_SUCCEEDED" => Context::CodegenSucceeded,
            "CODEGEN_FAILED" => Context::CodegenFailed,
            "KBGEN_SUCCEEDED" => Context::KbgenSucceeded,
            "KBGEN_FAILED" => Context::KbgenFailed,
            "QUERYENGINE_SUCCEEDED" => Context::QueryengineSucceeded,
            "QUERYENGINE_FAILED" => Context::QueryengineFailed,
            "RESULTS_SUCCEEDED" => Context::ResultsSucceeded,
            "RESULTS_FAILED" => Context::ResultsFailed,
            "COORDINATOR_NOT_RESPONDING" => Context::CoordinatorNotResponding,
            "ARTIFACT_LOAD_ABSENT" => Context::ArtifactLoadAbsent,
            "ARTIFACT_SAVE_FAILED" => Context::ArtifactSaveFailed,
            "ARTIFACT_DELETE_FAILED" => Context::ArtifactDeleteFailed,
            "WORKER_TICK_STARTED" => Context::WorkerTickStarted,
            "WORKER_TICK_COMPLETED" => Context::WorkerTickCompleted,
            "JOB_CREATED" => Context::JobCreated,
            "JOB_STATUS_ADVANCED" => Context::JobStatusAdvanced,
            "AUTH_REJECTED" => Context::AuthRejected,
            "RATE_LIMITED" => Context::RateLimited,
            "INGRESS_UPLOAD_REJECTED" => Context::IngressUploadRejected,
            "INGRESS_ANALYZE_REQUESTED" => Context::IngressAnalyzeRequested,
            "INGRESS_STATUS_REQUESTED" => Context::IngressStatusRequested,
            "INGRESS_RESULTS_REQUESTED" => Context::IngressResultsRequested,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializes to the UPPERCASE_SNAKE wire form the log sink expects (the
/// same one `as_str()` produces for local logging), not the Rust variant
/// name a bare `#[derive(Serialize)]` would emit.
impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Context::from_raw_str(&raw).ok_or_else(|| D::Error::custom(format!("unknown log context: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_distinct_wire_name() {
        let all = [
            Context::UploadFile,
            Context::GetJobId,
            Context::ReadSourceFileSucceeded,
            Context::ReadSourceFileFailed,
            Context::NativeParsingSucceeded,
            Context::NativeParsingFailed,
            Context::NativeParsingSkipped,
            Context::DhscannerParsingSucceeded,
            Context::DhscannerParsingFailed,
            Context::CodegenSucceeded,
            Context::CodegenFailed,
            Context::KbgenSucceeded,
            Context::KbgenFailed,
            Context::QueryengineSucceeded,
            Context::QueryengineFailed,
            Context::ResultsSucceeded,
            Context::ResultsFailed,
            Context::CoordinatorNotResponding,
            Context::ArtifactLoadAbsent,
            Context::ArtifactSaveFailed,
            Context::ArtifactDeleteFailed,
            Context::WorkerTickStarted,
            Context::WorkerTickCompleted,
            Context::JobCreated,
            Context::JobStatusAdvanced,
            Context::AuthRejected,
            Context::RateLimited,
            Context::IngressUploadRejected,
            Context::IngressAnalyzeRequested,
            Context::IngressStatusRequested,
            Context::IngressResultsRequested,
        ];
        let mut names: Vec<&str> = all.iter().map(|c| c.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all.len());

        for context in all {
            assert_eq!(Context::from_raw_str(context.as_str()), Some(context));
        }
    }

    /// The log sink receives the UPPERCASE_SNAKE event name, e.g.
    /// `DHSCANNER_PARSING_FAILED` (matching S3), not the Rust variant name
    /// a bare `#[derive(Serialize)]` would have produced.
    #[test]
    fn serializes_to_the_documented_wire_name() {
        let json = serde_json::to_string(&Context::DhscannerParsingFailed).unwrap();
        assert_eq!(json, "\"DHSCANNER_PARSING_FAILED\"");
    }

    #[test]
    fn deserializes_from_the_documented_wire_name() {
        let context: Context = serde_json::from_str("\"DHSCANNER_PARSING_FAILED\"").unwrap();
        assert_eq!(context, Context::DhscannerParsingFailed);
    }

    #[test]
    fn unknown_wire_name_fails_to_deserialize() {
        let result: Result<Context, _> = serde_json::from_str("\"NOT_A_REAL_CONTEXT\"");
        assert!(result.is_err());
    }
}
