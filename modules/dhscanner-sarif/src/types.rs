//! SARIF v2.1.0 document tree, grounded directly on
//! `workers/results/sarif.py`'s dataclass hierarchy.

use serde::Serialize;

/// One location in source: not part of the SARIF tree itself, the
/// intermediate shape the finding parser builds before `run()` lowers it
/// into a `SarifResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub filename: String,
    pub line_start: i64,
    pub line_end: i64,
    pub col_start: i64,
    pub col_end: i64,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}-{}:{}]", self.line_start, self.col_start, self.line_end, self.col_end)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Driver {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub start_line: i64,
    pub end_line: i64,
    pub start_column: i64,
    pub end_column: i64,
}

impl Region {
    pub fn default_zero() -> Self {
        Region { start_line: 0, end_line: 0, start_column: 0, end_column: 0 }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
    pub region: Region,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadFlowLocation {
    pub location: SarifLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadFlow {
    pub locations: Vec<ThreadFlowLocation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFlow {
    pub thread_flows: Vec<ThreadFlow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
    pub code_flows: Option<Vec<CodeFlow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifTool {
    pub driver: Driver,
}

#[derive(Debug, Clone, Serialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sarif {
    pub version: String,
    pub runs: Vec<SarifRun>,
}

const TOOL_NAME: &str = "dhscanner";

/// Build the one-result, one-codeflow document for a dataflow path: a
/// thread flow visiting every location in order, with the final location
/// also surfaced as the result's reported location.
pub fn run(path: &[Location], description: &str) -> Sarif {
    let thread_flow_locs: Vec<ThreadFlowLocation> = path
        .iter()
        .map(|loc| ThreadFlowLocation {
            location: SarifLocation {
                physical_location: PhysicalLocation {
                    artifact_location: ArtifactLocation { uri: loc.filename.clone() },
                    region: Region {
                        start_line: loc.line_start,
                        end_line: loc.line_end,
                        start_column: loc.col_start,
                        end_column: loc.col_end,
                    },
                },
            },
        })
        .collect();

    let final_location = thread_flow_locs
        .last()
        .map(|t| t.location.clone())
        .unwrap_or_else(|| SarifLocation {
            physical_location: PhysicalLocation {
                artifact_location: ArtifactLocation { uri: String::new() },
                region: Region::default_zero(),
            },
        });

    let code_flows = vec![CodeFlow { thread_flows: vec![ThreadFlow { locations: thread_flow_locs }] }];

    let result = SarifResult {
        rule_id: "dataflow".to_string(),
        message: SarifMessage { text: description.to_string() },
        locations: vec![final_location],
        code_flows: Some(code_flows),
    };

    Sarif {
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool { driver: Driver { name: TOOL_NAME.to_string() } },
            results: vec![result],
        }],
    }
}
