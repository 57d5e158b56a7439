pub mod parse;
pub mod types;

pub use types::{Location, Sarif};

/// The output a job's results stage produces: either a SARIF document
/// carrying the single finding the query engine reported, or the debug
/// envelope the original emits when no `: yes` finding is present at all.
/// Grounded on `workers/results/main.py`'s `Results.run`.
pub enum ResultsOutput {
    Sarif(Sarif),
    QueryEngineFailed,
}

impl ResultsOutput {
    /// The exact bytes the `Output` artifact stores.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResultsOutput::Sarif(doc) => {
                serde_json::to_vec(&doc).expect("Sarif serializes infallibly")
            }
            ResultsOutput::QueryEngineFailed => {
                serde_json::to_vec(&serde_json::json!({"debug": "query engine failed"}))
                    .expect("static json serializes infallibly")
            }
        }
    }
}

/// Turn raw query-engine output into the results stage's output. A
/// response with no `: yes` finding (or one whose edges don't parse)
/// yields the debug envelope rather than a valid-but-empty SARIF document
/// — matching the original, which never emits `{"runs":[{"results":[]}]}`.
pub fn generate_from_query_engine_output(content: &str, description: &str) -> ResultsOutput {
    if !content.contains(": yes") {
        return ResultsOutput::QueryEngineFailed;
    }
    let path = parse::parse_proper_path(content);
    if path.is_empty() {
        return ResultsOutput::QueryEngineFailed;
    }
    ResultsOutput::Sarif(types::run(&path, description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_engine_failure_text_yields_the_debug_envelope() {
        let output = generate_from_query_engine_output("nothing found", "owasp top 10");
        let bytes = output.into_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"debug": "query engine failed"}));
    }

    #[test]
    fn a_finding_yields_one_result_with_a_codeflow() {
        let content = "q1([(startloc_1_1_endloc_1_1_a_dot_py,startloc_2_2_endloc_2_2_b_dot_py)]): yes";
        let output = generate_from_query_engine_output(content, "owasp top 10");
        let ResultsOutput::Sarif(doc) = output else {
            panic!("expected a SARIF document");
        };
        assert_eq!(doc.runs[0].results.len(), 1);
        assert_eq!(doc.runs[0].results[0].message.text, "owasp top 10");
        assert!(doc.runs[0].results[0].code_flows.is_some());
    }

    #[test]
    fn empty_content_also_yields_the_debug_envelope() {
        let output = generate_from_query_engine_output("", "owasp top 10");
        let bytes = output.into_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"debug": "query engine failed"}));
    }

    /// A single source/sink edge within the same file yields one SARIF
    /// result whose reported location is the edge's destination and whose
    /// single code flow visits both endpoints.
    #[test]
    fn a_same_file_edge_yields_uri_and_two_flow_locations() {
        let content = "q1([(startloc_1_1_endloc_1_8_lib_dot_a_dot_py,\
                         startloc_1_1_endloc_1_8_lib_dot_a_dot_py)]): yes";
        let output = generate_from_query_engine_output(content, "owasp top 10");
        let ResultsOutput::Sarif(doc) = output else {
            panic!("expected a SARIF document");
        };
        let result = &doc.runs[0].results[0];
        assert_eq!(result.rule_id, "dataflow");
        assert_eq!(result.locations[0].physical_location.artifact_location.uri, "lib/a.py");
        assert_eq!(result.code_flows.as_ref().unwrap()[0].thread_flows[0].locations.len(), 2);
    }

    /// The wire JSON, not just the Rust struct fields, must use SARIF's
    /// camelCase property names — a struct-field assertion alone would
    /// pass even if `PhysicalLocation`'s `artifact_location` field
    /// serialized under its snake_case Rust name instead of `artifactLocation`.
    #[test]
    fn serialized_output_uses_sarif_camel_case_property_names() {
        let content = "q1([(startloc_1_1_endloc_1_8_lib_dot_a_dot_py,\
                         startloc_1_1_endloc_1_8_lib_dot_a_dot_py)]): yes";
        let output = generate_from_query_engine_output(content, "owasp top 10");
        let bytes = output.into_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let location = &value["runs"][0]["results"][0]["locations"][0];
        assert_eq!(
            location["physicalLocation"]["artifactLocation"]["uri"],
            serde_json::json!("lib/a.py")
        );
        assert!(location["physicalLocation"].get("artifact_location").is_none());
    }
}
