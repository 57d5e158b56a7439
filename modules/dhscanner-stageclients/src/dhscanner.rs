//! Client for the dhscanner-AST normalizer, grounded on
//! `workers/dhscanner_parser/main.py`: one `{filename, content}` JSON POST
//! per native AST, keyed by source language. A 200 response carries either
//! the normalized AST or a domain-level parse failure
//! (`{"status":"FAILED","location":…}`) — the latter is not a transport
//! error, so it is surfaced as its own outcome rather than folded into
//! "unavailable".

use dhscanner_model::Language;
use serde::{Deserialize, Serialize};

fn path_for(language: Language) -> &'static str {
    match language {
        Language::Js => "/from/js/to/dhscanner/ast",
        Language::Ts => "/from/ts/to/dhscanner/ast",
        Language::Tsx => "/from/ts/to/dhscanner/ast",
        Language::Php | Language::BladePhp => "/from/php/to/dhscanner/ast",
        Language::Py => "/from/py/to/dhscanner/ast",
        Language::Rb => "/from/rb/to/dhscanner/ast",
        Language::Cs => "/from/cs/to/dhscanner/ast",
        Language::Go => "/from/go/to/dhscanner/ast",
        Language::All | Language::Unknown => "/from/py/to/dhscanner/ast",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailureLocation {
    pub filename: String,
    #[serde(rename = "lineStart")]
    pub line_start: i64,
    #[serde(rename = "colStart")]
    pub col_start: i64,
    #[serde(rename = "lineEnd")]
    pub line_end: i64,
    #[serde(rename = "colEnd")]
    pub col_end: i64,
}

impl FailureLocation {
    /// `[L1:C1-L2:C2]`, matching `sarif.Location.__str__` in the original's
    /// results worker — reused here as the `more_details` the log sink
    /// records for a dhscanner domain-failure.
    pub fn format(&self) -> String {
        format!("[{}:{}-{}:{}]", self.line_start, self.col_start, self.line_end, self.col_end)
    }
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: String,
    location: Option<FailureLocation>,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    filename: &'a str,
    content: &'a str,
}

pub enum DhscannerParseOutcome {
    /// Normalized AST JSON bytes, to be stored verbatim.
    Success(Vec<u8>),
    /// The normalizer understood the request but could not parse this file.
    DomainFailure(Option<FailureLocation>),
    /// Transport failure or non-2xx response: treat as a skip, not fatal.
    Unavailable,
}

pub struct DhscannerParserClient {
    client: reqwest::Client,
    base_url: String,
}

impl DhscannerParserClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        DhscannerParserClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn parse(
        &self,
        language: Language,
        original_filename: &str,
        native_ast: &[u8],
    ) -> anyhow::Result<DhscannerParseOutcome> {
        let url = format!("{}{}", self.base_url, path_for(language));
        let content = String::from_utf8_lossy(native_ast);
        let request = ParseRequest { filename: original_filename, content: &content };

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(resp) => resp,
            Err(_) => return Ok(DhscannerParseOutcome::Unavailable),
        };

        if !response.status().is_success() {
            return Ok(DhscannerParseOutcome::Unavailable);
        }

        let bytes = response.bytes().await?;
        if let Ok(envelope) = serde_json::from_slice::<StatusEnvelope>(&bytes) {
            if envelope.status == "FAILED" {
                return Ok(DhscannerParseOutcome::DomainFailure(envelope.location));
            }
        }
        Ok(DhscannerParseOutcome::Success(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blade_php_shares_the_plain_php_path() {
        assert_eq!(path_for(Language::BladePhp), path_for(Language::Php));
    }

    #[test]
    fn failed_envelope_is_recognized() {
        let body = br#"{"status":"FAILED","location":{"filename":"a.py","lineStart":3,"colStart":1,"lineEnd":3,"colEnd":2}}"#;
        let envelope: StatusEnvelope = serde_json::from_slice(body).unwrap();
        assert_eq!(envelope.status, "FAILED");
        let loc = envelope.location.unwrap();
        assert_eq!(loc.format(), "[3:1-3:2]");
    }

    #[test]
    fn ordinary_ast_body_does_not_look_like_a_failure_envelope() {
        let body = br#"{"nodeType":"Module","body":[]}"#;
        let envelope: Result<StatusEnvelope, _> = serde_json::from_slice(body);
        assert!(envelope.is_err());
    }
}
