//! Client for the query engine, grounded on `workers/queryengine/main.py`.
//! The knowledge base is submitted as both the `kb` and `queries` form
//! fields — the original submits the same deduplicated, sorted blob
//! under both names, evaluating the full fact set against itself. Kept
//! verbatim; see DESIGN.md's Open Questions.

use std::collections::BTreeSet;

const PATH: &str = "/check";

/// Flatten every stage's fact lines into one deduplicated, lexicographically
/// sorted blob, newline-joined — matches
/// `'\n'.join(sorted(set(flatten)))`.
pub fn build_kb<I: IntoIterator<Item = String>>(fact_lines: I) -> String {
    let unique: BTreeSet<String> = fact_lines.into_iter().collect();
    unique.into_iter().collect::<Vec<_>>().join("\n")
}

pub struct QueryengineClient {
    client: reqwest::Client,
    base_url: String,
}

impl QueryengineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        QueryengineClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Evaluate the knowledge base. Returns the raw response text on 200.
    /// `Err` carries the status/exception detail the original logs as
    /// `more_details` on failure.
    pub async fn check(&self, kb: &str) -> anyhow::Result<String> {
        let url = format!("{}{}", self.base_url, PATH);
        let form = reqwest::multipart::Form::new()
            .text("kb", kb.to_string())
            .text("queries", kb.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("response status: {status}");
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_kb_dedupes_and_sorts() {
        let lines = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(build_kb(lines), "a\nb");
    }

    #[test]
    fn build_kb_of_empty_input_is_empty_string() {
        assert_eq!(build_kb(Vec::<String>::new()), "");
    }
}
