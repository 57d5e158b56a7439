//! Client for the code generator, grounded on `workers/codegen/main.py`:
//! the dhscanner AST JSON is posted verbatim as the request body, response
//! JSON carries the generated callables under `actualCallables`.

use serde::Deserialize;

const PATH: &str = "/codegen";

#[derive(Deserialize)]
struct CodegenResponse {
    #[serde(rename = "actualCallables")]
    actual_callables: Vec<serde_json::Value>,
}

pub struct CodegenClient {
    client: reqwest::Client,
    base_url: String,
}

impl CodegenClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        CodegenClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn generate(
        &self,
        _original_filename: &str,
        dhscanner_ast: &[u8],
    ) -> anyhow::Result<Option<Vec<serde_json::Value>>> {
        let url = format!("{}{}", self.base_url, PATH);

        let response = match self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(dhscanner_ast.to_vec())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(_) => return Ok(None),
        };

        if !response.status().is_success() {
            return Ok(None);
        }

        let parsed: CodegenResponse = response.json().await?;
        Ok(Some(parsed.actual_callables))
    }
}
