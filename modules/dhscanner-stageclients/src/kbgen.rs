//! Client for the knowledge-base-fact generator, grounded on
//! `workers/kbgen/main.py`: the callable JSON is posted verbatim as the
//! request body, response JSON carries the generated fact strings under
//! `content`.

use serde::Deserialize;

const PATH: &str = "/kbgen";

#[derive(Deserialize)]
struct KbgenResponse {
    content: Vec<String>,
}

pub struct KbgenClient {
    client: reqwest::Client,
    base_url: String,
}

impl KbgenClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        KbgenClient {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn generate(
        &self,
        _original_filename: &str,
        callable_source: &[u8],
    ) -> anyhow::Result<Option<Vec<String>>> {
        let url = format!("{}{}", self.base_url, PATH);

        let response = match self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(callable_source.to_vec())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(_) => return Ok(None),
        };

        if !response.status().is_success() {
            return Ok(None);
        }

        let parsed: KbgenResponse = response.json().await?;
        Ok(Some(parsed.content))
    }
}
