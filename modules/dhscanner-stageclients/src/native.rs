//! Client for the per-language native parser services, grounded on
//! `native_parser.py`'s `AST_BUILDER_URL` table (one distinct host per
//! language) and `add_php_asts`'s blade.php preflight.

use dhscanner_model::Language;

/// One base URL plus path per language's native-parse endpoint, matching
/// the original's distinct `frontjs`/`frontts`/`frontphp`/`frontpy`/
/// `frontrb`/`frontcs`/`frontgo` deployments.
#[derive(Debug, Clone)]
pub struct NativeParserEndpoints {
    pub frontjs_url: String,
    pub frontts_url: String,
    pub frontphp_url: String,
    pub frontpy_url: String,
    pub frontrb_url: String,
    pub frontcs_url: String,
    pub frontgo_url: String,
}

impl NativeParserEndpoints {
    fn url_for(&self, language: Language) -> String {
        match language {
            Language::Js => format!("{}/to/esprima/js/ast", self.frontjs_url),
            Language::Ts | Language::Tsx => format!("{}/to/native/ts/ast", self.frontts_url),
            Language::Php => format!("{}/to/php/ast", self.frontphp_url),
            Language::BladePhp => format!("{}/to/php/code", self.frontphp_url),
            Language::Py => format!("{}/to/native/py/ast", self.frontpy_url),
            Language::Rb => format!("{}/to/native/cruby/ast", self.frontrb_url),
            Language::Cs => format!("{}/to/native/cs/ast", self.frontcs_url),
            Language::Go => format!("{}/to/native/go/ast", self.frontgo_url),
            Language::All | Language::Unknown => format!("{}/to/native/py/ast", self.frontpy_url),
        }
    }
}

pub struct NativeParserClient {
    client: reqwest::Client,
    endpoints: NativeParserEndpoints,
}

impl NativeParserClient {
    pub fn new(endpoints: NativeParserEndpoints) -> Self {
        NativeParserClient {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Parse one source file. `None` means the service did not return a
    /// usable AST — a skip, not an error, matching the original's
    /// `if response.status == 200` gate with nothing raised otherwise.
    pub async fn parse(
        &self,
        language: Language,
        filename: &str,
        source: &[u8],
    ) -> anyhow::Result<Option<Vec<u8>>> {
        if language == Language::BladePhp {
            return self.parse_blade_php(filename, source).await;
        }
        self.post_source(&self.endpoints.url_for(language), filename, source).await
    }

    /// Blade-PHP preflight: try the plain PHP endpoint first (some
    /// `.blade.php` files are just plain PHP); only on failure, resubmit
    /// through the blade preflight endpoint and feed its output back into
    /// the plain PHP endpoint.
    async fn parse_blade_php(&self, filename: &str, source: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let plain_url = self.endpoints.url_for(Language::Php);
        let plain = self.post_source(&plain_url, filename, source).await?;
        if plain.is_some() {
            return Ok(plain);
        }

        let preflight_url = self.endpoints.url_for(Language::BladePhp);
        let preflighted = self.post_source(&preflight_url, filename, source).await?;
        match preflighted {
            Some(rewritten) => self.post_source(&plain_url, filename, &rewritten).await,
            None => Ok(None),
        }
    }

    async fn post_source(&self, url: &str, filename: &str, source: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let part = reqwest::multipart::Part::bytes(source.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("source", part);

        let response = match self.client.post(url).multipart(form).send().await {
            Ok(resp) => resp,
            Err(_) => return Ok(None),
        };

        if !response.status().is_success() {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> NativeParserEndpoints {
        NativeParserEndpoints {
            frontjs_url: "http://frontjs:3000".to_string(),
            frontts_url: "http://frontts:3000".to_string(),
            frontphp_url: "http://frontphp:5000".to_string(),
            frontpy_url: "http://frontpy:5000".to_string(),
            frontrb_url: "http://frontrb:3000".to_string(),
            frontcs_url: "http://frontcs:8080".to_string(),
            frontgo_url: "http://frontgo:8080".to_string(),
        }
    }

    #[test]
    fn blade_php_uses_the_blade_preflight_path_on_the_php_host() {
        let e = endpoints();
        assert_eq!(e.url_for(Language::BladePhp), "http://frontphp:5000/to/php/code");
        assert_eq!(e.url_for(Language::Php), "http://frontphp:5000/to/php/ast");
    }

    #[test]
    fn tsx_shares_the_ts_host_and_path() {
        let e = endpoints();
        assert_eq!(e.url_for(Language::Tsx), e.url_for(Language::Ts));
    }

    #[test]
    fn each_language_resolves_to_its_own_host() {
        let e = endpoints();
        assert_eq!(e.url_for(Language::Js), "http://frontjs:3000/to/esprima/js/ast");
        assert_eq!(e.url_for(Language::Py), "http://frontpy:5000/to/native/py/ast");
        assert_eq!(e.url_for(Language::Rb), "http://frontrb:3000/to/native/cruby/ast");
        assert_eq!(e.url_for(Language::Cs), "http://frontcs:8080/to/native/cs/ast");
        assert_eq!(e.url_for(Language::Go), "http://frontgo:8080/to/native/go/ast");
    }
}
