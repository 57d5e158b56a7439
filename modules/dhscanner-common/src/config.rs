use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub db_path: String,
    pub artifact_root: String,

    // Status coordinator
    pub redis_url: String,

    // Log sink
    pub log_sink_url: String,

    // Ingress
    pub ingress_host: String,
    pub ingress_port: u16,
    pub bearer_token: String,
    pub approved_urls: Vec<String>,

    // Native parser services: one host per language, matching the
    // original's distinct `frontjs`/`frontts`/`frontphp`/`frontpy`/
    // `frontrb`/`frontcs`/`frontgo` deployments.
    pub frontjs_url: String,
    pub frontts_url: String,
    pub frontphp_url: String,
    pub frontpy_url: String,
    pub frontrb_url: String,
    pub frontcs_url: String,
    pub frontgo_url: String,

    // Stage endpoints (dhscanner parser / codegen / kbgen / queryengine)
    pub dhscanner_parser_url: String,
    pub codegen_url: String,
    pub kbgen_url: String,
    pub queryengine_url: String,

    // Results
    pub sarif_description: String,
}

impl Config {
    /// Load config for the ingress API binary.
    pub fn ingress_from_env() -> Self {
        Self {
            db_path: db_path_from_env(),
            artifact_root: artifact_root_from_env(),
            redis_url: redis_url_from_env(),
            log_sink_url: log_sink_url_from_env(),
            ingress_host: env::var("INGRESS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            ingress_port: env::var("INGRESS_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("INGRESS_PORT must be a number"),
            bearer_token: required_env("APPROVED_BEARER_TOKEN_0"),
            approved_urls: approved_urls_from_env(),
            frontjs_url: String::new(),
            frontts_url: String::new(),
            frontphp_url: String::new(),
            frontpy_url: String::new(),
            frontrb_url: String::new(),
            frontcs_url: String::new(),
            frontgo_url: String::new(),
            dhscanner_parser_url: String::new(),
            codegen_url: String::new(),
            kbgen_url: String::new(),
            queryengine_url: String::new(),
            sarif_description: sarif_description_from_env(),
        }
    }

    /// Load config shared by the six stage-worker binaries.
    pub fn worker_from_env() -> Self {
        Self {
            db_path: db_path_from_env(),
            artifact_root: artifact_root_from_env(),
            redis_url: redis_url_from_env(),
            log_sink_url: log_sink_url_from_env(),
            ingress_host: String::new(),
            ingress_port: 0,
            bearer_token: String::new(),
            approved_urls: Vec::new(),
            frontjs_url: env::var("FRONTJS_URL").unwrap_or_else(|_| "http://frontjs:3000".to_string()),
            frontts_url: env::var("FRONTTS_URL").unwrap_or_else(|_| "http://frontts:3000".to_string()),
            frontphp_url: env::var("FRONTPHP_URL").unwrap_or_else(|_| "http://frontphp:5000".to_string()),
            frontpy_url: env::var("FRONTPY_URL").unwrap_or_else(|_| "http://frontpy:5000".to_string()),
            frontrb_url: env::var("FRONTRB_URL").unwrap_or_else(|_| "http://frontrb:3000".to_string()),
            frontcs_url: env::var("FRONTCS_URL").unwrap_or_else(|_| "http://frontcs:8080".to_string()),
            frontgo_url: env::var("FRONTGO_URL").unwrap_or_else(|_| "http://frontgo:8080".to_string()),
            dhscanner_parser_url: env::var("DHSCANNER_PARSER_URL")
                .unwrap_or_else(|_| "http://parsers:3000".to_string()),
            codegen_url: env::var("CODEGEN_URL").unwrap_or_else(|_| "http://codegen:3000".to_string()),
            kbgen_url: env::var("KBGEN_URL").unwrap_or_else(|_| "http://kbgen:3000".to_string()),
            queryengine_url: env::var("QUERYENGINE_URL")
                .unwrap_or_else(|_| "http://queryengine:5000".to_string()),
            sarif_description: sarif_description_from_env(),
        }
    }

    /// Load config for the schema-bootstrap binary (store path only).
    pub fn migrate_from_env() -> Self {
        Self {
            db_path: db_path_from_env(),
            artifact_root: artifact_root_from_env(),
            redis_url: String::new(),
            log_sink_url: String::new(),
            ingress_host: String::new(),
            ingress_port: 0,
            bearer_token: String::new(),
            approved_urls: Vec::new(),
            frontjs_url: String::new(),
            frontts_url: String::new(),
            frontphp_url: String::new(),
            frontpy_url: String::new(),
            frontrb_url: String::new(),
            frontcs_url: String::new(),
            frontgo_url: String::new(),
            dhscanner_parser_url: String::new(),
            codegen_url: String::new(),
            kbgen_url: String::new(),
            queryengine_url: String::new(),
            sarif_description: sarif_description_from_env(),
        }
    }

    /// Log the shape of sensitive config without leaking secret values.
    pub fn log_redacted(&self) {
        let redacted = [
            ("APPROVED_BEARER_TOKEN_0", &self.bearer_token),
            ("DHSCANNER_REDIS_URL", &self.redis_url),
        ];
        for (name, value) in redacted {
            if value.is_empty() {
                tracing::info!("{name} = (empty)");
            } else {
                tracing::info!("{name} = ({} chars)", value.len());
            }
        }
        tracing::info!(db_path = %self.db_path, artifact_root = %self.artifact_root, "configuration loaded");
    }
}

fn db_path_from_env() -> String {
    env::var("DHSCANNER_DB_PATH").unwrap_or_else(|_| "./dhscanner.sqlite".to_string())
}

fn artifact_root_from_env() -> String {
    env::var("DHSCANNER_ARTIFACT_ROOT").unwrap_or_else(|_| "./dhscanner-artifacts".to_string())
}

fn redis_url_from_env() -> String {
    env::var("DHSCANNER_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn log_sink_url_from_env() -> String {
    env::var("DHSCANNER_LOG_SINK_URL").unwrap_or_else(|_| "http://logger:8000/log".to_string())
}

fn sarif_description_from_env() -> String {
    env::var("DHSCANNER_SARIF_DESCRIPTION").unwrap_or_else(|_| "owasp top 10".to_string())
}

/// `NUM_APPROVED_URLS` approved callback URLs, named `APPROVED_URL_0`..`APPROVED_URL_{n-1}`.
/// Defaults to a single slug, `"scan"`, when unset.
fn approved_urls_from_env() -> Vec<String> {
    let count: usize = env::var("NUM_APPROVED_URLS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    (0..count)
        .map(|i| env::var(format!("APPROVED_URL_{i}")).unwrap_or_else(|_| "scan".to_string()))
        .collect()
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_defaults_when_unset() {
        std::env::remove_var("DHSCANNER_DB_PATH");
        assert_eq!(db_path_from_env(), "./dhscanner.sqlite");
    }

    #[test]
    fn sarif_description_defaults_to_owasp_top_10() {
        std::env::remove_var("DHSCANNER_SARIF_DESCRIPTION");
        assert_eq!(sarif_description_from_env(), "owasp top 10");
    }

    #[test]
    fn approved_urls_default_to_a_single_scan_slug() {
        std::env::remove_var("NUM_APPROVED_URLS");
        std::env::remove_var("APPROVED_URL_0");
        assert_eq!(approved_urls_from_env(), vec!["scan".to_string()]);
    }
}
