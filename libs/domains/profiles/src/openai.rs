//! Connection settings shared by the OpenAI embedding and chat clients.

use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};
use reqwest::Client;

use crate::error::{ProfileError, ProfileResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI-compatible API configuration
#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub summary_model: String,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build an HTTP client honouring the configured timeout.
    pub(crate) fn http_client(&self) -> ProfileResult<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ProfileError::Config(format!("Failed to build HTTP client: {}", e)))
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

// The key stays out of logs.
impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("summary_model", &self.summary_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl FromEnv for OpenAIConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            embedding_model: env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            summary_model: env_or_default("OPENAI_SUMMARY_MODEL", DEFAULT_SUMMARY_MODEL),
            timeout_secs: env_parse_or("OPENAI_TIMEOUT_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            let err = OpenAIConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "OPENAI_API_KEY"));
        });
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_BASE_URL", None),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("OPENAI_SUMMARY_MODEL", None),
                ("OPENAI_TIMEOUT_SECS", None),
            ],
            || {
                let config = OpenAIConfig::from_env().unwrap();
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.embedding_model, "text-embedding-3-small");
                assert_eq!(config.summary_model, "gpt-3.5-turbo");
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = OpenAIConfig::new("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = OpenAIConfig::new("k").with_base_url("http://localhost:9000/v1/");
        assert_eq!(
            config.endpoint("embeddings"),
            "http://localhost:9000/v1/embeddings"
        );
    }
}

/// Local stand-in for an OpenAI-compatible endpoint.
#[cfg(test)]
pub(crate) mod stub {
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// Authorization header and JSON body of each request received
    pub(crate) type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    struct Canned {
        status: StatusCode,
        body: &'static str,
        captured: Captured,
    }

    async fn reply(
        State(canned): State<Arc<Canned>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        canned.captured.lock().unwrap().push((auth, body));
        (
            canned.status,
            [(header::CONTENT_TYPE, "application/json")],
            canned.body,
        )
    }

    /// Answer `POST /v1/{path}` with `status` and `body`; returns the base URL.
    pub(crate) async fn spawn(path: &str, status: u16, body: &'static str) -> (String, Captured) {
        let captured = Captured::default();
        let canned = Arc::new(Canned {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            captured: captured.clone(),
        });
        let app = Router::new()
            .route(&format!("/v1/{}", path), post(reply))
            .with_state(canned);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await });

        (base_url, captured)
    }

    /// Nothing listens here, so requests fail before any response.
    pub(crate) const UNREACHABLE: &str = "http://127.0.0.1:1/v1";
}
