use crate::{env_or_default, ConfigError, FromEnv};

/// Cross-origin policy for browser clients.
///
/// `CORS_ALLOWED_ORIGIN` is either `*` (any origin) or a comma-separated
/// list such as `http://localhost:8080,https://roster.example.com`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CorsConfig {
    #[default]
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Ok(CorsConfig::AnyOrigin);
        }

        let origins: Vec<String> = trimmed
            .split(',')
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "expected '*' or at least one origin".to_string(),
            });
        }

        if origins.iter().any(|o| o == "*") {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "'*' cannot be combined with explicit origins".to_string(),
            });
        }

        Ok(CorsConfig::Origins(origins))
    }
}

impl FromEnv for CorsConfig {
    /// Reads CORS_ALLOWED_ORIGIN, defaulting to `*`.
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_or_default("CORS_ALLOWED_ORIGIN", "*"))
    }
}
