use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};

pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_API_VERSION: &str = "2024-07";

/// Pinecone connection configuration
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub control_url: String,
    pub cloud: String,
    pub region: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            control_url: DEFAULT_CONTROL_URL.to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_control_url(mut self, control_url: impl Into<String>) -> Self {
        self.control_url = control_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("control_url", &self.control_url)
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl FromEnv for PineconeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("PINECONE_API_KEY")?,
            control_url: env_or_default("PINECONE_CONTROL_URL", DEFAULT_CONTROL_URL),
            cloud: env_or_default("PINECONE_CLOUD", "aws"),
            region: env_or_default("PINECONE_REGION", "us-east-1"),
            api_version: env_or_default("PINECONE_API_VERSION", DEFAULT_API_VERSION),
            timeout_secs: env_parse_or("PINECONE_TIMEOUT_SECS", 30)?,
        })
    }
}
