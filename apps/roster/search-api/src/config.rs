use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, cors::CorsConfig, env_or_default,
    server::ServerConfig,
};
use domain_profiles::{
    IndexSettings, OpenAIConfig, PineconeConfig, ProfileServiceConfig, QdrantConfig,
};

pub use core_config::Environment;

const DEFAULT_PORT: u16 = 8000;

/// Vector store holding the profile embeddings, chosen by `VECTOR_BACKEND`
#[derive(Clone, Debug)]
pub enum VectorBackend {
    Pinecone(PineconeConfig),
    Qdrant(QdrantConfig),
}

impl VectorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            VectorBackend::Pinecone(_) => "pinecone",
            VectorBackend::Qdrant(_) => "qdrant",
        }
    }
}

impl FromEnv for VectorBackend {
    /// Defaults to Pinecone; only the selected backend's variables are read.
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_or_default("VECTOR_BACKEND", "pinecone");
        match raw.trim().to_ascii_lowercase().as_str() {
            "pinecone" => Ok(VectorBackend::Pinecone(PineconeConfig::from_env()?)),
            "qdrant" => Ok(VectorBackend::Qdrant(QdrantConfig::from_env()?)),
            other => Err(ConfigError::ParseError {
                key: "VECTOR_BACKEND".to_string(),
                details: format!("unknown backend '{}', expected pinecone or qdrant", other),
            }),
        }
    }
}

/// Application-specific configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub openai: OpenAIConfig,
    pub index: IndexSettings,
    pub backend: VectorBackend,
    pub service: ProfileServiceConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env_with_port(DEFAULT_PORT)?;
        let cors = CorsConfig::from_env()?;
        let openai = OpenAIConfig::from_env()?; // Required - OPENAI_API_KEY
        let index = IndexSettings::from_env()?;
        let backend = VectorBackend::from_env()?;
        let service = ProfileServiceConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            cors,
            openai,
            index,
            backend,
            service,
        })
    }
}
