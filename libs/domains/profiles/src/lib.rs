//! Profiles Domain Library
//!
//! Semantic search over roster profiles. A submitted profile is summarised by
//! a chat model, embedded, and upserted into an external vector index; a
//! free-text query is embedded and matched against the same index.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │  ProfileService  │  ← index_profile / search / fetch_top_k_ids
//!                 └────────┬─────────┘
//!          ┌───────────────┼─────────────────┐
//! ┌────────▼────────┐ ┌────▼─────────────┐ ┌─▼────────────────┐
//! │ SummaryGenerator│ │ EmbeddingProvider│ │   ProfileIndex   │
//! └────────┬────────┘ └────┬─────────────┘ └─┬────────────────┘
//!  OpenAISummaryGenerator  OpenAIProvider     PineconeIndex
//!                                             QdrantIndex
//!                                             InMemoryProfileIndex
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_profiles::{
//!     IndexSettings, OpenAIConfig, OpenAIProvider, OpenAISummaryGenerator, PineconeConfig,
//!     PineconeIndex, ProfileService,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let openai = OpenAIConfig::from_env()?;
//! let index = PineconeIndex::new(PineconeConfig::from_env()?, IndexSettings::from_env()?)?;
//!
//! let service = ProfileService::new(
//!     Arc::new(index),
//!     Arc::new(OpenAIProvider::new(openai.clone())?),
//!     Arc::new(OpenAISummaryGenerator::new(openai)?),
//! );
//!
//! let ids = service.fetch_top_k_ids("climate founders", 5, 0.25).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod index;
pub mod models;
pub mod openai;
pub mod service;
pub mod summary;

// Re-export commonly used types
pub use config::{IndexSettings, ProfileServiceConfig, SearchParams};
pub use embedding::{EmbeddingProvider, OpenAIProvider};
pub use error::{ProfileError, ProfileResult};
pub use handlers::ProfilesApiDoc;
pub use index::{
    InMemoryProfileIndex, PineconeConfig, PineconeIndex, ProfileIndex, QdrantConfig, QdrantIndex,
};
pub use models::{DistanceMetric, IndexDescription, IndexEntry, Profile, SearchMatch};
pub use openai::OpenAIConfig;
pub use service::ProfileService;
pub use summary::{OpenAISummaryGenerator, SummaryGenerator};
