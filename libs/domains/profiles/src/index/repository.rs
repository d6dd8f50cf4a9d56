use async_trait::async_trait;

use crate::error::ProfileResult;
use crate::models::{IndexDescription, IndexEntry, SearchMatch};

/// Vector index holding one entry per profile id
///
/// Implementations create the configured index on first use and cache the
/// resolved handle; a failed attempt is retried on the next call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileIndex: Send + Sync {
    /// Backend name, for logs
    fn backend(&self) -> &'static str;

    /// Resolve the index, creating it when absent. Idempotent.
    async fn ensure_index(&self) -> ProfileResult<IndexDescription>;

    /// Insert or overwrite the entry with `entry.id`
    async fn upsert(&self, entry: IndexEntry) -> ProfileResult<()>;

    /// Up to `top_k` entries ranked by descending score
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> ProfileResult<Vec<SearchMatch>>;
}
