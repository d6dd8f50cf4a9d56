use async_trait::async_trait;

use crate::error::ProfileResult;
use crate::models::Profile;

/// Produces a short natural-language summary of a profile
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Failures surface as `ProfileError::Summary`; callers decide whether to
    /// continue without one.
    async fn summarize(&self, profile: &Profile) -> ProfileResult<String>;
}
