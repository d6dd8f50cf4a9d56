use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::ProfileServiceConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{ProfileError, ProfileResult};
use crate::index::ProfileIndex;
use crate::models::{IndexDescription, IndexEntry, Profile, SearchMatch};
use crate::summary::{SummaryGenerator, format_profile};

/// Orchestrates summary, embedding and the vector index.
///
/// Every dependency is a trait object so the backend can be chosen at
/// startup and replaced with fakes in tests.
pub struct ProfileService {
    index: Arc<dyn ProfileIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    summarizer: Arc<dyn SummaryGenerator>,
    config: ProfileServiceConfig,
}

impl ProfileService {
    pub fn new(
        index: Arc<dyn ProfileIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        summarizer: Arc<dyn SummaryGenerator>,
    ) -> Self {
        Self {
            index,
            embedder,
            summarizer,
            config: ProfileServiceConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProfileServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProfileServiceConfig {
        &self.config
    }

    /// Resolve (and if needed create) the profile index.
    pub async fn ensure_index(&self) -> ProfileResult<IndexDescription> {
        self.index.ensure_index().await
    }

    /// Summarise, embed and upsert one profile under its id.
    ///
    /// A failed summary is logged and the profile is indexed without one;
    /// embedding and index failures abort before anything is written.
    #[instrument(skip_all, fields(id = %profile.id))]
    pub async fn index_profile(&self, profile: Profile) -> ProfileResult<()> {
        profile.validate()?;

        let summary = match self.summarizer.summarize(&profile).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Summary generation failed, indexing without summary");
                String::new()
            }
        };

        let embedding_input = if summary.is_empty() {
            format_profile(&profile)
        } else {
            summary.clone()
        };

        let values = self.embed(&embedding_input).await?;
        let metadata = profile.to_metadata(&summary)?;

        self.index
            .upsert(IndexEntry {
                id: profile.id.clone(),
                values,
                metadata,
            })
            .await?;

        debug!("Profile indexed");
        Ok(())
    }

    /// Profiles most similar to `query`, best first, all scoring at least
    /// `threshold` and at most `top_k` of them.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search(
        &self,
        query: &str,
        top_k: u32,
        threshold: f32,
    ) -> ProfileResult<Vec<SearchMatch>> {
        if top_k == 0 {
            return Err(ProfileError::Validation(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let vector = self.embed(query).await?;
        let matches = self.index.query(vector, top_k, true).await?;

        let results: Vec<SearchMatch> = matches
            .into_iter()
            .filter(|m| m.score >= threshold)
            .take(top_k as usize)
            .collect();

        debug!(results = results.len(), "Search complete");
        Ok(results)
    }

    /// Same pipeline as [`search`](Self::search), projected to profile ids.
    pub async fn fetch_top_k_ids(
        &self,
        query: &str,
        top_k: u32,
        threshold: f32,
    ) -> ProfileResult<Vec<String>> {
        Ok(self
            .search(query, top_k, threshold)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect())
    }

    async fn embed(&self, text: &str) -> ProfileResult<Vec<f32>> {
        let values = self.embedder.embed(text).await?;

        if values.len() != self.config.dimension as usize {
            return Err(ProfileError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.config.dimension,
                values.len()
            )));
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexSettings, SearchParams};
    use crate::embedding::MockEmbeddingProvider;
    use crate::index::{InMemoryProfileIndex, MockProfileIndex};
    use crate::summary::MockSummaryGenerator;
    use serde_json::json;

    const DIM: u32 = 3;

    fn test_config() -> ProfileServiceConfig {
        ProfileServiceConfig {
            dimension: DIM,
            fetch: SearchParams::new(5, 0.25),
            search: SearchParams::new(10, 0.8),
        }
    }

    fn service(
        index: impl ProfileIndex + 'static,
        embedder: MockEmbeddingProvider,
        summarizer: MockSummaryGenerator,
    ) -> ProfileService {
        ProfileService::new(Arc::new(index), Arc::new(embedder), Arc::new(summarizer))
            .with_config(test_config())
    }

    fn profile(id: &str) -> Profile {
        Profile::from_value(json!({
            "id": id,
            "name": "Ada",
            "school": "Cambridge",
            "location": "London",
            "experience": "Analytical engines",
            "interests": ["math"],
            "looking_for": "collaborators",
            "support": "proofreading"
        }))
        .unwrap()
    }

    fn summarizer_returning(summary: &'static str) -> MockSummaryGenerator {
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .returning(move |_| Ok(summary.to_string()));
        summarizer
    }

    fn embedder_returning(values: Vec<f32>) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(move |_| Ok(values.clone()));
        embedder
    }

    fn hit(id: &str, score: f32) -> SearchMatch {
        SearchMatch {
            id: id.to_string(),
            score,
            metadata: Some(serde_json::Map::new()),
        }
    }

    fn index_returning(matches: Vec<SearchMatch>) -> MockProfileIndex {
        let mut index = MockProfileIndex::new();
        index
            .expect_query()
            .returning(move |_, top_k, _| Ok(matches.iter().take(top_k as usize).cloned().collect()));
        index
    }

    #[tokio::test]
    async fn test_reindexing_same_profile_keeps_one_entry() {
        let index = Arc::new(InMemoryProfileIndex::new(IndexSettings::new("test", DIM)));
        let service = ProfileService::new(
            index.clone(),
            Arc::new(embedder_returning(vec![0.1, 0.2, 0.3])),
            Arc::new(summarizer_returning("Ada likes math.")),
        )
        .with_config(test_config());

        service.index_profile(profile("p-1")).await.unwrap();
        service.index_profile(profile("p-1")).await.unwrap();

        assert_eq!(index.len().await, 1);
        assert_eq!(index.upsert_count(), 2);
        let stored = index.get("p-1").await.unwrap();
        assert_eq!(stored.metadata["summary"], "Ada likes math.");
        assert_eq!(stored.metadata["name"], "Ada");
    }

    #[tokio::test]
    async fn test_summary_is_embedded_when_present() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .withf(|text| text.starts_with("Ada likes math."))
            .times(1)
            .returning(|_| Ok(vec![0.0; DIM as usize]));

        let mut index = MockProfileIndex::new();
        index.expect_upsert().times(1).returning(|_| Ok(()));

        let service = service(index, embedder, summarizer_returning("Ada likes math."));
        service.index_profile(profile("p-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_upsert() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(|_| Err(ProfileError::Embedding("rate limited".to_string())));

        let mut index = MockProfileIndex::new();
        index.expect_upsert().times(0);

        let service = service(index, embedder, summarizer_returning("summary"));
        let err = service.index_profile(profile("p-1")).await.unwrap_err();

        assert!(matches!(err, ProfileError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_summary_failure_still_indexes_without_summary() {
        let mut summarizer = MockSummaryGenerator::new();
        summarizer
            .expect_summarize()
            .returning(|_| Err(ProfileError::Summary("model unavailable".to_string())));

        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .withf(|text| text.starts_with("- Name: Ada") && text.contains("- Support Offered"))
            .times(1)
            .returning(|_| Ok(vec![0.5; DIM as usize]));

        let mut index = MockProfileIndex::new();
        index
            .expect_upsert()
            .withf(|entry| entry.id == "p-1" && !entry.metadata.contains_key("summary"))
            .times(1)
            .returning(|_| Ok(()));

        let service = service(index, embedder, summarizer);
        service.index_profile(profile("p-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_embedding_dimension_is_rejected() {
        let mut index = MockProfileIndex::new();
        index.expect_upsert().times(0);

        let service = service(index, embedder_returning(vec![0.1]), summarizer_returning("s"));
        let err = service.index_profile(profile("p-1")).await.unwrap_err();

        assert!(matches!(err, ProfileError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_index_failure_is_returned() {
        let mut index = MockProfileIndex::new();
        index
            .expect_upsert()
            .returning(|_| Err(ProfileError::Index("quota exceeded".to_string())));

        let service = service(
            index,
            embedder_returning(vec![0.0; DIM as usize]),
            summarizer_returning("s"),
        );
        assert!(matches!(
            service.index_profile(profile("p-1")).await,
            Err(ProfileError::Index(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_id_calls_nothing() {
        let mut summarizer = MockSummaryGenerator::new();
        summarizer.expect_summarize().times(0);
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().times(0);
        let mut index = MockProfileIndex::new();
        index.expect_upsert().times(0);

        let mut bad = profile("p-1");
        bad.id = String::new();

        let service = service(index, embedder, summarizer);
        assert!(matches!(
            service.index_profile(bad).await,
            Err(ProfileError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_with_empty_fields_indexes() {
        let empty = Profile::from_value(json!({
            "id": "blank",
            "name": "",
            "school": "",
            "location": "",
            "experience": "",
            "interests": [],
            "looking_for": "",
            "support": ""
        }))
        .unwrap();

        let mut index = MockProfileIndex::new();
        index.expect_upsert().times(1).returning(|_| Ok(()));

        let service = service(
            index,
            embedder_returning(vec![0.0; DIM as usize]),
            summarizer_returning(""),
        );
        service.index_profile(empty).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_respects_top_k_and_threshold() {
        let index = index_returning(vec![
            hit("a", 0.95),
            hit("b", 0.9),
            hit("c", 0.85),
            hit("d", 0.5),
            hit("e", 0.1),
        ]);
        let service = service(
            index,
            embedder_returning(vec![1.0; DIM as usize]),
            summarizer_returning(""),
        );

        let results = service.search("founders", 3, 0.8).await.unwrap();
        assert!(results.len() <= 3);
        assert!(results.iter().all(|m| m.score >= 0.8));

        let results = service.search("founders", 5, 0.8).await.unwrap();
        let ids: Vec<_> = results.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let service = service(
            index_returning(vec![hit("edge", 0.25)]),
            embedder_returning(vec![1.0; DIM as usize]),
            summarizer_returning(""),
        );
        assert_eq!(
            service.fetch_top_k_ids("q", 5, 0.25).await.unwrap(),
            vec!["edge"]
        );
    }

    #[tokio::test]
    async fn test_higher_threshold_never_adds_results() {
        let service = service(
            index_returning(vec![hit("a", 0.9), hit("b", 0.6), hit("c", 0.3)]),
            embedder_returning(vec![1.0; DIM as usize]),
            summarizer_returning(""),
        );

        let loose = service.fetch_top_k_ids("q", 10, 0.2).await.unwrap();
        let strict = service.fetch_top_k_ids("q", 10, 0.7).await.unwrap();

        assert!(strict.len() <= loose.len());
        assert!(strict.iter().all(|id| loose.contains(id)));
    }

    #[tokio::test]
    async fn test_fetch_returns_only_ids_above_threshold() {
        let mut index = MockProfileIndex::new();
        index
            .expect_query()
            .withf(|_, top_k, include_metadata| *top_k == 2 && *include_metadata)
            .returning(|_, _, _| Ok(vec![hit("strong", 0.81), hit("weak", 0.20)]));

        let service = service(
            index,
            embedder_returning(vec![1.0; DIM as usize]),
            summarizer_returning(""),
        );
        let ids = service
            .fetch_top_k_ids("climate founders", 2, 0.25)
            .await
            .unwrap();

        assert_eq!(ids, vec!["strong"]);
    }

    #[tokio::test]
    async fn test_search_embedding_failure_skips_query() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed()
            .returning(|_| Err(ProfileError::Embedding("timeout".to_string())));
        let mut index = MockProfileIndex::new();
        index.expect_query().times(0);

        let service = service(index, embedder, summarizer_returning(""));
        assert!(matches!(
            service.search("q", 5, 0.5).await,
            Err(ProfileError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_top_k_is_rejected() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().times(0);

        let service = service(MockProfileIndex::new(), embedder, summarizer_returning(""));
        assert!(matches!(
            service.search("q", 0, 0.5).await,
            Err(ProfileError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_index_delegates() {
        let mut index = MockProfileIndex::new();
        index.expect_ensure_index().times(1).returning(|| {
            Ok(IndexDescription {
                name: "test".to_string(),
                dimension: DIM,
                metric: Default::default(),
                host: None,
            })
        });

        let service = service(index, MockEmbeddingProvider::new(), summarizer_returning(""));
        assert_eq!(service.ensure_index().await.unwrap().name, "test");
    }
}
