use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::IndexSettings;
use crate::error::{ProfileError, ProfileResult};
use crate::models::{IndexDescription, IndexEntry, SearchMatch};
use crate::index::ProfileIndex;

/// In-process index ranking by cosine similarity.
///
/// Meant for tests and local runs; nothing survives a restart.
#[derive(Default)]
pub struct InMemoryProfileIndex {
    settings: IndexSettings,
    entries: RwLock<HashMap<String, IndexEntry>>,
    upserts: AtomicUsize,
}

impl InMemoryProfileIndex {
    pub fn new(settings: IndexSettings) -> Self {
        Self {
            settings,
            entries: RwLock::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
        }
    }

    /// Number of upsert calls received, including overwrites
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<IndexEntry> {
        self.entries.read().await.get(id).cloned()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl ProfileIndex for InMemoryProfileIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_index(&self) -> ProfileResult<IndexDescription> {
        Ok(IndexDescription {
            name: self.settings.name.clone(),
            dimension: self.settings.dimension,
            metric: self.settings.metric,
            host: None,
        })
    }

    async fn upsert(&self, entry: IndexEntry) -> ProfileResult<()> {
        if entry.values.len() != self.settings.dimension as usize {
            return Err(ProfileError::Index(format!(
                "Vector dimension {} does not match index dimension {}",
                entry.values.len(),
                self.settings.dimension
            )));
        }

        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> ProfileResult<Vec<SearchMatch>> {
        let entries = self.entries.read().await;

        let mut matches: Vec<SearchMatch> = entries
            .values()
            .map(|entry| SearchMatch {
                id: entry.id.clone(),
                score: cosine_similarity(&vector, &entry.values),
                metadata: include_metadata.then(|| entry.metadata.clone()),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k as usize);

        Ok(matches)
    }
}
