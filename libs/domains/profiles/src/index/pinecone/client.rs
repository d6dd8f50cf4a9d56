use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::PineconeConfig;
use crate::config::IndexSettings;
use crate::error::{ProfileError, ProfileResult};
use crate::index::ProfileIndex;
use crate::models::{DistanceMetric, IndexDescription, IndexEntry, SearchMatch};

const READY_POLL_ATTEMPTS: u32 = 30;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Pinecone serverless index over the REST API
pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
    settings: IndexSettings,
    description: OnceCell<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    dimension: u32,
    metric: String,
    host: String,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: &'static str,
    spec: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    serverless: CloudRegion<'a>,
}

#[derive(Debug, Serialize)]
struct CloudRegion<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: [UpsertVector<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: u32,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeIndex {
    pub fn new(config: PineconeConfig, settings: IndexSettings) -> ProfileResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProfileError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            settings,
            description: OnceCell::new(),
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", &self.config.api_version)
    }

    fn control_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.control_url.trim_end_matches('/'), path)
    }

    async fn describe(&self) -> ProfileResult<Option<IndexModel>> {
        let response = self
            .request(
                Method::GET,
                self.control_url(&format!("indexes/{}", self.settings.name)),
            )
            .send()
            .await
            .map_err(index_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await.map_err(index_error)?))
    }

    /// Returns `None` when another caller created the index first.
    async fn create(&self) -> ProfileResult<Option<IndexModel>> {
        let body = CreateIndexRequest {
            name: &self.settings.name,
            dimension: self.settings.dimension,
            metric: self.settings.metric.as_str(),
            spec: ServerlessSpec {
                serverless: CloudRegion {
                    cloud: &self.config.cloud,
                    region: &self.config.region,
                },
            },
        };

        let response = self
            .request(Method::POST, self.control_url("indexes"))
            .json(&body)
            .send()
            .await
            .map_err(index_error)?;

        if response.status() == StatusCode::CONFLICT {
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await.map_err(index_error)?))
    }

    async fn wait_until_ready(&self, mut model: IndexModel) -> ProfileResult<IndexModel> {
        for _ in 0..READY_POLL_ATTEMPTS {
            if model.status.as_ref().is_none_or(|s| s.ready) {
                return Ok(model);
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
            model = self.describe().await?.ok_or_else(|| {
                ProfileError::IndexNotReady(format!(
                    "index {} disappeared while initializing",
                    self.settings.name
                ))
            })?;
        }

        let state = model
            .status
            .map(|s| s.state)
            .unwrap_or_else(|| "unknown".to_string());
        Err(ProfileError::IndexNotReady(format!(
            "index {} is still {}",
            self.settings.name, state
        )))
    }

    async fn resolve(&self) -> ProfileResult<IndexDescription> {
        let model = match self.describe().await? {
            Some(model) => model,
            None => {
                info!(index = %self.settings.name, "Creating Pinecone index");
                match self.create().await? {
                    Some(model) => model,
                    None => {
                        debug!(index = %self.settings.name, "Index created concurrently");
                        self.describe().await?.ok_or_else(|| {
                            ProfileError::Index(format!(
                                "index {} reported as existing but not found",
                                self.settings.name
                            ))
                        })?
                    }
                }
            }
        };

        let model = self.wait_until_ready(model).await?;

        if model.dimension != self.settings.dimension {
            return Err(ProfileError::Index(format!(
                "index {} has dimension {}, expected {}",
                model.name, model.dimension, self.settings.dimension
            )));
        }

        let metric: DistanceMetric = model
            .metric
            .parse()
            .map_err(|e: String| ProfileError::Index(format!("index {}: {}", model.name, e)))?;
        if metric != self.settings.metric {
            return Err(ProfileError::Index(format!(
                "index {} uses metric {}, expected {}",
                model.name, metric, self.settings.metric
            )));
        }

        Ok(IndexDescription {
            name: model.name,
            dimension: model.dimension,
            metric,
            host: Some(model.host),
        })
    }

    async fn data_url(&self, path: &str) -> ProfileResult<String> {
        let description = self.ensure_index().await?;
        let host = description
            .host
            .ok_or_else(|| ProfileError::Index("index has no data-plane host".to_string()))?;
        Ok(data_plane_url(&host, path))
    }
}

fn data_plane_url(host: &str, path: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}/{}", host, path)
    } else {
        format!("https://{}/{}", host, path)
    }
}

fn index_error(err: reqwest::Error) -> ProfileError {
    ProfileError::Index(err.to_string())
}

async fn check_status(response: Response) -> ProfileResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(ProfileError::Index(format!(
        "Pinecone API error ({}): {}",
        status, error_text
    )))
}

/// Pinecone metadata values must be strings, numbers, booleans or lists of
/// strings. Anything else is stored as its JSON text.
fn pinecone_metadata(metadata: Map<String, Value>) -> Map<String, Value> {
    metadata
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Array(items) if items.iter().all(Value::is_string) => Value::Array(items),
                v @ (Value::Array(_) | Value::Object(_)) => Value::String(v.to_string()),
                v => v,
            };
            Some((key, value))
        })
        .collect()
}

#[async_trait]
impl ProfileIndex for PineconeIndex {
    fn backend(&self) -> &'static str {
        "pinecone"
    }

    async fn ensure_index(&self) -> ProfileResult<IndexDescription> {
        self.description
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    #[instrument(skip_all, fields(id = %entry.id))]
    async fn upsert(&self, entry: IndexEntry) -> ProfileResult<()> {
        let url = self.data_url("vectors/upsert").await?;
        let body = UpsertRequest {
            vectors: [UpsertVector {
                id: &entry.id,
                values: &entry.values,
                metadata: pinecone_metadata(entry.metadata),
            }],
        };

        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(index_error)?;
        check_status(response).await?;

        Ok(())
    }

    #[instrument(skip(self, vector))]
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> ProfileResult<Vec<SearchMatch>> {
        let url = self.data_url("query").await?;
        let body = QueryRequest {
            vector: &vector,
            top_k,
            include_metadata,
            include_values: false,
        };

        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(index_error)?;
        let response: QueryResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(index_error)?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| SearchMatch {
                id: m.id,
                score: m.score,
                metadata: if include_metadata { m.metadata } else { None },
            })
            .collect())
    }
}
