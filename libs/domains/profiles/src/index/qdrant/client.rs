use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CollectionExistsRequest, CollectionInfo, CreateCollectionBuilder, Distance, ListValue,
    PointId, PointStruct, SearchPointsBuilder, Struct, UpsertPointsBuilder, Value as QdrantValue,
    VectorParams, VectorParamsBuilder, point_id::PointIdOptions, value::Kind, vectors_config,
};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::QdrantConfig;
use crate::config::IndexSettings;
use crate::error::{ProfileError, ProfileResult};
use crate::index::ProfileIndex;
use crate::models::{DistanceMetric, IndexDescription, IndexEntry, SearchMatch};

/// Payload key holding the caller's profile id
const PROFILE_ID_KEY: &str = "profile_id";

/// Qdrant-backed profile index; the configured index name is the collection
pub struct QdrantIndex {
    client: Qdrant,
    settings: IndexSettings,
    description: OnceCell<IndexDescription>,
}

impl QdrantIndex {
    pub fn new(config: QdrantConfig, settings: IndexSettings) -> ProfileResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| ProfileError::Config(format!("Failed to build Qdrant client: {}", e)))?;

        Ok(Self::from_client(client, settings))
    }

    pub fn from_client(client: Qdrant, settings: IndexSettings) -> Self {
        Self {
            client,
            settings,
            description: OnceCell::new(),
        }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }

    fn describe(&self) -> IndexDescription {
        IndexDescription {
            name: self.settings.name.clone(),
            dimension: self.settings.dimension,
            metric: self.settings.metric,
            host: None,
        }
    }

    async fn resolve(&self) -> ProfileResult<IndexDescription> {
        let name = self.settings.name.as_str();

        let exists = self
            .client
            .collection_exists(CollectionExistsRequest {
                collection_name: name.to_string(),
            })
            .await?;

        if !exists {
            info!(collection = %name, "Creating Qdrant collection");
            let builder = CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(
                    u64::from(self.settings.dimension),
                    Self::to_qdrant_distance(self.settings.metric),
                ),
            );

            match self.client.create_collection(builder).await {
                Ok(_) => return Ok(self.describe()),
                Err(e) if is_collection_conflict(&e.to_string()) => {
                    debug!(collection = %name, "Collection created concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let info = self
            .client
            .collection_info(name)
            .await?
            .result
            .ok_or_else(|| ProfileError::Index(format!("collection {} has no info", name)))?;
        check_vector_params(&self.settings, &info)?;

        Ok(self.describe())
    }
}

/// Qdrant rejects a duplicate create with `InvalidArgument` ("Wrong input:
/// Collection `name` already exists!") rather than `AlreadyExists`, so the
/// message is the only signal.
fn is_collection_conflict(message: &str) -> bool {
    message.contains("already exists")
}

fn stored_vector_params(info: &CollectionInfo) -> Option<&VectorParams> {
    let config = info
        .config
        .as_ref()?
        .params
        .as_ref()?
        .vectors_config
        .as_ref()?
        .config
        .as_ref()?;

    match config {
        vectors_config::Config::Params(params) => Some(params),
        // Profiles use one unnamed vector
        vectors_config::Config::ParamsMap(_) => None,
    }
}

/// An existing collection must match the configured dimension and metric.
fn check_vector_params(settings: &IndexSettings, info: &CollectionInfo) -> ProfileResult<()> {
    let params = stored_vector_params(info).ok_or_else(|| {
        ProfileError::Index(format!(
            "collection {} has no single unnamed vector config",
            settings.name
        ))
    })?;

    if params.size != u64::from(settings.dimension) {
        return Err(ProfileError::Index(format!(
            "collection {} has dimension {}, expected {}",
            settings.name, params.size, settings.dimension
        )));
    }

    let expected = QdrantIndex::to_qdrant_distance(settings.metric);
    if params.distance() != expected {
        return Err(ProfileError::Index(format!(
            "collection {} uses {:?} distance, expected {:?}",
            settings.name,
            params.distance(),
            expected
        )));
    }

    Ok(())
}

/// Qdrant only accepts unsigned integers and UUIDs as point ids, so any
/// other profile id is mapped to a stable UUIDv5.
fn point_id_for(profile_id: &str) -> PointId {
    let uuid = Uuid::parse_str(profile_id)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, profile_id.as_bytes()));
    PointId::from(uuid.to_string())
}

fn point_id_to_string(point_id: Option<&PointId>) -> Option<String> {
    match point_id?.point_id_options.as_ref()? {
        PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
        PointIdOptions::Num(num) => Some(num.to_string()),
    }
}

fn json_to_qdrant_value(val: Value) -> QdrantValue {
    let kind = match val {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant_value(v)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

fn qdrant_value_to_json(val: QdrantValue) -> Value {
    match val.kind {
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

fn entry_payload(id: String, metadata: Map<String, Value>) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = metadata
        .into_iter()
        .map(|(k, v)| (k, json_to_qdrant_value(v)))
        .collect();
    payload.insert(
        PROFILE_ID_KEY.to_string(),
        json_to_qdrant_value(Value::String(id)),
    );
    payload
}

/// Split a stored payload into the caller's profile id and its metadata.
fn split_payload(payload: HashMap<String, QdrantValue>) -> (Option<String>, Map<String, Value>) {
    let mut metadata: Map<String, Value> = payload
        .into_iter()
        .map(|(k, v)| (k, qdrant_value_to_json(v)))
        .collect();

    let profile_id = match metadata.remove(PROFILE_ID_KEY) {
        Some(Value::String(id)) => Some(id),
        _ => None,
    };

    (profile_id, metadata)
}

#[async_trait]
impl ProfileIndex for QdrantIndex {
    fn backend(&self) -> &'static str {
        "qdrant"
    }

    async fn ensure_index(&self) -> ProfileResult<IndexDescription> {
        self.description
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    #[instrument(skip_all, fields(id = %entry.id))]
    async fn upsert(&self, entry: IndexEntry) -> ProfileResult<()> {
        self.ensure_index().await?;

        let IndexEntry {
            id,
            values,
            metadata,
        } = entry;
        let point = PointStruct::new(point_id_for(&id), values, entry_payload(id, metadata));

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.settings.name, vec![point]).wait(true))
            .await?;

        Ok(())
    }

    #[instrument(skip(self, vector))]
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: u32,
        include_metadata: bool,
    ) -> ProfileResult<Vec<SearchMatch>> {
        self.ensure_index().await?;

        // The payload carries the profile id, so it is fetched either way.
        let builder = SearchPointsBuilder::new(&self.settings.name, vector, u64::from(top_k))
            .with_payload(true);

        let results = self.client.search_points(builder).await?;

        results
            .result
            .into_iter()
            .map(|point| {
                let point_id = point_id_to_string(point.id.as_ref());
                let (profile_id, metadata) = split_payload(point.payload);
                let id = profile_id.or(point_id).ok_or_else(|| {
                    ProfileError::Index("search result without a point id".to_string())
                })?;

                Ok(SearchMatch {
                    id,
                    score: point.score,
                    metadata: include_metadata.then_some(metadata),
                })
            })
            .collect()
    }
}
