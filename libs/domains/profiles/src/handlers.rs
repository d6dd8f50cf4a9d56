//! REST handlers for indexing and searching profiles

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::errors::responses::{
    BadGatewayResponse, BadRequestValidationResponse, InternalServerErrorResponse,
    ServiceUnavailableResponse,
};
use axum_helpers::{AppError, ValidatedJson};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::config::SearchParams;
use crate::models::Profile;
use crate::service::ProfileService;

// ===== Request/Response DTOs =====

/// Request to index one profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IndexProfileRequest {
    /// Profile object; `id` may be a string or an integer
    #[schema(value_type = Object)]
    pub profile: Value,
}

/// Outcome of an indexing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IndexProfileResponse {
    pub message: String,
    pub success: bool,
}

/// Free-text search with optional overrides of the endpoint defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[validate(range(min = 1, max = 1000))]
    #[serde(default)]
    pub top_k: Option<u32>,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub threshold: Option<f32>,
}

impl SearchRequest {
    fn params(&self, defaults: SearchParams) -> SearchParams {
        SearchParams {
            top_k: self.top_k.unwrap_or(defaults.top_k),
            threshold: self.threshold.unwrap_or(defaults.threshold),
        }
    }
}

/// Matching profile ids, best first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FetchTopKResponse {
    pub results: Vec<String>,
}

/// Stored metadata of matching profiles, best first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<Value>,
}

// ===== Handlers =====

/// Summarise, embed and index a profile
///
/// Always answers 200; failures are reported through `success: false`.
#[utoipa::path(
    post,
    path = "/index_profile",
    tag = "profiles",
    request_body = IndexProfileRequest,
    responses(
        (status = 200, description = "Indexing outcome", body = IndexProfileResponse),
        (status = 400, response = BadRequestValidationResponse),
    )
)]
pub async fn index_profile(
    State(service): State<Arc<ProfileService>>,
    ValidatedJson(request): ValidatedJson<IndexProfileRequest>,
) -> Json<IndexProfileResponse> {
    let outcome = match Profile::from_value(request.profile) {
        Ok(profile) => service.index_profile(profile).await,
        Err(e) => Err(e),
    };

    let response = match outcome {
        Ok(()) => IndexProfileResponse {
            message: "Profile indexed".to_string(),
            success: true,
        },
        Err(e) => {
            warn!(error = %e, "Profile indexing failed");
            IndexProfileResponse {
                message: format!("Error indexing profile: {}", e),
                success: false,
            }
        }
    };

    Json(response)
}

/// Ids of the profiles closest to the query
#[utoipa::path(
    post,
    path = "/fetch_top_k_profiles",
    tag = "profiles",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching profile ids", body = FetchTopKResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse),
    )
)]
pub async fn fetch_top_k_profiles(
    State(service): State<Arc<ProfileService>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> Result<Json<FetchTopKResponse>, AppError> {
    let params = request.params(service.config().fetch);
    let results = service
        .fetch_top_k_ids(&request.query, params.top_k, params.threshold)
        .await?;

    Ok(Json(FetchTopKResponse { results }))
}

/// Metadata of the profiles closest to the query
#[utoipa::path(
    post,
    path = "/search",
    tag = "profiles",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching profile metadata", body = SearchResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 502, response = BadGatewayResponse),
        (status = 503, response = ServiceUnavailableResponse),
    )
)]
pub async fn search(
    State(service): State<Arc<ProfileService>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let params = request.params(service.config().search);
    let results = service
        .search(&request.query, params.top_k, params.threshold)
        .await?
        .into_iter()
        .map(|m| Value::Object(m.metadata.unwrap_or_default()))
        .collect();

    Ok(Json(SearchResponse { results }))
}

/// OpenAPI documentation for the profile endpoints
#[derive(OpenApi)]
#[openapi(
    paths(index_profile, fetch_top_k_profiles, search),
    components(
        schemas(
            IndexProfileRequest, IndexProfileResponse,
            SearchRequest, FetchTopKResponse, SearchResponse
        )
    ),
    tags(
        (name = "profiles", description = "Profile indexing and semantic search")
    )
)]
pub struct ProfilesApiDoc;

/// Create router for the profile endpoints
pub fn router(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/index_profile", post(index_profile))
        .route("/fetch_top_k_profiles", post(fetch_top_k_profiles))
        .route("/search", post(search))
        .with_state(service)
}
