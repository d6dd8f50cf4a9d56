use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_profiles::{ProfileService, ProfilesApiDoc, handlers};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Liveness banner served at `/`
#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "root",
    responses((status = 200, description = "Service is running", body = RootResponse))
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Search API is running",
    })
}

/// Readiness check: the vector index must exist and report ready.
pub async fn ready_handler(State(service): State<Arc<ProfileService>>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "vector_index",
        Box::pin(async {
            service
                .ensure_index()
                .await
                .map(|_| ())
                .map_err(|e| format!("Vector index unavailable: {}", e))
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(root),
    components(schemas(RootResponse)),
    tags((name = "root", description = "Service banner"))
)]
struct RootApiDoc;

/// OpenAPI document for the whole service
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = RootApiDoc::openapi();
        doc.merge(ProfilesApiDoc::openapi());
        doc.info.title = "Roster Search API".to_string();
        doc
    }
}

/// Profile endpoints plus the root banner, mounted at the root path.
pub fn routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(handlers::router(service))
}

/// `/ready` with its own state, merged after `create_router`.
pub fn ready_router(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_profiles::{
        EmbeddingProvider, IndexSettings, InMemoryProfileIndex, Profile, ProfileResult,
        SummaryGenerator,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct NoopEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for NoopEmbedder {
        async fn embed(&self, _text: &str) -> ProfileResult<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> ProfileResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct NoopSummary;

    #[async_trait::async_trait]
    impl SummaryGenerator for NoopSummary {
        async fn summarize(&self, _profile: &Profile) -> ProfileResult<String> {
            Ok(String::new())
        }
    }

    fn service() -> Arc<ProfileService> {
        Arc::new(ProfileService::new(
            Arc::new(InMemoryProfileIndex::new(IndexSettings::new("test", 2))),
            Arc::new(NoopEmbedder),
            Arc::new(NoopSummary),
        ))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = routes(service())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Search API is running"})
        );
    }

    #[tokio::test]
    async fn test_ready_reports_vector_index() {
        let response = ready_router(service())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "ready", "vector_index": "connected"})
        );
    }

    #[test]
    fn test_api_doc_merges_profile_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/index_profile", "/fetch_top_k_profiles", "/search"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
