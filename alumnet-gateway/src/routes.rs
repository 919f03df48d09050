//! Route definitions for the AlumNet gateway.
//!
//! Provides the story analysis endpoints (multipart, text-only, publish,
//! feed batch), the alumni backend proxy, and health checks. All four
//! analysis entry points share one [`Analyzer`].

use crate::proxy::{proxy_request, ProxyState};
use alumnet_common::config::Config;
use alumnet_common::Error;
use alumnet_insight::{Analyzer, ContentAnalysis, ImageData, PostContent};
use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
    pub proxy: ProxyState,
    pub max_upload_bytes: usize,
}

impl FromRef<AppState> for ProxyState {
    fn from_ref(app: &AppState) -> Self {
        app.proxy.clone()
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Text-only analysis request body.
#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub content: String,
}

/// Feed analysis request body.
#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub posts: Vec<FeedPost>,
}

/// One post in a feed analysis request.
#[derive(Debug, Deserialize)]
pub struct FeedPost {
    pub content: String,
}

/// Feed analysis response body.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub results: Vec<ContentAnalysis>,
}

/// Publish request body: analyze, then post to the alumni backend.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub content: String,
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Wrapper turning [`alumnet_common::Error`] into an HTTP error response.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the logs; callers get the canonical message
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
            "analysis failed".to_string()
        } else {
            self.0.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: self.0.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "alumnet-gateway".into(),
    })
}

/// Analyze a story submitted as `multipart/form-data`: a `content` text
/// field plus an optional `image` file part.
async fn analyze_story(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ContentAnalysis>, ApiError> {
    let mut content: Option<String> = None;
    let mut image: Option<ImageData> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("content") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("unreadable content field: {}", e)))?;
                content = Some(text);
            }
            Some("image") => {
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("unreadable image field: {}", e)))?;

                if bytes.len() > state.max_upload_bytes {
                    return Err(Error::PayloadTooLarge(format!(
                        "image exceeds {} bytes",
                        state.max_upload_bytes
                    ))
                    .into());
                }

                image = Some(ImageData {
                    bytes: bytes.to_vec(),
                    mime,
                });
            }
            // Unknown fields are ignored, matching lenient form handling
            _ => {}
        }
    }

    let content = content.ok_or_else(|| Error::InvalidInput("missing content field".into()))?;

    let post = match image {
        Some(image) => PostContent::with_image(content, image),
        None => PostContent::text(content),
    };

    let analysis = state.analyzer.analyze(&post).await?;
    Ok(Json(analysis))
}

/// Analyze a text-only story.
async fn analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<ContentAnalysis>, ApiError> {
    let analysis = state
        .analyzer
        .analyze(&PostContent::text(request.content))
        .await?;
    Ok(Json(analysis))
}

/// Analyze a feed of posts concurrently, preserving input order.
async fn analyze_feed(
    State(state): State<AppState>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<FeedResponse>, ApiError> {
    let posts = request
        .posts
        .into_iter()
        .map(|p| PostContent::text(p.content))
        .collect();

    let results = state.analyzer.analyze_batch(posts).await?;
    Ok(Json(FeedResponse { results }))
}

/// Analyze a story, then post it with its analysis to the alumni backend,
/// forwarding the caller's `Authorization` header verbatim.
async fn publish_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PublishRequest>,
) -> Result<Response, ApiError> {
    let analysis = state
        .analyzer
        .analyze(&PostContent::text(request.content.clone()))
        .await?;

    let payload = serde_json::json!({
        "content": request.content,
        "analysis": analysis,
        "analyzedAt": chrono::Utc::now().to_rfc3339(),
    });

    let mut builder = state
        .proxy
        .client
        .post(format!("{}/api/stories", state.proxy.target_url))
        .json(&payload);

    if let Some(authorization) = headers.get(header::AUTHORIZATION) {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }

    let response = builder.send().await.map_err(|e| {
        tracing::error!(error = %e, "Publishing to alumni backend failed");
        Error::External("alumni backend unreachable".into())
    })?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = response.bytes().await.unwrap_or_default();

    Ok((status, body).into_response())
}

// ============================================================================
// Router
// ============================================================================

/// Build all gateway routes with their shared state.
///
/// The upload body limit covers the analysis routes only; the proxy has its
/// own (larger) limit from the backend configuration.
pub fn build_all_routes(config: &Config) -> Router {
    let state = AppState {
        analyzer: Analyzer::from_config(config),
        proxy: ProxyState::new(&config.backend),
        max_upload_bytes: config.gateway.max_upload_bytes,
    };

    let story_routes = Router::new()
        .route("/api/v1/stories/analyze", post(analyze_story))
        .route("/api/v1/stories/analyze-text", post(analyze_text))
        .route("/api/v1/stories/publish", post(publish_story))
        .route("/api/v1/feed/analyze", post(analyze_feed))
        .layer(DefaultBodyLimit::max(config.gateway.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.gateway.max_upload_bytes));

    Router::new()
        .route("/health", get(health))
        .merge(story_routes)
        .route("/api/v1/backend", any(proxy_request))
        .route("/api/v1/backend/*path", any(proxy_request))
        .with_state(state)
}
