//! Proxy module for the AlumNet gateway.
//!
//! Everything that is not content analysis (profiles, connections,
//! messaging, events, campaigns) lives in the alumni backend; the gateway
//! forwards those requests verbatim. The caller's `Authorization` header is
//! passed through untouched - the gateway never validates credentials.

use crate::routes::ApiError;
use alumnet_common::config::BackendConfig;
use alumnet_common::logging::generate_trace_id;
use alumnet_common::Error;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, StatusCode},
    response::Response,
};
use reqwest::Client;
use std::sync::Arc;

/// Route prefix stripped before forwarding.
const PROXY_PREFIX: &str = "/api/v1/backend";

/// Hop-by-hop headers that must not be forwarded.
const HOP_BY_HOP: &[HeaderName] = &[
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
];

/// Proxy state.
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client,
    pub target_url: Arc<String>,
    pub max_body_bytes: usize,
}

impl ProxyState {
    /// Create proxy state from backend configuration.
    pub fn new(backend: &BackendConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(backend.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            target_url: Arc::new(backend.base_url.trim_end_matches('/').to_string()),
            max_body_bytes: backend.max_body_bytes,
        }
    }
}

/// Proxy a request to the alumni backend.
pub async fn proxy_request(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let uri = request.uri();
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let target_path = match path.strip_prefix(PROXY_PREFIX) {
        Some("") => "/",
        Some(stripped) => stripped,
        None => path,
    };
    let target_url = format!("{}{}", state.target_url, target_path);
    let trace_id = generate_trace_id();

    tracing::debug!(
        method = %method,
        target_url = %target_url,
        trace_id = %trace_id,
        "Proxying request to alumni backend"
    );

    // Build the proxy request
    let mut builder = state
        .client
        .request(method, &target_url)
        .header("x-request-id", &trace_id);

    // Copy headers minus hop-by-hop; Authorization passes through here
    for (name, value) in request.headers() {
        if HOP_BY_HOP.contains(name) {
            continue;
        }
        if let Ok(v) = value.to_str() {
            builder = builder.header(name.as_str(), v);
        }
    }

    // Forward the body
    let body_bytes = axum::body::to_bytes(request.into_body(), state.max_body_bytes)
        .await
        .map_err(|_| {
            Error::PayloadTooLarge(format!(
                "proxied body exceeds {} bytes",
                state.max_body_bytes
            ))
        })?;

    if !body_bytes.is_empty() {
        builder = builder.body(body_bytes.to_vec());
    }

    // Send the request
    let response = builder.send().await.map_err(|e| {
        tracing::error!(error = %e, trace_id = %trace_id, "Backend request failed");
        Error::External("alumni backend unreachable".into())
    })?;

    // Build the response
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::OK);
    let mut response_builder = Response::builder().status(status);

    for (name, value) in response.headers() {
        if name == header::TRANSFER_ENCODING || name == header::CONNECTION {
            continue;
        }
        if let Ok(v) = value.to_str() {
            response_builder = response_builder.header(name.as_str(), v);
        }
    }

    let body_bytes = response.bytes().await.map_err(|e| {
        tracing::error!(error = %e, trace_id = %trace_id, "Failed to read backend response body");
        Error::External("failed to read backend response".into())
    })?;

    response_builder
        .body(Body::from(body_bytes))
        .map_err(|e| Error::Internal(e.to_string()).into())
}
