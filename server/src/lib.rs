use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lexsearch_core::persist::{load_snapshot, IndexPaths};
use lexsearch_core::{QueryError, QueryService, RankedResult};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<RankedResult>,
}

/// Transport-level failures, each rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request or rejected query (400).
    BadRequest(String),
    /// Wrong HTTP method on a known route (405).
    MethodNotAllowed,
    /// Unknown route (404).
    NotFound,
    /// Unexpected failure inside the engine (500).
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "The resource could not be found.".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.".to_string()),
        };
        let body = Json(serde_json::json!({ "error": message }));
        if status == StatusCode::METHOD_NOT_ALLOWED {
            // /process_query is the only route with a method restriction
            return (status, [(header::ALLOW, "POST")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Validation(v) => ApiError::BadRequest(format!("Invalid query: {v}")),
            QueryError::Internal(_) => ApiError::Internal,
        }
    }
}

/// Load the snapshot under `index_dir` and build the router. Fails, and the
/// process must not serve, if any artifact is missing or unreadable.
pub fn build_app(index_dir: &str, top_k: usize) -> Result<Router> {
    let snapshot = load_snapshot(&IndexPaths::new(index_dir))?;
    let service = QueryService::new(Arc::new(snapshot)).with_top_k(top_k);

    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());
    Ok(router(Arc::new(service)).layer(TraceLayer::new_for_http()).layer(cors))
}

/// Browser access policy. `origins` is a comma-separated allow-list; when it
/// is absent or holds no valid origin, every origin is allowed.
pub fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .into_iter()
        .flat_map(|list| list.split(','))
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .filter(|o| !o.is_empty())
        .collect();
    let allow_origin = if allowed.is_empty() || allowed.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any)
}

pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/process_query", post(process_query).fallback(|| async { ApiError::MethodNotAllowed }))
        .fallback(|| async { ApiError::NotFound })
        .with_state(service)
}

pub async fn process_query(
    State(service): State<Arc<QueryService>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        ApiError::BadRequest("Missing JSON in request".into())
    })?;
    let query = match body.get("query") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.as_str()),
        Some(_) => return Err(ApiError::BadRequest("Empty or missing query in request".into())),
    };

    let results = service.answer(query)?;
    Ok(Json(QueryResponse { success: true, query: query.unwrap_or_default().to_string(), results }))
}
