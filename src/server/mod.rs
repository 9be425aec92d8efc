//! HTTP serving layer.
//!
//! One endpoint: `GET /v1/latestfiles/{bucket}/{channel}`, answering
//! 200 with the resolved [`FileInfo`] as JSON, 404 when there is no
//! backing row, 429 when rate-limited with nothing cached to serve, and
//! 500 for store or data failures. Error bodies are empty.
//!
//! The shared [`FileCache`] is injected as axum state; there are no
//! process-wide singletons.

pub mod config;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::MuninnError;
use crate::cache::FileCache;
use crate::types::FileId;

/// Build the service router around a shared lookup cache.
pub fn router(cache: Arc<FileCache>) -> Router {
    Router::new()
        .route("/v1/latestfiles/:bucket/:channel", get(get_latestfile))
        .layer(TraceLayer::new_for_http())
        .with_state(cache)
}

/// GET /v1/latestfiles/{bucket}/{channel}
async fn get_latestfile(
    State(cache): State<Arc<FileCache>>,
    Path((bucket, channel)): Path<(String, String)>,
) -> Response {
    let id = FileId::new(bucket, channel);
    match cache.lookup(&id).await {
        Ok(info) => Json(&*info).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for MuninnError {
    fn into_response(self) -> Response {
        let status = match self {
            MuninnError::NotFound => StatusCode::NOT_FOUND,
            MuninnError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            MuninnError::Store(_)
            | MuninnError::Timeout(_)
            | MuninnError::Pattern(_)
            | MuninnError::Decode(_)
            | MuninnError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Detail stays in the logs; the response body is empty.
            tracing::error!(error = %self, "lookup failed");
        }
        status.into_response()
    }
}
