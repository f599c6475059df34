//! Metrics exposition
//!
//! Serves the registry contents in Prometheus text format for a
//! scraper to poll.

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::REGISTRY;

/// Encode every registered instrument into one scrape body.
async fn export_metrics() -> Response {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();

    match encoder.encode_to_string(&families) {
        Ok(body) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, encoder.format_type())],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%error, "Metrics encoding failed");
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "metrics encoding failed",
            )
                .into_response()
        }
    }
}

/// Router serving `GET /metrics`.
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(export_metrics))
}
