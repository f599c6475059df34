//! Health and about endpoints

use axum::{Json, Router, http::HeaderMap, routing::get};
use serde_json::json;

use crate::api::dto::MessageResponse;

async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse::new("Server is running :) !"))
}

/// `GET /about.json`
///
/// Server self-description: the caller's address, the server epoch
/// time, and the catalog of exposed services.
async fn about(headers: HeaderMap) -> Json<serde_json::Value> {
    let client_host = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("127.0.0.1")
        .to_string();

    Json(json!({
        "client": {
            "host": client_host,
        },
        "server": {
            "current_time": chrono::Utc::now().timestamp(),
            "services": [
                {
                    "name": "auth",
                    "actions": [
                        {"name": "register", "description": "Create a local account"},
                        {"name": "token", "description": "Exchange credentials for a bearer token"},
                        {"name": "oauth", "description": "Log in through an external provider"},
                    ],
                    "reactions": [],
                },
                {
                    "name": "users",
                    "actions": [
                        {"name": "me", "description": "Read the authenticated profile"},
                        {"name": "update", "description": "Change email or password"},
                        {"name": "delete", "description": "Remove the account"},
                    ],
                    "reactions": [],
                },
            ],
        },
    }))
}

/// Create the health/about router (mounted at the root)
pub fn health_router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/about.json", get(about))
}
