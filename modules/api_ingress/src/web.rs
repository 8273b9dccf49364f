use std::sync::Arc;

use axum::{http::StatusCode, response::Json, Extension};
use restkit::{ErrDef, ProblemResponse, RequestCtx};
use serde_json::{json, Value};

const ROUTE_NOT_FOUND: ErrDef = ErrDef {
    status: StatusCode::NOT_FOUND,
    title: "Not Found",
    code: "ROUTE_NOT_FOUND",
    type_url: "https://errors.example.com/ROUTE_NOT_FOUND",
};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn openapi_json(
    Extension(doc): Extension<Arc<utoipa::openapi::OpenApi>>,
) -> Json<utoipa::openapi::OpenApi> {
    Json((*doc).clone())
}

/// Fallback for unknown paths so clients always get a problem body.
pub async fn not_found(ctx: RequestCtx) -> ProblemResponse {
    ctx.problem(
        &ROUTE_NOT_FOUND,
        format!("No route matches '{}'", ctx.path),
    )
}
