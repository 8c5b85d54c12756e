//! Synthesized responses.
//!
//! # Responsibilities
//! - Build gateway-failure responses (502/504) when a backend cannot answer
//!
//! # Design Decisions
//! - JSON body so the front-end's error handling sees the same shape as backend errors
//! - Backend responses themselves are never rewritten here

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A gateway-generated error response.
pub fn gateway_failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
