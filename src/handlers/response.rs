// src/handlers/response.rs
// DOCUMENTATION: Success envelope shared by all news endpoints
// PURPOSE: Render {code, status, message, data?} JSON bodies

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn respond<T: Serialize>(data: Option<T>, message: &str) -> HttpResponse {
    let status = StatusCode::OK;
    HttpResponse::build(status).json(ApiResponse {
        code: status.as_u16(),
        status: status.canonical_reason().unwrap_or("OK"),
        message: message.to_string(),
        data,
    })
}

/// 200 with a payload
pub fn success<T: Serialize>(data: T, message: &str) -> HttpResponse {
    respond(Some(data), message)
}

/// 200 without a payload, for mutations
pub fn success_no_data(message: &str) -> HttpResponse {
    respond::<()>(None, message)
}
