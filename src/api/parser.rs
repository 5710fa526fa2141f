// src/api/parser.rs
//! Turns raw HTTP responses into typed payloads or typed errors.

use super::types::NotionApiErrorResponse;
use crate::error::{AppError, NotionErrorCode};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

const BODY_PREVIEW_LEN: usize = 500;

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse {
    pub body: String,
    pub status: StatusCode,
    pub url: String,
}

pub fn parse_api_response<T: DeserializeOwned>(response: ApiResponse) -> Result<T, AppError> {
    if response.status.is_success() {
        parse_success(&response.body, &response.url)
    } else {
        Err(parse_error(&response.body, response.status, &response.url))
    }
}

fn parse_success<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

fn parse_error(body: &str, status: StatusCode, url: &str) -> AppError {
    if let Ok(error) = serde_json::from_str::<NotionApiErrorResponse>(body) {
        return AppError::NotionService {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status: status.as_u16(),
        };
    }

    AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}", status, url),
        status: status.as_u16(),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
