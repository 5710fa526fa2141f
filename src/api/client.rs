// src/api/client.rs
//! HTTP client for the Notion API.
//!
//! Handles authentication, versioning and status mapping. It performs one
//! request per call; retries and pagination live a layer up.

use super::parser::{parse_api_response, ApiResponse};
use super::query::DatabaseQuery;
use super::types::RecordPage;
use super::ContentApi;
use crate::constants::{HTTP_REQUEST_TIMEOUT_SECS, NOTION_API_PAGE_SIZE};
use crate::error::AppError;
use crate::types::{ApiKey, BlockId, DatabaseId, PageId};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const NOTION_VERSION: &str = "2022-06-28";
pub const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Points the client at another server, e.g. a local mock.
    pub fn with_base_url(api_key: &ApiKey, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );
        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    async fn get(&self, endpoint: &str) -> Result<ApiResponse, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        extract_response_text(response).await
    }

    async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<ApiResponse, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        extract_response_text(response).await
    }
}

async fn extract_response_text(response: Response) -> Result<ApiResponse, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await?;
    log::debug!("{} <- {}", status, url);
    Ok(ApiResponse { body, status, url })
}

#[async_trait]
impl ContentApi for NotionHttpClient {
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
        cursor: Option<&str>,
    ) -> Result<RecordPage, AppError> {
        let endpoint = format!("databases/{}/query", database.to_dashed());
        let body = query.to_body(NOTION_API_PAGE_SIZE, cursor);
        parse_api_response(self.post(&endpoint, &body).await?)
    }

    async fn list_block_children(
        &self,
        block: &BlockId,
        cursor: Option<&str>,
    ) -> Result<RecordPage, AppError> {
        let mut endpoint = format!(
            "blocks/{}/children?page_size={}",
            block.to_dashed(),
            NOTION_API_PAGE_SIZE
        );
        if let Some(cursor) = cursor {
            let cursor: String = url::form_urlencoded::byte_serialize(cursor.as_bytes()).collect();
            endpoint.push_str("&start_cursor=");
            endpoint.push_str(&cursor);
        }
        parse_api_response(self.get(&endpoint).await?)
    }

    async fn retrieve_page(&self, page: &PageId) -> Result<Value, AppError> {
        let endpoint = format!("pages/{}", page.to_dashed());
        parse_api_response(self.get(&endpoint).await?)
    }
}
