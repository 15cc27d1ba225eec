use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::catalog::dto::{BreedQuery, ImageQuery};
use crate::config::CatApiConfig;
use crate::error::{ApiError, ApiResult};

/// Read-only passthrough to the external cat catalog. Responses are raw JSON;
/// no pagination or filtering logic of our own.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn breeds(&self, query: &BreedQuery) -> ApiResult<Value>;
    async fn breed_by_id(&self, breed_id: &str) -> ApiResult<Value>;
    async fn search_breeds(&self, term: &str) -> ApiResult<Value>;
    async fn images(&self, query: &ImageQuery) -> ApiResult<Value>;
    async fn image_by_id(&self, image_id: &str) -> ApiResult<Value>;
}

pub struct TheCatApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TheCatApi {
    pub fn new(config: &CatApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "catalog request");
        let response = self
            .http
            .get(&url)
            .query(query)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %url, "catalog request failed");
                ApiError::Internal(e.into())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound("Not found".into()));
        }
        if !status.is_success() {
            error!(%status, %url, "catalog upstream error");
            return Err(ApiError::Internal(anyhow!("upstream returned {status}")));
        }
        let body = response.json().await.map_err(|e| {
            error!(error = %e, %url, "catalog response decode failed");
            ApiError::Internal(e.into())
        })?;
        Ok(body)
    }
}

fn with_not_found(e: ApiError, message: &str) -> ApiError {
    match e {
        ApiError::NotFound(_) => ApiError::NotFound(message.into()),
        other => other,
    }
}

#[async_trait]
impl CatalogClient for TheCatApi {
    async fn breeds(&self, query: &BreedQuery) -> ApiResult<Value> {
        let mut params = Vec::new();
        if let Some(q) = &query.q {
            params.push(("q", q.clone()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        self.get("breeds", &params).await
    }

    async fn breed_by_id(&self, breed_id: &str) -> ApiResult<Value> {
        self.get(&format!("breeds/{breed_id}"), &[])
            .await
            .map_err(|e| with_not_found(e, "Cat breed not found"))
    }

    async fn search_breeds(&self, term: &str) -> ApiResult<Value> {
        self.get("breeds/search", &[("q", term.to_string())]).await
    }

    async fn images(&self, query: &ImageQuery) -> ApiResult<Value> {
        let mut params = Vec::new();
        if let Some(breed_id) = &query.breed_id {
            params.push(("breed_id", breed_id.clone()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(size) = &query.size {
            params.push(("size", size.clone()));
        }
        if let Some(mime_types) = &query.mime_types {
            params.push(("mime_types", mime_types.clone()));
        }
        self.get("images/search", &params).await
    }

    async fn image_by_id(&self, image_id: &str) -> ApiResult<Value> {
        self.get(&format!("images/{image_id}"), &[])
            .await
            .map_err(|e| with_not_found(e, "Image not found"))
    }
}
