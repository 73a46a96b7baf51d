//! HTTP backend (JSON over reqwest).
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  products`          → `[ProductRecord]`
//! - `GET  branches`          → `[{name, products}]`
//! - `POST process_queue`     ← `[{id, branch, listed, productId}]`
//! - `POST new_branch/{name}`

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use listings_catalog::{Branch, ProductRecord};

use crate::backend::{CatalogBackend, ChangeBatch};
use crate::config::ClientConfig;
use crate::error::SyncError;

pub const BATCH_ID_HEADER: &str = "X-Batch-Id";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    request_timeout: std::time::Duration,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, SyncError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| SyncError::Parse(format!("invalid API URL {}: {e}", config.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Parse(format!("API URL cannot be a base: {base_url}")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: config.auth_token.clone(),
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let url = self.endpoint(&[path]);
        let resp = self
            .authorize(self.client.get(url).timeout(self.request_timeout))
            .send()
            .await
            .map_err(|e| timeout_or(e, self.request_timeout))?;

        let resp = ensure_success(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| SyncError::Parse(format!("failed to parse {path}: {e}")))
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, SyncError> {
        self.get_json("products").await
    }

    async fn fetch_branches(&self) -> Result<Vec<Branch>, SyncError> {
        self.get_json("branches").await
    }

    async fn submit_changes(&self, batch: &ChangeBatch) -> Result<(), SyncError> {
        // The session owns the submission deadline; no per-request timeout here.
        let req = self
            .client
            .post(self.endpoint(&["process_queue"]))
            .header(BATCH_ID_HEADER, batch.id.to_string())
            .json(&batch.entries);

        let resp = self.authorize(req).send().await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn create_branch(&self, name: &str) -> Result<(), SyncError> {
        let req = self
            .client
            .post(self.endpoint(&["new_branch", name]))
            .timeout(self.request_timeout);

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| timeout_or(e, self.request_timeout))?;
        ensure_success(resp).await?;
        Ok(())
    }
}

async fn ensure_success(resp: Response) -> Result<Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Api(status.as_u16(), body))
}

fn timeout_or(err: reqwest::Error, timeout: std::time::Duration) -> SyncError {
    if err.is_timeout() {
        SyncError::Timeout(timeout)
    } else {
        SyncError::from(err)
    }
}
