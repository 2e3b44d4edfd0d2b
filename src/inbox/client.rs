//! HTTP client for the inbox endpoint.
//!
//! `GET {endpoint}` answers `{ items, stats }` or `{ error }`. A forced fetch
//! appends `refresh=true` so the backend skips its own cache. Item updates go
//! out as `PATCH {endpoint}/{id}` with the partial fields as the JSON body.

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::types::{InboxPayload, InboxResponse, ItemPatch};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[async_trait]
pub trait InboxTransport: Send + Sync {
    async fn fetch(&self, force_refresh: bool) -> Result<InboxPayload, SyncError>;
    async fn update_item(&self, id: &str, fields: &ItemPatch) -> Result<(), SyncError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let endpoint = Url::parse(&config.endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(SyncError::InvalidEndpoint(config.endpoint.clone()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn fetch_url(&self, force_refresh: bool) -> Url {
        let mut url = self.endpoint.clone();
        if force_refresh {
            url.query_pairs_mut().append_pair("refresh", "true");
        }
        url
    }

    pub fn item_url(&self, id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }
        url
    }
}

#[async_trait]
impl InboxTransport for HttpTransport {
    async fn fetch(&self, force_refresh: bool) -> Result<InboxPayload, SyncError> {
        let resp = self
            .client
            .get(self.fetch_url(force_refresh))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let body = check_status(resp).await?.text().await?;
        let parsed: InboxResponse =
            serde_json::from_str(&body).map_err(|e| SyncError::MalformedBody(e.to_string()))?;
        parsed.into_result()
    }

    async fn update_item(&self, id: &str, fields: &ItemPatch) -> Result<(), SyncError> {
        let resp = self
            .client
            .patch(self.item_url(id))
            .json(fields)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let body = check_status(resp).await?.text().await?;
        // An empty body is a plain acknowledgement; `{ error }` is a refusal.
        if let Ok(InboxResponse::Failure { error }) = serde_json::from_str(&body) {
            return Err(SyncError::Backend(error));
        }
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound);
    }
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(SyncError::Status {
            status: status.as_u16(),
            message: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }
    Ok(resp)
}
