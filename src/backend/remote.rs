//! Remote compile-and-trace service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::protocol::{Command, TraceError};

use super::{SourceFile, TraceBackend};

#[derive(Debug, Serialize)]
struct TraceRequest<'a> {
    code: &'a str,
}

/// Posts source text to `{base_url}/tracers/{ext}` and reads back a command
/// array.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TraceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraceError::build(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, ext: &str) -> String {
        format!("{}/tracers/{}", self.base_url, ext)
    }
}

#[async_trait]
impl TraceBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        let ext = source
            .extension()
            .ok_or_else(|| TraceError::UnsupportedLanguage(String::new()))?;
        let url = self.endpoint(ext);
        tracing::debug!(url = %url, "Requesting remote trace");

        let response = self
            .client
            .post(&url)
            .json(&TraceRequest {
                code: &source.content,
            })
            .send()
            .await
            .map_err(|e| TraceError::build(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(TraceError::Build(message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TraceError::build(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}
