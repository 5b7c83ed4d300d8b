use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::error::{AppError, AppResult};

use super::SignedUrlStorage;

pub struct HttpSignedUrlStorage {
    client: Client,
}

impl HttpSignedUrlStorage {
    pub fn new(timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

/// Signed URLs carry credentials in the query string; keep them out of logs.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl SignedUrlStorage for HttpSignedUrlStorage {
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let size = data.len();
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "upload rejected with status {}",
                response.status()
            )));
        }

        tracing::info!("Signed upload: url={}, size={}", redact(url), size);
        Ok(())
    }

    async fn get(&self, url: &str) -> AppResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "download rejected with status {}",
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("download interrupted: {}", e)))?;

        tracing::info!("Signed download: url={}, size={}", redact(url), data.len());
        Ok(data)
    }
}
