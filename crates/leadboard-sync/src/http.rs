//! HTTP client for the spreadsheet web-app endpoint.
//!
//! The endpoint serves every row on `GET` and accepts one lead per `POST`.

use std::time::Duration;

use async_trait::async_trait;
use leadboard_core::{RawRow, SaveAck, SaveRequest};
use tracing::info;

use crate::backend::parse_rows;
use crate::{LeadBackend, SyncError};

/// HTTP client for a sheet endpoint.
pub struct SheetClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SheetClient {
    /// Create a client for the given endpoint URL (trailing slash ignored).
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(endpoint: String, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_body(resp: reqwest::Response) -> Result<String, SyncError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl LeadBackend for SheetClient {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SyncError> {
        info!(url = %self.endpoint, "fetching lead rows");
        let resp = self.client.get(&self.endpoint).send().await?;
        let body = Self::read_body(resp).await?;

        let rows = parse_rows(serde_json::from_str(&body)?)?;
        info!(count = rows.len(), "fetched lead rows");
        Ok(rows)
    }

    async fn save(&self, request: &SaveRequest) -> Result<SaveAck, SyncError> {
        info!(url = %self.endpoint, customer = %request.customer, "saving lead");
        let resp = self.client.post(&self.endpoint).json(request).send().await?;
        let body = Self::read_body(resp).await?;

        let ack: SaveAck = serde_json::from_str(&body)?;
        info!(status = %ack.status, "save acknowledged");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_client_trims_trailing_slash() {
        let client = SheetClient::new("https://sheets.example.com/exec/".into());
        assert_eq!(client.endpoint(), "https://sheets.example.com/exec");
    }

    #[test]
    fn sheet_client_with_timeout() {
        let client =
            SheetClient::with_timeout("http://localhost:4000".into(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.endpoint, "http://localhost:4000");
    }
}
