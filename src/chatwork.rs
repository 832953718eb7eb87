//! Chatwork message posting
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::{DigestError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.chatwork.com/v2";

/// Destination for a rendered digest
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn post(&self, room_id: &str, body: &str) -> Result<()>;
}

/// Chatwork REST API client
pub struct ChatworkClient {
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl ChatworkClient {
    pub fn new(api_token: String, base_url: &str, timeout_seconds: u64) -> Result<Self> {
        if api_token.is_empty() {
            return Err(DigestError::Config("Chatwork API token required".to_string()));
        }
        Url::parse(base_url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl MessageSink for ChatworkClient {
    async fn post(&self, room_id: &str, body: &str) -> Result<()> {
        let url = format!("{}/rooms/{}/messages", self.base_url, room_id);
        debug!("Posting {} chars to Chatwork room {}", body.chars().count(), room_id);

        let response = self
            .client
            .post(&url)
            .header("X-ChatWorkToken", &self.api_token)
            .form(&[("body", body)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::Api { status, body });
        }

        info!("📤 Posted digest to Chatwork room {}", room_id);
        Ok(())
    }
}
