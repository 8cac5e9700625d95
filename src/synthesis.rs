use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Turns a text prompt into raw image bytes (PNG).
    async fn synthesize(&self, prompt: &str) -> anyhow::Result<Bytes>;
}

/// Clipdrop-style text-to-image API: multipart `prompt` field, api key in a
/// custom header, raw image bytes back.
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSynthesizer {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("build synthesis http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ImageSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, prompt: &str) -> anyhow::Result<Bytes> {
        let form = reqwest::multipart::Form::new().text("prompt", prompt.to_string());
        let resp = self
            .client
            .post(format!("{}/text-to-image/v1", self.base_url))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .context("synthesis request")?;

        if !resp.status().is_success() {
            anyhow::bail!("synthesis api returned {}", resp.status());
        }
        let bytes = resp.bytes().await.context("read synthesis response")?;
        Ok(bytes)
    }
}
