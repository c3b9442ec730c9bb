//! Ollama 互換のローカル推論サーバ
//!
//! `POST {base}/api/generate` に `{model, prompt, stream: false, images: [base64]}` を送り、
//! `{response}` を受け取る。

use super::Captioner;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use base64::Engine;
use photo_ingest_common::normalize_caption;
use photo_ingest_common::prompts::{CAPTION_PROMPT, MAX_CAPTION_KEYWORDS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaCaptioner {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    images: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaCaptioner {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, image: &[u8]) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: CAPTION_PROMPT,
            stream: false,
            images: vec![base64::engine::general_purpose::STANDARD.encode(image)],
        }
    }
}

#[async_trait]
impl Captioner for OllamaCaptioner {
    async fn describe(&self, image: &[u8]) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        log::debug!("キャプション要求: {} ({:.2} MB)", url, image.len() as f64 / (1024.0 * 1024.0));

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(image))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Caption(format!("HTTP {}: {}", status, body)));
        }

        let body: GenerateResponse = response.json().await?;
        log::debug!("モデル出力: {}", body.response.trim());

        Ok(normalize_caption(&body.response, MAX_CAPTION_KEYWORDS))
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|e| IngestError::DependencyUnavailable(format!("{}: {}", url, e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IngestError::DependencyUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )))
        }
    }
}
