// Generative Language API client - narrative provider over HTTPS
use crate::application::diagnostics::{NarrativeProvider, NarrativeRequest};
use crate::infrastructure::config::NarrativeSettings;
use crate::infrastructure::prompt::build_prompt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GeminiClient {
    pub fn new(settings: &NarrativeSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build narrative HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    fn build_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            urlencoding::encode(&self.model),
            urlencoding::encode(api_key)
        )
    }

    fn extract_text(response: GenerateContentResponse) -> String {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl NarrativeProvider for GeminiClient {
    async fn analyze(&self, request: &NarrativeRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Narrative API key is not configured")?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_prompt(request)),
                }],
            }],
        };

        tracing::debug!(motor = %request.profile.id, model = %self.model, "requesting narrative");
        let response = self
            .client
            .post(self.build_url(api_key))
            .json(&body)
            .send()
            .await
            .context("Failed to send request to narrative service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Narrative service failed with status {}: {}", status, body);
        }

        let data = response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse narrative service response")?;

        Ok(Self::extract_text(data))
    }
}
