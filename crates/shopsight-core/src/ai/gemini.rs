//! Gemini backend implementation
//!
//! HTTP client for the Google Generative Language `generateContent` API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{upstream_error, AIBackend};

const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_VERSION: &str = "v1beta";

/// Gemini backend
///
/// The API key is sent in the `x-goog-api-key` header so it never appears in
/// request URLs or logs.
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend against the public API
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_host(DEFAULT_HOST, api_key, model)
    }

    /// Create a backend against a custom base URL (proxies, test servers)
    pub fn with_host(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.trim().trim_matches(|c| c == '"' || c == '\'').to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_MODEL` (default: gemini-1.5-flash), `GEMINI_HOST`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Some(Self::with_host(&host, &api_key, &model))
    }
}

/// Request to the generateContent endpoint
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response from the generateContent endpoint
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(format!(
                "{}/{}/models/{}:generateContent",
                self.base_url, API_VERSION, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("Gemini", response).await);
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .into_text()
            .ok_or_else(|| Error::Upstream(format!("Empty response from {}", self.model)))?;
        debug!(model = %self.model, chars = text.len(), "Gemini response received");

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/{}/models", self.base_url, API_VERSION))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockAiServer;

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(response.into_text().is_none());
    }

    #[test]
    fn test_api_key_is_cleaned() {
        let backend = GeminiBackend::new(" \"secret\" ", DEFAULT_MODEL);
        assert_eq!(backend.api_key, "secret");
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockAiServer::start("```json\n{\"insights\":[]}\n```").await;
        let backend = GeminiBackend::with_host(&server.url(), "test-key", DEFAULT_MODEL);

        assert!(backend.health_check().await);
        let reply = backend.generate("Phân tích").await.unwrap();
        assert_eq!(reply, "```json\n{\"insights\":[]}\n```");
        assert_eq!(server.last_prompt().as_deref(), Some("Phân tích"));
    }

    #[tokio::test]
    async fn test_quota_error_is_upstream() {
        let server = MockAiServer::start_failing(429).await;
        let backend = GeminiBackend::with_host(&server.url(), "test-key", DEFAULT_MODEL);

        let err = backend.generate("x").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref msg) if msg.contains("quota")));
    }
}
