//! Chat-completions client for the extraction provider.
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format so the
//! provider is swappable via the configured base URL (Groq, OpenAI, a local
//! gateway). Non-2xx response bodies are carried verbatim inside
//! [`ScraperError::Provider`] so the retry policy can inspect them for
//! rate-limit text.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    #[must_use]
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, ScraperError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|e| {
            ScraperError::Provider {
                message: format!("invalid API key header: {e}"),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Runs one extraction call: `instruction` as the system message,
    /// `content` as the user message. Returns the assistant's raw text.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`]: transport failure.
    /// - [`ScraperError::Provider`]: non-2xx status (body text preserved,
    ///   including any rate-limit hint) or a response without content.
    pub async fn extract(
        &self,
        instruction: &str,
        content: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, ScraperError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            temperature,
            max_tokens,
        };

        tracing::debug!(model = %self.model, content_len = content.len(), "extraction request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScraperError::Provider {
                message: format!("{status}: {body}"),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScraperError::Provider {
                message: "provider returned no content".to_string(),
            })
    }
}
