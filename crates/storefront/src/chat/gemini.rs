//! Gemini `generateContent` client.
//!
//! Used only as the last resort of the assistant widget, when no canned
//! answer matches.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use super::{ChatRole, ChatTurn};
use crate::config::GeminiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_OUTPUT_TOKENS: u32 = 512;

/// Store description sent as the system instruction.
pub const SYSTEM_INSTRUCTION: &str = "Bạn là trợ lý bán hàng của Mobistore, cửa hàng điện thoại \
    di động tại Việt Nam. Trả lời ngắn gọn bằng tiếng Việt, thân thiện, chỉ về sản phẩm điện thoại, \
    giao hàng, bảo hành, trả góp và thanh toán. Không bịa giá; nếu không chắc, hãy mời khách gọi \
    hotline 1900 6868.";

/// Errors from the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Gemini returned no text")]
    Empty,
}

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

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

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                endpoint: format!(
                    "{}/v1beta/models/{}:generateContent",
                    config.api_url.trim_end_matches('/'),
                    config.model
                ),
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// Generate an answer to `prompt`, with earlier turns as context.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer has no text.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn generate(&self, history: &[ChatTurn], prompt: &str) -> Result<String, GeminiError> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                }),
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: prompt }],
        });

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| text.chars().take(200).collect());
            return Err(GeminiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let response: GenerateResponse = response.json().await?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::Empty);
        }
        Ok(text)
    }
}
