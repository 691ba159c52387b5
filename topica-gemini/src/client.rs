use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use topica_chat::{Message, ModelAdapter, ModelReply, Topic};
use tracing::{debug, instrument, warn};

use crate::convert::{build_contents, build_request_body, parse_error, parse_response};
use crate::error::GeminiError;
use crate::types::GenerateRequest;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Values hosting environments leave behind when a key was never set.
const PLACEHOLDER_KEYS: &[&str] = &["undefined", "null", "PLACEHOLDER_API_KEY"];

#[derive(Clone)]
struct ApiKey(String);

impl ApiKey {
    /// Rejects empty and placeholder values.
    fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if key.is_empty() || PLACEHOLDER_KEYS.iter().any(|p| p.eq_ignore_ascii_case(key)) {
            return None;
        }
        Some(Self(key.to_string()))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Construction parameters for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Upper bound for a whole request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Client for the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<ApiKey>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Creates a client. The API key is validated here; a client without a
    /// usable key is still built, and every request fails with
    /// [`GeminiError::MissingApiKey`] without touching the network.
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let api_key = config.api_key.as_deref().and_then(ApiKey::parse);
        if api_key.is_none() {
            warn!("no usable Gemini API key configured; requests will fail until one is set");
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Executes a `generateContent` request.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ModelReply, GeminiError> {
        let api_key = self.api_key.as_ref().ok_or(GeminiError::MissingApiKey)?;
        let body = build_request_body(request);

        debug!(turns = request.contents.len(), "Sending request to Gemini");

        let response = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", &api_key.0)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(parse_error(status.as_u16(), &body));
        }

        let body: Value = response.json().await?;
        let reply = parse_response(&body);

        debug!(sources = reply.sources.len(), "Received successful response");

        Ok(reply)
    }
}

#[async_trait]
impl ModelAdapter for GeminiClient {
    type Error = GeminiError;

    async fn send(
        &self,
        message: &str,
        history: &[Message],
        topic: &Topic,
    ) -> Result<ModelReply, GeminiError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            contents: build_contents(message, history),
            system_instruction: Some(topic.system_instruction.clone()),
            web_search: true,
        };
        self.generate(&request).await
    }
}
