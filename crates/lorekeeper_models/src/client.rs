//! OpenAI-compatible chat completions client.

use crate::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat, parse_mapping};
use async_trait::async_trait;
use derive_getters::Getters;
use lorekeeper_error::{GenerationError, GenerationErrorKind, LorekeeperResult};
use lorekeeper_interface::{Mapping, StructuredGenerator};
use reqwest::Client;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, instrument, warn};

const JSON_ONLY_SUFFIX: &str = "\n\nRespond with a single valid JSON object and nothing else.";

/// Connection and sampling settings for [`ChatCompletionsClient`].
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ClientSettings {
    /// API root, e.g. `https://api.openai.com/v1`
    base_url: String,
    /// Model identifier
    model: String,
    /// Bearer token, if the endpoint needs one
    #[builder(default)]
    api_key: Option<String>,
    /// Reply length limit
    #[builder(default = "4096")]
    max_tokens: u32,
    /// Sampling temperature
    #[builder(default = "0.3")]
    temperature: f32,
    /// Retries after the first failed attempt
    #[builder(default = "5")]
    max_retries: usize,
    /// First backoff delay in milliseconds
    #[builder(default = "2000")]
    initial_backoff_ms: u64,
    /// Per-request timeout in seconds
    #[builder(default = "120")]
    timeout_secs: u64,
}

impl ClientSettings {
    /// Creates a new settings builder.
    pub fn builder() -> ClientSettingsBuilder {
        ClientSettingsBuilder::default()
    }
}

/// Chat completions client that returns parsed JSON objects.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    settings: ClientSettings,
}

impl ChatCompletionsClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(settings: ClientSettings) -> LorekeeperResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GenerationError::new(GenerationErrorKind::Http(e.to_string())))?;
        debug!(model = %settings.model, base_url = %settings.base_url, "Creating chat completions client");
        Ok(Self { client, settings })
    }

    /// Model identifier.
    pub fn model_name(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, prompt: &str, system: &str) -> LorekeeperResult<ChatRequest> {
        ChatRequest::builder()
            .model(self.settings.model.clone())
            .messages(vec![
                ChatMessage::system(format!("{}{}", system, JSON_ONLY_SUFFIX)),
                ChatMessage::user(prompt),
            ])
            .temperature(Some(self.settings.temperature))
            .max_tokens(Some(self.settings.max_tokens))
            .response_format(Some(ResponseFormat::json_object()))
            .build()
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::ResponseParsing(e.to_string())).into()
            })
    }

    /// Sends one request without retrying.
    #[instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError> {
        let mut builder = self.client.post(self.endpoint()).json(request);
        if let Some(api_key) = &self.settings.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = ?e, "Failed to send chat completions request");
            GenerationError::new(GenerationErrorKind::Http(format!("Request failed: {}", e)))
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            warn!("Chat completions rate limit exceeded");
            return Err(GenerationError::new(GenerationErrorKind::RateLimit));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Chat completions API returned error");
            return Err(GenerationError::new(GenerationErrorKind::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse chat completions response");
            GenerationError::new(GenerationErrorKind::ResponseParsing(e.to_string()))
        })
    }

    /// Sends a request, retrying transient failures with exponential backoff.
    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatResponse, GenerationError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.settings.initial_backoff_ms)
            .factor(2)
            .max_delay(Duration::from_secs(60))
            .map(jitter)
            .take(self.settings.max_retries);

        Retry::spawn(retry_strategy, || async {
            match self.send(request).await {
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Chat completions request failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent chat completions error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl StructuredGenerator for ChatCompletionsClient {
    #[instrument(skip(self, prompt, system), fields(model = %self.settings.model, prompt_chars = prompt.len()))]
    async fn generate_structured(&self, prompt: &str, system: &str) -> LorekeeperResult<Mapping> {
        let request = self.build_request(prompt, system)?;
        let response = self.send_with_retry(&request).await?;

        let Some(text) = response.first_text() else {
            warn!("Chat completions response had no choices");
            return Ok(Mapping::new());
        };
        let mapping = parse_mapping(text);
        debug!(keys = mapping.len(), "Parsed structured reply");
        Ok(mapping)
    }
}
