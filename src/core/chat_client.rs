use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::config::Config;
use crate::utils::url::construct_api_url;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// One chat-completion call: model, role-tagged turns, and sampling knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No credential is configured; nothing was sent.
    Configuration(String),
    /// The request failed. `status` is `None` when no HTTP response arrived.
    Transport { status: Option<u16>, body: String },
    /// The provider answered, but not with `choices[0].message.content`.
    MalformedResponse(String),
}

impl CompletionError {
    pub fn missing_token() -> Self {
        CompletionError::Configuration(
            "API token is not configured. Set SILICONFLOW_API_TOKEN or run `concept-mentor settings set <model> --token`.".to_string(),
        )
    }

    /// Connection failures, rate limits and server errors may succeed on a
    /// second attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Transport { status: None, .. } => true,
            CompletionError::Transport {
                status: Some(status),
                ..
            } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Configuration(message) => write!(f, "{message}"),
            CompletionError::Transport {
                status: Some(status),
                body,
            } => write!(
                f,
                "API request failed with status {status}: {}",
                summarize_error_body(body)
            ),
            CompletionError::Transport { status: None, body } => {
                write!(f, "API request failed: {body}")
            }
            CompletionError::MalformedResponse(message) => {
                write!(f, "Malformed API response: {message}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Reduce an error body to one readable line. JSON bodies contribute their
/// `error.message`; anything else is collapsed and truncated.
pub(crate) fn summarize_error_body(body: &str) -> String {
    const MAX_CHARS: usize = 300;

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            return summary;
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_CHARS {
        let truncated: String = collapsed.chars().take(MAX_CHARS).collect();
        format!("{truncated}…")
    } else {
        collapsed
    }
}

/// Extract `choices[0].message.content` from a successful response body.
pub fn parse_completion_body(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|err| {
        CompletionError::MalformedResponse(format!("response is not valid JSON: {err}"))
    })?;

    response.into_first_content().ok_or_else(|| {
        CompletionError::MalformedResponse(
            "response has no choices[0].message.content".to_string(),
        )
    })
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

#[async_trait]
impl<T: ChatCompletion + ?Sized> ChatCompletion for Arc<T> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_token))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatCompletion for HttpChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let token = self
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(CompletionError::missing_token)?;

        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            url = %chat_url,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(chat_url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| CompletionError::Transport {
                status: None,
                body: err.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| CompletionError::Transport {
                status: Some(status.as_u16()),
                body: err.to_string(),
            })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(CompletionError::Transport {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        parse_completion_body(&text)
    }
}

/// Retries transient failures of the wrapped client a bounded number of
/// times, sleeping `backoff * attempt` between tries.
pub struct RetryingChatClient<C> {
    inner: C,
    max_retries: u32,
    backoff: Duration,
}

impl<C> RetryingChatClient<C> {
    pub fn new(inner: C, max_retries: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
        }
    }
}

#[async_trait]
impl<C: ChatCompletion> ChatCompletion for RetryingChatClient<C> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let mut attempt: u32 = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, max = self.max_retries, error = %err, "retrying chat completion");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                outcome => return outcome,
            }
        }
    }
}

/// Client for the configured endpoint, wrapped in [`RetryingChatClient`]
/// only when `max-retries` is set.
pub fn client_from_config(
    config: &Config,
    api_token: String,
) -> Result<Arc<dyn ChatCompletion>, reqwest::Error> {
    let http = HttpChatClient::new(
        config.resolved_base_url(),
        Some(api_token),
        Duration::from_secs(config.request_timeout_secs()),
    )?;
    match config.max_retries() {
        0 => Ok(Arc::new(http)),
        retries => Ok(Arc::new(RetryingChatClient::new(
            http,
            retries,
            RETRY_BACKOFF,
        ))),
    }
}
