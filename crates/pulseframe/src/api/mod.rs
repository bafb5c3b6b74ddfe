//! Chat-completions client, reachability probe, and backend selection.
//!
//! The pipeline talks to any OpenAI-compatible `/chat/completions`
//! endpoint. Before any phase call is issued, [`select_backend`] probes
//! the configured primary backend (then the fallback, if any) with a
//! tiny low-temperature completion. An unreachable service aborts the
//! run before sampling or store mutation — a missing pulse must be
//! visibly absent rather than silently replaced.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{BackendConfig, PulseConfig};
use crate::error::{PulseError, Result};

// ── Request types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion request body. No token ceiling is imposed — the
/// instruction preamble bounds output length instead.
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_f32")]
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Clean return type from [`ChatClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: Option<UsageInfo>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client bound to one backend.
#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    backend: BackendConfig,
}

impl ChatClient {
    /// Create a client for the given backend with a fixed request timeout.
    pub fn new(backend: BackendConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("pulseframe/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| PulseError::Api(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, backend })
    }

    /// The backend this client talks to.
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// The model sent with every request.
    pub fn model(&self) -> &str {
        &self.backend.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.backend.base_url)
    }

    /// Send a chat completion request and return the generated text.
    ///
    /// Connect failures and timeouts map to
    /// [`PulseError::Unreachable`]; HTTP-level and body-level failures
    /// map to [`PulseError::Api`]. Both abort the run either way.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion> {
        debug!(
            "LLM request: model={}, messages={}, temp={}",
            body.model,
            body.messages.len(),
            body.temperature,
        );

        let start = Instant::now();

        let mut req = self.client.post(self.endpoint()).json(body);
        if let Some(key) = &self.backend.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PulseError::Unreachable(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PulseError::Api(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(PulseError::Api(format!("HTTP {status}: {text}")));
        }

        let parsed: RawChatResponse = serde_json::from_str(&text)
            .map_err(|e| PulseError::Api(format!("failed to parse response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(PulseError::Api(err.message));
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let content = parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .ok_or_else(|| PulseError::Api("empty response (no choices)".to_string()))?;

        Ok(ChatCompletion {
            content,
            usage: parsed.usage,
        })
    }

    /// Lightweight reachability probe: a tiny low-temperature
    /// completion. Any failure — connect, timeout, HTTP error — counts
    /// as unreachable.
    pub async fn probe(&self) -> bool {
        let body = ChatRequest {
            model: self.backend.model.clone(),
            messages: vec![Message::user("Say hello in 3 words.")],
            temperature: 0.1,
            max_tokens: Some(16),
        };
        match self.chat(&body).await {
            Ok(_) => true,
            Err(e) => {
                warn!("probe failed for {}: {e}", self.backend.provider);
                false
            }
        }
    }
}

// ── Backend selection ──────────────────────────────────────────────

/// Probe the primary backend, then the fallback, and return a client
/// for the first one that responds.
///
/// Both unreachable is fatal: the pipeline aborts with no calls issued
/// and no store mutation.
pub async fn select_backend(config: &PulseConfig) -> Result<ChatClient> {
    let primary = ChatClient::new(config.primary.clone(), config.timeout)?;
    info!(
        "probing primary backend ({}) at {}",
        config.primary.provider, config.primary.base_url
    );
    if primary.probe().await {
        info!(
            "primary responding (model: {})",
            primary.backend().model
        );
        return Ok(primary);
    }

    if let Some(fallback) = &config.fallback {
        info!(
            "primary unreachable, probing fallback ({}) at {}",
            fallback.provider, fallback.base_url
        );
        let client = ChatClient::new(fallback.clone(), config.timeout)?;
        if client.probe().await {
            info!("fallback responding (model: {})", client.backend().model);
            return Ok(client);
        }
        return Err(PulseError::Unreachable(format!(
            "primary ({}) and fallback ({}) both failed the probe",
            config.primary.base_url, fallback.base_url
        )));
    }

    Err(PulseError::Unreachable(format!(
        "primary ({}) failed the probe and no fallback is configured",
        config.primary.base_url
    )))
}
