//! Text generation: the OpenAI-compatible client, the offline echo backend and
//! a retry/timeout wrapper.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Anything that turns a prompt into free text.
pub trait PhraseGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

#[derive(Debug)]
pub enum GenerationError {
    Http(String),
    /// Non-success status from the service (quota, auth, overload).
    Api { status: u16, body: String },
    Parse(String),
    Empty,
    Timeout(Duration),
}

impl GenerationError {
    /// Client errors other than rate limiting will fail the same way again.
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Parse(_) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::Http(e) => write!(f, "HTTP error: {e}"),
            GenerationError::Api { status, body } => write!(f, "API error {status}: {body}"),
            GenerationError::Parse(e) => write!(f, "Parse error: {e}"),
            GenerationError::Empty => write!(f, "Empty response"),
            GenerationError::Timeout(d) => write!(f, "Timed out after {}s", d.as_secs()),
        }
    }
}

impl std::error::Error for GenerationError {}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat completions client.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ApiRequest {
            model: &self.model,
            messages: vec![ApiMessage { role: "user", content: prompt }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Http(e.to_string()))?;
        parse_completion(&body)
    }
}

fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::Empty)
}

impl PhraseGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("Generation request ({} chars)", prompt.chars().count());
        self.complete(prompt).await
    }
}

/// Offline backend: answers with the prompt itself. Used when no API key is set.
pub struct EchoGenerator;

impl PhraseGenerator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(format!("[TEST] Sorğu: {prompt}"))
    }
}

/// Backend picked from config.
pub enum Backend {
    OpenAi(OpenAiClient),
    Echo(EchoGenerator),
}

impl PhraseGenerator for Backend {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Backend::OpenAi(client) => client.generate(prompt).await,
            Backend::Echo(echo) => echo.generate(prompt).await,
        }
    }
}

/// Timeout and retry policy for [`Resilient`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 2,
            backoff: Duration::from_millis(1000),
        }
    }
}

/// Wraps a generator with a per-attempt timeout and bounded exponential backoff.
pub struct Resilient<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: PhraseGenerator> Resilient<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<G: PhraseGenerator> PhraseGenerator for Resilient<G> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut delay = self.policy.backoff;
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.policy.timeout, self.inner.generate(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.policy.timeout)),
            };

            match result {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.policy.retries && e.is_retryable() => {
                    attempt += 1;
                    warn!("Generation attempt {} failed: {}; retrying in {:?}", attempt, e, delay);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
