use crate::config::{Backend, Config};
use crate::error::{Error, Result};
use crate::prompt::system_prompt;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NO_RESPONSE_TEXT: &str = "No response generated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    General,
    Chart,
    Dashboard,
}

/// Body sent to the server function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeRequest {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(rename = "datasetId", skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
}

impl InvokeRequest {
    pub fn new(prompt: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            prompt: prompt.into(),
            kind,
            dataset_id: None,
        }
    }

    pub fn with_dataset(mut self, dataset_id: Option<String>) -> Self {
        self.dataset_id = dataset_id;
        self
    }
}

/// Sends one prompt to a remote AI service and returns its JSON reply.
/// One request per call: no retry, no cancellation.
#[async_trait]
pub trait AiInvoker: Send + Sync {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value>;
}

/// Pick the invoker named by the configuration
pub fn from_config(config: &Config) -> Result<Box<dyn AiInvoker>> {
    match config.backend {
        Backend::Function => {
            let url = config.function_url.clone().ok_or_else(|| {
                Error::NotConfigured("DATACHAT_FUNCTION_URL must be set for the function backend".to_string())
            })?;
            Ok(Box::new(FunctionInvoker::new(url, config.api_key.clone(), config.timeout)?))
        }
        Backend::Gateway => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::NotConfigured("DATACHAT_API_KEY must be set for the gateway backend".to_string())
            })?;
            Ok(Box::new(GatewayInvoker::new(
                config.gateway_url.clone(),
                api_key,
                config.model.clone(),
                config.timeout,
            )?))
        }
    }
}

fn ensure_prompt(request: &InvokeRequest) -> Result<()> {
    if request.prompt.trim().is_empty() {
        return Err(Error::EmptyPrompt);
    }
    Ok(())
}

/// Map a non-2xx reply to the error taxonomy.
/// The body's `error` field is preferred as the message.
fn remote_error(status: StatusCode, body: &str) -> Error {
    match status.as_u16() {
        429 => Error::RateLimited,
        402 => Error::PaymentRequired,
        _ => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("error").and_then(error_message))
                .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            Error::Remote {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("message").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

// =============================================================================
// Server function backend
// =============================================================================

/// POSTs `{prompt, type, datasetId}` to a deployed server function
pub struct FunctionInvoker {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl FunctionInvoker {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl AiInvoker for FunctionInvoker {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value> {
        ensure_prompt(request)?;
        info!(kind = ?request.kind, url = %self.url, "invoking server function");

        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "server function returned an error");
            return Err(remote_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

// =============================================================================
// OpenAI-compatible gateway backend
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReplyMessage>,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

/// Calls a chat completions endpoint directly, doing the server
/// function's job locally.
pub struct GatewayInvoker {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl GatewayInvoker {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl AiInvoker for GatewayInvoker {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value> {
        ensure_prompt(request)?;
        info!(kind = ?request.kind, model = %self.model, "invoking chat gateway");

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(request.kind),
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "chat gateway returned an error");
            return Err(remote_error(status, &text));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| Error::InvalidResponse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());

        debug!(chars = content.len(), "gateway reply received");
        Ok(reply_payload(request.kind, content))
    }
}

/// General replies are wrapped as `{response}`. Chart and dashboard replies
/// pass through when the whole text is a JSON object; anything else is
/// wrapped and left to the normalizer.
fn reply_payload(kind: RequestKind, text: String) -> Value {
    if kind != RequestKind::General {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text.trim()) {
            return value;
        }
    }
    json!({ "response": text })
}
