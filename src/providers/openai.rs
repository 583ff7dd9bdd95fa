//! OpenAI-compatible provider implementation for Uplevel
//!
//! This module implements the [`Provider`] trait against an OpenAI
//! chat-completions endpoint, offering both a single-shot call and an
//! incremental SSE token stream. Response length and temperature are
//! configuration constants, not per-request knobs.

use crate::config::OpenAiConfig;
use crate::error::{Result, UplevelError};
use crate::providers::{Message, Provider, Role, TokenStream};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Returned in place of an empty completion, matching the upstream
/// platform's behavior.
const FALLBACK_RESPONSE: &str = "Sorry, I could not generate a response.";

/// OpenAI chat-completions provider
///
/// Connects to `{api_base}/chat/completions`. The API base is
/// configurable so tests can point the provider at a mock server.
///
/// # Examples
///
/// ```no_run
/// use uplevel::config::OpenAiConfig;
/// use uplevel::providers::{Message, OpenAiProvider, Provider};
///
/// # async fn example() -> uplevel::error::Result<()> {
/// let provider = OpenAiProvider::new(OpenAiConfig::default())?;
/// let messages = vec![Message::user("Hello!")];
/// let reply = provider.complete(&messages, None).await?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Message in OpenAI wire format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// Non-streaming response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One SSE `data:` payload of a streaming response
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("uplevel/0.2.0")
            .build()
            .map_err(|e| UplevelError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Resolve the API key from the config or the `OPENAI_API_KEY` env var
    fn api_key(&self) -> Result<String> {
        if let Some(key) = &self.config.api_key {
            return Ok(key.clone());
        }
        std::env::var("OPENAI_API_KEY").map_err(|_| {
            UplevelError::Provider(
                "Missing OpenAI API key: set provider.openai.api_key or OPENAI_API_KEY".to_string(),
            )
            .into()
        })
    }

    /// Build the wire-format message list, prepending the system prompt
    fn build_messages(&self, messages: &[Message], system_prompt: Option<&str>) -> Vec<WireMessage> {
        let mut formatted = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = system_prompt {
            formatted.push(WireMessage {
                role: "system".to_string(),
                content: prompt.to_string(),
            });
        }
        formatted.extend(messages.iter().map(|m| WireMessage {
            role: match m.role {
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        }));
        formatted
    }

    /// Issue the POST and check the HTTP status, returning the raw response
    async fn send_request(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.config.api_base);
        let api_key = self.api_key()?;

        tracing::debug!(
            "Sending completion request: {} messages, stream={}",
            request.messages.len(),
            request.stream
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                UplevelError::Provider(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Provider returned error {}: {}", status, error_text);
            return Err(UplevelError::Provider(format!(
                "Provider returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], system_prompt: Option<&str>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(messages, system_prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let response = self.send_request(&request).await?;
        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            UplevelError::Provider(format!("Failed to parse completion response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_RESPONSE.to_string());

        Ok(content)
    }

    async fn stream_complete(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<TokenStream> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(messages, system_prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: true,
        };

        let response = self.send_request(&request).await?;
        let byte_stream = response.bytes_stream();

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            decode_token_stream(byte_stream, tx).await;
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

/// Decode an SSE byte stream into token fragments
///
/// Consumes the stream until the `[DONE]` sentinel, the transport ends,
/// or an error occurs. Events are separated by blank lines; each
/// `data:` payload is a JSON chunk whose `choices[0].delta.content`
/// carries the fragment. Chunks without content (role preambles) are
/// skipped. If the transport ends before `[DONE]` a single
/// `TransportInterrupted` error is emitted, so callers never mistake a
/// truncated reply for a complete one.
async fn decode_token_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    tx: mpsc::UnboundedSender<Result<String>>,
) {
    use futures::StreamExt;

    let mut buffer: Vec<u8> = Vec::new();
    let mut done = false;

    tokio::pin!(byte_stream);

    'outer: while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(Err(UplevelError::TransportInterrupted(e.to_string()).into()));
                return;
            }
        };
        buffer.extend_from_slice(&chunk);

        // SSE events are separated by blank lines (`\n\n`). The
        // separator is ASCII, so scanning raw bytes keeps a multibyte
        // character intact when a transport chunk boundary lands
        // inside it; the incomplete tail waits for the next chunk.
        while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = buffer.drain(..pos + 2).collect();
            let event_block = String::from_utf8_lossy(&block[..pos]);

            for data in event_data_lines(&event_block) {
                if data == "[DONE]" {
                    done = true;
                    break 'outer;
                }
                match serde_json::from_str::<StreamChunk>(&data) {
                    Ok(chunk) => {
                        let fragment = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content);
                        if let Some(token) = fragment {
                            if !token.is_empty() && tx.send(Ok(token)).is_err() {
                                // Receiver dropped; stop reading.
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping unparseable stream chunk: {}", e);
                    }
                }
            }
        }
    }

    if !done {
        let _ = tx.send(Err(UplevelError::TransportInterrupted(
            "stream ended before [DONE]".to_string(),
        )
        .into()));
    }
}

/// Extract the `data:` payloads from a single SSE event block
fn event_data_lines(event_block: &str) -> Vec<String> {
    event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
