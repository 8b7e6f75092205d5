// src/llm/openai.rs

use crate::config::{Config, RequestParams};
use crate::error::{ChatError, Result};
use crate::llm::{CompletionService, FragmentStream};
use crate::prompt::RequestPayload;
use crate::transcript::ChatMessage;
use anyhow::Context;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace};

const DONE_MARKER: &str = "[DONE]";

// --- Request Structures ---

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(flatten)]
    params: &'a RequestParams,
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    stream: bool,
    #[serde(flatten)]
    params: &'a RequestParams,
}

// --- Response Structures ---

#[derive(Deserialize, Debug)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiErrorBody>,
}

// Chat chunks carry `delta.content`, completion chunks carry `text`.
#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<Delta>,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

impl ApiErrorBody {
    fn describe(self) -> String {
        match self.error_type {
            Some(error_type) => format!("{} ({})", self.message, error_type),
            None => self.message,
        }
    }
}

// --- Client ---

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn build_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut auth_value =
        HeaderValue::from_str(&format!("Bearer {}", api_key)).context("Invalid API key format")?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);
    Ok(headers)
}

fn api_error(status: StatusCode, body: &str) -> ChatError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) => body.trim().to_string(),
    };
    if status == StatusCode::BAD_REQUEST {
        ChatError::InvalidRequest(message)
    } else {
        ChatError::Api { status: status.as_u16(), message }
    }
}

/// Extract the text delta from one SSE `data` payload.
fn parse_fragment(data: &str) -> Result<Option<String>> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .with_context(|| format!("Failed to parse stream chunk: {}", data))?;

    if let Some(api_error) = chunk.error {
        error!(?api_error, "API returned an error mid-stream");
        return Err(ChatError::Stream(api_error.describe()).into());
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.and_then(|delta| delta.content).or(choice.text)))
}

#[async_trait]
impl CompletionService for OpenAiClient {
    #[instrument(skip(self, payload, params), fields(model = %params.model))]
    async fn stream(&self, payload: &RequestPayload, params: &RequestParams) -> Result<FragmentStream> {
        let headers = build_headers(&self.api_key)?;

        let (url, request) = match payload {
            RequestPayload::Messages(messages) => {
                let url = format!("{}/chat/completions", self.base_url);
                let body = ChatCompletionRequest { messages, stream: true, params };
                (url.clone(), self.client.post(url).headers(headers).json(&body))
            }
            RequestPayload::Prompt(prompt) => {
                let url = format!("{}/completions", self.base_url);
                let body = CompletionRequest { prompt, stream: true, params };
                (url.clone(), self.client.post(url).headers(headers).json(&body))
            }
        };

        debug!(?url, "Sending streaming request"); // Don't log full payload by default

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!("Request failed. Status: {}, Body: {:.200}", status, body);
            return Err(api_error(status, &body).into());
        }

        let fragments = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(!matches!(event, Ok(e) if e.data == DONE_MARKER)))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => {
                        trace!(data = %event.data, "SSE event");
                        parse_fragment(&event.data).transpose()
                    }
                    Err(e) => Some(Err(ChatError::Stream(e.to_string()).into())),
                })
            })
            .boxed();

        Ok(fragments)
    }
}
