#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::{fmt::Display, sync::Arc, time};

use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ArcBackend, Backend, StreamOutcome, stream::read_stream};
use crate::{
    config::{
        GatewayConfig,
        constants::{
            DEFAULT_MAX_TOKENS, DEFAULT_MODEL, GATEWAY_APP_TITLE, GATEWAY_ENDPOINT, GATEWAY_REFERER,
        },
        user_agent,
    },
    models::ChatMessage,
};

const PROBE_MESSAGE: &str = "Test connection";

/// Client for an OpenAI-compatible chat completion gateway.
pub struct OpenAI {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<time::Duration>,
    max_tokens: usize,
    referer: Option<String>,
    app_title: Option<String>,
    default_model: String,
    client: reqwest::Client,
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<String> {
        let res = self
            .completion(messages, model, temperature, false)
            .await?;
        let res = res
            .json::<CompletionResponse>()
            .await
            .wrap_err("parsing completion response")?;

        match res.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content.unwrap_or_default()),
            None => bail!("gateway returned no choices"),
        }
    }

    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<StreamOutcome> {
        let res = self.completion(messages, model, temperature, true).await?;
        Ok(read_stream(res.bytes_stream(), on_chunk).await)
    }
}

impl From<OpenAI> for ArcBackend {
    fn from(value: OpenAI) -> Self {
        Arc::new(value)
    }
}

impl From<&GatewayConfig> for OpenAI {
    fn from(value: &GatewayConfig) -> Self {
        let mut openai = OpenAI::default()
            .with_endpoint(&value.endpoint)
            .with_max_tokens(value.max_tokens)
            .with_default_model(&value.default_model);

        if let Some(api_key) = value.api_key.as_deref() {
            openai = openai.with_api_key(api_key);
        }

        if let Some(timeout) = value.timeout_secs {
            openai = openai.with_timeout(time::Duration::from_secs(timeout as u64));
        }

        if let Some(referer) = value.referer.as_deref() {
            openai = openai.with_referer(referer);
        }

        if let Some(app_title) = value.app_title.as_deref() {
            openai = openai.with_app_title(app_title);
        }
        openai
    }
}

impl OpenAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_referer(mut self, referer: &str) -> Self {
        self.referer = Some(referer.to_string());
        self
    }

    pub fn with_app_title(mut self, app_title: &str) -> Self {
        self.app_title = Some(app_title.to_string());
        self
    }

    pub fn with_default_model(mut self, model: &str) -> Self {
        self.default_model = model.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Sends a one-line probe with the default model. Any failure, including
    /// an empty answer, counts as an invalid key.
    pub async fn validate_api_key(&self) -> bool {
        let probe = [ChatMessage::user(PROBE_MESSAGE)];
        match self.send_chat(&probe, &self.default_model, 0.0).await {
            Ok(answer) => !answer.is_empty(),
            Err(err) => {
                log::error!("API key validation failed: {:#}", err);
                false
            }
        }
    }

    async fn completion(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
        stream: bool,
    ) -> Result<reqwest::Response> {
        if model.is_empty() {
            bail!("no model is set");
        }

        let completion_req = CompletionRequest {
            model,
            messages,
            temperature,
            max_tokens: self.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stream,
        };

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = &self.api_key {
            req = req.bearer_auth(token);
        }

        if let Some(referer) = &self.referer {
            req = req.header("HTTP-Referer", referer);
        }

        if let Some(app_title) = &self.app_title {
            req = req.header("X-Title", app_title);
        }

        log::trace!("Sending completion request: {:?}", completion_req);

        let res = req
            .json(&completion_req)
            .send()
            .await
            .wrap_err("sending completion request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let body = res.text().await.wrap_err("reading error response")?;
            log::error!("Error response: {}", body);
            return Err(GatewayError { http_code, body }.into());
        }
        Ok(res)
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self {
            alias: "OpenRouter".to_string(),
            endpoint: GATEWAY_ENDPOINT.to_string(),
            api_key: None,
            timeout: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            referer: Some(GATEWAY_REFERER.to_string()),
            app_title: Some(GATEWAY_APP_TITLE.to_string()),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    stream: bool,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionMessageResponse {
    role: Option<String>,
    content: Option<String>,
}

/// Non-success answer from the gateway. The body is kept verbatim.
#[derive(Default, Error, Debug)]
pub struct GatewayError {
    pub http_code: u16,
    pub body: String,
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gateway error ({}): {}", self.http_code, self.body)
    }
}
