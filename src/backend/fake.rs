//! Scripted backend for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eyre::Result;

use super::{ArcBackend, Backend, StreamOutcome};
use crate::models::ChatMessage;

#[derive(Default)]
pub struct FakeBackend {
    /// Answer for `send_chat`; `None` fails the call.
    pub reply: Option<String>,
    /// Pieces for `stream_chat`; `None` fails the call before streaming.
    pub chunks: Option<Vec<String>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeBackend {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            chunks: Some(chunks.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shared(self) -> (Arc<FakeBackend>, ArcBackend) {
        let fake = Arc::new(self);
        let backend: ArcBackend = fake.clone();
        (fake, backend)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        _model: &str,
        _temperature: f32,
    ) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.reply
            .clone()
            .ok_or_else(|| eyre::eyre!("gateway unavailable"))
    }

    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        _model: &str,
        _temperature: f32,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<StreamOutcome> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let Some(chunks) = &self.chunks else {
            eyre::bail!("gateway unavailable");
        };
        for chunk in chunks {
            on_chunk(chunk);
        }
        Ok(StreamOutcome::Done)
    }
}
