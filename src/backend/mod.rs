pub mod openai;
pub mod stream;
pub mod title;

#[cfg(test)]
pub(crate) mod fake;

pub use openai::{GatewayError, OpenAI};
pub use stream::{StreamOutcome, read_stream};
pub use title::TitleGenerator;

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;

use crate::{
    config::{GatewayConfig, verbose},
    models::ChatMessage,
};

/// A chat completion provider.
#[async_trait]
pub trait Backend {
    fn name(&self) -> &str;

    /// Returns the whole answer at once.
    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<String>;

    /// Streams the answer, calling `on_chunk` with every piece of text as it
    /// arrives. Only failures before the stream starts are errors.
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<StreamOutcome>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &GatewayConfig) -> Result<ArcBackend> {
    if config.api_key.as_deref().is_none_or(str::is_empty) {
        eyre::bail!("no gateway api key configured, set gateway.api_key");
    }

    let openai = OpenAI::from(config);
    verbose!("  [+] Using gateway {}", openai.endpoint());
    Ok(openai.into())
}
