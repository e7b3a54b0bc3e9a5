#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;

use std::fmt::Display;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use serde::Deserialize;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// How a completion stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The gateway sent `[DONE]`.
    Done,
    /// The body ended (or broke) without `[DONE]`.
    Eof,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Reads a server-sent-events completion body and hands every non-empty
/// content delta to `on_chunk`, in order. Chunk boundaries of `stream` may
/// fall anywhere, including inside a line or a UTF-8 sequence.
///
/// Lines that are not `data:` lines, and data that is not valid JSON, are
/// skipped. Invalid UTF-8 is replaced, never fatal. Nothing is delivered
/// after `[DONE]`.
pub async fn read_stream<S, E>(
    stream: S,
    on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
) -> StreamOutcome
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let stream = Box::pin(
        stream.map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string())),
    );
    let mut lines = StreamReader::new(stream).split(b'\n');

    loop {
        let raw = match lines.next_segment().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return StreamOutcome::Eof,
            Err(err) => {
                log::warn!("Completion stream interrupted: {}", err);
                return StreamOutcome::Eof;
            }
        };

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        log::trace!("streaming response: {}", line);
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            continue;
        };

        let data = data.trim_start();
        if data == DONE_MARKER {
            return StreamOutcome::Done;
        }

        if let Some(content) = parse_content(data) {
            on_chunk(&content);
        }
    }
}

fn parse_content(data: &str) -> Option<String> {
    let chunk = match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            log::trace!("skipping malformed stream data ({}): {}", err, data);
            return None;
        }
    };

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
}
