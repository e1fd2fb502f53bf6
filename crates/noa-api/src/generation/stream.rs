//! Incremental parsing of a newline-delimited JSON generation stream.
//!
//! Each line of the body is one JSON object that may carry a `response`
//! text fragment. Lines are surfaced lazily as [`Fragment`]s; anything
//! that does not parse is reported as [`Fragment::Skipped`].

use futures_util::{Stream, StreamExt};
use serde::Deserialize;

/// One line of the generation stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A well-formed object carrying generated text.
    Text(String),
    /// Malformed JSON, or an object without a `response` field.
    Skipped,
}

/// The fields of a stream object we care about.
#[derive(Deserialize)]
struct StreamChunk {
    response: Option<String>,
    error: Option<String>,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_fragment(line: &str) -> Option<Fragment> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamChunk>(line) {
        Ok(StreamChunk {
            response: Some(text),
            ..
        }) => Some(Fragment::Text(text)),
        Ok(StreamChunk {
            error: Some(error), ..
        }) => {
            tracing::warn!(error = %error, "generation backend reported an error fragment");
            Some(Fragment::Skipped)
        }
        Ok(_) => Some(Fragment::Skipped),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream fragment");
            Some(Fragment::Skipped)
        }
    }
}

fn parse_bytes(bytes: &[u8]) -> Option<Fragment> {
    parse_fragment(&String::from_utf8_lossy(bytes))
}

/// Turn a byte-chunk stream into a stream of fragments.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; an unterminated
/// final line is parsed once the body ends. A transport error is yielded
/// once and ends the stream.
pub fn fragments<S, B, E>(body: S) -> impl Stream<Item = Result<Fragment, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        futures_util::pin_mut!(body);
        let mut buffer: Vec<u8> = Vec::new();
        let mut failed = false;

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(bytes.as_ref());
                    while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=newline).collect();
                        if let Some(fragment) = parse_bytes(&line) {
                            yield Ok(fragment);
                        }
                    }
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed {
            if let Some(fragment) = parse_bytes(&buffer) {
                yield Ok(fragment);
            }
        }
    }
}

/// Concatenate the text of every fragment, in order.
pub async fn accumulate<S, E>(fragments: S) -> Result<String, E>
where
    S: Stream<Item = Result<Fragment, E>>,
{
    futures_util::pin_mut!(fragments);
    let mut text = String::new();
    let mut skipped = 0usize;
    while let Some(fragment) = fragments.next().await {
        match fragment? {
            Fragment::Text(piece) => text.push_str(&piece),
            Fragment::Skipped => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "stream fragments without text");
    }
    Ok(text)
}
