//! In-memory provider for testing.
//!
//! Available behind the `test-utils` feature flag. [`ScriptedProvider`]
//! replays one canned [`Script`] per `open_stream` call and records every
//! request it saw.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use bytes::Bytes;
use futures::StreamExt;

use crate::error::{ChatError, HttpErrorClass};
use crate::stream::ByteStream;
use crate::traits::Provider;
use crate::types::RequestContext;
use crate::wasm::WasmCompatSend;

/// What a single `open_stream` call returns.
#[derive(Debug, Clone)]
pub enum Script {
    /// Fail at the opening stage.
    Fail(ChatError),
    /// Succeed and deliver these chunks, then end the body.
    Body(Vec<Result<Bytes, ChatError>>),
    /// Succeed, deliver these chunks, then never produce another one.
    Stall(Vec<Bytes>),
}

impl Script {
    /// A successful body delivered as a single chunk.
    #[must_use]
    pub fn body(text: impl Into<String>) -> Self {
        Self::Body(vec![Ok(Bytes::from(text.into()))])
    }

    /// A successful body delivered one byte at a time.
    #[must_use]
    pub fn body_bytewise(text: impl AsRef<[u8]>) -> Self {
        Self::Body(
            text.as_ref()
                .iter()
                .map(|b| Ok(Bytes::copy_from_slice(&[*b])))
                .collect(),
        )
    }

    /// An HTTP failure with the given status and class.
    #[must_use]
    pub fn status(status: u16, class: HttpErrorClass) -> Self {
        Self::Fail(ChatError::Http {
            status,
            class,
            message: format!("scripted {status}"),
            raw: String::new(),
        })
    }
}

/// Build one `data:` line carrying a content delta, followed by a blank line.
#[must_use]
pub fn delta_frame(content: &str) -> String {
    let payload = serde_json::json!({
        "choices": [{"index": 0, "delta": {"content": content}}]
    });
    format!("data: {payload}\n\n")
}

/// Build a complete event-stream body: one frame per delta, then `[DONE]`.
#[must_use]
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body: String = deltas.iter().map(|d| delta_frame(d)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

/// A provider that replays scripts in order.
///
/// Once the scripts run out, every further call fails with a non-transient
/// network error.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<RequestContext>>,
}

impl ScriptedProvider {
    /// Create a provider that will replay `scripts` in order.
    #[must_use]
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestContext> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The model identifier of every request received so far.
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }
}

impl Provider for ScriptedProvider {
    fn open_stream(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = Result<ByteStream, ChatError>> + WasmCompatSend {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        async move {
            match script {
                None => Err(ChatError::network("no scripted response left", false)),
                Some(Script::Fail(err)) => Err(err),
                Some(Script::Body(chunks)) => {
                    let body: ByteStream = Box::pin(futures::stream::iter(chunks));
                    Ok(body)
                }
                Some(Script::Stall(chunks)) => {
                    let body: ByteStream = Box::pin(
                        futures::stream::iter(chunks.into_iter().map(Ok))
                            .chain(futures::stream::pending()),
                    );
                    Ok(body)
                }
            }
        }
    }
}
