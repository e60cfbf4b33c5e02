//! Streaming types: the raw response body and the events decoded from it.

use bytes::Bytes;

use crate::error::ChatError;
use crate::wasm::WasmBoxedStream;

/// One event decoded from the upstream event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental text fragment. May be empty.
    Delta(String),
    /// The end-of-stream sentinel was received.
    End,
    /// A payload that did not parse or carried no content field.
    Malformed(String),
    /// The upstream reported an error in place of a delta.
    UpstreamError {
        /// The upstream error code, stringified (`"429"`, `"model_not_found"`).
        code: Option<String>,
        /// The upstream error message.
        message: String,
        /// The raw payload.
        raw: String,
    },
}

/// A response body as a stream of byte chunks.
///
/// Dropping the stream stops reading the body and releases the connection.
pub type ByteStream = WasmBoxedStream<'static, Result<Bytes, ChatError>>;
