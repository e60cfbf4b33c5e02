//! The seam between the session controller and the network.

use std::future::Future;

use crate::error::ChatError;
use crate::stream::ByteStream;
use crate::types::RequestContext;
use crate::wasm::{WasmCompatSend, WasmCompatSync};

/// A chat-completion backend that can open a streaming response.
///
/// Implementations issue the request described by the [`RequestContext`]
/// with `stream: true`, inspect the status, and either classify a failure
/// into a [`ChatError`] or hand back the raw response body. Decoding the body
/// is the session controller's job.
///
/// Uses RPITIT (return position impl trait in trait), native async in Rust 2024.
/// Not object-safe; compose with generics `<P: Provider>`.
///
/// # Example
///
/// ```ignore
/// struct MyProvider;
///
/// impl Provider for MyProvider {
///     fn open_stream(&self, request: &RequestContext)
///         -> impl Future<Output = Result<ByteStream, ChatError>> + Send
///     {
///         async { todo!() }
///     }
/// }
/// ```
pub trait Provider: WasmCompatSend + WasmCompatSync {
    /// Issue a streaming request and return the response body on success.
    fn open_stream(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = Result<ByteStream, ChatError>> + WasmCompatSend;
}

impl<P: Provider> Provider for &P {
    fn open_stream(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = Result<ByteStream, ChatError>> + WasmCompatSend {
        (**self).open_stream(request)
    }
}

impl<P: Provider> Provider for std::sync::Arc<P> {
    fn open_stream(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = Result<ByteStream, ChatError>> + WasmCompatSend {
        (**self).open_stream(request)
    }
}
