#![doc = include_str!("../README.md")]

pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod render;
pub mod session;

pub use config::SessionConfig;
pub use decoder::FrameDecoder;
pub use error::SendError;
pub use extractor::extract_delta;
pub use orchestrator::{Orchestrator, SendOutcome, SendRequest};
pub use parser::{SseEvent, parse_line};
pub use pipeline::{EventStream, event_stream, event_stream_with_limit};
pub use policy::FallbackPolicy;
pub use render::RenderSink;
pub use session::{AttemptFailure, SessionOutcome, SessionState, StreamSession};

// Re-export chatstream-types and the cancellation token for convenience
pub use chatstream_types::{
    Attachment, ChatError, ChatMessage, Conversation, HttpErrorClass, Provider, RequestContext,
    StreamEvent,
};
pub use tokio_util::sync::CancellationToken;
