//! The stream session controller: one attempt, from request to finalized
//! message.

use std::fmt;

use chatstream_types::{
    ChatError, ChatMessage, Conversation, HttpErrorClass, Provider, RequestContext, StreamEvent,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::pipeline::event_stream_with_limit;
use crate::render::RenderSink;

/// Lifecycle of a [`StreamSession`].
///
/// `Idle → Opening → Streaming → Finalizing → Completed`, with `Aborted`
/// reachable from `Opening` and `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// The request is in flight.
    Opening,
    /// Reading the body.
    Streaming,
    /// Building and storing the final message.
    Finalizing,
    /// The message was appended to the conversation.
    Completed,
    /// Failed or cancelled; nothing was appended.
    Aborted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a session ended, other than by failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The reply was finalized and appended to the conversation.
    Completed(ChatMessage),
    /// The caller cancelled; partial text was discarded.
    Cancelled,
}

/// A failed attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct AttemptFailure {
    /// What went wrong.
    #[source]
    pub error: ChatError,
    /// Text accumulated before the failure.
    pub partial: String,
    /// Whether any delta reached the render sink.
    pub rendered: bool,
}

impl AttemptFailure {
    fn before_stream(error: ChatError) -> Self {
        Self {
            error,
            partial: String::new(),
            rendered: false,
        }
    }
}

/// Drives one streaming attempt.
///
/// Opens the stream through the provider, feeds the body through the
/// decode → parse → extract pipeline, forwards each non-empty delta to the
/// render sink, and on the end of the stream appends the assembled assistant
/// message to the conversation.
///
/// Cancellation is honoured at every await point up to Finalizing. Dropping
/// the body on abort stops the read and releases the connection.
pub struct StreamSession<'a, P: Provider> {
    provider: &'a P,
    config: &'a SessionConfig,
    state: SessionState,
}

impl<'a, P: Provider> StreamSession<'a, P> {
    /// Create an idle session.
    #[must_use]
    pub fn new(provider: &'a P, config: &'a SessionConfig) -> Self {
        Self {
            provider,
            config,
            state: SessionState::Idle,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState, model: &str) {
        tracing::debug!(model = %model, from = %self.state, to = %next, "session state change");
        self.state = next;
    }

    /// Run one attempt for `request`.
    ///
    /// On success the assistant reply has been appended to `conversation`
    /// and passed to [`RenderSink::on_finalize`]. On cancellation the sink
    /// gets [`RenderSink::on_discard`] and `conversation` is untouched.
    ///
    /// # Errors
    ///
    /// Returns an [`AttemptFailure`] if the request fails, the body cannot be
    /// read, the upstream reports an error mid-stream, or too many
    /// consecutive frames are malformed. The conversation is untouched.
    pub async fn run(
        &mut self,
        request: &RequestContext,
        conversation: &mut Conversation,
        sink: &mut impl RenderSink,
        cancel: &CancellationToken,
    ) -> Result<SessionOutcome, AttemptFailure> {
        let model = request.model.as_str();
        let provider = self.provider;

        self.transition(SessionState::Opening, model);
        let opened = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = provider.open_stream(request) => Some(result),
        };
        let body = match opened {
            None => return Ok(self.cancel(model, sink)),
            Some(Err(error)) => {
                self.transition(SessionState::Aborted, model);
                return Err(AttemptFailure::before_stream(error));
            }
            Some(Ok(body)) => body,
        };

        self.transition(SessionState::Streaming, model);
        sink.on_begin(model);

        let mut events = event_stream_with_limit(body, self.config.max_line_bytes);
        let mut text = String::new();
        let mut rendered = false;
        let mut malformed_run = 0usize;
        let cap = self.config.max_consecutive_malformed;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                next = events.next() => Some(next),
            };
            let Some(next) = next else {
                drop(events);
                return Ok(self.cancel(model, sink));
            };

            let error = match next {
                None => {
                    tracing::debug!(model = %model, "stream ended without [DONE]");
                    break;
                }
                Some(Ok(StreamEvent::End)) => break,
                Some(Ok(StreamEvent::Delta(delta))) => {
                    malformed_run = 0;
                    if !delta.is_empty() {
                        text.push_str(&delta);
                        sink.on_delta(&delta);
                        rendered = true;
                    }
                    continue;
                }
                Some(Ok(StreamEvent::Malformed(_))) => {
                    malformed_run += 1;
                    if cap == 0 || malformed_run < cap {
                        continue;
                    }
                    ChatError::StreamCorrupted {
                        consecutive: malformed_run,
                    }
                }
                Some(Ok(StreamEvent::UpstreamError { code, message, raw })) => ChatError::Upstream {
                    class: code
                        .as_deref()
                        .and_then(HttpErrorClass::from_code)
                        .unwrap_or(HttpErrorClass::Unknown),
                    message,
                    raw,
                },
                Some(Err(error)) => error,
            };

            drop(events);
            self.transition(SessionState::Aborted, model);
            return Err(AttemptFailure {
                error,
                partial: text,
                rendered,
            });
        }
        drop(events);

        self.transition(SessionState::Finalizing, model);
        let message = ChatMessage::assistant(text);
        sink.on_finalize(&message);
        conversation.push(message.clone());
        self.transition(SessionState::Completed, model);
        Ok(SessionOutcome::Completed(message))
    }

    fn cancel(&mut self, model: &str, sink: &mut impl RenderSink) -> SessionOutcome {
        tracing::debug!(model = %model, state = %self.state, "session cancelled");
        self.transition(SessionState::Aborted, model);
        sink.on_discard();
        SessionOutcome::Cancelled
    }
}
