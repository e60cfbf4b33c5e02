#![deny(missing_docs)]
//! Terminal front end for chatstream.
//!
//! Plays the part of the chat UI: loads settings, keeps one conversation for
//! the life of the process, and renders streamed replies to a terminal.

/// Command-line argument parsing.
pub mod args;
/// Turning files on disk into attachments.
pub mod attach;
/// Settings file and environment layering.
pub mod settings;
/// The terminal [`RenderSink`](chatstream_session::RenderSink).
pub mod sink;

use chatstream_openrouter::OpenRouter;
use chatstream_session::{
    CancellationToken, ChatError, Conversation, Orchestrator, RenderSink, SendError, SendOutcome,
    SendRequest,
};

pub use args::{CliArgs, Command, parse_args};
pub use attach::load_attachment;
pub use settings::Settings;
pub use sink::TerminalSink;
use tokio::sync::mpsc;

/// Errors raised by the CLI outside of a send.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad command line.
    #[error("usage error: {0}")]
    Usage(String),
    /// Settings rejected before any request.
    #[error("{0}")]
    Invalid(#[from] ChatError),
    /// A settings file could not be parsed.
    #[error("invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),
    /// Reading a file or the terminal failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A send failed.
    #[error("{0}")]
    Send(#[from] SendError),
}

/// One conversation against OpenRouter.
pub struct Chat {
    orchestrator: Orchestrator<OpenRouter>,
    conversation: Conversation,
}

impl Chat {
    /// Build a chat from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Invalid`] if the client or session settings are
    /// rejected.
    pub fn new(settings: &Settings) -> Result<Self, CliError> {
        settings.client.validate()?;
        settings.session.validate()?;
        let provider = OpenRouter::from_config(&settings.client);
        Ok(Self {
            orchestrator: Orchestrator::new(provider, settings.session.clone()),
            conversation: Conversation::new(),
        })
    }

    /// Send one message, streaming the reply into `sink`.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's [`SendError`]; the conversation is left
    /// as it was.
    pub async fn send(
        &mut self,
        request: SendRequest,
        sink: &mut impl RenderSink,
        cancel: &CancellationToken,
    ) -> Result<SendOutcome, SendError> {
        self.orchestrator
            .send(&mut self.conversation, request, sink, cancel)
            .await
    }

    /// Send one message, cancelling it when `interrupts` yields.
    ///
    /// Interrupts that arrive while the send is in flight are consumed here,
    /// so a caller reading the same receiver between sends only sees fresh
    /// ones.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn send_interruptible(
        &mut self,
        request: SendRequest,
        sink: &mut impl RenderSink,
        interrupts: &mut mpsc::UnboundedReceiver<()>,
    ) -> Result<SendOutcome, SendError> {
        let cancel = CancellationToken::new();
        let send = self.send(request, sink, &cancel);
        tokio::pin!(send);
        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                Some(()) = interrupts.recv() => {
                    tracing::debug!("interrupt received, cancelling send");
                    cancel.cancel();
                }
            }
        };
        while interrupts.try_recv().is_ok() {}
        result
    }

    /// The finalized messages so far.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Start a new conversation.
    pub fn clear(&mut self) {
        self.conversation = Conversation::new();
    }
}
