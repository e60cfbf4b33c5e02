//! The retry/fallback orchestrator: one user send, as many attempts as the
//! failure class and the policy allow.

use chatstream_types::{
    Attachment, ChatError, ChatMessage, ContentPart, Conversation, GenerationParams, ImageDetail,
    MessageContent, Provider, RequestContext,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::SendError;
use crate::policy::FallbackPolicy;
use crate::render::RenderSink;
use crate::session::{SessionOutcome, StreamSession};

/// Characters of a text attachment inlined into the prompt.
pub const ATTACHMENT_PREVIEW_CHARS: usize = 500;

/// What the user sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// The typed text.
    pub text: String,
    /// Attached files, in the order they were attached.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl SendRequest {
    /// A text-only send.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    /// Attach a file.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Whether any attachment is an image.
    #[must_use]
    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }

    /// Build the user message: one preamble line per attachment, a blank
    /// line, then the typed text. Images also become `image_url` parts
    /// after the text.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if there is neither text nor an
    /// attachment.
    pub fn to_message(&self) -> Result<ChatMessage, ChatError> {
        if self.text.trim().is_empty() && self.attachments.is_empty() {
            return Err(ChatError::Config("nothing to send".into()));
        }

        let text = if self.attachments.is_empty() {
            self.text.clone()
        } else {
            let preamble: Vec<String> = self.attachments.iter().map(describe).collect();
            format!("{}\n\n{}", preamble.join("\n"), self.text)
        };

        if !self.has_images() {
            return Ok(ChatMessage::user(text));
        }

        let mut parts = vec![ContentPart::text(text)];
        parts.extend(self.attachments.iter().filter_map(|a| match a {
            Attachment::Image { data_url, .. } => {
                Some(ContentPart::image(data_url.clone(), Some(ImageDetail::High)))
            }
            Attachment::Text { .. } => None,
        }));
        Ok(ChatMessage::user(MessageContent::Parts(parts)))
    }
}

fn describe(attachment: &Attachment) -> String {
    match attachment {
        Attachment::Image { name, .. } => {
            format!("[Attached image: {name}] - Describe this image in detail.")
        }
        Attachment::Text { name, content } => {
            let preview: String = content.chars().take(ATTACHMENT_PREVIEW_CHARS).collect();
            let preview = if preview.is_empty() {
                "binary file".to_string()
            } else {
                preview
            };
            format!("[Attached file: {name}] - Content: {preview}")
        }
    }
}

/// How a send ended, other than by failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The reply was appended to the conversation.
    Completed {
        /// The finalized assistant message.
        message: ChatMessage,
        /// The model that produced it.
        model: String,
        /// Attempts made, this one included.
        attempts: usize,
        /// Set when the reply came from a model other than the first one
        /// tried.
        fallback_model: Option<String>,
    },
    /// The caller cancelled; the conversation is unchanged.
    Cancelled {
        /// Attempts started before the cancellation.
        attempts: usize,
    },
}

/// Wraps one logical send in model fallback.
///
/// Generic over `P: Provider`. Rate-limit and model-unavailable failures,
/// and transient network failures, move on to the next model in the
/// [`FallbackPolicy`] as long as nothing has been rendered yet. Anything
/// else, or running out of attempts, surfaces as a [`SendError`].
pub struct Orchestrator<P: Provider> {
    provider: P,
    config: SessionConfig,
}

impl<P: Provider> Orchestrator<P> {
    /// Create an orchestrator over `provider`.
    #[must_use]
    pub fn new(provider: P, config: SessionConfig) -> Self {
        Self { provider, config }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns a reference to the provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The fallback policy for a send, picking the vision model as primary
    /// when images are attached and one is configured.
    #[must_use]
    pub fn policy_for(&self, has_images: bool) -> FallbackPolicy {
        let primary = match (&self.config.vision_model, has_images) {
            (Some(vision), true) => vision.clone(),
            _ => self.config.model.clone(),
        };
        let policy = FallbackPolicy::new(primary, self.config.fallback_models.iter().cloned());
        match self.config.max_attempts {
            Some(max) => policy.max_attempts(max),
            None => policy,
        }
    }

    /// Send `request` and stream the reply into `sink`.
    ///
    /// The request carries the system prompt followed by the last
    /// `memory_length` messages of the conversation, the new user message
    /// included. The user message and the reply are appended to
    /// `conversation` together, only on success.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] if the settings or the request are invalid,
    /// if an attempt fails with a class that does not warrant a fallback, if
    /// a stream fails after text was rendered, or when attempts run out.
    pub async fn send(
        &self,
        conversation: &mut Conversation,
        request: SendRequest,
        sink: &mut impl RenderSink,
        cancel: &CancellationToken,
    ) -> Result<SendOutcome, SendError> {
        let user_message = self
            .config
            .validate()
            .and_then(|()| request.to_message())
            .map_err(|e| {
                tracing::error!(error = %e, "send rejected before any request");
                SendError::new(e, "", 0)
            })?;
        let has_images = request.has_images();

        let mut staged = conversation.clone();
        staged.push(user_message);

        let mut policy = self.policy_for(has_images);

        let mut messages = vec![ChatMessage::system(self.config.system_prompt.clone())];
        messages.extend_from_slice(staged.window(self.config.memory_length.max(1)));
        let params = GenerationParams {
            max_tokens: Some(if has_images {
                self.config.max_tokens_with_images
            } else {
                self.config.max_tokens
            }),
            temperature: self.config.temperature,
        };
        let mut ctx = RequestContext::new(policy.current(), messages).params(params);

        loop {
            tracing::debug!(
                model = %policy.current(),
                attempt = policy.attempt(),
                max_attempts = policy.limit(),
                "starting attempt"
            );

            let mut session = StreamSession::new(&self.provider, &self.config);
            let failure = match session.run(&ctx, &mut staged, sink, cancel).await {
                Ok(SessionOutcome::Completed(message)) => {
                    *conversation = staged;
                    let model = policy.current().to_string();
                    let fallback_model = (policy.attempt() > 1).then(|| model.clone());
                    if let Some(fallback) = &fallback_model {
                        tracing::info!(model = %fallback, attempts = policy.attempt(), "fallback model succeeded");
                    }
                    return Ok(SendOutcome::Completed {
                        message,
                        model,
                        attempts: policy.attempt(),
                        fallback_model,
                    });
                }
                Ok(SessionOutcome::Cancelled) => {
                    return Ok(SendOutcome::Cancelled {
                        attempts: policy.attempt(),
                    });
                }
                Err(failure) => failure,
            };

            let from = policy.current().to_string();
            let eligible = failure.error.is_fallback_eligible() && !failure.rendered;
            if eligible && let Some(next) = policy.advance().map(str::to_owned) {
                tracing::warn!(
                    from = %from,
                    to = %next,
                    attempt = policy.attempt(),
                    max_attempts = policy.limit(),
                    error = %failure.error,
                    "retrying with fallback model"
                );
                sink.on_fallback(&from, &next, policy.attempt(), policy.limit());
                ctx = ctx.with_model(next);
                continue;
            }

            tracing::error!(
                model = %from,
                attempts = policy.attempt(),
                error = %failure.error,
                "send failed"
            );
            return Err(SendError::new(failure.error, from, policy.attempt())
                .with_partial(failure.partial));
        }
    }
}
