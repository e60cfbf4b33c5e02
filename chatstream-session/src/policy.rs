//! Ordered model rotation for one send.

/// The models one send may try, in order, and how far it has got.
///
/// Created fresh per send and discarded afterwards. The first entry is the
/// primary model; the rest are fallbacks, tried strictly in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    models: Vec<String>,
    attempt: usize,
    max_attempts: usize,
}

impl FallbackPolicy {
    /// Build a policy of `primary` followed by `fallbacks`.
    ///
    /// `max_attempts` starts at `fallbacks.len() + 1`.
    pub fn new<I, S>(primary: impl Into<String>, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut models = vec![primary.into()];
        models.extend(fallbacks.into_iter().map(Into::into));
        let max_attempts = models.len();
        Self {
            models,
            attempt: 1,
            max_attempts,
        }
    }

    /// Lower the attempt bound. Clamped to `1..=models.len()`.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.clamp(1, self.models.len());
        self
    }

    /// The model for the current attempt.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.models[self.attempt - 1]
    }

    /// The current attempt, counting from 1.
    #[must_use]
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// The attempt bound.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.max_attempts
    }

    /// Every model in the policy, primary first.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Move to the next model. Returns `None` once the bound is reached.
    pub fn advance(&mut self) -> Option<&str> {
        if !self.has_next() {
            return None;
        }
        self.attempt += 1;
        Some(self.current())
    }
}
