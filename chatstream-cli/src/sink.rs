use std::io::Write;

use chatstream_session::{ChatMessage, RenderSink};

/// Writes the reply to `out` as it streams and status notices to `err`.
///
/// Terminal write failures are logged and otherwise ignored; a broken pipe
/// must not abort the send.
pub struct TerminalSink<O, E> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    /// Create a sink over the two writers.
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Give the writers back.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn notice(&mut self, text: &str) {
        if let Err(e) = writeln!(self.err, "{text}").and_then(|()| self.err.flush()) {
            tracing::debug!(error = %e, "failed to write notice");
        }
    }
}

impl<O: Write, E: Write> RenderSink for TerminalSink<O, E> {
    fn on_begin(&mut self, model: &str) {
        tracing::debug!(model = %model, "reply started");
    }

    fn on_delta(&mut self, delta: &str) {
        if let Err(e) = self
            .out
            .write_all(delta.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::debug!(error = %e, "failed to write delta");
        }
    }

    fn on_finalize(&mut self, _message: &ChatMessage) {
        if let Err(e) = writeln!(self.out).and_then(|()| self.out.flush()) {
            tracing::debug!(error = %e, "failed to finish reply");
        }
    }

    fn on_discard(&mut self) {
        self.notice("\n[cancelled]");
    }

    fn on_fallback(&mut self, from: &str, to: &str, attempt: usize, max_attempts: usize) {
        self.notice(&format!(
            "[{from} unavailable, trying fallback model {attempt}/{max_attempts}: {to}]"
        ));
    }
}
