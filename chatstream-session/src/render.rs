//! The callback surface a UI implements to show a reply as it streams.

use chatstream_types::ChatMessage;

/// Receives rendering callbacks for one send.
///
/// Only [`on_delta`](RenderSink::on_delta) is required. Deltas are never
/// empty and arrive in network order; the sink appends them.
pub trait RenderSink {
    /// A stream opened for `model`; a placeholder may be shown.
    fn on_begin(&mut self, model: &str) {
        let _ = model;
    }

    /// Append `delta` to the in-progress message.
    fn on_delta(&mut self, delta: &str);

    /// Replace the in-progress message with the finalized one.
    fn on_finalize(&mut self, message: &ChatMessage) {
        let _ = message;
    }

    /// Drop the in-progress message; the send was cancelled.
    fn on_discard(&mut self) {}

    /// The attempt on `from` failed and `to` is about to be tried.
    /// `attempt` counts from 2 up to `max_attempts`.
    fn on_fallback(&mut self, from: &str, to: &str, attempt: usize, max_attempts: usize) {
        let _ = (from, to, attempt, max_attempts);
    }
}

impl<F: FnMut(&str)> RenderSink for F {
    fn on_delta(&mut self, delta: &str) {
        self(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_a_sink() {
        let mut out = String::new();
        {
            let mut sink = |d: &str| out.push_str(d);
            sink.on_begin("m");
            sink.on_delta("a");
            sink.on_delta("b");
            sink.on_finalize(&ChatMessage::assistant("ab"));
        }
        assert_eq!(out, "ab");
    }
}
