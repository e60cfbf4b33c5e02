//! Frame decoder: raw body chunks in, complete text lines out.
//!
//! Bytes are buffered until a `\n` arrives, so a multi-byte UTF-8 sequence
//! split across chunks is never decoded in halves. Each complete line is
//! decoded on its own; invalid sequences inside a line become U+FFFD.

/// Splits a chunked byte stream into newline-terminated lines.
///
/// The newline is not part of the yielded line. A `\r` before it is kept;
/// the event parser deals with CRLF.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    /// Leading bytes of `buf` already known to hold no newline.
    scanned: usize,
}

impl FrameDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and iterate over the lines it completes.
    ///
    /// Lines are produced lazily. Bytes after the last newline stay in the
    /// carry buffer for the next call. Dropping the iterator early keeps the
    /// unread lines buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.buf.extend_from_slice(chunk);
        let scan = self.scanned;
        Lines {
            decoder: self,
            start: 0,
            scan,
        }
    }

    /// Number of bytes held back waiting for a newline.
    #[must_use]
    pub fn carried(&self) -> usize {
        self.buf.len()
    }

    /// Signal end of input. The incomplete trailing line, if any, is
    /// discarded; its length in bytes is returned.
    pub fn finish(self) -> usize {
        self.buf.len()
    }
}

/// Lazy iterator over the complete lines of a [`FrameDecoder`].
///
/// Created by [`FrameDecoder::push`].
#[derive(Debug)]
pub struct Lines<'a> {
    decoder: &'a mut FrameDecoder,
    /// Start of the next unread line.
    start: usize,
    /// Where the next newline search begins.
    scan: usize,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let buf = &self.decoder.buf;
        let from = self.scan.max(self.start);
        match buf[from..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = from + offset;
                let line = String::from_utf8_lossy(&buf[self.start..end]).into_owned();
                self.start = end + 1;
                self.scan = self.start;
                Some(line)
            }
            None => {
                self.scan = buf.len();
                None
            }
        }
    }
}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        self.decoder.buf.drain(..self.start);
        self.decoder.scanned = self.scan.saturating_sub(self.start);
    }
}
