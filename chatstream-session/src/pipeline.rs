//! The decode → parse → extract pipeline over a response body.

use chatstream_types::{ByteStream, ChatError, StreamEvent, WasmBoxedStream};
use futures::StreamExt;

use crate::config::DEFAULT_MAX_LINE_BYTES;
use crate::decoder::FrameDecoder;
use crate::extractor::extract_delta;
use crate::parser::{SseEvent, parse_line};

/// Events decoded from one response body.
pub type EventStream = WasmBoxedStream<'static, Result<StreamEvent, ChatError>>;

/// Turn a raw body into a stream of [`StreamEvent`]s.
///
/// The stream yields [`StreamEvent::End`] and stops at the `[DONE]`
/// sentinel; lines after it, in the same chunk or later ones, are never
/// read. A body read failure is yielded once as `Err` and ends the stream.
/// If the body ends without the sentinel, the stream just ends and any
/// incomplete trailing line is dropped.
///
/// Lines are capped at [`DEFAULT_MAX_LINE_BYTES`]; see
/// [`event_stream_with_limit`].
pub fn event_stream(body: ByteStream) -> EventStream {
    event_stream_with_limit(body, DEFAULT_MAX_LINE_BYTES)
}

/// [`event_stream`] with an explicit line-length cap.
///
/// Once more than `max_line_bytes` are carried without a newline, the
/// stream yields [`ChatError::LineTooLong`] and ends. `0` disables the cap.
pub fn event_stream_with_limit(body: ByteStream, max_line_bytes: usize) -> EventStream {
    Box::pin(async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        let mut body = body;

        while let Some(chunk_result) = body.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let mut done = false;
            for line in decoder.push(&chunk) {
                match parse_line(&line) {
                    Some(SseEvent::Data(payload)) => {
                        yield Ok(extract_delta(payload));
                    }
                    Some(SseEvent::Done) => {
                        done = true;
                        break;
                    }
                    None => {}
                }
            }
            if done {
                yield Ok(StreamEvent::End);
                return;
            }
            if max_line_bytes > 0 && decoder.carried() > max_line_bytes {
                tracing::warn!(carried = decoder.carried(), limit = max_line_bytes, "line too long, abandoning stream");
                yield Err(ChatError::LineTooLong { limit: max_line_bytes });
                return;
            }
        }

        let dropped = decoder.finish();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "discarding incomplete trailing line");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn body(chunks: Vec<Result<&'static str, ChatError>>) -> ByteStream {
        Box::pin(futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes()))),
        ))
    }

    async fn collect(stream: EventStream) -> Vec<Result<StreamEvent, ChatError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn yields_deltas_then_end() {
        let events = collect(event_stream(body(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n",
        )])))
        .await;
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Delta("Hel".into())),
                Ok(StreamEvent::Delta("lo".into())),
                Ok(StreamEvent::End),
            ]
        );
    }

    #[tokio::test]
    async fn done_short_circuits_rest_of_chunk() {
        let events = collect(event_stream(body(vec![
            Ok("data: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"later\"}}]}\n"),
        ])))
        .await;
        assert_eq!(events, vec![Ok(StreamEvent::End)]);
    }

    #[tokio::test]
    async fn malformed_frames_pass_through() {
        let events = collect(event_stream(body(vec![Ok(
            "data: {not json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        )])))
        .await;
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Malformed("{not json".into())),
                Ok(StreamEvent::Delta("ok".into())),
            ]
        );
    }

    #[tokio::test]
    async fn read_error_ends_stream() {
        let events = collect(event_stream(body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Err(ChatError::network("connection reset", false)),
            Ok("data: [DONE]\n"),
        ])))
        .await;
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Delta("a".into())),
                Err(ChatError::network("connection reset", false)),
            ]
        );
    }

    #[tokio::test]
    async fn endless_line_is_cut_off() {
        let events = collect(event_stream_with_limit(
            body(vec![
                Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
                Ok("data: xxxxxxxx"),
                Ok("xxxxxxxxxxxxxxxx"),
                Ok("data: [DONE]\n"),
            ]),
            16,
        ))
        .await;
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Delta("a".into())),
                Err(ChatError::LineTooLong { limit: 16 }),
            ]
        );
    }

    #[tokio::test]
    async fn long_complete_lines_pass_under_the_cap() {
        let events = collect(event_stream_with_limit(
            body(vec![Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\ndata: [DONE]\n")]),
            16,
        ))
        .await;
        assert_eq!(
            events,
            vec![Ok(StreamEvent::Delta("a".into())), Ok(StreamEvent::End)]
        );
    }

    #[tokio::test]
    async fn zero_disables_the_line_cap() {
        let long: ByteStream = Box::pin(futures::stream::iter(vec![Ok(Bytes::from(format!(
            "data: {}",
            "x".repeat(4096)
        )))]));
        let events = collect(event_stream_with_limit(long, 0)).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn eof_without_done_drops_partial_line() {
        let events = collect(event_stream(body(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\ndata: {\"choices\"",
        )])))
        .await;
        assert_eq!(events, vec![Ok(StreamEvent::Delta("a".into()))]);
    }
}
