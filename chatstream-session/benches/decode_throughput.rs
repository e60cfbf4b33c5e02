use chatstream_session::{FrameDecoder, SseEvent, extract_delta, parse_line};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn make_body(n_frames: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..n_frames {
        let frame = serde_json::json!({
            "id": "gen-bench",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": format!("token {i} ")}}]
        });
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body.into_bytes()
}

fn decode(body: &[u8], chunk_size: usize) -> usize {
    let mut decoder = FrameDecoder::new();
    let mut total = 0;
    for chunk in body.chunks(chunk_size) {
        for line in decoder.push(chunk) {
            if let Some(SseEvent::Data(payload)) = parse_line(&line) {
                total += match extract_delta(payload) {
                    chatstream_session::StreamEvent::Delta(text) => text.len(),
                    _ => 0,
                };
            }
        }
    }
    total
}

fn bench_decode(c: &mut Criterion) {
    let body = make_body(1000);
    let mut group = c.benchmark_group("decode_1000_frames");
    for chunk_size in [16, 512, 16 * 1024] {
        group.bench_function(format!("{chunk_size}_byte_chunks"), |b| {
            b.iter(|| decode(black_box(&body), chunk_size))
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let payload = r#"{"id":"gen-1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;
    c.bench_function("extract_delta", |b| {
        b.iter(|| extract_delta(black_box(payload)))
    });
}

criterion_group!(benches, bench_decode, bench_extract);
criterion_main!(benches);
