use chatstream_cli::{Chat, CliError, Settings, TerminalSink, load_attachment};
use std::time::Duration;

use chatstream_session::{CancellationToken, ChatMessage, SendOutcome, SendRequest};
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let frame = serde_json::json!({"choices": [{"delta": {"content": delta}}]});
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn settings_for(server: &MockServer, dir: &tempfile::TempDir) -> Settings {
    let path = dir.path().join("chatstream.json");
    std::fs::write(
        &path,
        r#"{
            "model": "m1",
            "fallback_models": ["m2", "m3"],
            "system_prompt": "Answer tersely.",
            "title": "chatstream tests"
        }"#,
    )
    .expect("write settings");

    let mut settings = Settings::load(Some(&path)).expect("settings parse");
    let uri = server.uri();
    settings.apply_env(|name| match name {
        "OPENROUTER_API_KEY" => Some("sk-or-v1-offline".into()),
        "CHATSTREAM_BASE_URL" => Some(uri.clone()),
        _ => None,
    });
    settings
}

#[tokio::test]
async fn fallback_reply_is_rendered_and_history_is_reused() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({"model": "m1"})))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":{"code":429,"message":"slow down"}}"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({"model": "m2"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["Hel", "lo"]), "text/event-stream"))
        .mount(&server)
        .await;

    let mut chat = Chat::new(&settings_for(&server, &dir)).expect("valid settings");
    let mut sink = TerminalSink::new(Vec::new(), Vec::new());
    let outcome = chat
        .send(SendRequest::new("hi"), &mut sink, &CancellationToken::new())
        .await
        .expect("send succeeds");

    assert!(matches!(
        outcome,
        SendOutcome::Completed { fallback_model: Some(ref m), .. } if m == "m2"
    ));
    let (out, err) = sink.into_inner();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello\n");
    assert!(String::from_utf8(err).unwrap().contains("trying fallback model 2/3: m2"));
    assert_eq!(
        chat.conversation().messages(),
        &[ChatMessage::user("hi"), ChatMessage::assistant("Hello")]
    );

    // The second turn carries the system prompt and the first exchange.
    server.reset().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "model": "m1",
            "messages": [
                {"role": "system", "content": "Answer tersely."},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "Hello"},
                {"role": "user", "content": "again"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["Hi again"]), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut sink = TerminalSink::new(Vec::new(), Vec::new());
    chat.send(SendRequest::new("again"), &mut sink, &CancellationToken::new())
        .await
        .expect("second send succeeds");
    assert_eq!(chat.conversation().len(), 4);

    chat.clear();
    assert!(chat.conversation().is_empty());
}

#[tokio::test]
async fn attachment_is_inlined_into_the_prompt() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("todo.txt");
    std::fs::write(&file, "buy milk").expect("write attachment");

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                {"role": "system"},
                {"role": "user", "content": "[Attached file: todo.txt] - Content: buy milk\n\nwhat is on my list?"}
            ],
            "max_tokens": 2000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse(&["Milk."]), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = Chat::new(&settings_for(&server, &dir)).expect("valid settings");
    let request = SendRequest::new("what is on my list?").attach(load_attachment(&file).unwrap());
    let mut sink = TerminalSink::new(Vec::new(), Vec::new());
    chat.send(request, &mut sink, &CancellationToken::new())
        .await
        .expect("send succeeds");
    assert_eq!(String::from_utf8(sink.into_inner().0).unwrap(), "Milk.\n");
}

#[tokio::test]
async fn interrupt_cancels_the_send_in_flight() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse(&["late"]), "text/event-stream")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut chat = Chat::new(&settings_for(&server, &dir)).expect("valid settings");
    let (tx, mut interrupts) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Two presses during one send.
        tx.send(()).unwrap();
        tx.send(()).unwrap();
    });

    let mut sink = TerminalSink::new(Vec::new(), Vec::new());
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        chat.send_interruptible(SendRequest::new("hi"), &mut sink, &mut interrupts),
    )
    .await
    .expect("interrupt stops the send")
    .expect("cancellation is not an error");

    assert!(matches!(outcome, SendOutcome::Cancelled { .. }), "got {outcome:?}");
    assert!(chat.conversation().is_empty());
    // Both presses were consumed by the send; none is left for the prompt.
    assert!(interrupts.try_recv().is_err());
}

#[test]
fn missing_api_key_is_rejected_up_front() {
    let settings = Settings::from_json(r#"{"model":"m1"}"#).unwrap();
    let err = match Chat::new(&settings) {
        Ok(_) => panic!("expected invalid settings"),
        Err(err) => err,
    };
    assert!(matches!(err, CliError::Invalid(_)));
    assert!(err.to_string().contains("API key"));
}
