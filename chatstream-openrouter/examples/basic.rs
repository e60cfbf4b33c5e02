//! Open a stream against OpenRouter and print the raw event-stream body.
//!
//! Set OPENROUTER_API_KEY in your environment and run:
//!   cargo run --example basic

use chatstream_openrouter::{OpenRouter, Provider};
use chatstream_types::{ChatMessage, RequestContext};
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("OPENROUTER_API_KEY")
        .map_err(|_| "OPENROUTER_API_KEY environment variable must be set")?;

    let provider = OpenRouter::new(api_key).title("chatstream example");

    let request = RequestContext::new(
        "meta-llama/llama-3.2-3b-instruct:free",
        vec![ChatMessage::user("Say hello in one sentence.")],
    );

    let mut body = provider.open_stream(&request).await?;
    while let Some(chunk) = body.next().await {
        print!("{}", String::from_utf8_lossy(&chunk?));
    }
    Ok(())
}
