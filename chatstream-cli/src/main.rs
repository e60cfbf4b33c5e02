use chatstream_cli::args::USAGE;
use chatstream_cli::{
    Chat, CliError, Command, Settings, TerminalSink, load_attachment, parse_args,
};
use chatstream_session::{RenderSink, SendOutcome, SendRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run_cli().await {
        eprintln!("chatstream error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let args = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Chat(args) => args,
    };

    let mut settings = Settings::load(args.settings.as_deref())?;
    settings.apply_env(|name| std::env::var(name).ok());
    settings.apply_args(&args);

    let mut chat = Chat::new(&settings)?;
    let mut attachments = args
        .attachments
        .iter()
        .map(|path| load_attachment(path))
        .collect::<Result<Vec<_>, _>>()?;
    let mut sink = TerminalSink::new(std::io::stdout(), std::io::stderr());
    let mut interrupts = watch_interrupts();

    if let Some(text) = args.prompt {
        let request = SendRequest { text, attachments };
        return send_interruptible(&mut chat, request, &mut sink, &mut interrupts).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        // Ctrl-C while idle leaves the loop.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(()) = interrupts.recv() => {
                eprintln!();
                break;
            }
        };
        let Some(line) = line else { break };
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                chat.clear();
                eprintln!("[new conversation]");
                continue;
            }
            _ => {}
        }
        let request = SendRequest {
            text: text.to_string(),
            attachments: std::mem::take(&mut attachments),
        };
        // A failed send leaves the conversation as it was; keep going.
        if let Err(err) = send_interruptible(&mut chat, request, &mut sink, &mut interrupts).await {
            eprintln!("{err}");
        }
    }
    Ok(())
}

/// Forward every Ctrl-C for the life of the process.
///
/// Installing the handler replaces the default SIGINT action, so the
/// receiver is the only place an interrupt is seen.
fn watch_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Send with Ctrl-C wired to cancellation.
async fn send_interruptible(
    chat: &mut Chat,
    request: SendRequest,
    sink: &mut impl RenderSink,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<(), CliError> {
    if let SendOutcome::Completed {
        fallback_model: Some(model),
        ..
    } = chat.send_interruptible(request, sink, interrupts).await?
    {
        eprintln!("[answered by fallback model {model}]");
    }
    Ok(())
}
