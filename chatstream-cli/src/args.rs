use std::path::PathBuf;

use crate::CliError;

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print usage and exit.
    Help,
    /// Chat, one-shot when a prompt is given, interactive otherwise.
    Chat(CliArgs),
}

/// Flags for a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--settings FILE`.
    pub settings: Option<PathBuf>,
    /// `--model ID`.
    pub model: Option<String>,
    /// `--fallback ID`, repeatable. Replaces the configured list.
    pub fallback_models: Vec<String>,
    /// `--no-fallback`: try the primary model only.
    pub no_fallback: bool,
    /// `--base-url URL`.
    pub base_url: Option<String>,
    /// `--attach FILE`, repeatable. Sent with the first message.
    pub attachments: Vec<PathBuf>,
    /// `--prompt TEXT`, or the positional words joined by spaces.
    pub prompt: Option<String>,
}

/// Parse arguments, program name excluded.
///
/// # Errors
///
/// Returns [`CliError::Usage`] for an unknown flag or a flag missing its
/// value.
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut remaining: Vec<String> = args.into_iter().collect();
    remaining.reverse();

    let mut parsed = CliArgs::default();
    let mut words: Vec<String> = Vec::new();
    while let Some(arg) = remaining.pop() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--settings" => parsed.settings = Some(take_arg(&arg, &mut remaining)?.into()),
            "--model" => parsed.model = Some(take_arg(&arg, &mut remaining)?),
            "--fallback" => parsed.fallback_models.push(take_arg(&arg, &mut remaining)?),
            "--no-fallback" => parsed.no_fallback = true,
            "--base-url" => parsed.base_url = Some(take_arg(&arg, &mut remaining)?),
            "--attach" => parsed.attachments.push(take_arg(&arg, &mut remaining)?.into()),
            "--prompt" => parsed.prompt = Some(take_arg(&arg, &mut remaining)?),
            "--" => {
                words.extend(remaining.drain(..).rev());
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(CliError::Usage(format!("unknown flag: {other}")));
            }
            _ => words.push(arg),
        }
    }

    if !words.is_empty() {
        if parsed.prompt.is_some() {
            return Err(CliError::Usage(
                "pass the prompt either with --prompt or as words, not both".into(),
            ));
        }
        parsed.prompt = Some(words.join(" "));
    }
    Ok(Command::Chat(parsed))
}

fn take_arg(flag: &str, remaining: &mut Vec<String>) -> Result<String, CliError> {
    remaining
        .pop()
        .ok_or_else(|| CliError::Usage(format!("missing value for {flag}")))
}

/// Usage text for `--help`.
pub const USAGE: &str = "\
chatstream [--settings FILE] [--model ID] [--fallback ID]... [--no-fallback]
           [--base-url URL] [--attach FILE]... [--prompt TEXT | TEXT...]

Without a prompt, reads one message per line from stdin.
Environment: OPENROUTER_API_KEY, CHATSTREAM_MODEL, CHATSTREAM_BASE_URL, RUST_LOG.
Interactive commands: /clear starts a new conversation, /quit exits.";
