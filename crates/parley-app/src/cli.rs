use clap::Parser;

/// Parley — terminal chat over the OpenAI Responses API.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct Args {
    /// Model to converse with.
    #[arg(short, long, default_value = "gpt-5-mini")]
    pub model: String,

    /// Reasoning effort (low, medium, high). Ignored for models that
    /// don't support it.
    #[arg(long)]
    pub effort: Option<String>,

    /// Conversation name shown in logs.
    #[arg(long, default_value = "New Conversation")]
    pub name: String,

    /// List available models and exit.
    #[arg(long)]
    pub list_models: bool,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
