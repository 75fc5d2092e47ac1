mod cli;

use std::io::{BufRead, Write};

use tracing_subscriber::EnvFilter;

use parley_ai::{ChatError, ChatService, Conversation, OpenAiClient, OpenAiConfig, ReasoningEffort};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let log_directive = args.log.as_deref().unwrap_or("parley=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "parley=info".parse().unwrap()),
            ),
        )
        .init();

    let config = match OpenAiConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let api_key = config.api_key.clone();
    let client = OpenAiClient::new(config);

    if args.list_models {
        match client.list_models().await {
            Ok(models) => {
                for model in models {
                    println!("{}", model.id);
                }
            }
            Err(err) => {
                eprintln!("Failed to list models: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let effort = ReasoningEffort::normalize(args.effort.as_deref());
    let mut conversation = match Conversation::new(api_key, &args.model, &args.name) {
        Ok(conv) => conv.with_effort(effort),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        conversation = %conversation.id(),
        model = %conversation.model(),
        "Parley v{} ready",
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "Chatting with {} (reasoning: {}). Empty line or Ctrl-D to quit.",
        conversation.model(),
        if parley_ai::supports_reasoning(conversation.model()) {
            conversation.effort().as_str()
        } else {
            "unavailable"
        }
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("stdin error: {err}");
                break;
            }
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            break;
        }

        tracing::debug!(prompt_tokens = conversation.count_prompt(prompt), "sending");
        match conversation.send(&client, prompt).await {
            Ok(reply) => {
                println!("{reply}");
                println!("[tokens in context: {}]", conversation.total_tokens());
            }
            Err(ChatError::RateLimited) => {
                eprintln!("Rate limited; try again shortly.");
            }
            Err(err) => {
                eprintln!("Send failed: {err}");
            }
        }
    }
}
