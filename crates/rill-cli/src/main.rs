//! rill - streaming question/answer chat client

mod commands;
mod config;
mod printer;
mod ui;
mod utils;

use clap::Parser;
use rill_chat::{Chat, ChatConfig, HttpTransport, Outcome};
use rill_client::QueryClient;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use crate::commands::CommandResult;
use crate::printer::AnswerPrinter;

/// rill - ask a knowledge base and watch the answer stream in
#[derive(Parser, Debug)]
#[command(name = "rill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Query endpoint URL (default: http://localhost:8000/query)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Knowledge-base namespace to search
    #[arg(short, long)]
    namespace: Option<String>,

    /// Number of passages the backend should retrieve
    #[arg(short = 'k', long)]
    top_k: Option<u32>,

    /// Overall request timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// Ask a single question and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable TUI mode (use simple stdin/stdout)
    #[arg(long)]
    no_tui: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("rill=debug,rill_chat=debug,rill_client=debug")
            .with_writer(io::stderr)
            .init();
    }

    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let Settings {
        endpoint,
        chat: chat_config,
        config,
    } = resolve(&args, config::Config::load());

    tracing::debug!(
        "endpoint={} namespace={:?} top_k={:?}",
        endpoint,
        chat_config.namespace,
        chat_config.top_k
    );

    let client = QueryClient::with_timeouts(&endpoint, config.connect_timeout(), config.timeout())?;
    let transport = Arc::new(HttpTransport::new(client));
    let mut chat = Chat::new(chat_config, transport);

    if let Some(question) = args.command {
        return run_command(&mut chat, &question).await;
    }

    let use_tui = !args.no_tui && config.tui.unwrap_or(true) && io::stdout().is_terminal();
    if use_tui {
        let theme = rill_tui::Theme::named(config.theme.as_deref().unwrap_or("dark"));
        return ui::run_tui(&mut chat, &endpoint, theme).await;
    }

    run_interactive(&mut chat, &endpoint).await
}

/// Settings after merging flags over environment over the config file
struct Settings {
    endpoint: String,
    chat: ChatConfig,
    config: config::Config,
}

fn resolve(args: &Args, mut config: config::Config) -> Settings {
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    let endpoint = args.endpoint.clone().unwrap_or_else(|| config.endpoint());
    let chat = ChatConfig {
        namespace: args.namespace.clone().or_else(|| config.namespace.clone()),
        top_k: args.top_k.or(config.top_k),
    };
    Settings {
        endpoint,
        chat,
        config,
    }
}

/// Ask one question, printing the answer as it streams. Ctrl+C cancels.
async fn answer(chat: &mut Chat, question: &str) -> anyhow::Result<Outcome> {
    let mut rx = chat.subscribe();
    let handle = chat.handle();
    let pending = chat.begin(question)?;

    let mut printer = AnswerPrinter::new(io::stdout());
    let mut output: io::Result<()> = Ok(());
    let mut drive = std::pin::pin!(chat.drive(pending));

    // the answer is always driven to the end so the chat returns to idle
    let result = loop {
        tokio::select! {
            biased;

            result = &mut drive => break result,

            event = rx.recv() => {
                if let Ok(event) = event {
                    if output.is_ok() {
                        output = printer.handle(&event);
                        if output.is_err() {
                            handle.cancel();
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("Interrupted, cancelling answer");
                handle.cancel();
            }
        }
    };

    // events sent after the last poll of the receiver
    while let Ok(event) = rx.try_recv() {
        if output.is_ok() {
            output = printer.handle(&event);
        }
    }

    let outcome = result?;
    output?;
    Ok(outcome)
}

async fn run_command(chat: &mut Chat, question: &str) -> anyhow::Result<()> {
    match answer(chat, question).await? {
        Outcome::Answered { .. } => Ok(()),
        Outcome::Cancelled { .. } => std::process::exit(130),
    }
}

async fn run_interactive(chat: &mut Chat, endpoint: &str) -> anyhow::Result<()> {
    if io::stderr().is_terminal() {
        match &chat.config().namespace {
            Some(ns) => eprintln!("rill ({}) namespace: {}", endpoint, ns),
            None => eprintln!("rill ({})", endpoint),
        }
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            if let Some(result) = commands::execute_command(input, chat) {
                match result {
                    CommandResult::Clear => match chat.clear() {
                        Ok(()) => println!("Cleared conversation."),
                        Err(e) => println!("Cannot clear: {}", e),
                    },
                    CommandResult::SetNamespace(namespace) => {
                        match &namespace {
                            Some(ns) => println!("Namespace: {}", ns),
                            None => println!("Namespace: backend default"),
                        }
                        chat.set_namespace(namespace);
                    }
                    CommandResult::Message(msg) => println!("{}", msg),
                    CommandResult::Exit => break,
                    CommandResult::Unknown(cmd) => {
                        println!("Unknown command: /{}", cmd);
                        println!("Type /help for available commands.");
                    }
                }
            }
            continue;
        }

        if let Err(e) = answer(chat, input).await {
            eprintln!("Error: {}", e);
        }
        println!();
    }

    Ok(())
}
