//! agent-portal: 终端版智能体对话客户端
//!
//! Usage:
//!   agent-portal [--config <path|url>]      Start an interactive session
//!   agent-portal version                    Show version information
//!   agent-portal help                       Show usage

use agent_portal::dispatch::staged_refs;
use agent_portal::{
    ConfigLoader, DispatchHandle, DispatchObserver, DispatchOrchestrator, LocalFile, Message,
    StatusState,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!(
        r#"agent-portal: chat with an agent backend from the terminal

USAGE:
    agent-portal [--config <path|url>]

COMMANDS (inside a session):
    /attach <path>      Stage a file for the next message
    /detach <id>        Remove a staged file
    /files              List staged files
    /preview            Show the payload the next send would produce
    /config             Show the active configuration
    /mock on|off        Toggle mock responses
    /clear              Clear the conversation
    /help               Show this help message
    /quit               Wait for pending replies and exit
    <anything else>     Send it as a message

ENVIRONMENT:
    AGENT_PORTAL_CONFIG          Configuration document (default config/app-config.json)
    AGENT_PORTAL_BASE_URL ...    Per-field overrides, see README
    RUST_LOG                     Log filter (default agent_portal=info)"#
    );
}

/// Renders thread events to stdout.
struct TerminalObserver;

impl TerminalObserver {
    fn render(message: &Message) {
        let time = message.timestamp.format("%H:%M");
        let marker = if message.is_error { " !" } else { "" };
        println!("[{}] {}{}:", time, message.role.label(), marker);
        println!("{}", message.content);
        for attachment in &message.attachments {
            println!("  📁 {} ({})", attachment.name, attachment.size_label());
        }
        println!();
    }
}

impl DispatchObserver for TerminalObserver {
    fn on_message_appended(&self, message: &Message) {
        Self::render(message);
    }

    fn on_dispatch_start(&self, placeholder: &Message) {
        println!("… {}", placeholder.content);
    }

    fn on_dispatch_settled(&self, _placeholder_id: &str, message: &Message) {
        Self::render(message);
    }

    fn on_status_change(&self, state: StatusState, label: &str) {
        let dot = match state {
            StatusState::Idle => "○",
            StatusState::Active => "●",
        };
        eprintln!("{} {}", dot, label);
    }
}

fn resolve_config_source(args: &[String]) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" {
            return args.get(i + 1).cloned();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("help" | "--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some("version" | "--version" | "-V") => {
            println!("agent-portal {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent_portal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(source) = resolve_config_source(&args[1..]) {
        loader = loader.with_source(source);
    }
    let loaded = loader.load().await;

    let portal = DispatchOrchestrator::builder()
        .loaded(loaded)
        .observer(Arc::new(TerminalObserver))
        .build()?;

    for message in portal.messages() {
        TerminalObserver::render(&message);
    }

    let mut pending: Vec<DispatchHandle> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => print_usage(),
            "/attach" => match LocalFile::open(rest).await {
                Ok(file) => {
                    let id = portal.stage_file(Arc::new(file));
                    println!("staged {} as {}", rest, id);
                }
                Err(e) => eprintln!("{}", e),
            },
            "/detach" => {
                if !portal.remove_staged(rest) {
                    eprintln!("no staged file with id {}", rest);
                }
            }
            "/files" => {
                let staged = portal.staged();
                if staged.is_empty() {
                    println!("no attachments staged");
                }
                for (item, r) in staged.iter().zip(staged_refs(&staged)) {
                    println!("📎 {} · {} [{}]", r.name, r.size_label(), item.id);
                }
            }
            "/preview" => println!("{}", portal.preview()),
            "/config" => {
                let config = portal.config().load().redacted();
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            "/mock" => match rest {
                "on" => portal.set_mock_mode(true),
                "off" => portal.set_mock_mode(false),
                _ => eprintln!("usage: /mock on|off"),
            },
            "/clear" => {
                portal.clear_conversation();
                println!("conversation cleared");
            }
            _ => {
                if let Some(handle) = portal.send(line) {
                    pending.push(handle);
                }
            }
        }
        pending.retain(|h| !h.is_finished());
    }

    for handle in pending {
        handle.settled().await;
    }
    Ok(())
}
