use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use parley_client::{ChatClient, ClientConfig, NoAuth, StaticToken, TokenProvider, TurnOutcome};
use parley_core::cancel::{CancelReason, CancelSignal};
use parley_core::ids::ChatId;
use parley_core::parts::Part;
use parley_store::{ChatRepo, Database, StoreError};
use parley_stream::NullCanvasSink;
use parley_telemetry::TelemetryConfig;

#[derive(Parser)]
#[command(name = "parley", version, about = "Streaming chat client")]
struct Cli {
    /// Gateway base URL.
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token for the gateway.
    #[arg(long, global = true, env = "PARLEY_TOKEN")]
    token: Option<String>,

    /// Emit JSON logs.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a prompt and stream the reply into a chat.
    Chat {
        prompt: String,

        /// Continue an existing chat by id; omit to start a new one.
        #[arg(long)]
        chat: Option<String>,

        /// Inactivity timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Manage stored chats.
    Chats {
        #[command(subcommand)]
        command: ChatsCommand,
    },
}

#[derive(Subcommand)]
enum ChatsCommand {
    /// List chats, most recently updated first.
    List,
    /// Print a chat transcript as JSON.
    Show { id: String },
    /// Delete a chat.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    parley_telemetry::init_telemetry(TelemetryConfig {
        json: cli.json_logs,
        ..TelemetryConfig::default()
    });

    let db_dir = home_dir().join(".parley").join("database");
    let db = Database::open(&db_dir.join("chats.db")).context("open chat database")?;
    let repo = Arc::new(ChatRepo::new(db));

    match cli.command {
        Command::Chat { prompt, chat, timeout } => {
            run_chat(&cli.url, cli.token.as_deref(), repo, prompt, chat, timeout).await
        }
        Command::Chats { command } => run_chats(repo, command),
    }
}

async fn run_chat(
    url: &str,
    token: Option<&str>,
    repo: Arc<ChatRepo>,
    prompt: String,
    chat: Option<String>,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let (chat_id, mut transcript) = match chat {
        Some(id) => {
            let row = repo.get(&ChatId::from_raw(id)).context("load chat")?;
            (row.id, row.messages)
        }
        None => {
            let row = repo.create().context("create chat")?;
            (row.id, row.messages)
        }
    };

    let auth: Arc<dyn TokenProvider> = match token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(NoAuth),
    };

    let config = ClientConfig::new(url)
        .with_inactivity_timeout(Duration::from_secs(timeout_secs));
    let client = ChatClient::new(config, auth)?.with_store(repo.clone());

    // Ctrl-C stops generation; the partial reply is kept and persisted.
    let signal = CancelSignal::new();
    let stopper = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.cancel(CancelReason::UserStop);
        }
    });

    let outcome = client
        .send(&chat_id, &mut transcript, prompt, &signal, &mut NullCanvasSink)
        .await;

    if let Some(reply) = transcript.last() {
        if let Some(parts) = &reply.parts {
            render_parts(parts);
        }
    }

    match outcome {
        TurnOutcome::Completed | TurnOutcome::Stopped => {
            eprintln!("\nchat: {chat_id}");
            Ok(())
        }
        TurnOutcome::Failed(info) => anyhow::bail!("{}", info.message),
        TurnOutcome::Skipped => anyhow::bail!("nothing to do"),
    }
}

fn run_chats(repo: Arc<ChatRepo>, command: ChatsCommand) -> anyhow::Result<()> {
    match command {
        ChatsCommand::List => {
            for chat in repo.list().context("list chats")? {
                println!("{}  {}  {}", chat.id, chat.updated_at, chat.title);
            }
            Ok(())
        }
        ChatsCommand::Show { id } => {
            let row = repo.get(&ChatId::from_raw(id)).context("load chat")?;
            println!("{}", serde_json::to_string_pretty(&row.messages)?);
            Ok(())
        }
        ChatsCommand::Delete { id } => {
            match repo.delete(&ChatId::from_raw(&id)) {
                Ok(()) => Ok(()),
                Err(StoreError::NotFound(_)) => anyhow::bail!("no chat with id {id}"),
                Err(err) => Err(err.into()),
            }
        }
    }
}

fn render_parts(parts: &[Part]) {
    for part in parts {
        match part {
            Part::Text { text } => println!("{text}"),
            Part::Thinking { duration, .. } => {
                let secs = duration.unwrap_or(0);
                eprintln!("[thought for {secs}s]");
            }
            Part::Code { code, language } => {
                println!("```{}", language.as_deref().unwrap_or_default());
                println!("{code}");
                println!("```");
            }
            Part::Table { headers, rows } => {
                println!("{}", headers.join(" | "));
                for row in rows {
                    println!("{}", row.join(" | "));
                }
            }
            Part::Callout { style, title, callout } => {
                println!("[{}] {}", title.as_deref().unwrap_or(style), callout);
            }
            Part::Image { image, alt, .. } => {
                let label = alt.as_deref().or(image.as_deref()).unwrap_or("image");
                println!("[image: {label}]");
            }
            Part::Steps { steps } => {
                for step in steps {
                    eprintln!("[step: {}]", step.step);
                }
            }
            Part::Canvas { title, content, .. } => {
                println!("--- {title} ---");
                println!("{content}");
            }
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
