//! TanyaBot CLI entry point.
//!
//! Binary name: `tanyabot`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the interactive chat loop or one of the readback commands.

mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tanyabot_core::chat::repository::ChatRepository;
use tanyabot_core::popularity::repository::PromptRepository;
use tanyabot_types::chat::TurnKind;

use state::AppState;

#[derive(Parser)]
#[command(name = "tanyabot", about = "Retrieval-grounded chat backend", version)]
struct Cli {
    /// Data directory holding config.toml and the SQLite database.
    #[arg(long, env = "TANYABOT_DATA_DIR", default_value_os_t = default_data_dir())]
    data_dir: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat loop on stdin.
    Chat {
        /// Session id to resume; a fresh one is generated when omitted.
        #[arg(long)]
        session: Option<String>,

        /// User identifier recorded on the session.
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Print the stored turns of a session in order.
    History {
        /// Session id to read back.
        session: String,
    },

    /// Print the most-asked prompts, highest count first.
    TopPrompts {
        /// Maximum number of prompts to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".tanyabot")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tanyabot_observe::tracing_setup::init_tracing(cli.json_logs)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init(&cli.data_dir).await?;

    match cli.command {
        Commands::Chat { session, user } => {
            let session_id = session.unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
            run_chat_loop(&state, &session_id, &user).await?;
        }

        Commands::History { session } => {
            let turns = state.service.chat_repo().get_turns(&session).await?;
            if turns.is_empty() {
                println!("No turns recorded for session {session}.");
            }
            for turn in turns {
                let label = match turn.kind {
                    TurnKind::Question => "you",
                    TurnKind::Response => "bot",
                };
                println!("[{}] {label}: {}", turn.created_at.to_rfc3339(), turn.body);
            }
        }

        Commands::TopPrompts { limit } => {
            let prompts = state.service.tracker().prompts().top_prompts(limit).await?;
            if prompts.is_empty() {
                println!("No prompts tracked yet.");
            }
            for prompt in prompts {
                println!("{:>6}  {}", prompt.count, prompt.prompt);
            }
        }
    }

    Ok(())
}

/// Read questions from stdin until EOF, printing each answer.
async fn run_chat_loop(state: &AppState, session_id: &str, user_id: &str) -> anyhow::Result<()> {
    println!("Session {session_id}. Ask away (Ctrl-D to quit).");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let answer = state.service.converse(question, session_id, user_id).await?;
        println!("{answer}");
        println!();
    }

    Ok(())
}
