//! ragc - terminal client for the RAG console

mod commands;
mod config;
mod notifier;
mod utils;

use clap::{Parser, Subcommand};
use rag_client::{ApiClient, FileStore};
use std::sync::Arc;

/// ragc - chat with RAG console dialogs from the terminal
#[derive(Parser, Debug)]
#[command(name = "ragc")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Console API root (overrides config and RAGCONSOLE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session tokens
    Login {
        email: String,
        /// Password. When omitted it is read from stdin, and the prompt echoes
        /// what you type.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account, then sign in
    Register {
        email: String,
        /// Password. When omitted it is read from stdin, and the prompt echoes
        /// what you type.
        #[arg(long)]
        password: Option<String>,
    },
    /// End the session and forget stored tokens
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List dialogs
    Dialogs,
    /// List conversations of a dialog
    Conversations { dialog_id: String },
    /// List knowledge bases
    Kbs {
        /// Only names containing this text
        #[arg(long)]
        keywords: Option<String>,
    },
    /// List the documents of a knowledge base with their parse status
    Documents { kb_id: String },
    /// Show the health of the server's backing services
    Status,
    /// List published agents
    Agents,
    /// List the models configured for this account
    Models,
    /// Chat with a dialog
    Chat {
        dialog_id: String,
        /// Send a single message and exit
        #[arg(short = 'c', long)]
        command: Option<String>,
        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rag=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Initialize config and exit
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

    let Some(command) = args.command else {
        eprintln!("No command given. Run `ragc --help` for usage.");
        std::process::exit(2);
    };

    let cfg = config::Config::load();
    let base_url = args.api_url.unwrap_or_else(|| cfg.api_base_url());
    let storage_path = cfg.storage_path();
    tracing::debug!("API {} / token store {}", base_url, storage_path.display());

    let client = ApiClient::new(
        cfg.client_config(base_url),
        Arc::new(FileStore::new(storage_path)),
        Arc::new(notifier::TerminalNotifier),
    )?;

    let result = match command {
        Command::Login { email, password } => {
            commands::account::login(&client, &email, password).await
        }
        Command::Register { email, password } => {
            commands::account::register(&client, &email, password).await
        }
        Command::Logout => commands::account::logout(&client).await,
        Command::Whoami => commands::account::whoami(&client).await,
        Command::Dialogs => commands::dialogs::list_dialogs(&client).await,
        Command::Conversations { dialog_id } => {
            commands::dialogs::list_conversations(&client, &dialog_id).await
        }
        Command::Kbs { keywords } => {
            commands::knowledge::list_knowledge_bases(&client, keywords).await
        }
        Command::Documents { kb_id } => {
            commands::knowledge::list_documents(&client, &kb_id).await
        }
        Command::Status => commands::system::status(&client).await,
        Command::Agents => commands::system::list_agents(&client).await,
        Command::Models => commands::system::list_models(&client).await,
        Command::Chat {
            dialog_id,
            command,
            conversation,
        } => {
            commands::chat::run(
                &client,
                &dialog_id,
                conversation.as_deref(),
                command.as_deref(),
                cfg.completion_delay(),
            )
            .await
        }
    };

    if let Err(e) = result {
        if !utils::already_reported(&e) {
            eprintln!("Error: {:#}", e);
        }
        tracing::debug!("Command failed: {:?}", e);
        std::process::exit(1);
    }
    Ok(())
}
