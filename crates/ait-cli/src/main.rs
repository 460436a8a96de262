mod commands;
mod render;

use ait::store::{ConfigStore, JsonFileStore};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Choose the active provider and its credentials
    Configure {
        /// Provider type (gemini, openai, anthropic or deepseek)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use with that provider
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send a probe request to the active provider
    Test,

    /// List, add or remove instructions
    Instructions {
        #[command(subcommand)]
        command: InstructionsCommand,
    },

    /// Apply an instruction to some text
    Run {
        /// Instruction id, e.g. fixGrammar
        instruction: String,

        /// Text to process; read from stdin when omitted
        text: Option<String>,

        /// Treat the text as read-only, the result is only shown
        #[arg(long)]
        read_only: bool,

        /// Replace the text with the result without asking
        #[arg(short = 'y', long)]
        apply: bool,
    },

    /// Print the version
    Version,
}

#[derive(Subcommand)]
enum InstructionsCommand {
    /// Show built-in and custom instructions
    List,

    /// Add a custom instruction
    Add { title: String, instruction: String },

    /// Remove a custom instruction
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Quiet unless RUST_LOG asks for more.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.store.unwrap_or_else(JsonFileStore::default_path);
    let store: Arc<dyn ConfigStore> = Arc::new(JsonFileStore::new(path));

    match cli.command {
        Command::Configure { provider, model } => {
            commands::configure::handle_configure(store.as_ref(), provider, model).await
        }
        Command::Test => commands::test::execute(store.as_ref()).await,
        Command::Instructions { command } => match command {
            InstructionsCommand::List => commands::instructions::list(store.as_ref()).await,
            InstructionsCommand::Add { title, instruction } => {
                commands::instructions::add(store.as_ref(), &title, &instruction).await
            }
            InstructionsCommand::Remove { id } => {
                commands::instructions::remove(store.as_ref(), &id).await
            }
        },
        Command::Run {
            instruction,
            text,
            read_only,
            apply,
        } => commands::run::execute(store, &instruction, text, !read_only, apply).await,
        Command::Version => commands::version::execute().await,
    }
}
