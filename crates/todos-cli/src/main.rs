use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod bootstrap;
mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "todos")]
#[command(about = "Todos - a to-do list with live queries", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Access token identifying the caller when `auth.mode = "tokens"`
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Print tasks
    List {
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Newest first instead of creation order
        #[arg(long)]
        newest: bool,
    },
    /// Change a task's title and/or description
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Set a task's completion flag
    Toggle {
        id: String,
        #[arg(action = clap::ArgAction::Set, value_parser = clap::value_parser!(bool))]
        completed: bool,
    },
    /// Delete a task
    Delete { id: String },
    /// Serve JSON-lines requests on stdin/stdout
    Rpc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    All,
    Completed,
    Incomplete,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref()).await?;
    let _log_guard = logging::init(&config.logging)?;
    let api = bootstrap::build_api(&config).await?;
    let token = cli.token.as_deref();

    match cli.command {
        Commands::Add { title, description } => {
            commands::tasks::add(&api, token, title, description).await?
        }
        Commands::List { filter, newest } => {
            commands::tasks::list(&api, token, filter, newest).await?
        }
        Commands::Edit {
            id,
            title,
            description,
        } => commands::tasks::edit(&api, token, id, title, description).await?,
        Commands::Toggle { id, completed } => {
            commands::tasks::toggle(&api, token, id, completed).await?
        }
        Commands::Delete { id } => commands::tasks::delete(&api, token, id).await?,
        Commands::Rpc => commands::rpc::run(api).await?,
    }

    Ok(())
}
