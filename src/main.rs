mod background;
mod cli;
mod config;
mod db;
mod embedding;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use background::store::NewItem;
use background::types::BackgroundKind;

#[derive(Parser)]
#[command(name = "loreseek", version, about = "Background retrieval for fiction writing")]
struct Cli {
    /// Config file to use instead of ~/.loreseek/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport unless --http)
    Serve {
        /// Serve streamable HTTP on server.host:server.port instead of stdio
        #[arg(long)]
        http: bool,
    },
    /// Embed and store a background item
    Add {
        #[arg(long)]
        book: Option<String>,
        /// worldview, character, or chapter
        #[arg(long = "type", value_parser = parse_kind)]
        kind: BackgroundKind,
        #[arg(long, default_value = "")]
        content: String,
        /// Character name
        #[arg(long)]
        name: Option<String>,
        /// Character description
        #[arg(long)]
        description: Option<String>,
    },
    /// Find background relevant to a query and print the context block
    Search {
        query: String,
        #[arg(long)]
        book: Option<String>,
        /// Also print per-item scores to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the items stored for a book
    List {
        #[arg(long)]
        book: Option<String>,
    },
    /// Delete one item by ID
    Remove { id: String },
    /// Delete every item in a book (asks for confirmation)
    Clear {
        #[arg(long)]
        book: Option<String>,
    },
    /// Show store statistics
    Stats {
        #[arg(long)]
        book: Option<String>,
    },
    /// Import items from a JSON export, re-embedding each one
    Import {
        file: PathBuf,
        #[arg(long)]
        book: Option<String>,
    },
    /// Export a book's items as JSON to stdout
    Export {
        #[arg(long)]
        book: Option<String>,
    },
    /// Regenerate a book's embeddings with the configured model
    ReEmbed {
        #[arg(long)]
        book: Option<String>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn parse_kind(s: &str) -> Result<BackgroundKind, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::LoreConfig::load_from(&config_path)?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and CLI output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { http } => {
            if http || config.server.transport == "http" {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
        Command::Add {
            book,
            kind,
            content,
            name,
            description,
        } => {
            let item = NewItem {
                kind,
                content,
                name,
                description,
                created_at: None,
            };
            let book = config.book_or_default(book.as_deref()).to_string();
            cli::add::add(&config, &book, item).await?;
        }
        Command::Search {
            query,
            book,
            verbose,
        } => {
            let book = config.book_or_default(book.as_deref()).to_string();
            cli::search::search(&config, &book, &query, verbose).await?;
        }
        Command::List { book } => {
            cli::list::list(&config, config.book_or_default(book.as_deref()))?;
        }
        Command::Remove { id } => cli::remove::remove(&config, &id)?,
        Command::Clear { book } => {
            cli::clear::clear(&config, config.book_or_default(book.as_deref()))?;
        }
        Command::Stats { book } => cli::stats::stats(&config, book.as_deref())?,
        Command::Import { file, book } => {
            let book = config.book_or_default(book.as_deref()).to_string();
            cli::import::import(&config, &book, &file).await?;
        }
        Command::Export { book } => {
            cli::export::export(&config, config.book_or_default(book.as_deref()))?;
        }
        Command::ReEmbed { book } => {
            let book = config.book_or_default(book.as_deref()).to_string();
            cli::re_embed::re_embed(&config, &book).await?;
        }
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cli::config_init(&config_path, force)?,
        },
    }

    Ok(())
}
