//! # lua-chat CLI (`luachat`)
//!
//! ## Usage
//!
//! ```bash
//! luachat --config ./config/luachat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `luachat serve` | Start the HTTP chat endpoint |
//! | `luachat search "<query>"` | Rank catalog snippets against a query |
//! | `luachat ask "<message>" [--search]` | Run one chat request and print the JSON response |
//! | `luachat snippets` | List catalog snippets |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use lua_chat::catalog::{catalog_from_config, validate_record, SnippetSource};
use lua_chat::chat::ChatError;
use lua_chat::config;
use lua_chat::models::ChatRequest;
use lua_chat::search::search;
use lua_chat::server;

const DEFAULT_CONFIG_PATH: &str = "./config/luachat.toml";

/// lua-chat: a chat endpoint that searches a Lua snippet catalog and
/// combines matches through an LLM.
#[derive(Parser)]
#[command(name = "luachat", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/luachat.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Rank catalog snippets against a query, without calling the LLM.
    Search {
        query: String,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run a single chat request and print the JSON response.
    Ask {
        message: String,

        /// Search the snippet catalog and combine the matches.
        #[arg(long)]
        search: bool,
    },

    /// List catalog snippets and check that each one compiles as Lua.
    Snippets,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let cfg = config::load_or_default(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, limit } => {
            let catalog = catalog_from_config(&cfg.catalog)?;
            let records = catalog.list()?;
            let mut results = search(&query, &records);
            if let Some(limit) = limit {
                results.truncate(limit);
            }
            if results.is_empty() {
                println!("No results.");
            }
            for (i, r) in results.iter().enumerate() {
                println!(
                    "{}. [{}] {} ({})",
                    i + 1,
                    r.relevance_score,
                    r.record.title,
                    r.record.keywords.join(", ")
                );
            }
        }
        Commands::Ask { message, search } => {
            let chat = server::build_service(&cfg)?;
            match chat.handle(ChatRequest::new(message, search)).await {
                Ok(resp) => println!("{}", serde_json::to_string_pretty(&resp)?),
                Err(ChatError::Validation(msg)) => anyhow::bail!(msg),
                Err(ChatError::Internal(e)) => return Err(e),
            }
        }
        Commands::Snippets => {
            let catalog = catalog_from_config(&cfg.catalog)?;
            list_snippets(catalog.as_ref())?;
        }
    }

    Ok(())
}

fn list_snippets(catalog: &dyn SnippetSource) -> anyhow::Result<()> {
    let records = catalog.list()?;
    println!("{} snippets:", records.len());
    for r in &records {
        let status = match validate_record(r) {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("INVALID: {}", e),
        };
        println!(
            "  {:<20} {:>3} lines  [{}]  {}",
            r.title,
            r.code.lines().count(),
            r.keywords.join(", "),
            status
        );
    }
    Ok(())
}
