//! # Campus Assist CLI (`assist`)
//!
//! ## Usage
//!
//! ```bash
//! assist --config ./config/assist.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `assist init` | Create data directories and the history schema |
//! | `assist serve` | Start the HTTP server |
//! | `assist ingest` | Extract documents into the knowledge base |
//! | `assist append <filename> <file>` | Upsert one knowledge-base entry |
//! | `assist search "<query>"` | Show the documents a query would ground on |
//! | `assist resolve <filename>` | Show which stored file a name resolves to |
//! | `assist fetch <filename>` | Deliver a file (original or placeholder) to disk |
//! | `assist ask "<message>"` | One chat turn against the configured model |

use campus_assist::{commands, config, ingest, migrate, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Campus Assist: a document-grounded administrative assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/assist.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "assist",
    about = "Campus Assist: a document-grounded administrative assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/assist.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the knowledge-base and document directories and, when history
    /// is enabled, the conversation schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Extract text from every document under `[ingest].root` and upsert it
    /// into the knowledge base.
    Ingest {
        /// List the files that would be ingested without extracting them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Insert or replace one knowledge-base entry.
    Append {
        /// Filename the entry is stored under.
        filename: String,
        /// Text file holding the entry's content.
        content_file: PathBuf,
    },

    /// Show which documents a query selects.
    Search {
        query: String,
        /// Also print the assembled prompt context.
        #[arg(long)]
        context: bool,
    },

    /// Resolve a requested filename against the document root.
    Resolve { filename: String },

    /// Deliver a file: the stored original, or a placeholder when allowed.
    Fetch {
        filename: String,
        /// Template field for placeholders, as `key=value`. Repeatable.
        #[arg(long = "data")]
        data: Vec<String>,
        /// Output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Send one message to the assistant and print the reply.
    Ask { message: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()
        .ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            if let Some(parent) = cfg.corpus.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::create_dir_all(&cfg.storage.root)?;
            if cfg.history.enabled {
                migrate::run_migrations(&cfg).await?;
                println!("History schema ready.");
            }
            println!("Initialized.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Append {
            filename,
            content_file,
        } => {
            ingest::run_append(&cfg, &filename, &content_file).await?;
        }
        Commands::Search { query, context } => {
            commands::run_search(&cfg, &query, context).await?;
        }
        Commands::Resolve { filename } => {
            commands::run_resolve(&cfg, &filename).await?;
        }
        Commands::Fetch {
            filename,
            data,
            out,
        } => {
            commands::run_fetch(&cfg, &filename, &data, &out).await?;
        }
        Commands::Ask { message } => {
            commands::run_ask(&cfg, &message).await?;
        }
    }

    Ok(())
}
