//! # Ticket Triage CLI (`triage`)
//!
//! The `triage` binary is the primary interface for Ticket Triage. It
//! provides commands for collection initialization, corpus ingestion, search,
//! question answering, report generation, and starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! triage --config ./config/triage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `triage init` | Create the vector collection |
//! | `triage ingest` | Load, embed, and index the ticket corpus |
//! | `triage search "<query>"` | Show the nearest past tickets for a query |
//! | `triage ask "<query>"` | Answer a single question with the agent |
//! | `triage chat` | Interactive chat session |
//! | `triage report "<query>"` | Render a markdown incident report |
//! | `triage serve` | Start the HTTP server |

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use ticket_triage::app::AppContext;
use ticket_triage::{chat, config, corpus, report, server};

/// Ticket Triage CLI — a retrieval-augmented assistant for support-ticket
/// resolution.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/triage.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "triage",
    about = "Ticket Triage — a retrieval-augmented assistant for support-ticket resolution",
    version,
    long_about = "Ticket Triage ingests a corpus of past resolved tickets, embeds them into a \
    vector store, and answers new error reports by retrieving similar past fixes — through an \
    agent-driven chat loop, a one-shot question, or a markdown incident report."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/triage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the vector collection.
    ///
    /// Creates the store collection with the configured embedding
    /// dimensionality. Idempotent — running it against an existing
    /// collection with matching dimensions is a no-op; a dimension
    /// mismatch is an error.
    Init,

    /// Load, embed, and index the ticket corpus.
    ///
    /// Reads the corpus file, formats each ticket into a retrieval document,
    /// embeds them in batches, and writes them to the store. Re-running
    /// overwrites documents with the same ticket id.
    Ingest {
        /// Show record counts without embedding or writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the nearest past tickets for a query.
    Search {
        /// The query string.
        query: String,

        /// Number of results to return.
        #[arg(long)]
        k: Option<i64>,
    },

    /// Answer a single question with the agent.
    ///
    /// The agent may search the indexed corpus before answering.
    Ask {
        /// The question or error description.
        query: String,
    },

    /// Start an interactive chat session.
    Chat,

    /// Render a markdown incident report for a query.
    Report {
        /// The query string.
        query: String,

        /// Number of matches to include.
        #[arg(long)]
        k: Option<i64>,

        /// Write the report to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `/resolve`, `/report`, and `/health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let ctx = AppContext::init(cfg)?;
            ctx.pipeline.init_collection().await?;
            println!(
                "Collection '{}' ready.",
                ctx.config.store.collection
            );
        }
        Commands::Ingest { dry_run } => {
            if dry_run {
                // A dry run must not touch the filesystem, so no seeding.
                match corpus::load_corpus_if_present(&cfg.corpus.path)? {
                    Some(records) => println!(
                        "Would ingest {} ticket(s) from {}",
                        records.len(),
                        cfg.corpus.path.display()
                    ),
                    None => println!(
                        "Corpus file {} not found; ingest would seed a one-record placeholder.",
                        cfg.corpus.path.display()
                    ),
                }
                return Ok(());
            }

            let records = corpus::load_corpus(&cfg.corpus.path)?;
            let ctx = AppContext::init(cfg)?;
            ctx.pipeline.init_collection().await?;
            let outcome = ctx.pipeline.ingest(&records).await?;
            println!(
                "Ingested {} document(s) ({} skipped).",
                outcome.written, outcome.skipped
            );
        }
        Commands::Search { query, k } => {
            let ctx = AppContext::init(cfg)?;
            let k = k.unwrap_or(ctx.config.retrieval.k);
            let matches = ctx.pipeline.search(&query, k).await?;

            if matches.is_empty() {
                println!("No matching past tickets found.");
            }
            for (i, m) in matches.iter().enumerate() {
                let id = m.document_id.as_deref().unwrap_or("-");
                println!("{}. [{:.4}] {}", i + 1, m.score, id);
                for line in m.text.lines() {
                    println!("   {line}");
                }
                println!();
            }
        }
        Commands::Ask { query } => {
            let ctx = AppContext::init(cfg)?;
            chat::run_ask(&ctx, &query).await?;
        }
        Commands::Chat => {
            let ctx = AppContext::init(cfg)?;
            chat::run_chat(&ctx).await?;
        }
        Commands::Report { query, k, output } => {
            let ctx = AppContext::init(cfg)?;
            let k = k.unwrap_or(ctx.config.retrieval.k);
            let matches = ctx.pipeline.search(&query, k).await?;
            let markdown = report::render_report(&query, &matches, chrono::Utc::now());

            match output {
                Some(path) => {
                    std::fs::write(&path, &markdown)?;
                    println!("Report written to {}", path.display());
                }
                None => print!("{markdown}"),
            }
        }
        Commands::Serve => {
            let ctx = Arc::new(AppContext::init(cfg)?);
            server::run_server(ctx).await?;
        }
    }

    Ok(())
}
