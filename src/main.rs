//! # Tubesage CLI (`tsg`)
//!
//! The `tsg` binary is the primary interface for Tubesage. It provides
//! commands for database initialization, transcript ingestion, quick
//! retrieval-augmented chat, deep research, and library statistics.
//!
//! ## Usage
//!
//! ```bash
//! tsg --config ./config/tubesage.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tsg init` | Create the SQLite database and run schema migrations |
//! | `tsg fetch <topic>` | Search videos and store their transcripts |
//! | `tsg chat <topic> <question>` | Answer a question from stored transcripts |
//! | `tsg research <topic> <question>` | Run the multi-stage research pipeline |
//! | `tsg stats` | Show library statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! tsg init --config ./config/tubesage.toml
//!
//! # Ingest transcripts for a topic
//! tsg fetch "rust async"
//!
//! # Ingest with a search query different from the stored topic label
//! tsg fetch "rust async" --query "rust tokio async runtime tutorial"
//!
//! # Quick answer from stored transcripts
//! tsg chat "rust async" "what problem does pinning solve?"
//!
//! # Deep research with an article deliverable, batching large transcripts
//! tsg research "rust async" "how mature is the ecosystem?" \
//!     --output article --token-optimized
//!
//! # Deepen specific coverage gaps with focused follow-up searches
//! tsg research "rust async" "how mature is the ecosystem?" \
//!     --deepen "executor benchmarks" --deepen "embedded targets"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tubesage::completion::OpenAiCompletion;
use tubesage::models::OutputType;
use tubesage::research::{
    GapSelector, Researcher, ResearchRequest, SelectAll, SelectByLabel, SelectNone,
};
use tubesage::source::YouTubeSource;
use tubesage::store::sqlite::SqliteStore;
use tubesage::{chat, config, db, ingest, migrate, stats};

/// Tubesage CLI — a video-transcript research assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tubesage.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tsg",
    about = "Tubesage — fetch video transcripts, chat against them, and run deep research",
    version,
    long_about = "Tubesage fetches YouTube transcripts by topic into SQLite, answers questions \
    against them with TF-IDF retrieval, and runs a multi-stage research pipeline that analyzes \
    every source, identifies coverage gaps, and synthesizes a deliverable."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tubesage.toml`. Database, completion, video
    /// search, retrieval, and research settings are read from this file.
    #[arg(long, global = true, default_value = "./config/tubesage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the transcripts table.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Search videos for a topic and store their transcripts.
    ///
    /// Already-stored videos are skipped; videos without captions are
    /// recorded so they are never refetched.
    Fetch {
        /// Topic label the transcripts are stored under.
        topic: String,

        /// Search query. Defaults to the topic itself.
        #[arg(long)]
        query: Option<String>,

        /// Maximum videos to consider (overrides config).
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Answer a question from stored transcripts.
    ///
    /// Picks the most relevant transcript excerpts by TF-IDF cosine
    /// similarity and answers with a single completion call.
    Chat {
        /// Topic to search within (substring match against stored topics).
        topic: String,

        /// The question to answer.
        question: String,
    },

    /// Run the deep-research pipeline over a topic.
    ///
    /// Analyzes every stored transcript against the question, identifies
    /// coverage gaps, optionally deepens them with focused searches, and
    /// synthesizes a deliverable.
    Research {
        /// Topic to research (substring match against stored topics).
        topic: String,

        /// The research question.
        question: String,

        /// Deliverable shape: `script`, `summary`, `analysis`, or `article`.
        #[arg(long, default_value = "summary")]
        output: String,

        /// Chunk large transcripts and synthesize in batches. Slower but
        /// keeps every completion call small.
        #[arg(long)]
        token_optimized: bool,

        /// Deepen the gap with this label via a focused follow-up search.
        /// Repeatable. Without any, gaps are reported but not deepened.
        #[arg(long = "deepen")]
        deepen: Vec<String>,

        /// Deepen every identified gap.
        #[arg(long, conflicts_with = "deepen")]
        deepen_all: bool,
    },

    /// Show library statistics.
    ///
    /// Transcript counts, caption coverage, and the per-topic breakdown.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let pool = db::connect(&cfg.db).await?;
    let store = SqliteStore::new(pool);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(store.pool()).await?;
            println!("Database initialized successfully.");
        }
        Commands::Fetch {
            topic,
            query,
            max_results,
        } => {
            migrate::run_migrations(store.pool()).await?;
            let source = YouTubeSource::new(&cfg.videos)?;
            let query = query.unwrap_or_else(|| topic.clone());
            let max = max_results.unwrap_or(cfg.videos.max_results);
            ingest::run_fetch(&store, &source, &topic, &query, max).await?;
        }
        Commands::Chat { topic, question } => {
            let completion = OpenAiCompletion::new(&cfg.completion)?;
            chat::run_chat(&store, &completion, &topic, &question, &cfg.retrieval).await?;
        }
        Commands::Research {
            topic,
            question,
            output,
            token_optimized,
            deepen,
            deepen_all,
        } => {
            let source = YouTubeSource::new(&cfg.videos)?;
            let completion = OpenAiCompletion::new(&cfg.completion)?;

            let selector: Box<dyn GapSelector> = if deepen_all {
                Box::new(SelectAll)
            } else if deepen.is_empty() {
                Box::new(SelectNone)
            } else {
                Box::new(SelectByLabel(deepen))
            };

            let request = ResearchRequest {
                topic,
                query: question,
                output_type: OutputType::parse(&output),
                token_optimized,
            };

            let researcher =
                Researcher::new(&store, &source, &completion, &cfg.research, &cfg.videos);
            let report = researcher.conduct(&request, selector.as_ref()).await?;

            println!("{}", report.final_text);
            println!();
            if !report.gaps.is_empty() {
                println!("Coverage gaps identified:");
                for gap in &report.gaps {
                    println!("  - {}: {}", gap.label, gap.rationale);
                }
                println!();
            }
            println!(
                "{} of {} sources analyzed ({} deliverable)",
                report.analyzed,
                report.total,
                request.output_type.name()
            );
            println!("ok");
        }
        Commands::Stats => {
            stats::run_stats(&store, &cfg).await?;
        }
    }

    Ok(())
}
