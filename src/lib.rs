//! # Tubesage
//!
//! A video-transcript research assistant: fetch YouTube transcripts by
//! topic, chat against them with TF-IDF retrieval, and run multi-stage
//! deep research that analyzes every source, hunts coverage gaps, and
//! synthesizes a deliverable.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────┐
//! │ VideoSource  │──▶│   Ingest     │──▶│  SQLite   │
//! │ search+fetch │   │ skip stored  │   │transcripts│
//! └──────────────┘   └──────────────┘   └─────┬─────┘
//!                                             │
//!                       ┌─────────────────────┤
//!                       ▼                     ▼
//!                 ┌───────────┐        ┌────────────┐
//!                 │   Chat    │        │  Research  │
//!                 │ TF-IDF+LLM│        │ analyze →  │
//!                 └───────────┘        │ gaps →     │
//!                                      │ synthesize │
//!                                      └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tsg init                                    # create database
//! tsg fetch "rust async"                      # ingest transcripts
//! tsg chat "rust async" "what is pinning?"    # quick RAG answer
//! tsg research "rust async" "how mature is the ecosystem?" --output article
//! tsg stats                                   # library overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`source`] | Video search and transcript fetching |
//! | [`store`] | Transcript storage (SQLite, in-memory) |
//! | [`ingest`] | Topic ingestion pipeline |
//! | [`retrieve`] | TF-IDF lexical retrieval |
//! | [`chat`] | Quick retrieval-augmented answers |
//! | [`chunk`] | Sentence-aligned transcript chunking |
//! | [`analyze`] | Per-document analysis |
//! | [`gaps`] | Coverage-gap identification |
//! | [`synthesize`] | Deliverable synthesis |
//! | [`research`] | Deep-research orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyze;
pub mod chat;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod db;
pub mod gaps;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod research;
pub mod retrieve;
pub mod source;
pub mod stats;
pub mod store;
pub mod synthesize;
