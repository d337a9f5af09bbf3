//! # Ticket Triage
//!
//! A retrieval-augmented assistant for support-ticket resolution.
//!
//! Ticket Triage ingests a corpus of past resolved tickets, embeds them into
//! a vector store, and answers new error reports by retrieving similar past
//! fixes — either through an agent-driven chat loop or a markdown incident
//! report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │   Corpus    │──▶│   Pipeline    │──▶│  Qdrant   │
//! │ JSON tickets│   │ Format+Embed │   │  vectors  │
//! └─────────────┘   └──────────────┘   └────┬──────┘
//!                                           │
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                 ┌──────────┐        ┌──────────┐
//!                 │  Agent   │        │  Report  │
//!                 │ CLI/HTTP │        │ markdown │
//!                 └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! triage init                     # create the vector collection
//! triage ingest                   # embed and index the ticket corpus
//! triage ask "division by zero in nightly ETL"
//! triage report "division by zero" --output incident.md
//! triage chat                     # interactive session
//! triage serve                    # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Ticket corpus loading and seeding |
//! | [`document`] | Ticket-to-document formatting |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store trait and backends |
//! | [`pipeline`] | Ingestion and retrieval orchestration |
//! | [`agent`] | Answering agent and chat client |
//! | [`report`] | Markdown incident report rendering |
//! | [`app`] | Application context wiring |
//! | [`server`] | HTTP API |
//! | [`chat`] | Interactive chat session |
//! | [`error`] | Library error type |

pub mod agent;
pub mod app;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod store;
