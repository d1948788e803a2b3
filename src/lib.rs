//! # Campus Assist
//!
//! A document-grounded administrative assistant for a vocational school.
//! Questions are answered by a hosted language model that sees a small,
//! deterministic selection of the school's own documents; when the model
//! asks to hand over a form, the request is resolved back to a real file or
//! a letterhead placeholder.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────┐   ┌──────────┐
//! │ knowledge  │──▶│ rules/scorer │──▶│  context  │──▶│   LLM    │
//! │ base JSON  │   │  (core)      │   │  (core)   │   │          │
//! └────────────┘   └──────────────┘   └───────────┘   └────┬─────┘
//!                                                          │ JSON_START…JSON_END
//!                  ┌──────────────┐   ┌───────────┐        ▼
//!                  │ document root│◀──│ resolver  │◀── file request
//!                  └──────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! assist init                      # create history schema
//! assist ingest                    # extract docs into the knowledge base
//! assist search "staj formu"       # inspect retrieval
//! assist serve                     # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy and HTTP mapping |
//! | [`corpus`] | JSON knowledge-base store |
//! | [`storage`] | Document-root file store |
//! | [`extract`] | PDF / DOCX / XLSX text extraction |
//! | [`ingest`] | Knowledge-base ingestion |
//! | [`docx`] | Letterhead placeholder rendering |
//! | [`deliver`] | File delivery I/O |
//! | [`llm`] | Chat-model client |
//! | [`prompt`] | System prompt construction |
//! | [`moderation`] | Blocked-term filter |
//! | [`chat`] | Chat turn orchestration |
//! | [`history`] | Conversation logging |
//! | [`server`] | HTTP server |

pub mod assistant;
pub mod chat;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod db;
pub mod deliver;
pub mod docx;
pub mod error;
pub mod extract;
pub mod history;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod moderation;
pub mod prompt;
pub mod server;
pub mod storage;
