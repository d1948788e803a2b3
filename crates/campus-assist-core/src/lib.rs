//! # Campus Assist Core
//!
//! The retrieval-and-grounding pipeline behind Campus Assist, with no
//! tokio, filesystem, or network dependencies:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Documents and scored documents |
//! | [`score`] | Lexical relevance scorer |
//! | [`overrides`] | Rule table that forces compliance documents into context |
//! | [`retrieve`] | Query → selected documents (rules first, then scorer) |
//! | [`context`] | Prompt-context assembly |
//! | [`action`] | Structured file-request block embedded in model replies |
//! | [`resolve`] | Requested filename → stored filename cascade |
//! | [`delivery`] | Serve / refuse / synthesize planning, MIME and headers |
//! | [`store`] | Corpus and file storage traits |
//!
//! The host application owns I/O: it implements [`store::CorpusStore`] and
//! [`store::FileStore`], calls the LLM, and renders synthesized documents.

pub mod action;
pub mod context;
pub mod delivery;
pub mod models;
pub mod overrides;
pub mod resolve;
pub mod retrieve;
pub mod score;
pub mod store;
