//! The assembled service: stores, model, moderation, and history behind one
//! handle shared by the CLI and the HTTP server.

use std::sync::Arc;

use anyhow::Result;
use campus_assist_core::action::FileRequest;
use campus_assist_core::context;
use campus_assist_core::models::ScoredDocument;
use campus_assist_core::retrieve;
use campus_assist_core::store::{CorpusStore, FileStore};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::config::Config;
use crate::corpus::JsonCorpus;
use crate::deliver::{self, DeliveredFile};
use crate::error::AssistError;
use crate::history::ConversationLog;
use crate::llm::{self, ChatModel};
use crate::moderation::Moderator;
use crate::storage::DirectoryStore;

#[derive(Clone)]
pub struct Assistant {
    pub corpus: Arc<dyn CorpusStore>,
    pub files: Arc<dyn FileStore>,
    pub model: Arc<dyn ChatModel>,
    pub moderator: Moderator,
    pub history: Option<ConversationLog>,
    pub timezone: Tz,
    pub letterhead: Vec<String>,
}

/// Retrieval result for inspection endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub documents: Vec<ScoredDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Assistant {
    /// Wire up the service from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            corpus: Arc::new(JsonCorpus::new(&config.corpus.path)),
            files: Arc::new(DirectoryStore::new(&config.storage.root)),
            model: llm::create_model(&config.llm)?,
            moderator: Moderator::new(&config.assistant.blocked_terms),
            history: ConversationLog::open(config).await?,
            timezone: config.assistant.tz(),
            letterhead: config.assistant.letterhead.clone(),
        })
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Select documents for `query`, optionally with the assembled context.
    pub async fn search(&self, query: &str, with_context: bool) -> Result<SearchOutcome, AssistError> {
        let documents = retrieve::retrieve(self.corpus.as_ref(), query).await?;
        let context = with_context.then(|| context::assemble(&documents));
        Ok(SearchOutcome { documents, context })
    }

    /// Resolve and deliver a file request.
    pub async fn fetch(&self, request: &FileRequest) -> Result<DeliveredFile, AssistError> {
        deliver::deliver(self.files.as_ref(), request, &self.letterhead, self.today()).await
    }
}
