//! Conversation logging.
//!
//! Turns are appended after the reply has been built, on a spawned task.
//! A failed write is logged as a [`AssistError::PersistenceFailure`] and
//! otherwise ignored; it never changes what the caller receives.

use anyhow::Result;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AssistError;
use crate::{db, migrate};

/// Title length taken from the first user message.
const TITLE_CHARS: usize = 60;

#[derive(Debug, Clone)]
pub struct ConversationLog {
    pool: SqlitePool,
}

/// One completed exchange.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub user_message: String,
    pub reply: String,
}

impl ConversationLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured log, creating the schema if needed. `None` when
    /// history is disabled.
    pub async fn open(config: &Config) -> Result<Option<Self>> {
        if !config.history.enabled {
            return Ok(None);
        }
        let pool = db::connect(config).await?;
        migrate::create_schema(&pool).await?;
        Ok(Some(Self::new(pool)))
    }

    pub async fn record(&self, turn: &TurnRecord) -> Result<(), AssistError> {
        self.write(turn)
            .await
            .map_err(|e| AssistError::PersistenceFailure(e.to_string()))
    }

    async fn write(&self, turn: &TurnRecord) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().timestamp_millis();
        let title: String = turn.user_message.chars().take(TITLE_CHARS).collect();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, title, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(&turn.conversation_id)
        .bind(&turn.user_id)
        .bind(&title)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (offset, (role, content)) in [("user", &turn.user_message), ("assistant", &turn.reply)]
            .into_iter()
            .enumerate()
        {
            sqlx::query(
                "INSERT INTO messages (id, conversation_id, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&turn.conversation_id)
            .bind(role)
            .bind(content)
            .bind(now + offset as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Record `turn` in the background. Dropping the handle detaches the
    /// write; awaiting it waits for the row to land.
    pub fn spawn_record(&self, turn: TurnRecord) -> JoinHandle<()> {
        let log = self.clone();
        tokio::spawn(async move {
            match log.record(&turn).await {
                Ok(()) => debug!(conversation = %turn.conversation_id, "Turn recorded"),
                Err(e) => warn!(conversation = %turn.conversation_id, error = %e, "History write failed"),
            }
        })
    }

    /// Messages of a conversation as `(role, content)`, oldest first.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM messages WHERE conversation_id = ? ORDER BY rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
