//! Conversation history written by one-shot turns.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use campus_assist::assistant::Assistant;
use campus_assist::chat::ChatInput;
use campus_assist::history::ConversationLog;
use campus_assist::llm::{ChatModel, ChatRequest};
use campus_assist::moderation::Moderator;
use campus_assist::{db, migrate};
use campus_assist_core::store::memory::{InMemoryCorpus, InMemoryFiles};

struct FixedReply;

#[async_trait]
impl ChatModel for FixedReply {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        Ok("Buyurun.".to_string())
    }
}

fn assistant(log: ConversationLog) -> Assistant {
    Assistant {
        corpus: Arc::new(InMemoryCorpus::default()),
        files: Arc::new(InMemoryFiles::new()),
        model: Arc::new(FixedReply),
        moderator: Moderator::default(),
        history: Some(log),
        timezone: chrono_tz::Europe::Istanbul,
        letterhead: vec!["T.C.".to_string()],
    }
}

async fn open_log(path: &Path) -> ConversationLog {
    let pool = db::connect_path(path).await.unwrap();
    migrate::create_schema(&pool).await.unwrap();
    ConversationLog::new(pool)
}

fn read_back(path: &Path, conversation_id: &str) -> Vec<(String, String)> {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async { open_log(path).await.messages(conversation_id).await.unwrap() })
}

#[test]
fn one_shot_turn_survives_runtime_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");

    // Same shape as `assist ask`: the runtime is dropped right after the turn.
    let outcome = {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let assistant = assistant(open_log(&path).await);
            assistant
                .chat_to_completion(ChatInput::new("  Merhaba  "))
                .await
                .unwrap()
        })
    };

    let id = outcome.conversation_id.expect("history assigns an id");
    assert_eq!(
        read_back(&path, &id),
        vec![
            ("user".to_string(), "Merhaba".to_string()),
            ("assistant".to_string(), "Buyurun.".to_string()),
        ]
    );
}

#[test]
fn repeated_one_shot_turns_share_a_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.sqlite");

    for message in ["Birinci", "İkinci"] {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mut input = ChatInput::new(message);
            input.conversation_id = Some("c-1".to_string());
            assistant(open_log(&path).await)
                .chat_to_completion(input)
                .await
                .unwrap();
        });
    }

    let rows = read_back(&path, "c-1");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2], ("user".to_string(), "İkinci".to_string()));
}

#[tokio::test]
async fn failed_write_leaves_one_shot_reply_intact() {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::connect_path(&dir.path().join("history.sqlite")).await.unwrap();
    migrate::create_schema(&pool).await.unwrap();
    let log = ConversationLog::new(pool.clone());
    pool.close().await;

    let outcome = assistant(log)
        .chat_to_completion(ChatInput::new("Merhaba"))
        .await
        .unwrap();
    assert_eq!(outcome.reply, "Buyurun.");
    assert!(outcome.conversation_id.is_some());
}
