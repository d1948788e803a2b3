//! HTTP contract tests driven through the router without a socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use campus_assist::assistant::Assistant;
use campus_assist::error::PDF_NOT_FOUND_MESSAGE;
use campus_assist::history::ConversationLog;
use campus_assist::llm::{ChatModel, ChatRequest};
use campus_assist::moderation::Moderator;
use campus_assist::server::{build_router, AppState};
use campus_assist::{db, migrate};
use campus_assist_core::delivery::MIME_DOCX;
use campus_assist_core::models::Document;
use campus_assist_core::store::memory::{InMemoryCorpus, InMemoryFiles};
use serde_json::{json, Value};
use tower::ServiceExt;

const VET_FORM: &str = "Veterinerlik Bölümü Staj Başvuru ve Kabul Formu.pdf";

/// Replies with a fixed script and remembers the last request.
struct ScriptedModel {
    reply: Option<String>,
    last: Mutex<Option<ChatRequest>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        *self.last.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => bail!("connection refused"),
        }
    }
}

fn assistant(model: Arc<ScriptedModel>) -> Assistant {
    assistant_with_history(model, None)
}

fn assistant_with_history(model: Arc<ScriptedModel>, history: Option<ConversationLog>) -> Assistant {
    let corpus = InMemoryCorpus::new(vec![
        Document::new("Staj Yönergesi.docx", "Staj süresi 30 iş günüdür."),
        Document::new("Akademik Takvim.xlsx", "Sınav tarih listesi."),
    ]);
    let files = InMemoryFiles::new();
    files.insert(VET_FORM, b"%PDF-1.4 vet".to_vec());
    files.insert("FR-004 Ders Muafiyet Formu.docx", b"PK docx".to_vec());

    Assistant {
        corpus: Arc::new(corpus),
        files: Arc::new(files),
        model,
        moderator: Moderator::new(["aptal"]),
        history,
        timezone: chrono_tz::Europe::Istanbul,
        letterhead: vec!["T.C.".to_string(), "ÖRNEK ÜNİVERSİTESİ".to_string()],
    }
}

fn router(model: Arc<ScriptedModel>) -> Router {
    build_router(AppState::new(assistant(model)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn chat_strips_block_and_offers_resolved_file() {
    let model = Arc::new(ScriptedModel::replying(
        "Formunuz hazır.\nJSON_START\n{\"action\": \"generate_file\", \"filename\": \"veterinerlik bölümü staj başvuru ve kabul formu.pdf\", \"data\": {}}\nJSON_END",
    ));
    let app = router(model.clone());

    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({
                "message": "Staj formu lazım",
                "history": [{"role": "model", "parts": [{"text": "Merhaba"}]}]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"], "Formunuz hazır.");
    assert_eq!(body["file"]["resolved"], VET_FORM);
    assert_eq!(body["file"]["stage"], "normalized");
    assert_eq!(body["file"]["delivery"], "original");
    assert_eq!(
        body["documents"][0],
        "Bilgisayar Teknolojileri Bölümü Staj Başvuru ve Kabul Formu.pdf"
    );
    assert_eq!(body["documents"][5], "Staj Yönergesi.docx");
    assert!(body.get("conversation_id").is_none());

    let request = model.last.lock().unwrap().clone().unwrap();
    assert!(request.system.contains("--- BELGE BAŞLANGICI: Staj Yönergesi.docx ---"));
    // The leading assistant turn is dropped.
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].content, "Staj formu lazım");
}

#[tokio::test]
async fn chat_without_block_has_no_file() {
    let app = router(Arc::new(ScriptedModel::replying("Size nasıl yardımcı olabilirim?")));
    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Merhaba"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"], "Size nasıl yardımcı olabilirim?");
    assert!(body["file"].is_null());
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn chat_offers_unavailable_pdf() {
    let app = router(Arc::new(ScriptedModel::replying(
        "JSON_START{\"action\": \"generate_pdf\", \"filename\": \"Olmayan Form.pdf\"}JSON_END",
    )));
    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Olmayan form"})))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["file"]["delivery"], "unavailable");
    assert!(body["file"]["resolved"].is_null());
}

#[tokio::test]
async fn chat_blocked_message_is_422() {
    let model = Arc::new(ScriptedModel::replying("yanıt"));
    let app = router(model.clone());
    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Sen APTAL mısın"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "blocked");
    assert!(model.last.lock().unwrap().is_none());
}

#[tokio::test]
async fn chat_empty_message_is_400() {
    let app = router(Arc::new(ScriptedModel::replying("yanıt")));
    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_model_failure_is_503_without_details() {
    let app = router(Arc::new(ScriptedModel::failing()));
    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Merhaba"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "upstream_failure");
    assert!(!body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn generate_file_serves_original_bytes() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json(
            "/api/generate-file",
            json!({"filename": "Veterinerlik Staj Kabul.pdf"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; "));
    assert!(disposition.contains("filename*=UTF-8''Veterinerlik%20B%C3%B6l%C3%BCm%C3%BC"));
    assert_eq!(body_bytes(response).await, b"%PDF-1.4 vet");
}

#[tokio::test]
async fn generate_file_missing_pdf_is_404_json() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json(
            "/api/generate-file",
            json!({"filename": "Mezuniyet Belgesi.pdf", "data": {"Ad": "Ali"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unsupported_request");
    assert_eq!(body["error"]["message"], PDF_NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn generate_file_synthesizes_missing_docx() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json(
            "/api/generate-file",
            json!({"filename": "Kayıt Dondurma Dilekçesi.docx", "data": {"Ad Soyad": "Ayşe Yılmaz"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], MIME_DOCX);

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.ends_with("_Gen.docx"));
    assert!(body_bytes(response).await.starts_with(b"PK"));
}

#[tokio::test]
async fn generate_file_without_filename_is_400() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json("/api/generate-file", json!({"filename": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_returns_schedule_injection() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json(
            "/api/search",
            json!({"query": "haftalık ders programı", "context": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let documents = body["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 8);
    assert!(documents[..7].iter().all(|d| d["score"] == 100));
    assert_eq!(documents[7]["filename"], "Staj Yönergesi.docx");
    assert!(body["context"]
        .as_str()
        .unwrap()
        .contains("BU BELGE SİSTEMDE MEVCUTTUR"));
}

#[tokio::test]
async fn search_empty_query_is_400() {
    let app = router(Arc::new(ScriptedModel::replying("")));
    let response = app
        .oneshot(post_json("/api/search", json!({"query": " "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "bad_request");
}

async fn history_pool(dir: &tempfile::TempDir) -> sqlx::SqlitePool {
    let pool = db::connect_path(&dir.path().join("history.sqlite")).await.unwrap();
    migrate::create_schema(&pool).await.unwrap();
    pool
}

/// Poll until the detached history write for `id` has landed.
async fn wait_for_rows(log: &ConversationLog, id: &str, expected: usize) -> Vec<(String, String)> {
    for _ in 0..100 {
        let rows = log.messages(id).await.unwrap();
        if rows.len() >= expected {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("history rows for {} never appeared", id);
}

#[tokio::test]
async fn chat_turn_is_written_to_history() {
    let dir = tempfile::tempdir().unwrap();
    let log = ConversationLog::new(history_pool(&dir).await);
    let model = Arc::new(ScriptedModel::replying(
        "Form ektedir.\nJSON_START{\"action\": \"generate_file\", \"filename\": \"Yok.pdf\"}JSON_END",
    ));
    let app = build_router(AppState::new(assistant_with_history(model, Some(log.clone()))));

    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Staj formu lazım"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let id = body["conversation_id"].as_str().unwrap().to_string();

    let rows = wait_for_rows(&log, &id, 2).await;
    assert_eq!(
        rows,
        vec![
            ("user".to_string(), "Staj formu lazım".to_string()),
            // The visible reply is stored, not the raw block.
            ("assistant".to_string(), "Form ektedir.".to_string()),
        ]
    );
}

#[tokio::test]
async fn chat_keeps_caller_conversation_id() {
    let dir = tempfile::tempdir().unwrap();
    let log = ConversationLog::new(history_pool(&dir).await);
    let model = Arc::new(ScriptedModel::replying("Tamam."));
    let app = build_router(AppState::new(assistant_with_history(model, Some(log.clone()))));

    let response = app
        .oneshot(post_json(
            "/api/chat",
            json!({"message": "Merhaba", "conversation_id": "sohbet-7"}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["conversation_id"], "sohbet-7");
    assert_eq!(wait_for_rows(&log, "sohbet-7", 2).await.len(), 2);
}

#[tokio::test]
async fn history_failure_does_not_change_reply() {
    let dir = tempfile::tempdir().unwrap();
    let pool = history_pool(&dir).await;
    let log = ConversationLog::new(pool.clone());
    pool.close().await;

    let model = Arc::new(ScriptedModel::replying("Size nasıl yardımcı olabilirim?"));
    let app = build_router(AppState::new(assistant_with_history(model, Some(log))));

    let response = app
        .oneshot(post_json("/api/chat", json!({"message": "Merhaba"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["reply"], "Size nasıl yardımcı olabilirim?");
    assert!(body["file"].is_null());
    assert!(body["conversation_id"].is_string());
    assert!(body.get("error").is_none());
}
