//! Error taxonomy for the assistant service.
//!
//! Plumbing (config, storage, ingestion, LLM transport) returns
//! `anyhow::Result`; request handlers convert into [`AssistError`] so every
//! failure maps onto one HTTP status and a textual message.
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `NotFound` | 404 | `not_found` |
//! | `UnsupportedRequest` | 404 | `unsupported_request` |
//! | `Validation` | 400 | `bad_request` |
//! | `Blocked` | 422 | `blocked` |
//! | `UpstreamFailure` | 503 | `upstream_failure` |
//! | anything else | 500 | `internal` |
//!
//! `PersistenceFailure` exists so history writes can be classified and
//! logged; it is swallowed before it could reach a response.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    UnsupportedRequest(String),
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Message blocked: {0}")]
    Blocked(String),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document synthesis failed: {0}")]
    Synthesis(String),
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User-facing message for an unresolvable PDF request.
pub const PDF_NOT_FOUND_MESSAGE: &str = "PDF belgesi bulunamadı. Lütfen yöneticiye bildirin.";

/// User-facing message when the language model cannot be reached.
pub const UPSTREAM_MESSAGE: &str =
    "Yapay zeka servisine şu anda ulaşılamıyor. Lütfen biraz sonra tekrar deneyin.";

impl AssistError {
    pub fn code(&self) -> &'static str {
        match self {
            AssistError::NotFound(_) => "not_found",
            AssistError::UnsupportedRequest(_) => "unsupported_request",
            AssistError::Validation(_) => "bad_request",
            AssistError::Blocked(_) => "blocked",
            AssistError::UpstreamFailure(_) => "upstream_failure",
            _ => "internal",
        }
    }

    /// The message shown to callers. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AssistError::NotFound(msg)
            | AssistError::UnsupportedRequest(msg)
            | AssistError::Validation(msg)
            | AssistError::Blocked(msg) => msg.clone(),
            AssistError::UpstreamFailure(_) => UPSTREAM_MESSAGE.to_string(),
            _ => "Beklenmeyen bir hata oluştu.".to_string(),
        }
    }
}
