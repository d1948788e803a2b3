//! File delivery against the document root.
//!
//! Wraps the pure [`plan`] decision with the I/O it implies: listing the
//! root, reading the resolved original, or rendering the placeholder.

use campus_assist_core::action::FileRequest;
use campus_assist_core::delivery::{self, DeliveryKind, DeliveryPlan, MIME_DOCX};
use campus_assist_core::resolve::MatchStage;
use campus_assist_core::store::FileStore;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::docx;
use crate::error::{AssistError, PDF_NOT_FOUND_MESSAGE};

/// Bytes ready to be sent to the caller.
#[derive(Debug, Clone)]
pub struct DeliveredFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub kind: DeliveryKind,
    /// Set when an original was served.
    pub stage: Option<MatchStage>,
}

impl DeliveredFile {
    pub fn content_disposition(&self) -> String {
        delivery::content_disposition(&self.filename)
    }

    /// Write the file into `dir` under its bare name and return the path.
    /// Directory parts in the name are dropped so the write stays in `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, AssistError> {
        let name = Path::new(&self.filename)
            .file_name()
            .ok_or_else(|| AssistError::Validation(format!("invalid filename: {}", self.filename)))?;
        std::fs::create_dir_all(dir)?;
        let target = dir.join(name);
        std::fs::write(&target, &self.bytes)?;
        Ok(target)
    }
}

/// Current storage listing. An unreadable root counts as empty, so the
/// request degrades to not-found or synthesis instead of failing.
pub async fn listing<F: FileStore + ?Sized>(files: &F) -> Vec<String> {
    match files.list().await {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "Document root listing failed, treating as empty");
            Vec::new()
        }
    }
}

/// Decide how `request` would be delivered, without reading any bytes.
pub async fn plan_request<F: FileStore + ?Sized>(files: &F, request: &FileRequest) -> DeliveryPlan {
    let names = listing(files).await;
    delivery::plan(request, &names)
}

/// Resolve and deliver `request`.
pub async fn deliver<F: FileStore + ?Sized>(
    files: &F,
    request: &FileRequest,
    letterhead: &[String],
    today: NaiveDate,
) -> Result<DeliveredFile, AssistError> {
    if request.filename.trim().is_empty() {
        return Err(AssistError::Validation("filename must not be empty".to_string()));
    }

    match plan_request(files, request).await {
        DeliveryPlan::Serve { name, stage, mime } => {
            let bytes = files.read(&name).await.map_err(|e| {
                warn!(file = %name, error = %e, "Resolved file could not be read");
                AssistError::NotFound(format!("Belge okunamadı: {}", name))
            })?;
            info!(requested = %request.filename, file = %name, %stage, bytes = bytes.len(), "Serving original");
            Ok(DeliveredFile {
                filename: name,
                mime,
                bytes,
                kind: DeliveryKind::Original,
                stage: Some(stage),
            })
        }
        DeliveryPlan::Refuse { requested } => {
            info!(requested = %requested, "Refusing to synthesize missing PDF");
            Err(AssistError::UnsupportedRequest(
                PDF_NOT_FOUND_MESSAGE.to_string(),
            ))
        }
        DeliveryPlan::Synthesize(doc) => {
            let bytes = docx::render(&doc, letterhead, today)
                .map_err(|e| AssistError::Synthesis(e.to_string()))?;
            info!(requested = %request.filename, file = %doc.filename, rows = doc.rows.len(), "Synthesized placeholder");
            Ok(DeliveredFile {
                filename: doc.filename,
                mime: MIME_DOCX,
                bytes,
                kind: DeliveryKind::Synthesized,
                stage: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_assist_core::delivery::MIME_PDF;
    use campus_assist_core::store::memory::InMemoryFiles;

    fn letterhead() -> Vec<String> {
        vec!["T.C.".to_string()]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    const SCHEDULE: &str =
        "FR-011 Haftalık Ders Programı Formu - Bilgisayar Teknolojileri Bölümü.pdf";

    #[tokio::test]
    async fn serves_original_bytes_verbatim() {
        let files = InMemoryFiles::new();
        files.insert(SCHEDULE.to_lowercase(), b"%PDF-1.4 original".to_vec());

        let delivered = deliver(&files, &FileRequest::new(SCHEDULE), &letterhead(), today())
            .await
            .unwrap();
        assert_eq!(delivered.bytes, b"%PDF-1.4 original");
        assert_eq!(delivered.mime, MIME_PDF);
        assert_eq!(delivered.kind, DeliveryKind::Original);
        assert_eq!(delivered.stage, Some(MatchStage::Normalized));
    }

    #[tokio::test]
    async fn missing_pdf_is_unsupported() {
        let files = InMemoryFiles::new();
        let err = deliver(&files, &FileRequest::new("Yok.pdf"), &letterhead(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::UnsupportedRequest(_)));
        assert_eq!(err.public_message(), PDF_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn missing_docx_is_synthesized() {
        let files = InMemoryFiles::new();
        let request = FileRequest::new("İzin Dilekçesi.docx").with_field("Ad Soyad", "Test Kullanıcı");
        let delivered = deliver(&files, &request, &letterhead(), today()).await.unwrap();
        assert_eq!(delivered.kind, DeliveryKind::Synthesized);
        assert_eq!(delivered.filename, "İzin Dilekçesi_Gen.docx");
        assert_eq!(delivered.mime, MIME_DOCX);
        assert!(delivered.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn empty_filename_is_rejected() {
        let files = InMemoryFiles::new();
        let err = deliver(&files, &FileRequest::new("  "), &letterhead(), today())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Validation(_)));
    }

    fn delivered(filename: &str) -> DeliveredFile {
        DeliveredFile {
            filename: filename.to_string(),
            mime: MIME_DOCX,
            bytes: b"PK".to_vec(),
            kind: DeliveryKind::Synthesized,
            stage: None,
        }
    }

    #[test]
    fn save_keeps_writes_inside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let path = delivered("../../Dilekçe_Gen.docx").save_to(&out).unwrap();
        assert_eq!(path, out.join("Dilekçe_Gen.docx"));
        assert_eq!(std::fs::read(path).unwrap(), b"PK");
    }

    #[test]
    fn save_into_a_file_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("dosya");
        std::fs::write(&blocker, b"x").unwrap();

        let err = delivered("a.docx").save_to(&blocker).unwrap_err();
        assert!(matches!(err, AssistError::Io(_)));
        assert_eq!(err.code(), "internal");
        assert!(!err.public_message().contains("dosya"));
    }
}
