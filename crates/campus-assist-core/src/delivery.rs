//! Delivery planning for file requests.
//!
//! Given a [`FileRequest`] and the storage listing, [`plan`] decides one of
//! three outcomes:
//!
//! - **Serve** the resolved original, bytes untouched.
//! - **Refuse** a missing PDF. PDFs are official forms and are never
//!   fabricated.
//! - **Synthesize** a letterhead placeholder for any other missing name.
//!
//! This module stays pure; reading bytes and rendering the placeholder is
//! the host's job. It also owns the transport details shared by every host:
//! MIME inference and the `Content-Disposition` value.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use tracing::debug;

use crate::action::FileRequest;
use crate::resolve::{self, MatchStage, Resolution};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_BINARY: &str = "application/octet-stream";

/// Suffix added to the stem of a synthesized document.
pub const SYNTHESIZED_SUFFIX: &str = "_Gen";

/// MIME type for a filename, by extension.
pub fn mime_for(filename: &str) -> &'static str {
    match resolve::extension(filename).as_deref() {
        Some("pdf") => MIME_PDF,
        Some("docx") => MIME_DOCX,
        Some("xlsx") => MIME_XLSX,
        _ => MIME_BINARY,
    }
}

/// Bytes escaped by browsers' `encodeURIComponent`: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a filename the way `encodeURIComponent` does.
pub fn encode_filename(name: &str) -> String {
    utf8_percent_encode(name, URI_COMPONENT).to_string()
}

/// `Content-Disposition` value carrying both the plain and RFC 5987 hints.
pub fn content_disposition(name: &str) -> String {
    let encoded = encode_filename(name);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        encoded, encoded
    )
}

/// Whether a requested name denotes a PDF.
pub fn is_pdf(name: &str) -> bool {
    resolve::extension(name).as_deref() == Some("pdf")
}

/// A placeholder document to be rendered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticDocument {
    /// Requested name, extension stripped, upper-cased.
    pub title: String,
    /// Name the rendered file is delivered under.
    pub filename: String,
    /// Key/value rows in request order, `action` excluded.
    pub rows: Vec<(String, String)>,
}

impl SyntheticDocument {
    pub fn for_request(request: &FileRequest) -> Self {
        let stem = resolve::strip_extension(request.filename.trim());
        Self {
            title: stem.to_uppercase(),
            filename: format!("{}{}.docx", stem, SYNTHESIZED_SUFFIX),
            rows: request.template_rows(),
        }
    }
}

/// How a file request will be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPlan {
    Serve {
        name: String,
        stage: MatchStage,
        mime: &'static str,
    },
    Refuse {
        requested: String,
    },
    Synthesize(SyntheticDocument),
}

/// Short label for a plan, as reported to chat clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    Original,
    Synthesized,
    Unavailable,
}

impl DeliveryPlan {
    pub fn kind(&self) -> DeliveryKind {
        match self {
            DeliveryPlan::Serve { .. } => DeliveryKind::Original,
            DeliveryPlan::Synthesize(_) => DeliveryKind::Synthesized,
            DeliveryPlan::Refuse { .. } => DeliveryKind::Unavailable,
        }
    }

    /// The filename the caller will receive, if any.
    pub fn delivered_name(&self) -> Option<&str> {
        match self {
            DeliveryPlan::Serve { name, .. } => Some(name),
            DeliveryPlan::Synthesize(doc) => Some(&doc.filename),
            DeliveryPlan::Refuse { .. } => None,
        }
    }
}

/// Decide how to satisfy `request` given the current storage listing.
pub fn plan(request: &FileRequest, listing: &[String]) -> DeliveryPlan {
    let requested = request.filename.trim();

    if let Some(Resolution { name, stage }) = resolve::resolve(requested, listing) {
        debug!(requested, resolved = %name, %stage, "Resolved file request");
        let mime = mime_for(&name);
        return DeliveryPlan::Serve { name, stage, mime };
    }

    if is_pdf(requested) {
        debug!(requested, "Unresolved PDF request refused");
        return DeliveryPlan::Refuse {
            requested: requested.to_string(),
        };
    }

    debug!(requested, "Unresolved request, synthesizing placeholder");
    DeliveryPlan::Synthesize(SyntheticDocument::for_request(request))
}
