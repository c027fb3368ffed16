//! Media gate
//!
//! The delivery pipeline is specialized to safely embed one format inline:
//! PDF. Everything else must go through a different path and is rejected
//! here with `UnsupportedMedia` before any storage backend is touched.

use crate::error::AppError;
use crate::models::DocumentRecord;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const PDF_EXTENSION: &str = ".pdf";

/// Media types that carry no real format information; for these the gate
/// falls back to extension inference.
const GENERIC_MEDIA_TYPES: &[&str] = &[
    "application/octet-stream",
    "binary/octet-stream",
    "application/force-download",
    "application/download",
];

fn is_generic(media_type: &str) -> bool {
    GENERIC_MEDIA_TYPES
        .iter()
        .any(|g| media_type.eq_ignore_ascii_case(g))
}

fn name_is_pdf(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(PDF_EXTENSION)
}

/// Whether the record is, by declared type or inferred from its names, a PDF.
///
/// A declared non-generic type decides on its own; extension inference over
/// the title, original filename, storage key, and local path applies only
/// when the type is absent or generic.
pub fn is_pdf(record: &DocumentRecord) -> bool {
    match record.media_type.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(media_type) if !is_generic(media_type) => {
            media_type.to_ascii_lowercase().contains("pdf")
        }
        _ => [
            Some(record.title.as_str()),
            record.original_name.as_deref(),
            record.storage_key.as_deref(),
            record.local_path.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(name_is_pdf),
    }
}

/// Resolved media type to serve with: the declared PDF type when present,
/// otherwise the canonical one (the gate guarantees the document is a PDF).
pub fn serve_media_type(record: &DocumentRecord) -> &str {
    match record.media_type.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(media_type) if media_type.to_ascii_lowercase().contains("pdf") => media_type,
        _ => PDF_MEDIA_TYPE,
    }
}

/// Gate a record, failing with `UnsupportedMedia` (415) when it is not a PDF.
pub fn ensure_pdf(record: &DocumentRecord) -> Result<(), AppError> {
    if is_pdf(record) {
        Ok(())
    } else {
        Err(AppError::UnsupportedMedia(format!(
            "document {} is not a PDF (declared type: {})",
            record.id,
            record.media_type.as_deref().unwrap_or("none")
        )))
    }
}
