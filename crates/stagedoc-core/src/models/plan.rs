use std::path::PathBuf;

/// Whether the document is presented for inline viewing or forced download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Response presentation decided by the storage resolver: honored exactly by
/// the delivery engine in all streaming cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub content_type: String,
    /// Already sanitized; safe to quote in a Content-Disposition header.
    pub filename: String,
    pub disposition: Disposition,
}

impl Delivery {
    /// Content-Disposition header value, filename quoted.
    pub fn content_disposition(&self) -> String {
        format!("{}; filename=\"{}\"", self.disposition.as_str(), self.filename)
    }
}

/// How to obtain the document's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchSource {
    /// Emit a 302 to this URL; no body.
    Redirect { url: String },
    /// Stream from object storage, or redirect to the signed URL when the
    /// caller forced redirect-only delivery.
    ObjectStorage {
        key: String,
        signed_url: String,
        redirect_only: bool,
    },
    /// Stream the file's bytes directly from disk.
    LocalFile { path: PathBuf, size: u64 },
}

/// Ephemeral per-request plan produced by the storage resolver and executed
/// by the delivery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub source: FetchSource,
    pub delivery: Delivery,
}
