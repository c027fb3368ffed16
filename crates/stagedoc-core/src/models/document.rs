use serde::{Deserialize, Serialize};

/// One stored document, as loaded by the record locator.
///
/// Read-only to this service: rows are created by upload workflows elsewhere
/// and never mutated or deleted here. At most one of the three storage
/// locators is authoritative; [`DocumentRecord::tier`] encodes the precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub title: String,
    /// Original upload filename; column is deployment-optional.
    pub original_name: Option<String>,
    pub media_type: Option<String>,
    /// Byte size; column is deployment-optional and may be recomputed from
    /// the backend when absent.
    pub file_size: Option<i64>,
    /// Owning user; column is deployment-optional.
    pub owner_id: Option<i64>,
    pub external_url: Option<String>,
    pub storage_key: Option<String>,
    pub local_path: Option<String>,
}

/// Backend kind holding a document's bytes, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    DirectUrl,
    ObjectStorage,
    LocalFile,
}

fn locator(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DocumentRecord {
    /// Name shown to the caller: the original upload filename when recorded,
    /// otherwise the display title.
    pub fn display_name(&self) -> &str {
        self.original_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.title)
    }

    /// Select the storage tier holding this document's bytes, together with
    /// the locator value (trimmed) that won.
    ///
    /// First match wins: an external URL takes precedence over a storage key,
    /// which takes precedence over a local path. Blank locators count as
    /// absent. `None` means no locator is populated and the document resolves
    /// to `file_not_found`.
    pub fn tier(&self) -> Option<(StorageTier, &str)> {
        if let Some(url) = locator(&self.external_url) {
            Some((StorageTier::DirectUrl, url))
        } else if let Some(key) = locator(&self.storage_key) {
            Some((StorageTier::ObjectStorage, key))
        } else {
            locator(&self.local_path).map(|path| (StorageTier::LocalFile, path))
        }
    }

    /// The recorded local path, when populated; last tier in the chain and
    /// also the fallback target when object storage cannot sign.
    pub fn local_path(&self) -> Option<&str> {
        locator(&self.local_path)
    }
}
