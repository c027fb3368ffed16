//! Local-file tier: stream a document's bytes directly from disk.
//!
//! Unlike object storage, local documents are addressed by the absolute path
//! recorded on the document row, so the size is always known before the first
//! byte is written.

use crate::traits::{ByteStream, StorageError, StorageResult};
use futures::StreamExt;
use std::path::Path;
use tokio::fs;
use tokio_util::io::ReaderStream;

/// An opened local file: its size and a chunked byte stream.
pub struct LocalFile {
    pub size: u64,
    pub stream: ByteStream,
}

/// Open a local document for streaming.
///
/// A missing file maps to `NotFound` so the caller can treat the locator as
/// unpopulated and fall through the tier chain.
pub async fn open_local_file(path: &Path) -> StorageResult<LocalFile> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(StorageError::NotFound(path.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(path.display().to_string()))
        }
        Err(e) => return Err(StorageError::IoError(e)),
    };

    let file = fs::File::open(path).await.map_err(|e| {
        StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
    })?;

    let path_display = path.display().to_string();
    let stream = ReaderStream::new(file).map(move |result| {
        result.map_err(|e| {
            tracing::error!(path = %path_display, error = %e, "Local file stream error");
            StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
        })
    });

    Ok(LocalFile {
        size: metadata.len(),
        stream: Box::pin(stream),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_and_stream_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc42.pdf");
        let data = b"%PDF-1.7 test bytes".to_vec();
        tokio::fs::write(&path, &data).await.unwrap();

        let local = open_local_file(&path).await.unwrap();
        assert_eq!(local.size, data.len() as u64);

        let mut stream = local.stream;
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result = open_local_file(&dir.path().join("missing.pdf")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let result = open_local_file(dir.path()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
