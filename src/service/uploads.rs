//! Uploaded files are written under `uploads_dir` with a random name and
//! served back from `/uploads/<filename>`.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::DeskError;

pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
}

/// `<uuid><.ext>`, keeping the client's extension only when it is short and
/// alphanumeric.
pub fn stored_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}{ext}", Uuid::new_v4().simple())
}

pub async fn save_upload(
    dir: &Path,
    original: Option<&str>,
    bytes: &[u8],
) -> Result<StoredFile, DeskError> {
    tokio::fs::create_dir_all(dir).await?;
    let filename = stored_name(original);
    let mut file = tokio::fs::File::create(dir.join(&filename)).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    debug!(%filename, size = bytes.len(), "upload stored");
    Ok(StoredFile {
        url: format!("{UPLOADS_URL_PREFIX}/{filename}"),
        filename,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_extensions_only() {
        assert!(stored_name(Some("Photo.JPG")).ends_with(".jpg"));
        assert!(!stored_name(Some("evil.p/hp")).contains('/'));
        assert!(!stored_name(Some("x.tar gz")).contains(' '));
        assert_eq!(stored_name(None).len(), 32);
    }

    #[tokio::test]
    async fn writes_file_under_uploads_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_upload(dir.path(), Some("a.webm"), b"voice").await.unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.filename.ends_with(".webm"));
        let written = std::fs::read(dir.path().join(&stored.filename)).unwrap();
        assert_eq!(written, b"voice");
    }
}
