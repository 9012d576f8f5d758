use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use super::{BoxFuture, MediaUploader};
use crate::error::{ServiceError, ServiceResult};
use crate::model::MediaFile;

/// Stores uploads as files under a root directory.
///
/// Each upload gets a unique name, so the same file can be attached twice.
/// The returned storage path is `{root}/{uuid}-{sanitized name}`.
pub struct FsMediaUploader {
    root: PathBuf,
}

impl FsMediaUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

impl MediaUploader for FsMediaUploader {
    fn file(&self, file: MediaFile) -> BoxFuture<'_, ServiceResult<String>> {
        Box::pin(async move {
            if file.bytes.is_empty() {
                return Err(ServiceError::new(format!("{} is empty", file.name)));
            }

            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| ServiceError::with_source("failed to create media root", e))?;

            let path = self
                .root
                .join(format!("{}-{}", Uuid::new_v4(), sanitize(&file.name)));
            tokio::fs::write(&path, &file.bytes)
                .await
                .map_err(|e| ServiceError::with_source("failed to write upload", e))?;

            debug!("stored {} bytes at {path:?}", file.bytes.len());
            Ok(path.to_string_lossy().into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\pics\\my bowl.jpg"), "my_bowl.jpg");
        assert_eq!(sanitize(".hidden"), "hidden");
        assert_eq!(sanitize(""), "upload");
    }

    #[tokio::test]
    async fn writes_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FsMediaUploader::new(dir.path().join("media"));

        let path = uploader
            .file(MediaFile::new("bowl.jpg", &b"jpeg"[..]))
            .await
            .unwrap();

        assert!(path.ends_with("-bowl.jpg"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn rejects_empty_upload() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = FsMediaUploader::new(dir.path());
        let err = uploader
            .file(MediaFile::new("empty.jpg", Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "empty.jpg is empty");
    }
}
