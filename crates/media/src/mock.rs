//! Mock Media Storage Implementation
//!
//! Records uploads and delete attempts in memory for test assertions and
//! supports programmable failure injection. Thread-safe via `Arc<Mutex<>>`.

use crate::{validate_file, MediaError, MediaStorage, UploadFile, UploadedMedia};
use std::sync::{Arc, Mutex};

/// Mock media storage that records operations for test assertions.
#[derive(Debug, Clone)]
pub struct MockMediaStorage {
    uploads: Arc<Mutex<Vec<UploadedMedia>>>,
    delete_attempts: Arc<Mutex<Vec<String>>>,
    upload_attempts: Arc<Mutex<usize>>,
    fail_upload_at: Arc<Mutex<Option<usize>>>,
    fail_deletes: Arc<Mutex<bool>>,
}

impl MockMediaStorage {
    /// Create a new mock media storage.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            delete_attempts: Arc::new(Mutex::new(Vec::new())),
            upload_attempts: Arc::new(Mutex::new(0)),
            fail_upload_at: Arc::new(Mutex::new(None)),
            fail_deletes: Arc::new(Mutex::new(false)),
        }
    }

    /// Fail the upload with the given zero-based attempt index.
    pub fn set_fail_upload_at(&self, attempt: usize) {
        *self
            .fail_upload_at
            .lock()
            .expect("mock lock poisoned") = Some(attempt);
    }

    /// Make every delete report a provider failure. Attempts are still recorded.
    pub fn set_fail_deletes(&self, fail: bool) {
        *self
            .fail_deletes
            .lock()
            .expect("mock lock poisoned") = fail;
    }

    /// All successfully uploaded media, in upload order.
    pub fn uploaded(&self) -> Vec<UploadedMedia> {
        self.uploads
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    /// Number of upload attempts, successful or not.
    pub fn upload_attempts(&self) -> usize {
        *self
            .upload_attempts
            .lock()
            .expect("mock lock poisoned")
    }

    /// Every public id a delete was attempted for, in attempt order.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    /// Clear recorded operations and failure injection.
    pub fn reset(&self) {
        self.uploads
            .lock()
            .expect("mock lock poisoned")
            .clear();
        self.delete_attempts
            .lock()
            .expect("mock lock poisoned")
            .clear();
        *self
            .upload_attempts
            .lock()
            .expect("mock lock poisoned") = 0;
        *self
            .fail_upload_at
            .lock()
            .expect("mock lock poisoned") = None;
        *self
            .fail_deletes
            .lock()
            .expect("mock lock poisoned") = false;
    }
}

impl Default for MockMediaStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaStorage for MockMediaStorage {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        // Same pre-network gate as the real client
        validate_file(&file)?;

        let attempt = {
            let mut attempts = self
                .upload_attempts
                .lock()
                .map_err(|e| MediaError::Unavailable(format!("mock lock poisoned: {e}")))?;
            let current = *attempts;
            *attempts += 1;
            current
        };

        let fail_at = *self
            .fail_upload_at
            .lock()
            .map_err(|e| MediaError::Unavailable(format!("mock lock poisoned: {e}")))?;
        if fail_at == Some(attempt) {
            tracing::debug!(attempt, "Mock media: injected upload failure");
            return Err(MediaError::Unavailable(
                "injected upload failure".to_string(),
            ));
        }

        let media = UploadedMedia {
            url: format!("https://media.test/{}/{}", attempt, file.filename),
            public_id: format!("mock/{}-{}", attempt, file.filename),
        };

        tracing::debug!(public_id = %media.public_id, "Mock media: recording upload");
        self.uploads
            .lock()
            .map_err(|e| MediaError::Unavailable(format!("mock lock poisoned: {e}")))?
            .push(media.clone());

        Ok(media)
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        tracing::debug!(public_id, "Mock media: recording delete attempt");
        self.delete_attempts
            .lock()
            .map_err(|e| MediaError::Unavailable(format!("mock lock poisoned: {e}")))?
            .push(public_id.to_string());

        if *self
            .fail_deletes
            .lock()
            .map_err(|e| MediaError::Unavailable(format!("mock lock poisoned: {e}")))?
        {
            return Err(MediaError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_uploads_in_order() {
        let storage = MockMediaStorage::new();

        let first = storage
            .upload(UploadFile::new("a.jpg", "image/jpeg", vec![1]))
            .await
            .unwrap();
        let second = storage
            .upload(UploadFile::new("b.png", "image/png", vec![2]))
            .await
            .unwrap();

        let uploaded = storage.uploaded();
        assert_eq!(uploaded, vec![first, second]);
        assert_eq!(storage.upload_attempts(), 2);
    }

    #[tokio::test]
    async fn test_mock_injected_upload_failure() {
        let storage = MockMediaStorage::new();
        storage.set_fail_upload_at(1);

        storage
            .upload(UploadFile::new("a.jpg", "image/jpeg", vec![1]))
            .await
            .unwrap();
        let err = storage
            .upload(UploadFile::new("b.jpg", "image/jpeg", vec![2]))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Unavailable(_)));
        assert_eq!(storage.uploaded().len(), 1);
        assert_eq!(storage.upload_attempts(), 2);
    }

    #[tokio::test]
    async fn test_mock_validates_files() {
        let storage = MockMediaStorage::new();
        let err = storage
            .upload(UploadFile::new("empty.jpg", "image/jpeg", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::BadRequest(_)));
        // The gate rejects before the attempt counter is touched
        assert_eq!(storage.upload_attempts(), 0);
    }

    #[tokio::test]
    async fn test_mock_records_delete_attempts_even_when_failing() {
        let storage = MockMediaStorage::new();
        storage.set_fail_deletes(true);

        assert!(storage.delete("mock/0-a.jpg").await.is_err());
        assert!(storage.delete("mock/1-b.jpg").await.is_err());

        assert_eq!(
            storage.delete_attempts(),
            vec!["mock/0-a.jpg".to_string(), "mock/1-b.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_mock_reset_restores_defaults() {
        let storage = MockMediaStorage::new();
        storage.set_fail_deletes(true);
        storage.set_fail_upload_at(0);
        let _ = storage.delete("mock/0-a.jpg").await;

        storage.reset();

        assert!(storage.uploaded().is_empty());
        assert!(storage.delete_attempts().is_empty());
        assert_eq!(storage.upload_attempts(), 0);
        assert!(storage.delete("mock/0-a.jpg").await.is_ok());
        assert!(storage
            .upload(UploadFile::new("a.jpg", "image/jpeg", vec![1]))
            .await
            .is_ok());
    }
}
