//! Image orchestration: single and batch uploads with compensating deletes
//!
//! All storage failures are classified here into a single error shape so the
//! workflow layer only reasons about "image step succeeded" or "image step
//! failed with a reason", never about provider-specific failure shapes.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use atelier_media::{MediaError, MediaErrorKind, MediaStorage, UploadFile, UploadedMedia};

/// Uniform image-layer failure, carrying the provider's classification
/// (caller-fixable bad input vs. service failure) for retry decisions upstream.
#[derive(Error, Debug)]
#[error("image upload failed: {message}")]
pub struct ImageUploadError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl From<MediaError> for ImageUploadError {
    fn from(err: MediaError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Drives uploads and best-effort deletions against the object store.
#[derive(Clone)]
pub struct ImageOrchestrator {
    storage: Arc<dyn MediaStorage>,
}

impl ImageOrchestrator {
    pub fn new(storage: Arc<dyn MediaStorage>) -> Self {
        Self { storage }
    }

    /// Upload a single file.
    pub async fn upload_one(&self, file: UploadFile) -> Result<UploadedMedia, ImageUploadError> {
        match self.storage.upload(file).await {
            Ok(media) => Ok(media),
            Err(err) => {
                tracing::error!(error = %err, "Image upload failed");
                Err(err.into())
            }
        }
    }

    /// Upload files sequentially, preserving input order in the result.
    ///
    /// On the first failure every previously successful upload in this batch
    /// is compensated before the error propagates; partial galleries are
    /// never returned.
    pub async fn upload_many(
        &self,
        files: Vec<UploadFile>,
    ) -> Result<Vec<UploadedMedia>, ImageUploadError> {
        let mut uploaded: Vec<UploadedMedia> = Vec::with_capacity(files.len());

        for file in files {
            match self.upload_one(file).await {
                Ok(media) => uploaded.push(media),
                Err(err) => {
                    tracing::error!(
                        uploaded = uploaded.len(),
                        "Batch upload failed, rolling back prior uploads"
                    );
                    let ids: Vec<String> = uploaded
                        .iter()
                        .map(|media| media.public_id.clone())
                        .collect();
                    self.compensate(None, &ids).await;
                    return Err(err);
                }
            }
        }

        Ok(uploaded)
    }

    /// Best-effort parallel deletion of every supplied identifier.
    ///
    /// Each deletion runs independently; one failure neither blocks nor fails
    /// the others, and failures are only logged so they cannot mask the
    /// original error that triggered the compensation.
    pub async fn compensate(&self, main_id: Option<&str>, gallery_ids: &[String]) {
        let targets: Vec<&str> = main_id
            .into_iter()
            .chain(gallery_ids.iter().map(String::as_str))
            .collect();

        if targets.is_empty() {
            return;
        }

        tracing::info!(count = targets.len(), "Compensating uploaded assets");
        join_all(targets.into_iter().map(|id| self.try_delete(id))).await;
    }

    /// Single best-effort deletion; an empty identifier is a no-op.
    pub async fn delete_one(&self, public_id: &str) {
        if public_id.is_empty() {
            tracing::warn!("Delete requested with an empty public id");
            return;
        }
        self.try_delete(public_id).await;
    }

    async fn try_delete(&self, public_id: &str) {
        if let Err(err) = self.storage.delete(public_id).await {
            tracing::warn!(public_id, error = %err, "Could not delete remote asset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_media::mock::MockMediaStorage;

    fn jpeg(name: &str) -> UploadFile {
        UploadFile::new(name, "image/jpeg", vec![0xFF; 16])
    }

    fn orchestrator() -> (ImageOrchestrator, MockMediaStorage) {
        let storage = MockMediaStorage::new();
        (ImageOrchestrator::new(Arc::new(storage.clone())), storage)
    }

    #[tokio::test]
    async fn test_upload_many_preserves_order() {
        let (orchestrator, storage) = orchestrator();

        let uploaded = orchestrator
            .upload_many(vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")])
            .await
            .unwrap();

        assert_eq!(uploaded.len(), 3);
        assert!(uploaded[0].public_id.ends_with("a.jpg"));
        assert!(uploaded[1].public_id.ends_with("b.jpg"));
        assert!(uploaded[2].public_id.ends_with("c.jpg"));
        assert!(storage.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_upload_many_rolls_back_prior_successes_on_failure() {
        let (orchestrator, storage) = orchestrator();
        storage.set_fail_upload_at(2);

        let err = orchestrator
            .upload_many(vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")])
            .await
            .unwrap_err();
        assert_eq!(err.kind, MediaErrorKind::Unavailable);

        // Both prior successes were compensated
        let mut attempts = storage.delete_attempts();
        attempts.sort();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].ends_with("a.jpg"));
        assert!(attempts[1].ends_with("b.jpg"));
    }

    #[tokio::test]
    async fn test_upload_many_bad_file_classified_as_bad_request() {
        let (orchestrator, storage) = orchestrator();

        let err = orchestrator
            .upload_many(vec![
                jpeg("a.jpg"),
                UploadFile::new("notes.txt", "text/plain", vec![1]),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.kind, MediaErrorKind::BadRequest);
        assert_eq!(storage.delete_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_compensate_attempts_all_even_when_deletes_fail() {
        let (orchestrator, storage) = orchestrator();
        storage.set_fail_deletes(true);

        orchestrator
            .compensate(
                Some("mock/main"),
                &["mock/0".to_string(), "mock/1".to_string()],
            )
            .await;

        let attempts = storage.delete_attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.contains(&"mock/main".to_string()));
        assert!(attempts.contains(&"mock/0".to_string()));
        assert!(attempts.contains(&"mock/1".to_string()));
    }

    #[tokio::test]
    async fn test_compensate_with_nothing_to_delete_is_noop() {
        let (orchestrator, storage) = orchestrator();
        orchestrator.compensate(None, &[]).await;
        assert!(storage.delete_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_delete_one_empty_id_is_noop() {
        let (orchestrator, storage) = orchestrator();
        orchestrator.delete_one("").await;
        assert!(storage.delete_attempts().is_empty());

        orchestrator.delete_one("mock/main").await;
        assert_eq!(storage.delete_attempts(), vec!["mock/main".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_one_swallows_provider_failure() {
        let (orchestrator, storage) = orchestrator();
        storage.set_fail_deletes(true);

        // Best-effort: no error escapes
        orchestrator.delete_one("mock/main").await;
        assert_eq!(storage.delete_attempts(), vec!["mock/main".to_string()]);
    }
}
