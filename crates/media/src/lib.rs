//! Atelier Media Storage Service
//!
//! Provides object storage for binary assets behind a narrow interface:
//! - Cloudinary HTTP API integration for production
//! - Mock storage for testing and development
//! - File validation (size, content type) enforced before any network call
//!
//! The provider is treated as unreliable: callers must not assume a delete
//! succeeded, and a non-error HTTP response can still report a failed delete.

pub mod cloudinary;
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a storage failure, used by callers to decide whether the
/// request itself was bad or the provider was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    BadRequest,
    Unavailable,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media rejected: {0}")]
    BadRequest(String),

    #[error("Media service unavailable: {0}")]
    Unavailable(String),
}

impl MediaError {
    pub fn kind(&self) -> MediaErrorKind {
        match self {
            MediaError::BadRequest(_) => MediaErrorKind::BadRequest,
            MediaError::Unavailable(_) => MediaErrorKind::Unavailable,
        }
    }
}

/// A binary file submitted for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Result of a successful upload: the remote URL plus the opaque storage
/// identifier (public id) required to delete the asset later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
}

/// Allowed upload content types: common image formats plus PDF.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Maximum upload size (10 MiB)
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Validate a file against the upload limits. Runs before any network call.
pub fn validate_file(file: &UploadFile) -> Result<(), MediaError> {
    if file.bytes.is_empty() {
        return Err(MediaError::BadRequest("file is empty".to_string()));
    }

    if file.bytes.len() > MAX_FILE_SIZE_BYTES {
        return Err(MediaError::BadRequest(format!(
            "file exceeds maximum size of {} MiB",
            MAX_FILE_SIZE_BYTES / 1024 / 1024
        )));
    }

    if !ALLOWED_CONTENT_TYPES.contains(&file.content_type.as_str()) {
        return Err(MediaError::BadRequest(format!(
            "content type '{}' not allowed",
            file.content_type
        )));
    }

    Ok(())
}

/// Media storage configuration.
#[derive(Clone)]
pub struct MediaConfig {
    /// Storage provider (cloudinary, mock)
    pub provider: String,
    /// Cloudinary cloud name
    pub cloud_name: String,
    /// Cloudinary API key
    pub api_key: String,
    /// Cloudinary API secret
    pub api_secret: String,
    /// Base URL for the Cloudinary API
    pub api_base: String,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("provider", &self.provider)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl MediaConfig {
    /// Create media config from environment variables.
    pub fn from_env() -> Result<Self, MediaError> {
        let provider = std::env::var("MEDIA_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default();
        let api_key = std::env::var("CLOUDINARY_API_KEY").unwrap_or_default();
        let api_secret = std::env::var("CLOUDINARY_API_SECRET").unwrap_or_default();
        let api_base = std::env::var("CLOUDINARY_API_BASE")
            .unwrap_or_else(|_| "https://api.cloudinary.com".to_string());

        if provider == "cloudinary" && (cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty())
        {
            return Err(MediaError::BadRequest(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required for the cloudinary provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            cloud_name,
            api_key,
            api_secret,
            api_base,
        })
    }
}

/// Storage service trait for different providers.
///
/// The client is constructed once with its credentials and shared by
/// reference; it is never ambient global state.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload a single asset, returning its URL and storage identifier.
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError>;

    /// Delete a previously uploaded asset by storage identifier.
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Factory for creating MediaStorage implementations.
pub struct MediaStorageFactory;

impl MediaStorageFactory {
    /// Create a MediaStorage based on configuration.
    pub fn create(config: MediaConfig) -> Result<std::sync::Arc<dyn MediaStorage>, MediaError> {
        match config.provider.as_str() {
            "cloudinary" => {
                tracing::info!("Creating Cloudinary media storage");
                if config.cloud_name.is_empty() || config.api_key.is_empty() {
                    return Err(MediaError::BadRequest(
                        "Cloudinary credentials are required for the cloudinary provider"
                            .to_string(),
                    ));
                }
                Ok(std::sync::Arc::new(cloudinary::CloudinaryClient::new(
                    config,
                )))
            }
            "mock" => {
                tracing::info!("Creating mock media storage");
                Ok(std::sync::Arc::new(mock::MockMediaStorage::new()))
            }
            provider => Err(MediaError::BadRequest(format!(
                "Unknown media provider: {}. Supported providers: cloudinary, mock",
                provider
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(len: usize) -> UploadFile {
        UploadFile::new("house.jpg", "image/jpeg", vec![0xFF; len])
    }

    #[test]
    fn test_validate_file_accepts_allowed_types() {
        for content_type in ALLOWED_CONTENT_TYPES {
            let file = UploadFile::new("file.bin", *content_type, vec![1, 2, 3]);
            assert!(validate_file(&file).is_ok(), "{} should be allowed", content_type);
        }
    }

    #[test]
    fn test_validate_file_rejects_empty() {
        let file = jpeg(0);
        let err = validate_file(&file).unwrap_err();
        assert_eq!(err.kind(), MediaErrorKind::BadRequest);
    }

    #[test]
    fn test_validate_file_rejects_oversized() {
        // One byte over the 10 MiB limit
        let file = jpeg(MAX_FILE_SIZE_BYTES + 1);
        let err = validate_file(&file).unwrap_err();
        assert_eq!(err.kind(), MediaErrorKind::BadRequest);

        // Exactly at the limit is fine
        let file = jpeg(MAX_FILE_SIZE_BYTES);
        assert!(validate_file(&file).is_ok());
    }

    #[test]
    fn test_validate_file_rejects_disallowed_content_type() {
        let file = UploadFile::new("script.js", "text/javascript", vec![1]);
        let err = validate_file(&file).unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_media_config_debug_redacts_secrets() {
        let config = MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key-123".to_string(),
            api_secret: "secret-456".to_string(),
            api_base: "https://api.cloudinary.com".to_string(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("key-123"));
        assert!(!debug.contains("secret-456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_factory_mock_succeeds() {
        let config = MediaConfig {
            provider: "mock".to_string(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: "https://api.cloudinary.com".to_string(),
        };
        assert!(MediaStorageFactory::create(config).is_ok());
    }

    #[test]
    fn test_factory_cloudinary_requires_credentials() {
        let config = MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: "https://api.cloudinary.com".to_string(),
        };
        assert!(MediaStorageFactory::create(config).is_err());
    }

    #[test]
    fn test_factory_unknown_provider() {
        let config = MediaConfig {
            provider: "invalid".to_string(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: "https://api.cloudinary.com".to_string(),
        };
        let err = match MediaStorageFactory::create(config) {
            Err(e) => e,
            Ok(_) => panic!("Expected error for unknown provider"),
        };
        assert!(err.to_string().contains("Unknown media provider: invalid"));
    }

    #[test]
    fn test_error_display_and_kind() {
        let bad = MediaError::BadRequest("file is empty".to_string());
        assert_eq!(bad.to_string(), "Media rejected: file is empty");
        assert_eq!(bad.kind(), MediaErrorKind::BadRequest);

        let unavailable = MediaError::Unavailable("connection refused".to_string());
        assert_eq!(
            unavailable.to_string(),
            "Media service unavailable: connection refused"
        );
        assert_eq!(unavailable.kind(), MediaErrorKind::Unavailable);
    }
}
