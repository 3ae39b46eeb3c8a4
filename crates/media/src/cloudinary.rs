//! Cloudinary HTTP Client Implementation
//!
//! Uploads assets to `{api_base}/v1_1/{cloud_name}/image/upload` and deletes
//! them via the `destroy` action. Requests are authenticated with SHA-256
//! signatures (`signature_algorithm=sha256`).

use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{validate_file, MediaConfig, MediaError, MediaStorage, UploadFile, UploadedMedia};

/// Real Cloudinary client for uploading and deleting remote assets.
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

impl CloudinaryClient {
    /// Create a new Cloudinary client from configuration.
    pub fn new(config: MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: config.cloud_name,
            api_key: config.api_key,
            api_secret: config.api_secret,
            api_base: config.api_base,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.api_base.trim_end_matches('/'),
            self.cloud_name,
            action
        )
    }

    /// Sign request parameters: keys sorted alphabetically, serialized as
    /// `k=v` pairs joined with `&`, the API secret appended, SHA-256 hex.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Extract a provider error message from a non-success response body.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => format!("Cloudinary returned {}: {}", status, parsed.error.message),
                Err(_) => format!("Cloudinary returned {}: {}", status, body),
            },
            Err(_) => format!("Cloudinary returned {}", status),
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for CloudinaryClient {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaError> {
        validate_file(&file)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("timestamp", &timestamp)]);

        // Upload the payload as a base64 data URI instead of multipart.
        let data_uri = format!(
            "data:{};base64,{}",
            file.content_type,
            base64::engine::general_purpose::STANDARD.encode(&file.bytes)
        );

        let response = self
            .http
            .post(self.endpoint("upload"))
            .form(&[
                ("file", data_uri.as_str()),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| MediaError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let client_error = response.status().is_client_error();
            let message = Self::error_message(response).await;
            return Err(if client_error {
                MediaError::BadRequest(message)
            } else {
                MediaError::Unavailable(message)
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Unavailable(format!("invalid upload response: {}", e)))?;

        tracing::debug!(filename = %file.filename, public_id = %body.public_id, "Asset uploaded");

        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|e| MediaError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let client_error = response.status().is_client_error();
            let message = Self::error_message(response).await;
            return Err(if client_error {
                MediaError::BadRequest(message)
            } else {
                MediaError::Unavailable(message)
            });
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Unavailable(format!("invalid destroy response: {}", e)))?;

        // A 200 response can still report a failed delete; only "ok" and
        // "not found" (already gone, treated as idempotent) count as success.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Unavailable(format!(
                "destroy returned '{}' for {}",
                other, public_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base: "https://api.cloudinary.com".to_string(),
        })
    }

    #[test]
    fn test_endpoint_format() {
        let client = client();
        assert_eq!(
            client.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            client.endpoint("destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = CloudinaryClient::new(MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base: "http://localhost:9999/".to_string(),
        });
        assert_eq!(
            client.endpoint("upload"),
            "http://localhost:9999/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_sign_is_deterministic_and_order_independent() {
        let client = client();
        let a = client.sign(&[("public_id", "x"), ("timestamp", "123")]);
        let b = client.sign(&[("timestamp", "123"), ("public_id", "x")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 hex digest
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let a = client().sign(&[("timestamp", "123")]);

        let other = CloudinaryClient::new(MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "different".to_string(),
            api_base: "https://api.cloudinary.com".to_string(),
        });
        let b = other.sign(&[("timestamp", "123")]);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_upload_validates_before_network() {
        // Invalid files fail locally even with an unreachable endpoint.
        let client = CloudinaryClient::new(MediaConfig {
            provider: "cloudinary".to_string(),
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
        });

        let empty = UploadFile::new("empty.jpg", "image/jpeg", vec![]);
        let err = client.upload(empty).await.unwrap_err();
        assert!(matches!(err, MediaError::BadRequest(_)));

        let wrong_type = UploadFile::new("notes.txt", "text/plain", vec![1, 2]);
        let err = client.upload(wrong_type).await.unwrap_err();
        assert!(matches!(err, MediaError::BadRequest(_)));
    }
}
