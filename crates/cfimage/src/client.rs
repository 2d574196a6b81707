//! Cloudflare Images API client
//!
//! Thin pass-through over the Cloudflare Images REST endpoints. Every public
//! operation gates on a token verification call, performs its round trips
//! sequentially, and reports the outcome as an [`OperationResult`]. Nothing
//! is retried and nothing is cached between calls.

use crate::config::{ClientConfig, Credentials, DEFAULT_TIMEOUT};
use crate::error::{ConfigError, ErrorKind, ImageApiError, Result};
use crate::result::OperationResult;
use crate::source::ImageSource;
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, Transport};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const TARGET_FAILED: &str = "Temporary URL could not be created. Reason: ";
const UPLOAD_FAILED: &str = "Photo could not be uploaded. Reason: ";
const DELETE_FAILED: &str = "Photo could not be deleted. Reason: ";
const UPDATE_FAILED: &str = "Photo could not be updated. Reason: ";

/// Client for the Cloudflare Images API
pub struct ImageApiClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
}

impl ImageApiClient {
    /// Create a client with the default request timeout
    pub fn new(credentials: Credentials) -> std::result::Result<Self, ConfigError> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        credentials: Credentials,
        timeout: Duration,
    ) -> std::result::Result<Self, ConfigError> {
        let transport = HttpTransport::new(timeout)?;
        Ok(Self::with_transport(credentials, Arc::new(transport)))
    }

    pub fn from_config(config: ClientConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_timeout(config.credentials, config.timeout)
    }

    /// Credentials from the process environment only
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::new(Credentials::from_env())
    }

    /// Create a client that sends through `transport`
    pub fn with_transport(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Check the API token against `/user/tokens/verify`
    pub async fn verify_credentials(&self) -> OperationResult {
        match self.verify().await {
            Ok(()) => OperationResult::message("Cloudflare API key is valid"),
            Err(e) => report("verify", e),
        }
    }

    /// Obtain a single-use direct upload URL
    ///
    /// Returns `{"uploadUrl": "..."}` on success.
    pub async fn request_upload_target(&self) -> OperationResult {
        if let Err(e) = self.verify().await {
            return report("upload-url", e);
        }

        match self.fetch_upload_target().await {
            Ok(url) => OperationResult::field("uploadUrl", url),
            Err(e) => report("upload-url", e),
        }
    }

    /// Upload an image, transmitted as `{app_name}-{display_name}`
    ///
    /// Returns `{"photoId": "..."}` on success. The source is resolved before
    /// any network call, so an unreadable source costs no round trip.
    pub async fn upload_image(
        &self,
        source: impl Into<ImageSource>,
        display_name: &str,
    ) -> OperationResult {
        let source = source.into();
        match self.upload(&source, display_name).await {
            Ok(photo_id) => {
                tracing::info!("Uploaded {} as {}", source.path().display(), photo_id);
                OperationResult::field("photoId", photo_id)
            }
            Err(e) => report("upload", e),
        }
    }

    /// Delete an image by handle
    ///
    /// Not idempotent: deleting an unknown handle reports whatever the
    /// remote service answers.
    pub async fn delete_image(&self, handle: &str) -> OperationResult {
        if let Err(e) = self.verify().await {
            return report("delete", e);
        }

        match self.remove(handle).await {
            Ok(()) => {
                tracing::info!("Deleted image {}", handle);
                OperationResult::message("Photo deleted successfully")
            }
            Err(e) => report("delete", e),
        }
    }

    /// Replace an image: delete `handle`, then upload `source`
    ///
    /// Not atomic. If the upload fails after the delete succeeded, the old
    /// image is gone and is not restored.
    pub async fn update_image(
        &self,
        handle: &str,
        source: impl Into<ImageSource>,
        display_name: &str,
    ) -> OperationResult {
        let deleted = self.delete_image(handle).await;
        if let Some(e) = deleted.into_error() {
            return report("update", e.context(UPDATE_FAILED));
        }

        let uploaded = self.upload_image(source, display_name).await;
        match uploaded.photo_id() {
            Some(photo_id) => OperationResult::field("photoId", photo_id),
            None => {
                let e = uploaded.into_error().unwrap_or_else(|| {
                    ImageApiError::Remote("Failed to upload new photo".to_string())
                });
                tracing::warn!("Image {} was deleted but its replacement failed", handle);
                report("update", e.context(UPDATE_FAILED))
            }
        }
    }

    async fn verify(&self) -> Result<()> {
        if !self.credentials.has_api_key() {
            return Err(ImageApiError::Configuration(
                "Cloudflare API key is missing".to_string(),
            ));
        }

        let url = endpoint(&["user", "tokens", "verify"])?;
        tracing::debug!("GET {}", url);

        let request = ApiRequest::new(HttpMethod::Get, url).bearer(self.credentials.api_key());
        let response = self.transport.send(request).await.map_err(|e| {
            e.context("Cloudflare API key could not be verified. Reason: ")
        })?;

        if response.status != 200 {
            tracing::debug!("Token verification answered HTTP {}", response.status);
            return Err(ImageApiError::Authentication(
                "Cloudflare API key is invalid".to_string(),
            ));
        }

        Ok(())
    }

    fn require_account_id(&self) -> Result<&str> {
        if !self.credentials.has_account_id() {
            return Err(ImageApiError::Configuration(
                "Cloudflare account ID is missing".to_string(),
            ));
        }
        Ok(self.credentials.account_id())
    }

    async fn fetch_upload_target(&self) -> Result<String> {
        self.fetch_upload_target_inner()
            .await
            .map_err(|e| e.context(TARGET_FAILED))
    }

    async fn fetch_upload_target_inner(&self) -> Result<String> {
        let account_id = self.require_account_id()?;
        let url = endpoint(&["accounts", account_id, "images", "v2", "direct_upload"])?;
        tracing::debug!("POST {}", url);

        let request = ApiRequest::new(HttpMethod::Post, url).bearer(self.credentials.api_key());
        let response = self.transport.send(request).await?;
        let result: DirectUploadResult = parse_result(&response)?;

        result
            .upload_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ImageApiError::Remote("response did not contain an upload URL".to_string()))
    }

    async fn upload(&self, source: &ImageSource, display_name: &str) -> Result<String> {
        let bytes = source.read().await?;
        self.verify().await?;
        let target = self.fetch_upload_target().await?;

        self.send_image(&target, display_name, bytes)
            .await
            .map_err(|e| e.context(UPLOAD_FAILED))
    }

    async fn send_image(&self, target: &str, display_name: &str, bytes: Vec<u8>) -> Result<String> {
        let file_name = self.credentials.upload_file_name(display_name);
        tracing::debug!("POST {} ({}, {} bytes)", target, file_name, bytes.len());

        let request = ApiRequest::new(HttpMethod::Post, target).multipart("file", file_name, bytes);
        let response = self.transport.send(request).await?;
        let result: UploadResult = parse_result(&response)?;

        result
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ImageApiError::Remote("response did not contain an image id".to_string()))
    }

    async fn remove(&self, handle: &str) -> Result<()> {
        self.remove_inner(handle)
            .await
            .map_err(|e| e.context(DELETE_FAILED))
    }

    async fn remove_inner(&self, handle: &str) -> Result<()> {
        let account_id = self.require_account_id()?;
        if matches!(handle, "" | "." | "..") {
            return Err(ImageApiError::Validation(format!(
                "invalid image id {:?}",
                handle
            )));
        }
        let url = endpoint(&["accounts", account_id, "images", "v1", handle])?;
        tracing::debug!("DELETE {}", url);

        let request = ApiRequest::new(HttpMethod::Delete, url).bearer(self.credentials.api_key());
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(ImageApiError::Remote(describe_failure(&response)));
        }
        Ok(())
    }
}

/// API URL with each segment percent-encoded as a single path segment
fn endpoint(segments: &[&str]) -> Result<String> {
    let mut url = reqwest::Url::parse(CLOUDFLARE_API_BASE)
        .map_err(|e| ImageApiError::Configuration(format!("invalid API base URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ImageApiError::Configuration("API base URL cannot be a base".to_string()))?
        .extend(segments.iter().copied());
    Ok(url.into())
}

fn report(operation: &str, err: ImageApiError) -> OperationResult {
    match err.kind() {
        ErrorKind::Transport => tracing::warn!("{} failed (transport): {}", operation, err),
        kind => tracing::warn!("{} failed ({:?}): {}", operation, kind, err),
    }
    err.into()
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DirectUploadResult {
    #[serde(rename = "uploadURL")]
    upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    id: Option<String>,
}

/// Extract `result` from a successful Cloudflare response envelope
fn parse_result<T: serde::de::DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    if !response.is_success() {
        return Err(ImageApiError::Remote(describe_failure(response)));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| ImageApiError::Remote(format!("malformed response body: {}", e)))?;

    envelope
        .result
        .ok_or_else(|| ImageApiError::Remote("response did not contain a result".to_string()))
}

/// Human-readable cause of a non-success response
fn describe_failure(response: &ApiResponse) -> String {
    let provider_message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&response.body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|e| match e.code {
            Some(code) => format!("{} (code {})", e.message, code),
            None => e.message,
        });

    match provider_message {
        Some(message) => format!("HTTP {}: {}", response.status, message),
        None if response.body.trim().is_empty() => format!("HTTP {}", response.status),
        None => {
            let snippet: String = response.body.chars().take(200).collect();
            format!("HTTP {}: {}", response.status, snippet.trim())
        }
    }
}
