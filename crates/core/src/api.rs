//! Contract for the remote portfolio API.
//!
//! The editor core only talks to the server through [`PortfolioApi`]. `folio-client` implements
//! it over HTTP; tests implement it in memory.

use crate::FolioResult;
use async_trait::async_trait;
use folio_types::LanguageMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Response of the single-image upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadedImage {
    /// The stored reference: `filePath` when non-empty, else `url`.
    pub fn path(&self) -> Option<String> {
        [&self.file_path, &self.url]
            .into_iter()
            .flatten()
            .find(|p| !p.is_empty())
            .cloned()
    }
}

/// Response of the multi-image upload endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImages {
    #[serde(default)]
    pub file_paths: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadedImages {
    /// The stored references: `filePaths` when non-empty, else `urls`.
    pub fn paths(&self) -> Vec<String> {
        if self.file_paths.is_empty() {
            self.urls.clone()
        } else {
            self.file_paths.clone()
        }
    }
}

/// Plain `{ message }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote operations used by the editor and the CLI.
///
/// Section and item bodies are schema-less JSON objects. Implementations unwrap the server's
/// response envelopes (`{ section: ... }`, `{ items: [...] }`) before returning.
#[async_trait]
pub trait PortfolioApi: Send + Sync {
    async fn create_portfolio(&self) -> FolioResult<Value>;

    async fn my_portfolio(&self) -> FolioResult<Value>;

    /// Metadata for every section, keyed by section name.
    async fn all_sections(&self) -> FolioResult<Value>;

    async fn section(&self, section: &str) -> FolioResult<Value>;

    /// Replaces the section document with `body`.
    async fn upsert_section(&self, section: &str, body: &Map<String, Value>)
        -> FolioResult<Value>;

    async fn clear_section(&self, section: &str) -> FolioResult<ApiMessage>;

    async fn section_items(&self, section: &str) -> FolioResult<Vec<Value>>;

    async fn create_item(&self, section: &str, body: &Map<String, Value>) -> FolioResult<Value>;

    async fn update_item(
        &self,
        section: &str,
        item_id: &str,
        body: &Map<String, Value>,
    ) -> FolioResult<Value>;

    async fn delete_item(&self, section: &str, item_id: &str) -> FolioResult<ApiMessage>;

    async fn set_section_active(&self, section: &str, active: bool) -> FolioResult<Value>;

    async fn update_language_mode(&self, mode: LanguageMode) -> FolioResult<Value>;

    async fn publish(&self) -> FolioResult<ApiMessage>;

    async fn unpublish(&self) -> FolioResult<ApiMessage>;

    async fn upload_image(&self, file: UploadFile) -> FolioResult<UploadedImage>;

    async fn upload_images(&self, files: Vec<UploadFile>) -> FolioResult<UploadedImages>;

    async fn delete_image(&self, file_path: &str) -> FolioResult<ApiMessage>;
}

/// Returns the value under `key` when `body` is an object carrying it, else `body` itself.
pub fn unwrap_envelope(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key(key) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Fetches the caller's portfolio, creating it first when the fetch fails.
///
/// # Errors
///
/// Returns the error of the create call or of the second fetch.
pub async fn bootstrap_portfolio(api: &dyn PortfolioApi) -> FolioResult<Value> {
    match api.my_portfolio().await {
        Ok(portfolio) => Ok(portfolio),
        Err(err) => {
            tracing::info!(error = %err, "no portfolio yet, creating one");
            api.create_portfolio().await?;
            api.my_portfolio().await
        }
    }
}
