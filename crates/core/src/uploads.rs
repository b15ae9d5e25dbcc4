//! Upload coordination.
//!
//! Sends files to the upload endpoints, keeps the paths returned by the server in an
//! [`UploadRegistry`] for the rest of the editing session, and attaches registered paths to
//! section and item forms.

use crate::api::{PortfolioApi, UploadFile};
use crate::classify::is_image_key;
use crate::constants::{DEFAULT_ITEM_IMAGE_KEY, SECTION_IMAGES_KEY};
use crate::FolioResult;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

/// Deduplicated, insertion-ordered list of uploaded image paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRegistry {
    paths: Vec<String>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` unless it is empty or already present. Returns whether it was added.
    pub fn register(&mut self, path: &str) -> bool {
        if path.is_empty() || self.contains(path) {
            return false;
        }
        self.paths.push(path.to_string());
        true
    }

    pub fn register_all<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            self.register(path);
        }
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Bridges staged files to the upload API.
///
/// Methods take `&self` so several uploads can be in flight at once. The registry lock is only
/// taken after a server call has returned.
pub struct UploadCoordinator {
    api: Arc<dyn PortfolioApi>,
    registry: Mutex<UploadRegistry>,
}

impl UploadCoordinator {
    pub fn new(api: Arc<dyn PortfolioApi>) -> Self {
        Self {
            api,
            registry: Mutex::new(UploadRegistry::new()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, UploadRegistry> {
        // Every mutation is a single push or retain, so a poisoned lock still guards a valid list.
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the registered paths.
    pub fn registered(&self) -> Vec<String> {
        self.registry().paths().to_vec()
    }

    /// Uploads one file and registers the returned path.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the server accepted the file but returned neither `filePath` nor `url`.
    ///
    /// # Errors
    ///
    /// Propagates the API error; the registry is left unchanged.
    pub async fn upload_and_register(&self, file: UploadFile) -> FolioResult<Option<String>> {
        let file_name = file.file_name.clone();
        let uploaded = self.api.upload_image(file).await?;
        let path = uploaded.path();

        if let Some(path) = &path {
            self.registry().register(path);
            tracing::info!(file = %file_name, path = %path, "image uploaded");
        }
        Ok(path)
    }

    /// Uploads several files in one request and registers every returned path.
    ///
    /// # Errors
    ///
    /// Propagates the API error; the registry is left unchanged.
    pub async fn upload_many(&self, files: Vec<UploadFile>) -> FolioResult<Vec<String>> {
        let count = files.len();
        let paths = self.api.upload_images(files).await?.paths();

        self.registry()
            .register_all(paths.iter().map(String::as_str));
        tracing::info!(files = count, returned = paths.len(), "images uploaded");
        Ok(paths)
    }

    /// Deletes an uploaded image on the server, then forgets it locally.
    ///
    /// Callers drop the path from their forms with [`remove_from_section`] once this succeeds.
    ///
    /// # Errors
    ///
    /// Propagates the API error; the registry is left unchanged.
    pub async fn delete_registered_image(&self, path: &str) -> FolioResult<()> {
        self.api.delete_image(path).await?;
        self.registry().remove(path);
        tracing::info!(path = %path, "image deleted");
        Ok(())
    }
}

/// Appends `path` to the section's `images` list, creating the list when absent.
pub fn attach_to_section(form: &Map<String, Value>, path: &str) -> Map<String, Value> {
    let mut images = match form.get(SECTION_IMAGES_KEY) {
        Some(Value::Array(images)) => images.clone(),
        _ => Vec::new(),
    };
    if images.iter().any(|image| image.as_str() == Some(path)) {
        return form.clone();
    }
    images.push(Value::String(path.to_string()));

    let mut next = form.clone();
    next.insert(SECTION_IMAGES_KEY.to_string(), Value::Array(images));
    next
}

/// Puts `path` into the first image-like key of an item form (`image` when there is none).
///
/// Lists get the path appended once; any other value is replaced by the path.
pub fn attach_to_item(form: &Map<String, Value>, path: &str) -> Map<String, Value> {
    let key = form
        .keys()
        .find(|key| is_image_key(key))
        .cloned()
        .unwrap_or_else(|| DEFAULT_ITEM_IMAGE_KEY.to_string());

    let next_value = match form.get(&key) {
        Some(Value::Array(existing)) => {
            if existing.iter().any(|entry| entry.as_str() == Some(path)) {
                return form.clone();
            }
            let mut entries = existing.clone();
            entries.push(Value::String(path.to_string()));
            Value::Array(entries)
        }
        _ => Value::String(path.to_string()),
    };

    let mut next = form.clone();
    next.insert(key, next_value);
    next
}

/// Removes `path` from the section's `images` list. A missing list becomes an empty one.
pub fn remove_from_section(form: &Map<String, Value>, path: &str) -> Map<String, Value> {
    let images: Vec<Value> = match form.get(SECTION_IMAGES_KEY) {
        Some(Value::Array(images)) => images
            .iter()
            .filter(|image| image.as_str() != Some(path))
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    let mut next = form.clone();
    next.insert(SECTION_IMAGES_KEY.to_string(), Value::Array(images));
    next
}
