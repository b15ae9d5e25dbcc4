//! Content-addressed image store implementation
//!
//! Images are identified by the SHA-256 digest of their bytes. The store only accepts content
//! whose leading bytes identify an image format (via `infer`), or SVG markup.

use crate::FilesError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Metadata for a stored image
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    /// Hexadecimal SHA-256 digest of the image content
    pub hash: String,

    /// Server-relative path the image is served under (`/uploads/ab/ab3f….png`)
    pub public_path: String,

    /// Detected media type (always an `image/*` type)
    pub media_type: String,

    /// Size of the image in bytes
    pub size_bytes: u64,

    /// Filename supplied by the uploader, if any
    pub original_filename: Option<String>,

    /// UTC timestamp when the image was stored
    pub stored_at: DateTime<Utc>,
}

/// Image storage rooted at a single directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Opens (creating if needed) an image store at `root`
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory cannot be created,
    /// is not a directory, or cannot be canonicalised.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, FilesError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create directory {}: {}",
                root.display(),
                e
            ))
        })?;

        if !root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    /// Root directory holding the sharded images
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores image bytes and returns their metadata
    ///
    /// Storing identical bytes again returns the same `public_path` without rewriting the file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotAnImage` when the bytes are not a recognised image, or
    /// `FilesError::Io` if the shard directory or file cannot be written.
    pub fn store(
        &self,
        bytes: &[u8],
        original_filename: Option<&str>,
    ) -> Result<StoredImage, FilesError> {
        let (media_type, extension) = detect_image(bytes).ok_or(FilesError::NotAnImage)?;

        let hash = hex::encode(Sha256::digest(bytes));
        let relative = format!("{}/{}.{}", &hash[0..2], hash, extension);
        let storage_path = self.root.join(&relative);

        if !storage_path.exists() {
            if let Some(parent) = storage_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&storage_path, bytes)?;
        }

        Ok(StoredImage {
            hash,
            public_path: format!("{PUBLIC_PREFIX}{relative}"),
            media_type: media_type.to_string(),
            size_bytes: bytes.len() as u64,
            original_filename: original_filename
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            stored_at: Utc::now(),
        })
    }

    /// Reads a stored image by its public path
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` for paths outside the store, or `FilesError::Io`
    /// when the file is missing or unreadable.
    pub fn read(&self, public_path: &str) -> Result<Vec<u8>, FilesError> {
        let path = self.resolve(public_path)?;
        Ok(fs::read(path)?)
    }

    /// Deletes a stored image by its public path
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a file was removed, `Ok(false)` if nothing was stored at that path.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` for paths outside the store, or `FilesError::Io`
    /// if removal fails for a reason other than absence.
    pub fn delete(&self, public_path: &str) -> Result<bool, FilesError> {
        let path = self.resolve(public_path)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FilesError::Io(e)),
        }
    }

    /// Maps a public path (`/uploads/ab/ab….png`, with or without the leading slash or a
    /// full origin) back to a file under the root.
    fn resolve(&self, public_path: &str) -> Result<PathBuf, FilesError> {
        let marker = PUBLIC_PREFIX.trim_start_matches('/');
        let relative = public_path
            .find(marker)
            .map(|idx| &public_path[idx + marker.len()..])
            .ok_or_else(|| FilesError::InvalidPath(public_path.to_string()))?;

        let mut parts = relative.split('/');
        let (Some(shard), Some(file), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(FilesError::InvalidPath(public_path.to_string()));
        };

        let Some((digest, extension)) = file.split_once('.') else {
            return Err(FilesError::InvalidPath(public_path.to_string()));
        };

        let valid = shard.len() == 2
            && digest.len() == 64
            && digest.starts_with(shard)
            && digest.bytes().all(|b| b.is_ascii_hexdigit())
            && !extension.is_empty()
            && extension.bytes().all(|b| b.is_ascii_alphanumeric());

        if !valid {
            return Err(FilesError::InvalidPath(public_path.to_string()));
        }

        Ok(self.root.join(shard).join(file))
    }
}

/// Detects the media type of image bytes
///
/// Binary formats are recognised from their magic numbers; SVG is recognised from its markup.
/// Returns `None` for anything that is not an image.
pub fn detect_image_media_type(bytes: &[u8]) -> Option<&'static str> {
    detect_image(bytes).map(|(media_type, _)| media_type)
}

/// Media type and file extension of image bytes.
fn detect_image(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            return Some((kind.mime_type(), kind.extension()));
        }
        Some(kind) if kind.matcher_type() != infer::MatcherType::Text => return None,
        _ => {}
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some(("image/svg+xml", "svg"));
    }

    None
}
