//! Folio image storage
//!
//! Content-addressed storage for images uploaded to the Folio development API.
//!
//! ## Storage Layout
//!
//! ```text
//! <upload_root>/
//! └── ab/                 # first two hex characters of the SHA-256 digest
//!     └── ab3f9e….png     # full digest plus the detected extension
//! ```
//!
//! Each stored image is addressed publicly as `/uploads/<shard>/<digest>.<ext>`. Identical
//! content always maps to the same path, so uploading the same bytes twice is idempotent.
//!
//! ## Example Usage
//!
//! ```no_run
//! use folio_files::ImageStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ImageStore::open("uploads")?;
//! let bytes = std::fs::read("avatar.png")?;
//! let stored = store.store(&bytes, Some("avatar.png"))?;
//! println!("{}", stored.public_path);
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::{detect_image_media_type, ImageStore, StoredImage, PUBLIC_PREFIX};

/// Errors that can occur during image storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Upload root could not be created or is not a directory
    #[error("Invalid upload root: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or foreign path)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Uploaded bytes are not a recognised image format
    #[error("File is not a supported image")]
    NotAnImage,

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
