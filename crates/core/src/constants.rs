//! Constants used throughout the Folio core crate.

/// API origin used when none is configured.
pub const DEFAULT_API_ORIGIN: &str = "http://localhost:5000";

/// Request timeout (seconds) after which a remote call is treated as failed.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Deepest nesting of lists/objects the field renderer will descend into.
pub const DEFAULT_MAX_FIELD_DEPTH: usize = 16;

/// Strings longer than this many characters are edited with a multi-line control.
pub const LONG_TEXT_THRESHOLD: usize = 80;

/// Key-name fragments (case-insensitive) marking a field as holding an image reference.
pub const IMAGE_KEY_PATTERNS: &[&str] = &[
    "image",
    "img",
    "photo",
    "logo",
    "avatar",
    "thumbnail",
    "banner",
    "cover",
    "icon",
];

/// Key-name fragments (case-insensitive) marking a field as holding a date.
pub const DATE_KEY_PATTERNS: &[&str] = &["date", "from", "to", "start", "end"];

/// File extensions (lowercase, with the dot) that mark a string value as an image reference.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Path fragment used by the upload API for stored images.
pub const UPLOADS_PATH_MARKER: &str = "/uploads/";

/// Identifier keys stripped from section items before editing.
pub const ITEM_IDENTIFIER_KEYS: &[&str] = &["id", "_id"];

/// Identifier key stripped from section documents before editing.
pub const SECTION_IDENTIFIER_KEY: &str = "_id";

/// Key holding a section's image gallery.
pub const SECTION_IMAGES_KEY: &str = "images";

/// Key used when a new item has no image-like key to attach an upload to.
pub const DEFAULT_ITEM_IMAGE_KEY: &str = "image";

/// Localized text language keys.
pub const LOCALIZED_KEYS: &[&str] = &["ar", "en"];
