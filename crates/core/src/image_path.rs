use crate::constants::DEFAULT_API_ORIGIN;

/// Turns stored image references into renderable URLs.
///
/// Absolute (`http://`, `https://`) and `data:` references pass through, server-relative paths
/// (`/uploads/...`) get the API origin prepended, and anything else is returned as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePathResolver {
    origin: String,
}

impl ImagePathResolver {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn resolve(&self, path: &str) -> String {
        if path.is_empty()
            || path.starts_with("http://")
            || path.starts_with("https://")
            || path.starts_with("data:")
        {
            return path.to_string();
        }
        if path.starts_with('/') {
            return format!("{}{}", self.origin, path);
        }
        path.to_string()
    }
}

impl Default for ImagePathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_API_ORIGIN)
    }
}
