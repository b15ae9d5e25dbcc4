/// Errors surfaced by the Folio editor core.
///
/// Remote failures carry whatever message the server supplied so callers can show it to the user;
/// validation failures never reach the server.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    #[error("{}", remote_display(.status, .message))]
    Remote {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("session is no longer authorised")]
    Unauthorized,
    #[error("Required fields missing: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("Choose an item first.")]
    NoItemSelected,
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to access session file: {0}")]
    SessionIo(std::io::Error),
    #[error("failed to encode session: {0}")]
    SessionFormat(serde_json::Error),
}

pub type FolioResult<T> = std::result::Result<T, FolioError>;

fn remote_display(status: &Option<u16>, message: &Option<String>) -> String {
    match (status, message) {
        (_, Some(message)) => message.clone(),
        (Some(status), None) => format!("request failed with status {status}"),
        (None, None) => "request failed".to_string(),
    }
}

impl FolioError {
    /// Builds a remote failure from an HTTP status and optional server message.
    pub fn remote(status: Option<u16>, message: Option<String>) -> Self {
        FolioError::Remote {
            status,
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    /// Human-readable message for a transient notification.
    ///
    /// Server-provided text wins; otherwise `fallback` is used for remote failures without a
    /// message, and every other error shows its own description.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            FolioError::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            FolioError::Remote { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }

    /// `true` for failures that came back from (or never reached) the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(self, FolioError::Remote { .. } | FolioError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_lists_keys() {
        let err = FolioError::MissingRequired(vec!["title".into(), "desc".into()]);
        assert_eq!(err.to_string(), "Required fields missing: title, desc");
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = FolioError::remote(Some(400), Some("Title is required".into()));
        assert_eq!(err.user_message("Failed to save section"), "Title is required");

        let err = FolioError::remote(Some(500), Some("   ".into()));
        assert_eq!(err.user_message("Failed to save section"), "Failed to save section");
        assert_eq!(err.to_string(), "request failed with status 500");
    }

    #[test]
    fn test_user_message_for_local_errors() {
        assert_eq!(
            FolioError::NoItemSelected.user_message("ignored"),
            "Choose an item first."
        );
        assert!(!FolioError::NoItemSelected.is_remote());
        assert!(FolioError::Unauthorized.is_remote());
    }
}
