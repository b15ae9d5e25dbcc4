//! Required-field validation.
//!
//! The server attaches a list of required top-level keys to each section's metadata. Saving is
//! blocked locally while any of them is empty, so the request is never sent.

use crate::{FolioError, FolioResult};
use serde_json::{Map, Value};

/// Returns `true` when a field counts as empty for required-field purposes.
///
/// Absent, `null`, whitespace-only strings and empty arrays are missing. `false`, `0` and any
/// object (even an empty one) are present.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(entries)) => entries.is_empty(),
        Some(_) => false,
    }
}

/// Required keys that are missing from `form`, in the order they were listed.
pub fn missing_required(form: &Map<String, Value>, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|key| is_missing(form.get(key.as_str())))
        .cloned()
        .collect()
}

/// Validates a form against the section's required keys.
///
/// # Arguments
///
/// * `form` - The top-level form about to be saved.
/// * `required` - Required key names from the section metadata.
///
/// # Errors
///
/// Returns `FolioError::MissingRequired` listing every missing key.
pub fn validate_required(form: &Map<String, Value>, required: &[String]) -> FolioResult<()> {
    let missing = missing_required(form, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FolioError::MissingRequired(missing))
    }
}

/// Reads the required-key hint from one section's metadata object.
///
/// Non-string entries are ignored; a missing or malformed `required` field yields no keys.
pub fn required_keys(section_meta: Option<&Value>) -> Vec<String> {
    section_meta
        .and_then(|meta| meta.get("required"))
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
