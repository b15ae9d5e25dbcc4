//! Value classification.
//!
//! Decides which kind of editable control a JSON value gets, using only the value's structure and
//! the path of the field holding it. There is no schema: the same function handles every section
//! the server returns.
//!
//! The key-name heuristics are substring matches and have known false positives: `dateline`,
//! `tooltip` and `vendor` all look date-ish (`date`, `to`, `end`). They are kept as-is so documents
//! render the same way everywhere.

use crate::constants::{
    DATE_KEY_PATTERNS, IMAGE_EXTENSIONS, IMAGE_KEY_PATTERNS, LOCALIZED_KEYS, LONG_TEXT_THRESHOLD,
    UPLOADS_PATH_MARKER,
};
use serde_json::Value;

/// Semantic kind of a JSON value, as far as editing is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// An array. `item_default` is appended by "Add"; `image_list` marks an array of image
    /// references that also offers "upload and append".
    List {
        item_default: Value,
        image_list: bool,
    },
    /// An object, edited field by field. `localized` marks the `{ar, en}` convention, which does
    /// not change rendering.
    Object { localized: bool },
    Toggle,
    Numeric,
    /// A string holding one image reference.
    ImageText,
    /// A string edited with a date-only control.
    Date,
    LongText,
    ShortText,
    /// Anything else (explicit `null`). Rendered as a read-only notice.
    Unsupported,
}

impl FieldKind {
    /// `true` for kinds whose value is a string.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FieldKind::ImageText | FieldKind::Date | FieldKind::LongText | FieldKind::ShortText
        )
    }
}

/// Classifies `value`, held at `key`: the field's display path, e.g. `logo.en` or `images[0]`.
///
/// Pure and total: first matching rule wins, and unrecognised values become
/// [`FieldKind::Unsupported`] rather than an error.
pub fn classify(key: &str, value: &Value) -> FieldKind {
    match value {
        Value::Array(entries) => FieldKind::List {
            item_default: list_item_default(entries),
            image_list: is_image_key(key) && entries.iter().all(Value::is_string),
        },
        Value::Object(map) => FieldKind::Object {
            localized: LOCALIZED_KEYS.iter().any(|k| map.contains_key(*k)),
        },
        Value::Bool(_) => FieldKind::Toggle,
        Value::Number(_) => FieldKind::Numeric,
        Value::String(s) => {
            if is_image_key(key) || looks_like_image(s) {
                FieldKind::ImageText
            } else if is_date_key(key) {
                FieldKind::Date
            } else if is_long_text(s) {
                FieldKind::LongText
            } else {
                FieldKind::ShortText
            }
        }
        Value::Null => FieldKind::Unsupported,
    }
}

/// Default value appended when the user adds an entry to a list, inferred from the first entry.
///
/// Objects and arrays are deep-copied, numbers become `0`, booleans `false`, and everything else
/// (strings, `null`, an empty list) an empty string.
pub fn list_item_default(entries: &[Value]) -> Value {
    match entries.first() {
        Some(sample @ (Value::Object(_) | Value::Array(_))) => sample.clone(),
        Some(Value::Number(_)) => Value::from(0),
        Some(Value::Bool(_)) => Value::Bool(false),
        _ => Value::String(String::new()),
    }
}

/// `true` when the key name suggests an image reference.
pub fn is_image_key(key: &str) -> bool {
    contains_any(key, IMAGE_KEY_PATTERNS)
}

/// `true` when the key name suggests a date.
pub fn is_date_key(key: &str) -> bool {
    contains_any(key, DATE_KEY_PATTERNS)
}

/// `true` when the string itself looks like an image reference.
pub fn looks_like_image(value: &str) -> bool {
    let lower = value.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) || value.contains(UPLOADS_PATH_MARKER)
}

/// `true` when a string needs a multi-line control.
pub fn is_long_text(value: &str) -> bool {
    value.chars().count() > LONG_TEXT_THRESHOLD || value.contains('\n')
}

fn contains_any(key: &str, patterns: &[&str]) -> bool {
    let lower = key.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

/// Turns a field key into a display label.
///
/// camelCase boundaries and `_`/`-` become spaces, runs of whitespace collapse, and the first
/// character is uppercased: `skillRate` → `Skill Rate`, `cover_image` → `Cover image`.
pub fn title_case(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_uppercase() {
            spaced.push(' ');
            spaced.push(c);
        } else if c == '_' || c == '-' {
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
