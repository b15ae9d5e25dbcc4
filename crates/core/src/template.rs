//! Default skeletons for new section items.

use crate::constants::ITEM_IDENTIFIER_KEYS;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Parallel Arabic/English strings.
///
/// Documents carry these as plain objects; this type only exists to build empty ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ar: String,
    pub en: String,
}

impl LocalizedText {
    pub fn empty_value() -> Value {
        json!(LocalizedText::default())
    }
}

/// Builds the form used for a new item in `section_name`.
///
/// When items exist, the first one is deep-cloned with its identifiers removed so the form
/// matches whatever shape the server currently stores. Otherwise a fallback skeleton is picked
/// by section name (case-insensitive).
pub fn synthesize_template(section_name: &str, existing_items: &[Value]) -> Map<String, Value> {
    if let Some(Value::Object(first)) = existing_items.first() {
        return strip_identifiers(first, ITEM_IDENTIFIER_KEYS);
    }
    fallback_template(section_name)
}

fn fallback_template(section_name: &str) -> Map<String, Value> {
    let localized = LocalizedText::empty_value;
    let skeleton = match section_name.to_lowercase().as_str() {
        "skills" => json!({
            "skillName": localized(),
            "skillImage": "",
            "skillRate": 0,
            "skillCategory": localized(),
        }),
        "projects" => json!({
            "title": localized(),
            "desc": localized(),
            "images": [],
        }),
        "services" => json!({
            "title": localized(),
            "desc": localized(),
            "image": "",
        }),
        _ => json!({
            "title": localized(),
            "desc": localized(),
        }),
    };

    match skeleton {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Copy of `document` without the given identifier keys. Remaining keys keep their order.
pub fn strip_identifiers(document: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    document
        .iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Identifier of an item, read from `id` then `_id`. Numbers are accepted and stringified.
pub fn item_identifier(item: &Value) -> Option<String> {
    ITEM_IDENTIFIER_KEYS
        .iter()
        .filter_map(|key| item.get(*key))
        .find_map(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
