//! Dynamic form engine.
//!
//! [`FieldRenderer`] turns JSON values into a toolkit-neutral [`Control`] tree and applies
//! [`FieldAction`]s to produce replacement values. It never holds on to the values it is given:
//! every `apply*` call takes the current value by reference and returns a new one, so the state
//! always lives with the caller (the section editor page).

use crate::api::UploadFile;
use crate::classify::{classify, is_long_text, title_case, FieldKind};
use crate::constants::DEFAULT_MAX_FIELD_DEPTH;
use crate::image_path::ImagePathResolver;
use crate::{FolioError, FolioResult};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::future::Future;
use std::str::FromStr;

/// Notice shown for `null` values.
pub const UNSUPPORTED_NOTICE: &str = "Unsupported value";

/// Notice shown in place of values nested deeper than the configured limit.
pub const TOO_DEEP_NOTICE: &str = "nesting too deep";

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a form, such as `projects[2].title.en`.
///
/// The display form doubles as the classifier key, so `logo.en` and `images[0].caption` pick up
/// the image heuristics of their parents. Keys containing `.`, `[`, `]` or `\` are escaped with a
/// backslash in the display form. Empty keys have no display form that parses back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, addressing the value itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A single-key path addressing a top-level form field.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    for c in key.chars() {
        if matches!(c, '.' | '[' | ']' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if position > 0 {
                        f.write_char('.')?;
                    }
                    write_key(f, key)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = FolioError;

    /// Parses the display form back into a path: `a.b[2].c`. A leading index (`[0].name`) is
    /// accepted for paths relative to a list.
    fn from_str(s: &str) -> FolioResult<Self> {
        let invalid = || FolioError::InvalidInput(format!("invalid field path {s:?}"));

        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(Self(segments));
        }

        let mut chars = s.chars().peekable();
        let mut first = true;
        loop {
            let mut key = String::new();
            while let Some(&c) = chars.peek() {
                match c {
                    '.' | '[' => break,
                    ']' => return Err(invalid()),
                    '\\' => {
                        chars.next();
                        key.push(chars.next().ok_or_else(invalid)?);
                    }
                    _ => {
                        chars.next();
                        key.push(c);
                    }
                }
            }

            if !key.is_empty() {
                segments.push(PathSegment::Key(key));
            } else if !first || chars.peek() != Some(&'[') {
                return Err(invalid());
            }
            first = false;

            while chars.peek() == Some(&'[') {
                chars.next();
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(c) => digits.push(c),
                        None => return Err(invalid()),
                    }
                }
                let index = digits.parse::<usize>().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(index));
            }

            match chars.next() {
                None => return Ok(Self(segments)),
                Some('.') => {}
                Some(_) => return Err(invalid()),
            }
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Looks up the value at `path` inside a top-level form.
pub fn value_at<'a>(form: &'a Map<String, Value>, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let PathSegment::Key(key) = first else {
        return None;
    };

    rest.iter()
        .try_fold(form.get(key)?, |value, segment| match segment {
            PathSegment::Key(key) => value.as_object()?.get(key),
            PathSegment::Index(index) => value.as_array()?.get(*index),
        })
}

/// One labeled, editable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub path: FieldPath,
    pub label: String,
    #[serde(flatten)]
    pub kind: ControlKind,
}

/// What a control looks like and which actions it accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum ControlKind {
    /// Entries labeled `"{label} #{n}"`, each removable, plus "Add". `can_upload` marks an image
    /// list offering "upload and append".
    #[serde(rename_all = "camelCase")]
    List {
        entries: Vec<Control>,
        can_upload: bool,
        uploading: bool,
    },
    Group {
        fields: Vec<Control>,
    },
    Toggle {
        checked: bool,
    },
    Number {
        value: f64,
    },
    Date {
        value: String,
    },
    Text {
        value: String,
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<ImageAffordance>,
    },
    /// Read-only.
    Unsupported {
        notice: String,
    },
}

/// Upload button and preview attached to an image text field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAffordance {
    pub can_upload: bool,
    pub uploading: bool,
    /// Renderable URL, present only when the field holds a reference.
    pub preview: Option<String>,
}

/// How an uploaded reference lands in an image field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Image lists.
    Append,
    /// Image text fields.
    Replace,
}

impl UploadMode {
    pub fn action(self, stored: String) -> FieldAction {
        match self {
            UploadMode::Append => FieldAction::AppendImage(stored),
            UploadMode::Replace => FieldAction::ReplaceImage(stored),
        }
    }
}

/// A user edit, applied to the value at some [`FieldPath`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAction {
    /// Push the list's default entry.
    Append,
    Remove(usize),
    SetBool(bool),
    /// Raw numeric input. Empty or unparsable input becomes `0`.
    SetNumber(String),
    SetText(String),
    /// Image lists only.
    AppendImage(String),
    /// Image text fields only.
    ReplaceImage(String),
}

/// Renders and edits schema-less JSON documents.
#[derive(Debug, Clone)]
pub struct FieldRenderer {
    resolver: ImagePathResolver,
    max_depth: usize,
    can_upload: bool,
}

impl FieldRenderer {
    /// Creates a renderer without upload support.
    pub fn new(resolver: ImagePathResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
            can_upload: false,
        }
    }

    /// Advertise upload affordances on image fields.
    pub fn with_uploads(mut self, can_upload: bool) -> Self {
        self.can_upload = can_upload;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Renders `value`, found at the absolute `path`.
    ///
    /// `uploading` holds the paths with an upload in flight.
    pub fn render(
        &self,
        path: &FieldPath,
        label: &str,
        value: &Value,
        uploading: &HashSet<FieldPath>,
    ) -> Control {
        let kind = self.render_kind(path, label, value, uploading);
        Control {
            path: path.clone(),
            label: label.to_string(),
            kind,
        }
    }

    fn render_kind(
        &self,
        path: &FieldPath,
        label: &str,
        value: &Value,
        uploading: &HashSet<FieldPath>,
    ) -> ControlKind {
        if path.len() > self.max_depth {
            return ControlKind::Unsupported {
                notice: TOO_DEEP_NOTICE.to_string(),
            };
        }

        match (classify(&path.to_string(), value), value) {
            (FieldKind::List { image_list, .. }, Value::Array(entries)) => ControlKind::List {
                entries: entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        self.render(
                            &path.index(i),
                            &format!("{label} #{}", i + 1),
                            entry,
                            uploading,
                        )
                    })
                    .collect(),
                can_upload: image_list && self.can_upload,
                uploading: uploading.contains(path),
            },
            (FieldKind::Object { .. }, Value::Object(map)) => ControlKind::Group {
                fields: map
                    .iter()
                    .map(|(key, child)| {
                        self.render(&path.child(key), &title_case(key), child, uploading)
                    })
                    .collect(),
            },
            (FieldKind::Toggle, Value::Bool(checked)) => ControlKind::Toggle { checked: *checked },
            (FieldKind::Numeric, Value::Number(n)) => ControlKind::Number {
                value: n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
            },
            (FieldKind::Date, Value::String(s)) => ControlKind::Date { value: s.clone() },
            (FieldKind::ImageText, Value::String(s)) => ControlKind::Text {
                value: s.clone(),
                multiline: is_long_text(s),
                image: Some(ImageAffordance {
                    can_upload: self.can_upload,
                    uploading: uploading.contains(path),
                    preview: (!s.is_empty()).then(|| self.resolver.resolve(s)),
                }),
            },
            (FieldKind::LongText, Value::String(s)) => ControlKind::Text {
                value: s.clone(),
                multiline: true,
                image: None,
            },
            (FieldKind::ShortText, Value::String(s)) => ControlKind::Text {
                value: s.clone(),
                multiline: false,
                image: None,
            },
            _ => ControlKind::Unsupported {
                notice: UNSUPPORTED_NOTICE.to_string(),
            },
        }
    }

    /// Renders every top-level field of a form, labeled with its title-cased key.
    pub fn render_form(
        &self,
        form: &Map<String, Value>,
        uploading: &HashSet<FieldPath>,
    ) -> Vec<Control> {
        form.iter()
            .map(|(key, value)| {
                self.render(&FieldPath::key(key.clone()), &title_case(key), value, uploading)
            })
            .collect()
    }

    /// Applies `action` to the value at `path` (relative to `value`).
    ///
    /// Returns the replacement for `value`, or `None` when the path no longer exists or the
    /// action does not fit the value there. Along the path, objects are rebuilt with only the
    /// touched key replaced and lists with only the touched index replaced.
    pub fn apply(&self, value: &Value, path: &FieldPath, action: &FieldAction) -> Option<Value> {
        self.apply_at(value, path.segments(), &FieldPath::root(), action)
    }

    /// Like [`apply`](Self::apply), for a path starting at a top-level form key.
    pub fn apply_to_form(
        &self,
        form: &Map<String, Value>,
        path: &FieldPath,
        action: &FieldAction,
    ) -> Option<Map<String, Value>> {
        let (first, rest) = path.segments().split_first()?;
        let PathSegment::Key(key) = first else {
            tracing::debug!(%path, "form paths must start with a key");
            return None;
        };

        let next = self.apply_at(form.get(key)?, rest, &FieldPath::key(key.clone()), action)?;
        let mut rebuilt = form.clone();
        rebuilt.insert(key.clone(), next);
        Some(rebuilt)
    }

    fn apply_at(
        &self,
        value: &Value,
        rest: &[PathSegment],
        at: &FieldPath,
        action: &FieldAction,
    ) -> Option<Value> {
        if at.len() > self.max_depth {
            tracing::debug!(path = %at, "ignoring edit below the nesting limit");
            return None;
        }

        match rest.split_first() {
            None => apply_action(&at.to_string(), value, action),
            Some((PathSegment::Key(child_key), rest)) => {
                let map = value.as_object()?;
                let next = self.apply_at(map.get(child_key)?, rest, &at.child(child_key.clone()), action)?;
                let mut rebuilt = map.clone();
                rebuilt.insert(child_key.clone(), next);
                Some(Value::Object(rebuilt))
            }
            Some((PathSegment::Index(index), rest)) => {
                let entries = value.as_array()?;
                let next = self.apply_at(entries.get(*index)?, rest, &at.index(*index), action)?;
                let mut rebuilt = entries.clone();
                rebuilt[*index] = next;
                Some(Value::Array(rebuilt))
            }
        }
    }

    /// Whether the field at `path` takes uploads, and how.
    pub fn upload_mode(&self, form: &Map<String, Value>, path: &FieldPath) -> Option<UploadMode> {
        match classify(&path.to_string(), value_at(form, path)?) {
            FieldKind::List {
                image_list: true, ..
            } => Some(UploadMode::Append),
            FieldKind::ImageText => Some(UploadMode::Replace),
            _ => None,
        }
    }

    /// Uploads `file` for the image field at `path` and returns the updated form.
    ///
    /// Image lists get the new reference appended, image text fields have it replaced. Returns
    /// `None` (after logging) when the field does not take uploads, the uploader fails, or the
    /// server returned no reference.
    pub async fn upload_into<F, Fut>(
        &self,
        form: &Map<String, Value>,
        path: &FieldPath,
        file: UploadFile,
        uploader: F,
    ) -> Option<Map<String, Value>>
    where
        F: FnOnce(UploadFile) -> Fut,
        Fut: Future<Output = FolioResult<Option<String>>>,
    {
        let Some(mode) = self.upload_mode(form, path) else {
            tracing::debug!(%path, "field does not accept uploads");
            return None;
        };

        match uploader(file).await {
            Ok(Some(stored)) => self.apply_to_form(form, path, &mode.action(stored)),
            Ok(None) => {
                tracing::warn!(%path, "upload returned no image path");
                None
            }
            Err(err) => {
                tracing::warn!(%path, error = %err, "inline image upload failed");
                None
            }
        }
    }
}

impl Default for FieldRenderer {
    fn default() -> Self {
        Self::new(ImagePathResolver::default(), DEFAULT_MAX_FIELD_DEPTH)
    }
}

fn apply_action(key: &str, value: &Value, action: &FieldAction) -> Option<Value> {
    let kind = classify(key, value);
    let next = match (action, &kind, value) {
        (FieldAction::Append, FieldKind::List { item_default, .. }, Value::Array(entries)) => {
            let mut next = entries.clone();
            next.push(item_default.clone());
            Value::Array(next)
        }
        (FieldAction::Remove(index), FieldKind::List { .. }, Value::Array(entries))
            if *index < entries.len() =>
        {
            let mut next = entries.clone();
            next.remove(*index);
            Value::Array(next)
        }
        (
            FieldAction::AppendImage(stored),
            FieldKind::List {
                image_list: true, ..
            },
            Value::Array(entries),
        ) => {
            let mut next = entries.clone();
            next.push(Value::String(stored.clone()));
            Value::Array(next)
        }
        (FieldAction::SetBool(checked), FieldKind::Toggle, _) => Value::Bool(*checked),
        (FieldAction::SetNumber(raw), FieldKind::Numeric, _) => Value::Number(parse_number(raw)),
        (FieldAction::SetText(text), kind, _) if kind.is_text() => Value::String(text.clone()),
        (FieldAction::ReplaceImage(stored), FieldKind::ImageText, _) => {
            Value::String(stored.clone())
        }
        _ => {
            tracing::debug!(?action, ?kind, "action does not apply to this field");
            return None;
        }
    };
    Some(next)
}

/// Numeric input coercion: integers stay integers, anything unparsable or non-finite is `0`.
fn parse_number(raw: &str) -> Number {
    let raw = raw.trim();
    if let Ok(integer) = raw.parse::<i64>() {
        return Number::from(integer);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .unwrap_or_else(|| Number::from(0))
}
