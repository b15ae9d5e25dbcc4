//! In-memory portfolio data behind the development API.

use crate::error::{StubError, StubResult};
use folio_files::{FilesError, ImageStore};
use folio_types::{LanguageMode, Subdomain};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Sections present on startup, with the keys each one requires.
pub const SEEDED_SECTIONS: &[(&str, &[&str])] = &[
    ("skills", &["skillName"]),
    ("projects", &["title"]),
    ("services", &["title"]),
];

/// Subdomains never offered to users.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "app", "mail"];

const DEFAULT_SUBDOMAIN: &str = "demo";

/// Shared state for every handler. Cheap to clone.
#[derive(Clone)]
pub struct StubState {
    token: Arc<str>,
    images: ImageStore,
    data: Arc<Mutex<PortfolioData>>,
}

impl StubState {
    pub fn new(token: impl Into<String>, images: ImageStore) -> Self {
        Self {
            token: Arc::from(token.into()),
            images,
            data: Arc::new(Mutex::new(PortfolioData::seeded())),
        }
    }

    /// Opens (creating if needed) the upload directory and builds the state.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory cannot be used.
    pub fn open(token: impl Into<String>, upload_dir: impl AsRef<Path>) -> Result<Self, FilesError> {
        Ok(Self::new(token, ImageStore::open(upload_dir)?))
    }

    /// Bearer token accepted on `/portfolio/**`.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub(crate) fn data(&self) -> MutexGuard<'_, PortfolioData> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StubState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubState")
            .field("images", &self.images.root())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct PortfolioRecord {
    id: String,
    subdomain: String,
    language_mode: LanguageMode,
    is_published: bool,
}

#[derive(Debug, Clone)]
struct Section {
    id: String,
    required: Vec<String>,
    active: bool,
    document: Map<String, Value>,
    items: Vec<Map<String, Value>>,
}

impl Section {
    fn new(required: Vec<String>) -> Self {
        Self {
            id: new_id(),
            required,
            active: false,
            document: Map::new(),
            items: Vec::new(),
        }
    }

    fn render(&self) -> Value {
        let mut document = Map::new();
        document.insert("_id".into(), json!(self.id));
        for (key, value) in &self.document {
            document.insert(key.clone(), value.clone());
        }
        document.insert("active".into(), json!(self.active));
        Value::Object(document)
    }
}

/// Portfolio, sections and items. Sections not seeded are created on first use.
#[derive(Debug, Default)]
pub struct PortfolioData {
    portfolio: Option<PortfolioRecord>,
    sections: BTreeMap<String, Section>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn without_ids(body: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    body.iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn with_id(id: &str, body: &Map<String, Value>) -> Map<String, Value> {
    let mut item = Map::new();
    item.insert("_id".into(), json!(id));
    item.extend(without_ids(body, &["_id", "id"]));
    item
}

impl PortfolioData {
    pub fn seeded() -> Self {
        let sections = SEEDED_SECTIONS
            .iter()
            .map(|(name, required)| {
                let required = required.iter().map(|k| k.to_string()).collect();
                (name.to_string(), Section::new(required))
            })
            .collect();
        Self {
            portfolio: None,
            sections,
        }
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections
            .entry(name.to_string())
            .or_insert_with(|| Section::new(Vec::new()))
    }

    fn record(&self) -> StubResult<&PortfolioRecord> {
        self.portfolio
            .as_ref()
            .ok_or_else(|| StubError::NotFound("Portfolio not found".into()))
    }

    fn record_mut(&mut self) -> StubResult<&mut PortfolioRecord> {
        self.portfolio
            .as_mut()
            .ok_or_else(|| StubError::NotFound("Portfolio not found".into()))
    }

    pub fn subdomain(&self) -> &str {
        self.portfolio
            .as_ref()
            .map_or(DEFAULT_SUBDOMAIN, |p| p.subdomain.as_str())
    }

    pub fn create_portfolio(&mut self) -> StubResult<Value> {
        if self.portfolio.is_some() {
            return Err(StubError::Conflict("Portfolio already exists".into()));
        }
        self.portfolio = Some(PortfolioRecord {
            id: new_id(),
            subdomain: DEFAULT_SUBDOMAIN.into(),
            language_mode: LanguageMode::Both,
            is_published: false,
        });
        self.portfolio()
    }

    pub fn portfolio(&self) -> StubResult<Value> {
        let record = self.record()?;
        Ok(json!({
            "_id": record.id,
            "subdomain": record.subdomain,
            "languageMode": record.language_mode,
            "isPublished": record.is_published,
            "sections": self.sections.keys().collect::<Vec<_>>(),
        }))
    }

    /// Metadata per section: required keys, active flag and item count.
    pub fn sections_meta(&self) -> Value {
        let meta: Map<String, Value> = self
            .sections
            .iter()
            .map(|(name, section)| {
                (
                    name.clone(),
                    json!({
                        "required": section.required,
                        "active": section.active,
                        "itemCount": section.items.len(),
                    }),
                )
            })
            .collect();
        Value::Object(meta)
    }

    pub fn section(&mut self, name: &str) -> Value {
        self.section_mut(name).render()
    }

    /// Replaces the section document. `_id` is ignored and a boolean `active` updates the flag.
    pub fn upsert_section(&mut self, name: &str, body: &Map<String, Value>) -> Value {
        let section = self.section_mut(name);
        if let Some(Value::Bool(active)) = body.get("active") {
            section.active = *active;
        }
        section.document = without_ids(body, &["_id", "active"]);
        section.render()
    }

    pub fn clear_section(&mut self, name: &str) {
        let section = self.section_mut(name);
        section.document.clear();
        section.items.clear();
        section.active = false;
    }

    pub fn items(&mut self, name: &str) -> Vec<Value> {
        self.section_mut(name)
            .items
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    pub fn create_item(&mut self, name: &str, body: &Map<String, Value>) -> Value {
        let item = with_id(&new_id(), body);
        self.section_mut(name).items.push(item.clone());
        Value::Object(item)
    }

    pub fn update_item(
        &mut self,
        name: &str,
        item_id: &str,
        body: &Map<String, Value>,
    ) -> StubResult<Value> {
        let section = self.section_mut(name);
        let slot = section
            .items
            .iter_mut()
            .find(|item| item.get("_id") == Some(&json!(item_id)))
            .ok_or_else(|| StubError::NotFound(format!("Item not found: {item_id}")))?;
        *slot = with_id(item_id, body);
        Ok(Value::Object(slot.clone()))
    }

    pub fn delete_item(&mut self, name: &str, item_id: &str) -> StubResult<()> {
        let section = self.section_mut(name);
        let before = section.items.len();
        section
            .items
            .retain(|item| item.get("_id") != Some(&json!(item_id)));
        if section.items.len() == before {
            return Err(StubError::NotFound(format!("Item not found: {item_id}")));
        }
        Ok(())
    }

    pub fn set_active(&mut self, name: &str, active: bool) -> Value {
        let section = self.section_mut(name);
        section.active = active;
        section.render()
    }

    pub fn set_language_mode(&mut self, mode: LanguageMode) -> StubResult<()> {
        self.record_mut()?.language_mode = mode;
        Ok(())
    }

    pub fn set_published(&mut self, published: bool) -> StubResult<()> {
        self.record_mut()?.is_published = published;
        Ok(())
    }

    /// `None` when free, else the reason it cannot be used.
    pub fn subdomain_conflict(&self, subdomain: &Subdomain) -> Option<&'static str> {
        if RESERVED_SUBDOMAINS.contains(&subdomain.as_str()) {
            return Some("This subdomain is reserved.");
        }
        if self
            .portfolio
            .as_ref()
            .is_some_and(|p| p.subdomain == subdomain.as_str())
        {
            return Some("This subdomain is already taken.");
        }
        None
    }
}
