//! In-memory `PortfolioApi` that records every call.
#![allow(dead_code)]

use async_trait::async_trait;
use folio_core::{
    ApiMessage, FolioError, FolioResult, PortfolioApi, UploadFile, UploadedImage, UploadedImages,
};
use folio_types::LanguageMode;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreatePortfolio,
    MyPortfolio,
    AllSections,
    Section(String),
    SectionItems(String),
    UpsertSection(String, Value),
    ClearSection(String),
    CreateItem(String, Value),
    UpdateItem(String, String, Value),
    DeleteItem(String, String),
    SetActive(String, bool),
    LanguageMode(LanguageMode),
    Publish,
    Unpublish,
    UploadImage(String),
    UploadImages(Vec<String>),
    DeleteImage(String),
}

#[derive(Default)]
struct State {
    portfolio: Option<Value>,
    required: HashMap<String, Vec<String>>,
    documents: HashMap<String, Map<String, Value>>,
    items: HashMap<String, Vec<Value>>,
    raw_documents: HashMap<String, Value>,
    next_id: usize,
}

/// Fake API. Operations named in `fail` return a remote error until cleared.
#[derive(Default)]
pub struct RecordingApi {
    state: Mutex<State>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, (Option<u16>, Option<String>)>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(self, name: &str, document: Value, required: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let mut document = document.as_object().cloned().unwrap_or_default();
            document.insert("_id".into(), json!(format!("section-{name}")));
            state.documents.insert(name.to_string(), document);
            state.required.insert(
                name.to_string(),
                required.iter().map(|k| k.to_string()).collect(),
            );
        }
        self
    }

    pub fn with_items(self, name: &str, items: Vec<Value>) -> Self {
        self.state
            .lock()
            .unwrap()
            .items
            .insert(name.to_string(), items);
        self
    }

    /// Makes `section` answer with `body` as-is, whatever is stored.
    pub fn respond_section(&self, name: &str, body: Value) {
        self.state
            .lock()
            .unwrap()
            .raw_documents
            .insert(name.to_string(), body);
    }

    pub fn fail(&self, operation: &'static str, status: Option<u16>, message: Option<&str>) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation, (status, message.map(str::to_string)));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, predicate: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls().into_iter().filter(|c| predicate(c)).collect()
    }

    pub fn document(&self, name: &str) -> Option<Map<String, Value>> {
        self.state.lock().unwrap().documents.get(name).cloned()
    }

    fn record(&self, operation: &'static str, call: Call) -> FolioResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(operation) {
            Some((status, message)) => Err(FolioError::remote(*status, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortfolioApi for RecordingApi {
    async fn create_portfolio(&self) -> FolioResult<Value> {
        self.record("create_portfolio", Call::CreatePortfolio)?;
        let portfolio = json!({"_id": "p1", "languageMode": "both", "isPublished": false});
        self.state.lock().unwrap().portfolio = Some(portfolio.clone());
        Ok(portfolio)
    }

    async fn my_portfolio(&self) -> FolioResult<Value> {
        self.record("my_portfolio", Call::MyPortfolio)?;
        self.state
            .lock()
            .unwrap()
            .portfolio
            .clone()
            .ok_or_else(|| FolioError::remote(Some(404), Some("Portfolio not found".into())))
    }

    async fn all_sections(&self) -> FolioResult<Value> {
        self.record("all_sections", Call::AllSections)?;
        let state = self.state.lock().unwrap();
        let meta: Map<String, Value> = state
            .required
            .iter()
            .map(|(name, required)| (name.clone(), json!({ "required": required })))
            .collect();
        Ok(Value::Object(meta))
    }

    async fn section(&self, section: &str) -> FolioResult<Value> {
        self.record("section", Call::Section(section.into()))?;
        let state = self.state.lock().unwrap();
        if let Some(body) = state.raw_documents.get(section) {
            return Ok(body.clone());
        }
        Ok(state
            .documents
            .get(section)
            .cloned()
            .map(Value::Object)
            .unwrap_or_else(|| json!({})))
    }

    async fn upsert_section(
        &self,
        section: &str,
        body: &Map<String, Value>,
    ) -> FolioResult<Value> {
        self.record(
            "upsert_section",
            Call::UpsertSection(section.into(), Value::Object(body.clone())),
        )?;
        let mut document = body.clone();
        document.insert("_id".into(), json!(format!("section-{section}")));
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(section.to_string(), document.clone());
        Ok(Value::Object(document))
    }

    async fn clear_section(&self, section: &str) -> FolioResult<ApiMessage> {
        self.record("clear_section", Call::ClearSection(section.into()))?;
        let mut state = self.state.lock().unwrap();
        state.documents.remove(section);
        state.items.remove(section);
        Ok(ApiMessage {
            message: Some("Section cleared".into()),
        })
    }

    async fn section_items(&self, section: &str) -> FolioResult<Vec<Value>> {
        self.record("section_items", Call::SectionItems(section.into()))?;
        let state = self.state.lock().unwrap();
        Ok(state.items.get(section).cloned().unwrap_or_default())
    }

    async fn create_item(&self, section: &str, body: &Map<String, Value>) -> FolioResult<Value> {
        self.record(
            "create_item",
            Call::CreateItem(section.into(), Value::Object(body.clone())),
        )?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut item = body.clone();
        item.insert("_id".into(), json!(format!("item-{}", state.next_id)));
        let item = Value::Object(item);
        state
            .items
            .entry(section.to_string())
            .or_default()
            .push(item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        section: &str,
        item_id: &str,
        body: &Map<String, Value>,
    ) -> FolioResult<Value> {
        self.record(
            "update_item",
            Call::UpdateItem(section.into(), item_id.into(), Value::Object(body.clone())),
        )?;
        let mut state = self.state.lock().unwrap();
        let items = state.items.entry(section.to_string()).or_default();
        let Some(slot) = items.iter_mut().find(|item| item["_id"] == json!(item_id)) else {
            return Err(FolioError::remote(Some(404), Some("Item not found".into())));
        };
        let mut item = body.clone();
        item.insert("_id".into(), json!(item_id));
        *slot = Value::Object(item);
        Ok(slot.clone())
    }

    async fn delete_item(&self, section: &str, item_id: &str) -> FolioResult<ApiMessage> {
        self.record(
            "delete_item",
            Call::DeleteItem(section.into(), item_id.into()),
        )?;
        let mut state = self.state.lock().unwrap();
        if let Some(items) = state.items.get_mut(section) {
            items.retain(|item| item["_id"] != json!(item_id));
        }
        Ok(ApiMessage::default())
    }

    async fn set_section_active(&self, section: &str, active: bool) -> FolioResult<Value> {
        self.record("set_section_active", Call::SetActive(section.into(), active))?;
        let mut state = self.state.lock().unwrap();
        let document = state.documents.entry(section.to_string()).or_default();
        document.insert("active".into(), json!(active));
        Ok(Value::Object(document.clone()))
    }

    async fn update_language_mode(&self, mode: LanguageMode) -> FolioResult<Value> {
        self.record("update_language_mode", Call::LanguageMode(mode))?;
        Ok(json!({ "languageMode": mode.as_str() }))
    }

    async fn publish(&self) -> FolioResult<ApiMessage> {
        self.record("publish", Call::Publish)?;
        Ok(ApiMessage::default())
    }

    async fn unpublish(&self) -> FolioResult<ApiMessage> {
        self.record("unpublish", Call::Unpublish)?;
        Ok(ApiMessage::default())
    }

    async fn upload_image(&self, file: UploadFile) -> FolioResult<UploadedImage> {
        self.record("upload_image", Call::UploadImage(file.file_name.clone()))?;
        Ok(UploadedImage {
            file_path: Some(format!("/uploads/{}", file.file_name)),
            url: None,
            message: None,
        })
    }

    async fn upload_images(&self, files: Vec<UploadFile>) -> FolioResult<UploadedImages> {
        let names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        self.record("upload_images", Call::UploadImages(names.clone()))?;
        Ok(UploadedImages {
            file_paths: names.iter().map(|n| format!("/uploads/{n}")).collect(),
            urls: Vec::new(),
            message: None,
        })
    }

    async fn delete_image(&self, file_path: &str) -> FolioResult<ApiMessage> {
        self.record("delete_image", Call::DeleteImage(file_path.into()))?;
        Ok(ApiMessage::default())
    }
}

pub fn png(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}
