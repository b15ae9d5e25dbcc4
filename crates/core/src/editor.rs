//! Section editor page state.
//!
//! [`SectionEditor`] owns everything one open section page needs: the editable section form, the
//! item list, the new-item form, the item being edited, in-flight uploads and pending notices.
//! Edits only touch local state; explicit save/create/update calls send whole forms to the server
//! and reload afterwards.
//!
//! Remote work runs in three steps so the page stays usable while requests are in flight:
//! - `begin_*` takes `&mut self` briefly, marks uploads in progress and snapshots the payload into
//!   an owned request ([`PendingUpload`], [`PendingRequest`], or the future from
//!   [`SectionEditor::begin_load`]);
//! - `send` runs the request without touching the editor, so any number of them can be awaited
//!   or spawned at once while the caller keeps rendering and editing;
//! - `finish_*` applies the outcome to the editor's *current* state.
//!
//! The plain `async` methods (`load`, `save_section`, `upload_into`, ...) chain the three steps
//! for callers that do not need overlap.
//!
//! Every remote failure is caught in the finishing step, turned into an error [`Notice`] and
//! returned to the caller. Local forms are never rolled back.

use crate::api::{PortfolioApi, UploadFile};
use crate::config::CoreConfig;
use crate::constants::{ITEM_IDENTIFIER_KEYS, SECTION_IDENTIFIER_KEY};
use crate::form::{Control, FieldAction, FieldPath, FieldRenderer, UploadMode};
use crate::image_path::ImagePathResolver;
use crate::template::{item_identifier, strip_identifiers, synthesize_template};
use crate::uploads::{self, UploadCoordinator};
use crate::validation::{required_keys, validate_required};
use crate::{FolioError, FolioResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The three forms on a section page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormTarget {
    Section,
    NewItem,
    /// The item selected with [`SectionEditor::begin_edit`].
    Editing,
}

#[derive(Debug, Clone)]
struct EditingItem {
    id: String,
    form: Map<String, Value>,
}

/// Results of the three page fetches, applied with [`SectionEditor::finish_load`].
#[derive(Debug)]
pub struct PageData {
    meta: FolioResult<Value>,
    document: FolioResult<Value>,
    items: FolioResult<Vec<Value>>,
}

async fn fetch_page(api: Arc<dyn PortfolioApi>, section_name: String) -> PageData {
    let (meta, document, items) = tokio::join!(
        api.all_sections(),
        api.section(&section_name),
        api.section_items(&section_name),
    );
    PageData {
        meta,
        document,
        items,
    }
}

/// An inline image upload started with [`SectionEditor::begin_upload_into`].
#[must_use = "an upload does nothing until sent"]
pub struct PendingUpload {
    uploads: Arc<UploadCoordinator>,
    target: FormTarget,
    editing_id: Option<String>,
    path: FieldPath,
    mode: UploadMode,
    file: UploadFile,
}

impl PendingUpload {
    pub fn target(&self) -> FormTarget {
        self.target
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Uploads the file and registers the stored path.
    pub async fn send(self) -> UploadOutcome {
        let Self {
            uploads,
            target,
            editing_id,
            path,
            mode,
            file,
        } = self;
        let result = uploads.upload_and_register(file).await;
        UploadOutcome {
            target,
            editing_id,
            path,
            mode,
            result,
        }
    }
}

/// Finished inline upload, applied with [`SectionEditor::finish_upload_into`].
#[derive(Debug)]
pub struct UploadOutcome {
    target: FormTarget,
    editing_id: Option<String>,
    path: FieldPath,
    mode: UploadMode,
    result: FolioResult<Option<String>>,
}

/// What a [`PendingRequest`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    SaveSection,
    CreateItem,
    UpdateItem(String),
    DeleteItem(String),
    SetActive(bool),
    ClearSection,
    UploadOne,
    UploadMany,
    DeleteUploaded(String),
}

impl RequestKind {
    /// Section and item changes reload the page once they succeed.
    fn refreshes(&self) -> bool {
        !matches!(
            self,
            RequestKind::UploadOne | RequestKind::UploadMany | RequestKind::DeleteUploaded(_)
        )
    }

    fn failure(&self) -> &'static str {
        match self {
            RequestKind::SaveSection => "Failed to save section",
            RequestKind::CreateItem => "Failed to create item",
            RequestKind::UpdateItem(_) => "Failed to update item",
            RequestKind::DeleteItem(_) => "Failed to delete item",
            RequestKind::SetActive(_) => "Failed to update section active state",
            RequestKind::ClearSection => "Failed to clear section",
            RequestKind::UploadOne => "Failed to upload image",
            RequestKind::UploadMany => "Failed to upload images",
            RequestKind::DeleteUploaded(_) => "Failed to delete image",
        }
    }

    fn success(&self) -> String {
        match self {
            RequestKind::SaveSection => "Section saved.".into(),
            RequestKind::CreateItem => "Item created.".into(),
            RequestKind::UpdateItem(_) => "Item updated.".into(),
            RequestKind::DeleteItem(_) => "Item deleted.".into(),
            RequestKind::SetActive(true) => "Section is now open.".into(),
            RequestKind::SetActive(false) => "Section is now closed.".into(),
            RequestKind::ClearSection => "Section cleared.".into(),
            RequestKind::UploadOne => "Image uploaded.".into(),
            RequestKind::UploadMany => "Images uploaded.".into(),
            RequestKind::DeleteUploaded(_) => "Image deleted.".into(),
        }
    }
}

enum Request {
    SaveSection(Map<String, Value>),
    CreateItem(Map<String, Value>),
    UpdateItem {
        id: String,
        form: Map<String, Value>,
    },
    DeleteItem(String),
    SetActive(bool),
    ClearSection,
    UploadOne(UploadFile),
    UploadMany(Vec<UploadFile>),
    DeleteUploaded(String),
}

impl Request {
    fn kind(&self) -> RequestKind {
        match self {
            Request::SaveSection(_) => RequestKind::SaveSection,
            Request::CreateItem(_) => RequestKind::CreateItem,
            Request::UpdateItem { id, .. } => RequestKind::UpdateItem(id.clone()),
            Request::DeleteItem(id) => RequestKind::DeleteItem(id.clone()),
            Request::SetActive(active) => RequestKind::SetActive(*active),
            Request::ClearSection => RequestKind::ClearSection,
            Request::UploadOne(_) => RequestKind::UploadOne,
            Request::UploadMany(_) => RequestKind::UploadMany,
            Request::DeleteUploaded(path) => RequestKind::DeleteUploaded(path.clone()),
        }
    }
}

/// What the server handed back for a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Done,
    Uploaded(Option<String>),
    UploadedMany(Vec<String>),
}

/// A section, item or uploads-panel request with its payload already snapshotted.
#[must_use = "a request does nothing until sent"]
pub struct PendingRequest {
    api: Arc<dyn PortfolioApi>,
    uploads: Arc<UploadCoordinator>,
    section_name: String,
    request: Request,
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        self.request.kind()
    }

    /// Sends the request. Section and item changes fetch the page again when they succeed.
    pub async fn send(self) -> RequestOutcome {
        let kind = self.request.kind();
        let Self {
            api,
            uploads,
            section_name,
            request,
        } = self;
        let section = section_name.as_str();

        let result = match request {
            Request::SaveSection(form) => api
                .upsert_section(section, &form)
                .await
                .map(|_| Response::Done),
            Request::CreateItem(form) => api
                .create_item(section, &form)
                .await
                .map(|_| Response::Done),
            Request::UpdateItem { id, form } => api
                .update_item(section, &id, &form)
                .await
                .map(|_| Response::Done),
            Request::DeleteItem(id) => api
                .delete_item(section, &id)
                .await
                .map(|_| Response::Done),
            Request::SetActive(active) => api
                .set_section_active(section, active)
                .await
                .map(|_| Response::Done),
            Request::ClearSection => api.clear_section(section).await.map(|_| Response::Done),
            Request::UploadOne(file) => uploads
                .upload_and_register(file)
                .await
                .map(Response::Uploaded),
            Request::UploadMany(files) => uploads
                .upload_many(files)
                .await
                .map(Response::UploadedMany),
            Request::DeleteUploaded(path) => uploads
                .delete_registered_image(&path)
                .await
                .map(|()| Response::Done),
        };

        let page = match result {
            Ok(_) if kind.refreshes() => Some(fetch_page(api, section_name).await),
            _ => None,
        };

        RequestOutcome { kind, result, page }
    }
}

/// Finished request, applied with [`SectionEditor::finish`].
#[derive(Debug)]
pub struct RequestOutcome {
    kind: RequestKind,
    result: FolioResult<Response>,
    page: Option<PageData>,
}

impl RequestOutcome {
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }
}

pub struct SectionEditor {
    api: Arc<dyn PortfolioApi>,
    uploads: Arc<UploadCoordinator>,
    renderer: FieldRenderer,
    section_name: String,
    required: Vec<String>,
    section_form: Map<String, Value>,
    active: bool,
    items: Vec<Value>,
    new_item_form: Map<String, Value>,
    editing: Option<EditingItem>,
    /// In-flight upload count per field.
    uploading: HashMap<FormTarget, HashMap<FieldPath, usize>>,
    notices: Vec<Notice>,
}

impl SectionEditor {
    /// Opens an empty editor for `section_name`. Call [`load`](Self::load) to fetch its data.
    pub fn open(
        api: Arc<dyn PortfolioApi>,
        uploads: Arc<UploadCoordinator>,
        config: &CoreConfig,
        section_name: impl Into<String>,
    ) -> Self {
        let section_name = section_name.into();
        let renderer = FieldRenderer::new(
            ImagePathResolver::new(config.api_origin()),
            config.max_field_depth(),
        )
        .with_uploads(true);

        Self {
            api,
            uploads,
            renderer,
            new_item_form: synthesize_template(&section_name, &[]),
            section_name,
            required: Vec::new(),
            section_form: Map::new(),
            active: false,
            items: Vec::new(),
            editing: None,
            uploading: HashMap::new(),
            notices: Vec::new(),
        }
    }

    /// Fetches section metadata, the section document and its items concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; see [`finish_load`](Self::finish_load).
    pub async fn load(&mut self) -> FolioResult<()> {
        let page = self.begin_load().await;
        self.finish_load(page)
    }

    /// The three page fetches, detached from the editor.
    pub fn begin_load(&self) -> impl Future<Output = PageData> + Send + 'static {
        fetch_page(self.api.clone(), self.section_name.clone())
    }

    /// Applies fetched page data.
    ///
    /// Each failed fetch adds an error notice; the successful ones are still applied. The new-item
    /// form is re-synthesized from whatever items are known afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error.
    pub fn finish_load(&mut self, page: PageData) -> FolioResult<()> {
        let PageData {
            meta,
            document,
            items,
        } = page;
        let mut first_error = None;

        match meta {
            Ok(meta) => self.required = required_keys(meta.get(&self.section_name)),
            Err(err) => {
                self.report(&err, "Failed to load sections");
                first_error.get_or_insert(err);
            }
        }

        match document {
            Ok(Value::Object(document)) => {
                self.active = matches!(document.get("active"), Some(Value::Bool(true)));
                self.section_form = strip_identifiers(&document, &[SECTION_IDENTIFIER_KEY]);
            }
            Ok(other) => {
                tracing::debug!(
                    section = %self.section_name,
                    ?other,
                    "section document is not an object"
                );
                self.active = false;
            }
            Err(err) => {
                self.report(&err, "Failed to load section");
                first_error.get_or_insert(err);
            }
        }

        match items {
            Ok(items) => self.items = items,
            Err(err) => {
                self.report(&err, "Failed to load items");
                first_error.get_or_insert(err);
            }
        }

        self.new_item_form = synthesize_template(&self.section_name, &self.items);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn report(&mut self, err: &FolioError, fallback: &str) {
        tracing::error!(section = %self.section_name, error = %err, "{}", fallback);
        self.notices.push(Notice::error(err.user_message(fallback)));
    }

    /// Records an error notice and hands the error back.
    fn fail<T>(&mut self, err: FolioError, fallback: &str) -> FolioResult<T> {
        self.report(&err, fallback);
        Err(err)
    }

    /// Error notice for a request refused before anything was sent.
    fn refuse<T>(&mut self, err: FolioError) -> FolioResult<T> {
        self.notices.push(Notice::error(err.to_string()));
        Err(err)
    }

    pub fn section_name(&self) -> &str {
        &self.section_name
    }

    pub fn required_keys(&self) -> &[String] {
        &self.required
    }

    pub fn section_form(&self) -> &Map<String, Value> {
        &self.section_form
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn new_item_form(&self) -> &Map<String, Value> {
        &self.new_item_form
    }

    pub fn editing_item_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.id.as_str())
    }

    pub fn editing_form(&self) -> Option<&Map<String, Value>> {
        self.editing.as_ref().map(|e| &e.form)
    }

    pub fn form(&self, target: FormTarget) -> Option<&Map<String, Value>> {
        match target {
            FormTarget::Section => Some(&self.section_form),
            FormTarget::NewItem => Some(&self.new_item_form),
            FormTarget::Editing => self.editing_form(),
        }
    }

    fn set_form(&mut self, target: FormTarget, form: Map<String, Value>) {
        match target {
            FormTarget::Section => self.section_form = form,
            FormTarget::NewItem => self.new_item_form = form,
            FormTarget::Editing => {
                if let Some(editing) = self.editing.as_mut() {
                    editing.form = form;
                }
            }
        }
    }

    /// Paths of `target` with an upload in flight.
    pub fn uploading(&self, target: FormTarget) -> HashSet<FieldPath> {
        self.uploading
            .get(&target)
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Uploaded paths registered during this editing session.
    pub fn registered_uploads(&self) -> Vec<String> {
        self.uploads.registered()
    }

    /// Drains pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn section_controls(&self) -> Vec<Control> {
        self.renderer
            .render_form(&self.section_form, &self.uploading(FormTarget::Section))
    }

    pub fn new_item_controls(&self) -> Vec<Control> {
        self.renderer
            .render_form(&self.new_item_form, &self.uploading(FormTarget::NewItem))
    }

    /// Controls for the item being edited, if one is selected.
    pub fn editing_controls(&self) -> Option<Vec<Control>> {
        let form = self.editing_form()?;
        Some(
            self.renderer
                .render_form(form, &self.uploading(FormTarget::Editing)),
        )
    }

    /// Applies a field edit to one of the forms. Returns whether the form changed.
    pub fn edit(&mut self, target: FormTarget, path: &FieldPath, action: FieldAction) -> bool {
        let Some(form) = self.form(target) else {
            return false;
        };
        match self.renderer.apply_to_form(form, path, &action) {
            Some(next) => {
                self.set_form(target, next);
                true
            }
            None => false,
        }
    }

    /// Uploads `file` into the image field at `path`. Returns whether the form changed.
    pub async fn upload_into(
        &mut self,
        target: FormTarget,
        path: &FieldPath,
        file: UploadFile,
    ) -> bool {
        let Some(pending) = self.begin_upload_into(target, path, file) else {
            return false;
        };
        let outcome = pending.send().await;
        self.finish_upload_into(outcome)
    }

    /// Marks the image field at `path` as uploading and hands back the upload to run.
    ///
    /// Returns `None` when the form or field is gone, or the field does not take uploads.
    pub fn begin_upload_into(
        &mut self,
        target: FormTarget,
        path: &FieldPath,
        file: UploadFile,
    ) -> Option<PendingUpload> {
        let form = self.form(target)?;
        let Some(mode) = self.renderer.upload_mode(form, path) else {
            tracing::debug!(%path, "field does not accept uploads");
            return None;
        };

        *self
            .uploading
            .entry(target)
            .or_default()
            .entry(path.clone())
            .or_insert(0) += 1;

        Some(PendingUpload {
            uploads: self.uploads.clone(),
            target,
            editing_id: self.editing_item_id().map(str::to_string),
            path: path.clone(),
            mode,
            file,
        })
    }

    /// Clears the uploading mark and puts the stored reference into the field as it is now.
    /// Returns whether the form changed.
    ///
    /// Edits made while the upload ran are kept. Nothing is applied when the field no longer
    /// takes the reference, or the edited item changed in the meantime.
    pub fn finish_upload_into(&mut self, outcome: UploadOutcome) -> bool {
        let UploadOutcome {
            target,
            editing_id,
            path,
            mode,
            result,
        } = outcome;

        let same_item = target != FormTarget::Editing
            || editing_id.as_deref() == self.editing_item_id();
        if same_item {
            if let Some(paths) = self.uploading.get_mut(&target) {
                if let Some(count) = paths.get_mut(&path) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        paths.remove(&path);
                    }
                }
            }
        }

        let stored = match result {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::warn!(%path, "upload returned no image path");
                return false;
            }
            Err(err) => {
                self.report(&err, "Failed to upload image");
                return false;
            }
        };

        let next = self
            .form(target)
            .filter(|_| same_item)
            .and_then(|form| {
                self.renderer
                    .apply_to_form(form, &path, &mode.action(stored))
            });
        match next {
            Some(next) => {
                self.set_form(target, next);
                self.notices.push(Notice::success("Image uploaded."));
                true
            }
            None => {
                tracing::debug!(%path, "field changed while uploading");
                false
            }
        }
    }

    fn pending(&self, request: Request) -> PendingRequest {
        PendingRequest {
            api: self.api.clone(),
            uploads: self.uploads.clone(),
            section_name: self.section_name.clone(),
            request,
        }
    }

    /// Applies a finished request.
    ///
    /// # Errors
    ///
    /// The remote error, after recording an error notice.
    pub fn finish(&mut self, outcome: RequestOutcome) -> FolioResult<Response> {
        let RequestOutcome { kind, result, page } = outcome;
        let response = match result {
            Ok(response) => response,
            Err(err) => return self.fail(err, kind.failure()),
        };

        match &kind {
            RequestKind::SaveSection => {
                tracing::info!(section = %self.section_name, "section saved");
            }
            RequestKind::CreateItem => {
                tracing::info!(section = %self.section_name, "item created");
            }
            RequestKind::UpdateItem(id) => {
                tracing::info!(section = %self.section_name, item = %id, "item updated");
            }
            RequestKind::DeleteItem(id) => {
                tracing::info!(section = %self.section_name, item = %id, "item deleted");
                if self.editing_item_id() == Some(id.as_str()) {
                    self.cancel_edit();
                }
            }
            RequestKind::ClearSection => {
                tracing::info!(section = %self.section_name, "section cleared");
            }
            RequestKind::DeleteUploaded(path) => {
                self.section_form = uploads::remove_from_section(&self.section_form, path);
            }
            RequestKind::SetActive(_) | RequestKind::UploadOne | RequestKind::UploadMany => {}
        }

        if let Some(page) = page {
            if let Err(err) = self.finish_load(page) {
                tracing::debug!(section = %self.section_name, error = %err, "refresh incomplete");
            }
        }

        self.notices.push(Notice::success(kind.success()));
        Ok(response)
    }

    async fn run(&mut self, pending: PendingRequest) -> FolioResult<Response> {
        let outcome = pending.send().await;
        self.finish(outcome)
    }

    /// Saves the section form after checking required fields.
    ///
    /// # Errors
    ///
    /// `FolioError::MissingRequired` without contacting the server, or the remote error.
    pub async fn save_section(&mut self) -> FolioResult<()> {
        let pending = self.begin_save_section()?;
        self.run(pending).await.map(drop)
    }

    /// Validates and snapshots the section form.
    ///
    /// # Errors
    ///
    /// `FolioError::MissingRequired`, with an error notice naming the keys.
    pub fn begin_save_section(&mut self) -> FolioResult<PendingRequest> {
        if let Err(err) = validate_required(&self.section_form, &self.required) {
            return self.refuse(err);
        }
        Ok(self.pending(Request::SaveSection(self.section_form.clone())))
    }

    pub async fn create_item(&mut self) -> FolioResult<()> {
        let pending = self.begin_create_item();
        self.run(pending).await.map(drop)
    }

    pub fn begin_create_item(&self) -> PendingRequest {
        self.pending(Request::CreateItem(self.new_item_form.clone()))
    }

    /// Selects an item for editing: its form is a copy without identifier keys.
    ///
    /// # Errors
    ///
    /// `FolioError::ItemNotFound` when no loaded item has that id.
    pub fn begin_edit(&mut self, item_id: &str) -> FolioResult<()> {
        let found = self
            .items
            .iter()
            .find(|item| item_identifier(item).as_deref() == Some(item_id))
            .and_then(Value::as_object);

        let Some(item) = found else {
            return self.refuse(FolioError::ItemNotFound(item_id.to_string()));
        };

        self.editing = Some(EditingItem {
            id: item_id.to_string(),
            form: strip_identifiers(item, ITEM_IDENTIFIER_KEYS),
        });
        self.uploading.remove(&FormTarget::Editing);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.uploading.remove(&FormTarget::Editing);
    }

    /// Sends the edited item back to the server.
    ///
    /// # Errors
    ///
    /// `FolioError::NoItemSelected` when nothing is being edited, or the remote error.
    pub async fn update_item(&mut self) -> FolioResult<()> {
        let pending = self.begin_update_item()?;
        self.run(pending).await.map(drop)
    }

    /// Snapshots the edited item.
    ///
    /// # Errors
    ///
    /// `FolioError::NoItemSelected`, with an error notice.
    pub fn begin_update_item(&mut self) -> FolioResult<PendingRequest> {
        let Some(editing) = self.editing.clone() else {
            return self.refuse(FolioError::NoItemSelected);
        };
        Ok(self.pending(Request::UpdateItem {
            id: editing.id,
            form: editing.form,
        }))
    }

    pub async fn delete_item(&mut self, item_id: &str) -> FolioResult<()> {
        let pending = self.begin_delete_item(item_id);
        self.run(pending).await.map(drop)
    }

    pub fn begin_delete_item(&self, item_id: &str) -> PendingRequest {
        self.pending(Request::DeleteItem(item_id.to_string()))
    }

    /// Opens or closes the section on the public portfolio.
    pub async fn set_active(&mut self, active: bool) -> FolioResult<()> {
        let pending = self.begin_set_active(active);
        self.run(pending).await.map(drop)
    }

    pub fn begin_set_active(&self, active: bool) -> PendingRequest {
        self.pending(Request::SetActive(active))
    }

    pub async fn clear_section(&mut self) -> FolioResult<()> {
        let pending = self.begin_clear_section();
        self.run(pending).await.map(drop)
    }

    pub fn begin_clear_section(&self) -> PendingRequest {
        self.pending(Request::ClearSection)
    }

    /// Uploads one file from the uploads panel.
    pub async fn upload_one(&mut self, file: UploadFile) -> FolioResult<Option<String>> {
        let pending = self.begin_upload_one(file);
        match self.run(pending).await? {
            Response::Uploaded(path) => Ok(path),
            _ => Ok(None),
        }
    }

    pub fn begin_upload_one(&self, file: UploadFile) -> PendingRequest {
        self.pending(Request::UploadOne(file))
    }

    /// Uploads several files from the uploads panel. Nothing is sent for an empty selection.
    pub async fn upload_many(&mut self, files: Vec<UploadFile>) -> FolioResult<Vec<String>> {
        let Some(pending) = self.begin_upload_many(files) else {
            return Ok(Vec::new());
        };
        match self.run(pending).await? {
            Response::UploadedMany(paths) => Ok(paths),
            _ => Ok(Vec::new()),
        }
    }

    /// `None` for an empty selection.
    pub fn begin_upload_many(&self, files: Vec<UploadFile>) -> Option<PendingRequest> {
        (!files.is_empty()).then(|| self.pending(Request::UploadMany(files)))
    }

    pub fn attach_to_section(&mut self, path: &str) {
        self.section_form = uploads::attach_to_section(&self.section_form, path);
    }

    pub fn attach_to_new_item(&mut self, path: &str) {
        self.new_item_form = uploads::attach_to_item(&self.new_item_form, path);
    }

    pub fn remove_section_image(&mut self, path: &str) {
        self.section_form = uploads::remove_from_section(&self.section_form, path);
    }

    /// Deletes an uploaded image on the server and drops it from the registry and the section.
    pub async fn delete_uploaded(&mut self, path: &str) -> FolioResult<()> {
        let pending = self.begin_delete_uploaded(path);
        self.run(pending).await.map(drop)
    }

    pub fn begin_delete_uploaded(&self, path: &str) -> PendingRequest {
        self.pending(Request::DeleteUploaded(path.to_string()))
    }
}

impl std::fmt::Debug for SectionEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionEditor")
            .field("section_name", &self.section_name)
            .field("required", &self.required)
            .field("active", &self.active)
            .field("items", &self.items.len())
            .field("editing", &self.editing_item_id())
            .finish_non_exhaustive()
    }
}
