//! # Folio Core
//!
//! Schema-less editing engine for portfolio sections.
//!
//! Section documents and items come back from the portfolio API as arbitrary JSON. This crate
//! decides how each value should be edited, renders toolkit-neutral controls, applies edits as
//! pure replacements, and hosts the per-page editor state:
//! - [`classify`]: value → [`FieldKind`] from structure and key-name heuristics
//! - [`form`]: [`FieldRenderer`], [`Control`] trees and [`FieldAction`]s
//! - [`template`]: skeletons for new items
//! - [`image_path`]: stored references → renderable URLs
//! - [`uploads`]: upload registry and attach/detach helpers
//! - [`editor`]: the [`SectionEditor`] page state
//!
//! **No transport concerns**: HTTP lives in `folio-client`, which implements [`PortfolioApi`].

pub mod api;
pub mod classify;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod form;
pub mod image_path;
pub mod session;
pub mod template;
pub mod uploads;
pub mod validation;

pub use api::{
    bootstrap_portfolio, unwrap_envelope, ApiMessage, PortfolioApi, UploadFile, UploadedImage,
    UploadedImages,
};
pub use classify::{classify, title_case, FieldKind};
pub use config::CoreConfig;
pub use editor::{
    FormTarget, Notice, NoticeLevel, PageData, PendingRequest, PendingUpload, RequestKind,
    RequestOutcome, Response, SectionEditor, UploadOutcome,
};
pub use error::{FolioError, FolioResult};
pub use form::{
    Control, ControlKind, FieldAction, FieldPath, FieldRenderer, ImageAffordance, UploadMode,
};
pub use image_path::ImagePathResolver;
pub use session::{
    AuthUser, FileSessionStore, MemorySessionStore, Session, SessionEvent, SessionHandle,
    SessionStore,
};
pub use template::{synthesize_template, LocalizedText};
pub use uploads::{UploadCoordinator, UploadRegistry};
pub use validation::validate_required;
