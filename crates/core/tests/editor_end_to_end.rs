mod common;

use common::{png, Call, RecordingApi};
use folio_core::{
    bootstrap_portfolio, Control, ControlKind, CoreConfig, FieldAction, FieldPath, FolioError,
    FormTarget, Notice, NoticeLevel, PortfolioApi, RequestKind, SectionEditor, UploadCoordinator,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn editor_for(api: &Arc<RecordingApi>, section: &str) -> SectionEditor {
    let api: Arc<dyn PortfolioApi> = api.clone();
    let uploads = Arc::new(UploadCoordinator::new(api.clone()));
    SectionEditor::open(api, uploads, &CoreConfig::default(), section)
}

fn path(s: &str) -> FieldPath {
    s.parse().unwrap()
}

fn control<'a>(controls: &'a [Control], at: &FieldPath) -> &'a Control {
    controls.iter().find(|c| &c.path == at).unwrap()
}

fn errors(notices: &[Notice]) -> Vec<&str> {
    notices
        .iter()
        .filter(|n| n.level == NoticeLevel::Error)
        .map(|n| n.message.as_str())
        .collect()
}

#[tokio::test]
async fn test_services_section_round_trip() {
    let api = Arc::new(RecordingApi::new().with_section(
        "services",
        json!({"title": {"ar": "", "en": ""}, "images": []}),
        &["title"],
    ));
    let mut editor = editor_for(&api, "services");
    editor.load().await.unwrap();

    assert_eq!(editor.required_keys(), ["title"]);
    assert!(!editor.section_form().contains_key("_id"));
    assert!(editor.items().is_empty());
    let template_keys: Vec<_> = editor.new_item_form().keys().cloned().collect();
    assert_eq!(template_keys, ["title", "desc", "image"]);

    // New item from the synthesized template.
    assert!(editor.edit(
        FormTarget::NewItem,
        &path("title.en"),
        FieldAction::SetText("Web design".into())
    ));
    editor.create_item().await.unwrap();

    let created = api.calls_matching(|c| matches!(c, Call::CreateItem(..)));
    assert_eq!(
        created,
        [Call::CreateItem(
            "services".into(),
            json!({"title": {"ar": "", "en": "Web design"}, "desc": {"ar": "", "en": ""}, "image": ""})
        )]
    );

    // After the refresh the template is cloned from the stored item, minus its id.
    assert_eq!(editor.items().len(), 1);
    assert_eq!(editor.new_item_form()["title"]["en"], json!("Web design"));
    assert!(!editor.new_item_form().contains_key("_id"));

    // Section document edit and save.
    assert!(editor.edit(
        FormTarget::Section,
        &path("title.en"),
        FieldAction::SetText("My services".into())
    ));
    editor.save_section().await.unwrap();

    let saved = api.calls_matching(|c| matches!(c, Call::UpsertSection(..)));
    assert_eq!(
        saved,
        [Call::UpsertSection(
            "services".into(),
            json!({"title": {"ar": "", "en": "My services"}, "images": []})
        )]
    );

    let notices = editor.take_notices();
    assert_eq!(
        notices,
        [Notice::success("Item created."), Notice::success("Section saved.")]
    );
    assert!(editor.take_notices().is_empty());
}

#[tokio::test]
async fn test_missing_required_field_blocks_save() {
    let api = Arc::new(RecordingApi::new().with_section(
        "projects",
        json!({"title": "", "desc": "ok"}),
        &["title"],
    ));
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    let err = editor.save_section().await.unwrap_err();
    assert!(matches!(err, FolioError::MissingRequired(ref keys) if keys == &["title"]));
    assert!(api
        .calls_matching(|c| matches!(c, Call::UpsertSection(..)))
        .is_empty());
    assert_eq!(
        errors(&editor.take_notices()),
        ["Required fields missing: title"]
    );

    editor.edit(
        FormTarget::Section,
        &path("title"),
        FieldAction::SetText("x".into()),
    );
    editor.save_section().await.unwrap();
    assert_eq!(
        api.calls_matching(|c| matches!(c, Call::UpsertSection(..)))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_remote_failure_keeps_local_edits() {
    let api = Arc::new(RecordingApi::new().with_section("skills", json!({"title": "a"}), &[]));
    let mut editor = editor_for(&api, "skills");
    editor.load().await.unwrap();

    editor.edit(
        FormTarget::Section,
        &path("title"),
        FieldAction::SetText("b".into()),
    );

    api.fail("upsert_section", Some(500), None);
    assert!(editor.save_section().await.is_err());
    assert_eq!(editor.section_form()["title"], json!("b"));
    assert_eq!(errors(&editor.take_notices()), ["Failed to save section"]);

    api.fail("upsert_section", Some(422), Some("Title too short"));
    assert!(editor.save_section().await.is_err());
    assert_eq!(errors(&editor.take_notices()), ["Title too short"]);
}

#[tokio::test]
async fn test_partial_load_failure_applies_the_rest() {
    let api = Arc::new(RecordingApi::new().with_section(
        "skills",
        json!({"headline": "Tools", "active": true}),
        &["headline"],
    ));
    api.fail("section_items", Some(503), Some("Items unavailable"));

    let mut editor = editor_for(&api, "skills");
    let err = editor.load().await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(editor.section_form()["headline"], json!("Tools"));
    assert!(editor.is_active());
    assert_eq!(editor.required_keys(), ["headline"]);
    assert!(editor.new_item_form().contains_key("skillRate"));
    assert_eq!(errors(&editor.take_notices()), ["Items unavailable"]);
}

#[tokio::test]
async fn test_update_requires_a_selected_item() {
    let api = Arc::new(
        RecordingApi::new()
            .with_section("projects", json!({}), &[])
            .with_items(
                "projects",
                vec![json!({"_id": "p-1", "id": "legacy", "title": "Old"})],
            ),
    );
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    assert!(matches!(
        editor.update_item().await,
        Err(FolioError::NoItemSelected)
    ));
    assert_eq!(errors(&editor.take_notices()), ["Choose an item first."]);

    assert!(matches!(
        editor.begin_edit("nope"),
        Err(FolioError::ItemNotFound(_))
    ));
    editor.take_notices();

    editor.begin_edit("legacy").unwrap();
    assert_eq!(
        editor.editing_form().cloned().map(Value::Object),
        Some(json!({"title": "Old"}))
    );
}

#[tokio::test]
async fn test_edit_and_update_item() {
    let api = Arc::new(
        RecordingApi::new()
            .with_section("projects", json!({}), &[])
            .with_items(
                "projects",
                vec![json!({"_id": "p-1", "title": "Old", "images": []})],
            ),
    );
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    editor.begin_edit("p-1").unwrap();
    assert!(editor.editing_controls().is_some());
    assert!(editor.edit(
        FormTarget::Editing,
        &path("title"),
        FieldAction::SetText("New".into())
    ));
    assert!(editor.edit(
        FormTarget::Editing,
        &path("images"),
        FieldAction::AppendImage("/uploads/x.png".into())
    ));
    editor.update_item().await.unwrap();

    assert_eq!(
        api.calls_matching(|c| matches!(c, Call::UpdateItem(..))),
        [Call::UpdateItem(
            "projects".into(),
            "p-1".into(),
            json!({"title": "New", "images": ["/uploads/x.png"]})
        )]
    );
    assert_eq!(editor.items()[0]["title"], json!("New"));

    editor.delete_item("p-1").await.unwrap();
    assert!(editor.items().is_empty());
    assert_eq!(editor.editing_item_id(), None);
}

#[tokio::test]
async fn test_inline_upload_appends_and_clears_indicator() {
    let api = Arc::new(RecordingApi::new().with_section("projects", json!({"images": []}), &[]));
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    let images = path("images");
    assert!(
        editor
            .upload_into(FormTarget::Section, &images, png("cover.png"))
            .await
    );

    assert_eq!(editor.section_form()["images"], json!(["/uploads/cover.png"]));
    assert!(editor.uploading(FormTarget::Section).is_empty());
    assert_eq!(editor.registered_uploads(), ["/uploads/cover.png"]);
}

#[tokio::test]
async fn test_upload_in_flight_shows_indicator_and_keeps_edits() {
    let api = Arc::new(RecordingApi::new().with_section(
        "projects",
        json!({"title": "t", "images": []}),
        &[],
    ));
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    let images = path("images");
    let pending = editor
        .begin_upload_into(FormTarget::Section, &images, png("cover.png"))
        .unwrap();

    let controls = editor.section_controls();
    assert!(matches!(
        control(&controls, &images).kind,
        ControlKind::List { uploading: true, .. }
    ));
    assert!(editor.edit(
        FormTarget::Section,
        &path("title"),
        FieldAction::SetText("Edited".into())
    ));

    let outcome = tokio::spawn(pending.send()).await.unwrap();
    assert!(editor.finish_upload_into(outcome));

    assert_eq!(editor.section_form()["title"], json!("Edited"));
    assert_eq!(editor.section_form()["images"], json!(["/uploads/cover.png"]));
    assert!(editor.uploading(FormTarget::Section).is_empty());
    assert_eq!(editor.take_notices(), [Notice::success("Image uploaded.")]);
}

#[tokio::test]
async fn test_overlapping_uploads_all_land() {
    let api = Arc::new(RecordingApi::new().with_section(
        "services",
        json!({"images": [], "logo": ""}),
        &[],
    ));
    let mut editor = editor_for(&api, "services");
    editor.load().await.unwrap();

    let images = path("images");
    let first = editor
        .begin_upload_into(FormTarget::Section, &images, png("a.png"))
        .unwrap();
    let second = editor
        .begin_upload_into(FormTarget::Section, &images, png("b.png"))
        .unwrap();
    let logo = editor
        .begin_upload_into(FormTarget::Section, &path("logo"), png("logo.png"))
        .unwrap();
    assert_eq!(editor.uploading(FormTarget::Section).len(), 2);

    let (first, second, logo) = tokio::join!(first.send(), second.send(), logo.send());

    assert!(editor.finish_upload_into(second));
    assert!(editor.uploading(FormTarget::Section).contains(&images));
    assert!(editor.finish_upload_into(logo));
    assert!(editor.finish_upload_into(first));

    assert!(editor.uploading(FormTarget::Section).is_empty());
    assert_eq!(
        editor.section_form()["images"],
        json!(["/uploads/b.png", "/uploads/a.png"])
    );
    assert_eq!(editor.section_form()["logo"], json!("/uploads/logo.png"));
    assert_eq!(editor.registered_uploads().len(), 3);
}

#[tokio::test]
async fn test_upload_for_a_replaced_item_is_not_applied() {
    let api = Arc::new(
        RecordingApi::new()
            .with_section("projects", json!({}), &[])
            .with_items(
                "projects",
                vec![
                    json!({"_id": "p-1", "image": ""}),
                    json!({"_id": "p-2", "image": ""}),
                ],
            ),
    );
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    editor.begin_edit("p-1").unwrap();
    let pending = editor
        .begin_upload_into(FormTarget::Editing, &path("image"), png("a.png"))
        .unwrap();
    editor.begin_edit("p-2").unwrap();
    assert!(editor.uploading(FormTarget::Editing).is_empty());

    let outcome = pending.send().await;
    assert!(!editor.finish_upload_into(outcome));
    assert_eq!(editor.editing_form().unwrap()["image"], json!(""));
    assert_eq!(editor.registered_uploads(), ["/uploads/a.png"]);
}

#[tokio::test]
async fn test_save_runs_while_editing_continues() {
    let api = Arc::new(RecordingApi::new().with_section("skills", json!({"title": "a"}), &[]));
    let mut editor = editor_for(&api, "skills");
    editor.load().await.unwrap();

    editor.edit(
        FormTarget::Section,
        &path("title"),
        FieldAction::SetText("Saved".into()),
    );
    let pending = editor.begin_save_section().unwrap();
    assert_eq!(pending.kind(), RequestKind::SaveSection);

    editor.edit(
        FormTarget::Section,
        &path("title"),
        FieldAction::SetText("Later".into()),
    );
    assert_eq!(editor.section_form()["title"], json!("Later"));

    let outcome = pending.send().await;
    editor.finish(outcome).unwrap();

    assert_eq!(
        api.calls_matching(|c| matches!(c, Call::UpsertSection(..))),
        [Call::UpsertSection("skills".into(), json!({"title": "Saved"}))]
    );
    assert_eq!(editor.take_notices(), [Notice::success("Section saved.")]);
}

#[tokio::test]
async fn test_non_object_section_resets_active_flag() {
    let api = Arc::new(RecordingApi::new().with_section(
        "skills",
        json!({"title": "a", "active": true}),
        &[],
    ));
    let mut editor = editor_for(&api, "skills");
    editor.load().await.unwrap();
    assert!(editor.is_active());

    api.respond_section("skills", Value::Null);
    editor.load().await.unwrap();

    assert!(!editor.is_active());
    assert_eq!(editor.section_form()["title"], json!("a"));
}

#[tokio::test]
async fn test_inline_upload_failure_leaves_form_unchanged() {
    let api = Arc::new(RecordingApi::new().with_section("services", json!({"image": "old.png"}), &[]));
    let mut editor = editor_for(&api, "services");
    editor.load().await.unwrap();
    api.fail("upload_image", Some(413), Some("File too large"));

    let changed = editor
        .upload_into(FormTarget::Section, &path("image"), png("big.png"))
        .await;

    assert!(!changed);
    assert_eq!(editor.section_form()["image"], json!("old.png"));
    assert!(editor.uploading(FormTarget::Section).is_empty());
    assert!(editor.registered_uploads().is_empty());
    assert_eq!(errors(&editor.take_notices()), ["File too large"]);
}

#[tokio::test]
async fn test_uploads_panel_attach_and_delete() {
    let api = Arc::new(RecordingApi::new().with_section("projects", json!({"title": "t"}), &[]));
    let mut editor = editor_for(&api, "projects");
    editor.load().await.unwrap();

    let paths = editor
        .upload_many(vec![png("a.png"), png("b.png")])
        .await
        .unwrap();
    assert_eq!(paths, ["/uploads/a.png", "/uploads/b.png"]);
    assert!(editor.upload_many(Vec::new()).await.unwrap().is_empty());
    assert_eq!(
        api.calls_matching(|c| matches!(c, Call::UploadImages(_)))
            .len(),
        1
    );

    editor.attach_to_section("/uploads/a.png");
    editor.attach_to_section("/uploads/a.png");
    editor.attach_to_section("/uploads/b.png");
    assert_eq!(
        editor.section_form()["images"],
        json!(["/uploads/a.png", "/uploads/b.png"])
    );

    editor.attach_to_new_item("/uploads/b.png");
    assert!(editor.new_item_form()["images"]
        .as_array()
        .unwrap()
        .contains(&json!("/uploads/b.png")));

    api.fail("delete_image", Some(500), None);
    assert!(editor.delete_uploaded("/uploads/a.png").await.is_err());
    assert_eq!(editor.registered_uploads().len(), 2);
    assert_eq!(errors(&editor.take_notices()), ["Failed to delete image"]);

    api.clear_failures();
    editor.delete_uploaded("/uploads/a.png").await.unwrap();
    assert_eq!(editor.registered_uploads(), ["/uploads/b.png"]);
    assert_eq!(editor.section_form()["images"], json!(["/uploads/b.png"]));

    editor.remove_section_image("/uploads/b.png");
    assert_eq!(editor.section_form()["images"], json!([]));
}

#[tokio::test]
async fn test_active_toggle_and_clear() {
    let api = Arc::new(RecordingApi::new().with_section("skills", json!({"active": false}), &[]));
    let mut editor = editor_for(&api, "skills");
    editor.load().await.unwrap();
    assert!(!editor.is_active());

    editor.set_active(true).await.unwrap();
    assert!(editor.is_active());
    editor.set_active(false).await.unwrap();
    editor.clear_section().await.unwrap();

    let messages: Vec<_> = editor
        .take_notices()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(
        messages,
        [
            "Section is now open.",
            "Section is now closed.",
            "Section cleared."
        ]
    );
    assert!(api.document("skills").is_none());
}

#[tokio::test]
async fn test_bootstrap_creates_missing_portfolio() {
    let api = RecordingApi::new();
    let portfolio = bootstrap_portfolio(&api).await.unwrap();

    assert_eq!(portfolio["_id"], json!("p1"));
    assert_eq!(
        api.calls(),
        [Call::MyPortfolio, Call::CreatePortfolio, Call::MyPortfolio]
    );

    let again = bootstrap_portfolio(&api).await.unwrap();
    assert_eq!(again, portfolio);
    assert_eq!(api.calls().len(), 4);
}
