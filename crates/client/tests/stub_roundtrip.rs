//! HTTP client against the in-memory development server.

use folio_client::{AuthClient, HttpPortfolioApi, LoginRequest};
use folio_core::{
    bootstrap_portfolio, CoreConfig, FieldAction, FolioError, FormTarget, PortfolioApi,
    SectionEditor, Session, SessionEvent, SessionHandle, UploadCoordinator, UploadFile,
};
use folio_stub::StubState;
use folio_types::{LanguageMode, Subdomain};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TOKEN: &str = "stub-token";

const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

struct Harness {
    _uploads: TempDir,
    config: CoreConfig,
}

impl Harness {
    async fn start() -> Self {
        let uploads = TempDir::new().unwrap();
        let state = StubState::open(TOKEN, uploads.path()).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(folio_stub::serve(listener, state));

        let config = CoreConfig::new(format!("http://{addr}"), Duration::from_secs(5), 16).unwrap();
        Self {
            _uploads: uploads,
            config,
        }
    }

    fn api(&self, token: Option<&str>) -> HttpPortfolioApi {
        let session = SessionHandle::in_memory(Session {
            token: token.map(str::to_string),
            ..Session::default()
        });
        HttpPortfolioApi::new(&self.config, session).unwrap()
    }
}

fn png(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", PNG.to_vec())
}

#[tokio::test]
async fn test_login_then_edit_a_section() {
    let harness = Harness::start().await;
    let api = harness.api(None);

    let auth = api
        .auth()
        .login(&LoginRequest {
            email: "jane@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(auth.token.as_deref(), Some(TOKEN));
    assert_eq!(api.http().session().token().as_deref(), Some(TOKEN));

    let portfolio = bootstrap_portfolio(&api).await.unwrap();
    assert_eq!(portfolio["languageMode"], json!("both"));

    let document = json!({"title": "", "images": []});
    api.upsert_section("services", document.as_object().unwrap())
        .await
        .unwrap();

    let shared: Arc<dyn PortfolioApi> = Arc::new(api.clone());
    let uploads = Arc::new(UploadCoordinator::new(shared.clone()));
    let mut editor = SectionEditor::open(shared, uploads, &harness.config, "services");
    editor.load().await.unwrap();
    assert_eq!(editor.required_keys(), ["title"]);

    editor.edit(
        FormTarget::NewItem,
        &"title.en".parse().unwrap(),
        FieldAction::SetText("Consulting".into()),
    );
    editor.create_item().await.unwrap();
    assert_eq!(editor.items().len(), 1);
    assert_eq!(editor.items()[0]["title"]["en"], json!("Consulting"));

    // An empty title counts as missing.
    assert!(matches!(
        editor.save_section().await,
        Err(FolioError::MissingRequired(_))
    ));
    editor.edit(
        FormTarget::Section,
        &"title".parse().unwrap(),
        FieldAction::SetText("Services".into()),
    );
    editor.save_section().await.unwrap();

    let stored = api.section("services").await.unwrap();
    assert_eq!(stored["title"], json!("Services"));
}

#[tokio::test]
async fn test_upload_serve_and_delete_image() {
    let harness = Harness::start().await;
    let api = harness.api(Some(TOKEN));

    let uploaded = api.upload_image(png("cover.png")).await.unwrap();
    let path = uploaded.path().unwrap();
    assert!(path.starts_with("/uploads/"));
    assert!(path.ends_with(".png"));

    let served = reqwest::get(format!("{}{path}", harness.config.api_origin()))
        .await
        .unwrap();
    assert!(served.status().is_success());
    assert_eq!(served.bytes().await.unwrap().as_ref(), PNG);

    let many = api
        .upload_images(vec![png("a.png"), png("b.png")])
        .await
        .unwrap();
    assert_eq!(many.paths(), [path.clone(), path.clone()]);

    api.delete_image(&path).await.unwrap();
    let err = api.delete_image(&path).await.unwrap_err();
    assert!(matches!(
        err,
        FolioError::Remote { status: Some(404), ref message } if message.as_deref() == Some("Image not found")
    ));
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let harness = Harness::start().await;
    let api = harness.api(Some(TOKEN));

    let err = api
        .upload_image(UploadFile::new("notes.txt", "text/plain", b"hello".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Failed to upload image"), "Only image uploads are allowed");
    assert!(matches!(err, FolioError::Remote { status: Some(400), .. }));
}

#[tokio::test]
async fn test_unauthorized_response_invalidates_session() {
    let harness = Harness::start().await;
    let api = harness.api(Some("expired"));
    let mut events = api.http().session().subscribe();

    let err = api.section("skills").await.unwrap_err();

    assert!(matches!(err, FolioError::Unauthorized));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Unauthorized);
    assert!(api.http().session().token().is_none());
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let harness = Harness::start().await;
    let api = harness.api(Some(TOKEN));

    let body = json!({"title": "x"}).as_object().cloned().unwrap();
    let err = api
        .update_item("projects", "missing", &body)
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::Remote { status: Some(404), .. }));

    let created = api.create_item("projects", &body).await.unwrap();
    let id = created["item"]["_id"].as_str().unwrap().to_string();
    let items = api.section_items("projects").await.unwrap();
    assert_eq!(items[0]["_id"], json!(id));

    api.delete_item("projects", &id).await.unwrap();
    assert!(api.section_items("projects").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_portfolio_settings() {
    let harness = Harness::start().await;
    let api = harness.api(Some(TOKEN));
    api.create_portfolio().await.unwrap();

    api.update_language_mode(LanguageMode::Ar).await.unwrap();
    let message = api.publish().await.unwrap();
    assert_eq!(message.message.as_deref(), Some("Portfolio published"));

    let portfolio = api.my_portfolio().await.unwrap();
    assert_eq!(portfolio["languageMode"], json!("ar"));
    assert_eq!(portfolio["isPublished"], json!(true));

    api.unpublish().await.unwrap();
    assert_eq!(api.my_portfolio().await.unwrap()["isPublished"], json!(false));
}

#[tokio::test]
async fn test_subdomain_availability() {
    let harness = Harness::start().await;
    let auth = AuthClient::new(
        &harness.config,
        SessionHandle::in_memory(Session::default()),
    )
    .unwrap();

    let free = auth
        .check_subdomain(&Subdomain::parse("acme").unwrap())
        .await
        .unwrap();
    assert!(free.available);
    assert_eq!(free.subdomain.as_deref(), Some("acme"));

    let reserved = auth
        .check_subdomain(&Subdomain::parse("admin").unwrap())
        .await
        .unwrap();
    assert!(!reserved.available);
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = CoreConfig::new(format!("http://{addr}"), Duration::from_secs(2), 16).unwrap();
    let api =
        HttpPortfolioApi::new(&config, SessionHandle::in_memory(Session::default())).unwrap();

    let err = api.all_sections().await.unwrap_err();
    assert!(matches!(err, FolioError::Remote { status: None, message: Some(_) }));
}
