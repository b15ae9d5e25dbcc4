//! reqwest transport for the portfolio API.

use crate::AuthClient;
use async_trait::async_trait;
use folio_core::{
    unwrap_envelope, ApiMessage, CoreConfig, FolioError, FolioResult, PortfolioApi,
    SessionHandle, UploadFile, UploadedImage, UploadedImages,
};
use folio_types::LanguageMode;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Connection pool, API base URL and session shared by every request.
///
/// Cloning is cheap; clones share the pool and the session.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base: Url,
    session: SessionHandle,
}

impl HttpClient {
    /// Builds the client from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::InvalidConfig` if the origin is not a usable base URL or the
    /// underlying client cannot be built.
    pub fn new(config: &CoreConfig, session: SessionHandle) -> FolioResult<Self> {
        let base = Url::parse(config.api_origin()).map_err(|e| {
            FolioError::InvalidConfig(format!(
                "invalid api origin {:?}: {e}",
                config.api_origin()
            ))
        })?;
        if base.cannot_be_a_base() {
            return Err(FolioError::InvalidConfig(format!(
                "api origin {base} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FolioError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded `segments` to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> FolioResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FolioError::InvalidConfig(format!("api origin {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> FolioResult<RequestBuilder> {
        let builder = self.client.request(method, self.endpoint(segments)?);
        Ok(match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends the request and maps the response onto `FolioResult`.
    ///
    /// A 401 clears the session and broadcasts `SessionEvent::Unauthorized` before returning
    /// `FolioError::Unauthorized`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> FolioResult<Value> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;
        let body = parse_body(&bytes);

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("server rejected the session token");
            self.session.invalidate();
            return Err(FolioError::Unauthorized);
        }
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(FolioError::remote(
                Some(status.as_u16()),
                error_message(&body),
            ));
        }

        Ok(body)
    }

    pub(crate) async fn call(&self, method: Method, segments: &[&str]) -> FolioResult<Value> {
        self.send(self.request(method, segments)?).await
    }

    pub(crate) async fn call_json<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> FolioResult<Value>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(method, segments)?.json(body)).await
    }

    pub(crate) async fn call_multipart(&self, segments: &[&str], form: Form) -> FolioResult<Value> {
        self.send(self.request(Method::POST, segments)?.multipart(form))
            .await
    }
}

fn transport_error(err: reqwest::Error) -> FolioError {
    let message = if err.is_timeout() {
        "The request timed out.".to_string()
    } else {
        err.to_string()
    };
    tracing::debug!(error = %err, "transport failure");
    FolioError::remote(None, Some(message))
}

/// Empty bodies become `null`; bodies that are not JSON are kept as a string.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Server-supplied error text: `message`, then `error`.
fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

pub(crate) fn decode<T>(body: Value) -> FolioResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(body)
        .map_err(|e| FolioError::remote(None, Some(format!("unexpected response: {e}"))))
}

fn file_part(file: UploadFile) -> FolioResult<Part> {
    let UploadFile {
        file_name,
        media_type,
        bytes,
    } = file;
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(&media_type)
        .map_err(|_| FolioError::InvalidInput(format!("invalid media type {media_type:?}")))
}

/// [`PortfolioApi`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPortfolioApi {
    http: HttpClient,
}

impl HttpPortfolioApi {
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn new(config: &CoreConfig, session: SessionHandle) -> FolioResult<Self> {
        Ok(Self::from_client(HttpClient::new(config, session)?))
    }

    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Auth endpoints on the same connection pool and session.
    pub fn auth(&self) -> AuthClient {
        AuthClient::from_client(self.http.clone())
    }
}

#[async_trait]
impl PortfolioApi for HttpPortfolioApi {
    async fn create_portfolio(&self) -> FolioResult<Value> {
        let body = self.http.call(Method::POST, &["portfolio"]).await?;
        Ok(unwrap_envelope(body, "portfolio"))
    }

    async fn my_portfolio(&self) -> FolioResult<Value> {
        let body = self.http.call(Method::GET, &["portfolio", "me"]).await?;
        Ok(unwrap_envelope(body, "portfolio"))
    }

    async fn all_sections(&self) -> FolioResult<Value> {
        let body = self
            .http
            .call(Method::GET, &["portfolio", "sections", "all"])
            .await?;
        Ok(unwrap_envelope(body, "sections"))
    }

    async fn section(&self, section: &str) -> FolioResult<Value> {
        let body = self
            .http
            .call(Method::GET, &["portfolio", "section", section])
            .await?;
        Ok(unwrap_envelope(body, "section"))
    }

    async fn upsert_section(
        &self,
        section: &str,
        body: &Map<String, Value>,
    ) -> FolioResult<Value> {
        tracing::info!(section, "saving section");
        self.http
            .call_json(Method::PUT, &["portfolio", "section", section], body)
            .await
    }

    async fn clear_section(&self, section: &str) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call(Method::DELETE, &["portfolio", "section", section])
            .await?;
        decode(body)
    }

    async fn section_items(&self, section: &str) -> FolioResult<Vec<Value>> {
        let body = self
            .http
            .call(Method::GET, &["portfolio", "section", section, "items"])
            .await?;
        match unwrap_envelope(body, "items") {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => {
                tracing::debug!(section, response = %other, "items response is not a list");
                Ok(Vec::new())
            }
        }
    }

    async fn create_item(&self, section: &str, body: &Map<String, Value>) -> FolioResult<Value> {
        self.http
            .call_json(
                Method::POST,
                &["portfolio", "section", section, "items"],
                body,
            )
            .await
    }

    async fn update_item(
        &self,
        section: &str,
        item_id: &str,
        body: &Map<String, Value>,
    ) -> FolioResult<Value> {
        self.http
            .call_json(
                Method::PUT,
                &["portfolio", "section", section, "items", item_id],
                body,
            )
            .await
    }

    async fn delete_item(&self, section: &str, item_id: &str) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call(
                Method::DELETE,
                &["portfolio", "section", section, "items", item_id],
            )
            .await?;
        decode(body)
    }

    async fn set_section_active(&self, section: &str, active: bool) -> FolioResult<Value> {
        self.http
            .call_json(
                Method::PATCH,
                &["portfolio", "section", section, "active"],
                &json!({ "active": active }),
            )
            .await
    }

    async fn update_language_mode(&self, mode: LanguageMode) -> FolioResult<Value> {
        self.http
            .call_json(
                Method::PATCH,
                &["portfolio", "language"],
                &json!({ "languageMode": mode }),
            )
            .await
    }

    async fn publish(&self) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call(Method::POST, &["portfolio", "publish"])
            .await?;
        decode(body)
    }

    async fn unpublish(&self) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call(Method::POST, &["portfolio", "unpublish"])
            .await?;
        decode(body)
    }

    async fn upload_image(&self, file: UploadFile) -> FolioResult<UploadedImage> {
        tracing::info!(file = %file.file_name, bytes = file.bytes.len(), "uploading image");
        let form = Form::new().part("image", file_part(file)?);
        let body = self
            .http
            .call_multipart(&["portfolio", "upload", "image"], form)
            .await?;
        decode(body)
    }

    async fn upload_images(&self, files: Vec<UploadFile>) -> FolioResult<UploadedImages> {
        tracing::info!(count = files.len(), "uploading images");
        let mut form = Form::new();
        for file in files {
            form = form.part("images", file_part(file)?);
        }
        let body = self
            .http
            .call_multipart(&["portfolio", "upload", "images"], form)
            .await?;
        decode(body)
    }

    async fn delete_image(&self, file_path: &str) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call_json(
                Method::DELETE,
                &["portfolio", "upload", "image"],
                &json!({ "filePath": file_path }),
            )
            .await?;
        decode(body)
    }
}
