//! Image upload handlers backed by `folio-files`.

use crate::error::{StubError, StubResult};
use crate::state::StubState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use folio_files::detect_image_media_type;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteImageReq {
    file_path: String,
}

struct UploadedPart {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Collects every part named `field`, rejecting anything that is not an image.
async fn read_images(multipart: &mut Multipart, field: &str) -> StubResult<Vec<UploadedPart>> {
    let mut parts = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| StubError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part.file_name().map(str::to_string);
        let bytes = part
            .bytes()
            .await
            .map_err(|e| StubError::BadRequest(format!("Malformed upload: {e}")))?;
        if detect_image_media_type(&bytes).is_none() {
            return Err(StubError::BadRequest("Only image uploads are allowed".into()));
        }
        parts.push(UploadedPart {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Ok(parts)
}

pub(crate) async fn upload_image(
    State(state): State<StubState>,
    mut multipart: Multipart,
) -> StubResult<(StatusCode, Json<Value>)> {
    let part = read_images(&mut multipart, "image")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StubError::BadRequest("No image provided".into()))?;

    let stored = state
        .images()
        .store(&part.bytes, part.file_name.as_deref())?;
    tracing::info!(path = %stored.public_path, bytes = stored.size_bytes, "Image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Image uploaded",
            "filePath": stored.public_path,
            "url": stored.public_path,
        })),
    ))
}

pub(crate) async fn upload_images(
    State(state): State<StubState>,
    mut multipart: Multipart,
) -> StubResult<(StatusCode, Json<Value>)> {
    let parts = read_images(&mut multipart, "images").await?;
    if parts.is_empty() {
        return Err(StubError::BadRequest("No images provided".into()));
    }

    let mut paths = Vec::with_capacity(parts.len());
    for part in &parts {
        let stored = state
            .images()
            .store(&part.bytes, part.file_name.as_deref())?;
        paths.push(stored.public_path);
    }
    tracing::info!(count = paths.len(), "Images uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Images uploaded",
            "filePaths": paths,
            "urls": paths,
        })),
    ))
}

pub(crate) async fn delete_image(
    State(state): State<StubState>,
    Json(req): Json<DeleteImageReq>,
) -> StubResult<Json<Value>> {
    if state.images().delete(&req.file_path)? {
        tracing::info!(path = %req.file_path, "Image deleted");
        Ok(Json(json!({ "message": "Image deleted" })))
    } else {
        Err(StubError::NotFound("Image not found".into()))
    }
}
