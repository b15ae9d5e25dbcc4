//! `/portfolio` handlers: the portfolio record, sections and items.

use crate::error::{StubError, StubResult};
use crate::state::StubState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_types::LanguageMode;
use serde::Deserialize;
use serde_json::{json, Map, Value};

type Body = Json<Map<String, Value>>;

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveReq {
    active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LanguageReq {
    language_mode: String,
}

pub(crate) async fn create_portfolio(
    State(state): State<StubState>,
) -> StubResult<(StatusCode, Json<Value>)> {
    let portfolio = state.data().create_portfolio()?;
    tracing::info!("Portfolio created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Portfolio created", "portfolio": portfolio })),
    ))
}

pub(crate) async fn my_portfolio(State(state): State<StubState>) -> StubResult<Json<Value>> {
    let portfolio = state.data().portfolio()?;
    Ok(Json(json!({ "portfolio": portfolio })))
}

pub(crate) async fn all_sections(State(state): State<StubState>) -> Json<Value> {
    Json(json!({ "sections": state.data().sections_meta() }))
}

pub(crate) async fn get_section(
    State(state): State<StubState>,
    Path(section): Path<String>,
) -> Json<Value> {
    Json(json!({ "section": state.data().section(&section) }))
}

pub(crate) async fn upsert_section(
    State(state): State<StubState>,
    Path(section): Path<String>,
    Json(body): Body,
) -> Json<Value> {
    let saved = state.data().upsert_section(&section, &body);
    tracing::info!(section = %section, "Section saved");
    Json(json!({ "message": "Section saved", "section": saved }))
}

pub(crate) async fn clear_section(
    State(state): State<StubState>,
    Path(section): Path<String>,
) -> Json<Value> {
    state.data().clear_section(&section);
    tracing::info!(section = %section, "Section cleared");
    Json(json!({ "message": "Section cleared" }))
}

pub(crate) async fn list_items(
    State(state): State<StubState>,
    Path(section): Path<String>,
) -> Json<Value> {
    Json(json!({ "items": state.data().items(&section) }))
}

pub(crate) async fn create_item(
    State(state): State<StubState>,
    Path(section): Path<String>,
    Json(body): Body,
) -> (StatusCode, Json<Value>) {
    let item = state.data().create_item(&section, &body);
    tracing::info!(section = %section, "Item created");
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Item created", "item": item })),
    )
}

pub(crate) async fn update_item(
    State(state): State<StubState>,
    Path((section, item_id)): Path<(String, String)>,
    Json(body): Body,
) -> StubResult<Json<Value>> {
    let item = state.data().update_item(&section, &item_id, &body)?;
    Ok(Json(json!({ "message": "Item updated", "item": item })))
}

pub(crate) async fn delete_item(
    State(state): State<StubState>,
    Path((section, item_id)): Path<(String, String)>,
) -> StubResult<Json<Value>> {
    state.data().delete_item(&section, &item_id)?;
    Ok(Json(json!({ "message": "Item deleted" })))
}

pub(crate) async fn set_active(
    State(state): State<StubState>,
    Path(section): Path<String>,
    Json(req): Json<ActiveReq>,
) -> Json<Value> {
    let saved = state.data().set_active(&section, req.active);
    Json(json!({ "message": "Section status updated", "section": saved }))
}

pub(crate) async fn update_language(
    State(state): State<StubState>,
    Json(req): Json<LanguageReq>,
) -> StubResult<Json<Value>> {
    let mode: LanguageMode = req
        .language_mode
        .parse()
        .map_err(|e: folio_types::TypesError| StubError::BadRequest(e.to_string()))?;
    state.data().set_language_mode(mode)?;
    Ok(Json(
        json!({ "message": "Language mode updated", "languageMode": mode }),
    ))
}

pub(crate) async fn publish(State(state): State<StubState>) -> StubResult<Json<Value>> {
    state.data().set_published(true)?;
    Ok(Json(json!({ "message": "Portfolio published" })))
}

pub(crate) async fn unpublish(State(state): State<StubState>) -> StubResult<Json<Value>> {
    state.data().set_published(false)?;
    Ok(Json(json!({ "message": "Portfolio unpublished" })))
}
