//! # Folio Stub
//!
//! In-memory development server for the portfolio API.
//!
//! Serves every endpoint the Folio client calls, so the editor and CLI can run without the
//! production backend:
//! - `/portfolio/**`: portfolio, sections, items and uploads (bearer token required)
//! - `/auth/login` and `/auth/subdomain/availability`
//! - `/uploads/**`: stored images, served from the upload directory
//! - `/health`
//!
//! All data lives in memory and is lost on restart. Uploaded images are written to disk through
//! `folio-files`.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod error;
mod portfolio;
pub mod state;
mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use error::{StubError, StubResult};
pub use state::{PortfolioData, StubState};

/// Largest request body accepted (uploads included).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Folio stub API is alive".into(),
    })
}

/// Serves the router on an already-bound listener until the process stops.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: tokio::net::TcpListener, state: StubState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Builds the full application router.
pub fn router(state: StubState) -> Router {
    let protected = Router::new()
        .route("/portfolio", post(portfolio::create_portfolio))
        .route("/portfolio/me", get(portfolio::my_portfolio))
        .route("/portfolio/sections/all", get(portfolio::all_sections))
        .route(
            "/portfolio/section/:section",
            get(portfolio::get_section)
                .put(portfolio::upsert_section)
                .delete(portfolio::clear_section),
        )
        .route(
            "/portfolio/section/:section/items",
            get(portfolio::list_items).post(portfolio::create_item),
        )
        .route(
            "/portfolio/section/:section/items/:item_id",
            put(portfolio::update_item).delete(portfolio::delete_item),
        )
        .route(
            "/portfolio/section/:section/active",
            patch(portfolio::set_active),
        )
        .route("/portfolio/language", patch(portfolio::update_language))
        .route("/portfolio/publish", post(portfolio::publish))
        .route("/portfolio/unpublish", post(portfolio::unpublish))
        .route(
            "/portfolio/upload/image",
            post(uploads::upload_image).delete(uploads::delete_image),
        )
        .route("/portfolio/upload/images", post(uploads::upload_images))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/subdomain/availability",
            get(auth::subdomain_availability),
        )
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(state.images().root()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
