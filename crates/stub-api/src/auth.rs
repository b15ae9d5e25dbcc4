//! Bearer-token check and the small part of `/auth` the stub serves.

use crate::error::{StubError, StubResult};
use crate::state::StubState;
use axum::extract::{Query, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use folio_types::Subdomain;
use serde::Deserialize;
use serde_json::{json, Value};

/// Validates the provided bearer token against the configured one.
pub fn validate_token(state: &StubState, provided: Option<&str>) -> StubResult<()> {
    match provided {
        Some(token) if !token.is_empty() && token == state.token() => Ok(()),
        _ => Err(StubError::Unauthorized),
    }
}

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

pub(crate) async fn require_bearer(
    State(state): State<StubState>,
    request: Request,
    next: Next,
) -> StubResult<Response> {
    if let Err(err) = validate_token(&state, bearer(&request)) {
        tracing::debug!(path = %request.uri().path(), "Rejected request without a valid token");
        return Err(err);
    }
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginReq {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Any non-empty credentials sign in as the single stub account.
pub(crate) async fn login(
    State(state): State<StubState>,
    Json(req): Json<LoginReq>,
) -> StubResult<Json<Value>> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(StubError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let subdomain = state.data().subdomain().to_string();
    let name = email.split('@').next().unwrap_or(email);
    tracing::info!(email = %email, "Signed in");

    Ok(Json(json!({
        "message": "Logged in",
        "token": state.token(),
        "user": {
            "id": "stub-user",
            "name": name,
            "email": email,
            "type": "freelancer",
            "subdomain": subdomain,
            "isVerified": true,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityQuery {
    #[serde(default)]
    subdomain: String,
}

pub(crate) async fn subdomain_availability(
    State(state): State<StubState>,
    Query(query): Query<AvailabilityQuery>,
) -> StubResult<Json<Value>> {
    let subdomain =
        Subdomain::parse(&query.subdomain).map_err(|e| StubError::BadRequest(e.to_string()))?;

    let response = match state.data().subdomain_conflict(&subdomain) {
        Some(reason) => json!({
            "available": false,
            "subdomain": subdomain.as_str(),
            "message": reason,
        }),
        None => json!({
            "available": true,
            "subdomain": subdomain.as_str(),
            "message": "Subdomain is available.",
        }),
    };
    Ok(Json(response))
}
