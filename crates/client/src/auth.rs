//! Account endpoints.
//!
//! Successful sign-ins are written straight into the shared [`SessionHandle`], so the next
//! portfolio request already carries the new bearer token.

use crate::http::{decode, HttpClient};
use folio_core::{ApiMessage, AuthUser, CoreConfig, FolioResult, SessionHandle};
use folio_types::Subdomain;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthRequest {
    pub id_token: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Auth response reduced to the parts the client uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSuccess {
    pub message: Option<String>,
    pub token: Option<String>,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainAvailability {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Pulls the token and user out of the shapes the auth server is known to return.
///
/// Token: `token`, `accessToken`, `data.token`, `data.accessToken`. User: `user`, `data.user`.
/// A user object that does not parse is dropped.
pub fn normalize_auth_response(payload: &Value) -> AuthSuccess {
    let data = payload.get("data");
    let string_at = |value: Option<&Value>, key: &str| {
        value
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let token = string_at(Some(payload), "token")
        .or_else(|| string_at(Some(payload), "accessToken"))
        .or_else(|| string_at(data, "token"))
        .or_else(|| string_at(data, "accessToken"));

    let user = payload
        .get("user")
        .or_else(|| data.and_then(|d| d.get("user")))
        .filter(|u| u.is_object())
        .and_then(|u| match serde_json::from_value::<AuthUser>(u.clone()) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed user in auth response");
                None
            }
        });

    AuthSuccess {
        message: string_at(Some(payload), "message"),
        token,
        user,
    }
}

/// Keeps a non-blank subdomain as given, otherwise generates a temporary one from `seed`.
pub fn ensure_subdomain(given: Option<&str>, seed: &str) -> String {
    match given {
        Some(subdomain) if !subdomain.trim().is_empty() => subdomain.to_string(),
        _ => Subdomain::temporary(seed).as_str().to_string(),
    }
}

/// Client for the `/auth` endpoints.
#[derive(Clone, Debug)]
pub struct AuthClient {
    http: HttpClient,
}

impl AuthClient {
    /// # Errors
    ///
    /// See [`HttpClient::new`].
    pub fn new(config: &CoreConfig, session: SessionHandle) -> FolioResult<Self> {
        Ok(Self::from_client(HttpClient::new(config, session)?))
    }

    pub fn from_client(http: HttpClient) -> Self {
        Self { http }
    }

    fn session(&self) -> &SessionHandle {
        self.http.session()
    }

    /// Registers an account and remembers its email as awaiting verification.
    pub async fn register(&self, mut request: RegisterRequest) -> FolioResult<AuthSuccess> {
        let seed = [request.name.as_str(), request.email.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("user")
            .to_string();
        request.subdomain = Some(ensure_subdomain(request.subdomain.as_deref(), &seed));

        let body = self
            .http
            .call_json(Method::POST, &["auth", "register"], &request)
            .await?;
        self.session()
            .set_pending_email(Some(request.email.clone()))?;
        Ok(normalize_auth_response(&body))
    }

    pub async fn login(&self, request: &LoginRequest) -> FolioResult<AuthSuccess> {
        let body = self
            .http
            .call_json(Method::POST, &["auth", "login"], request)
            .await?;
        let auth = normalize_auth_response(&body);
        self.store_token(&auth)?;
        Ok(auth)
    }

    pub async fn google_auth(&self, mut request: GoogleAuthRequest) -> FolioResult<AuthSuccess> {
        request.subdomain = Some(ensure_subdomain(
            request.subdomain.as_deref(),
            "google-user",
        ));

        let body = self
            .http
            .call_json(Method::POST, &["auth", "google"], &request)
            .await?;
        let auth = normalize_auth_response(&body);
        self.store_token(&auth)?;
        Ok(auth)
    }

    /// Confirms the emailed code. The pending email is cleared on success.
    pub async fn verify_email(&self, email: &str, code: &str) -> FolioResult<AuthSuccess> {
        let body = self
            .http
            .call_json(
                Method::POST,
                &["auth", "verify-email"],
                &json!({ "email": email, "code": code }),
            )
            .await?;
        let auth = normalize_auth_response(&body);
        if auth.token.is_some() {
            self.store_token(&auth)?;
        } else if let Some(user) = auth.user.clone() {
            self.session().set_user(user)?;
        }
        self.session().set_pending_email(None)?;
        Ok(auth)
    }

    pub async fn resend_verification(&self, email: &str) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call_json(
                Method::POST,
                &["auth", "resend-verification"],
                &json!({ "email": email }),
            )
            .await?;
        decode(body)
    }

    pub async fn forgot_password(&self, email: &str) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call_json(
                Method::POST,
                &["auth", "forgot-password"],
                &json!({ "email": email }),
            )
            .await?;
        decode(body)
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> FolioResult<ApiMessage> {
        let body = self
            .http
            .call_json(Method::POST, &["auth", "reset-password"], request)
            .await?;
        decode(body)
    }

    pub async fn check_subdomain(&self, subdomain: &Subdomain) -> FolioResult<SubdomainAvailability> {
        let request = self
            .http
            .request(Method::GET, &["auth", "subdomain", "availability"])?
            .query(&[("subdomain", subdomain.as_str())]);
        let body = self.http.send(request).await?;
        decode(body)
    }

    /// Replaces the account's subdomain and updates the stored user to match.
    pub async fn update_subdomain(&self, subdomain: &Subdomain) -> FolioResult<AuthSuccess> {
        let body = self
            .http
            .call_json(
                Method::PATCH,
                &["auth", "subdomain"],
                &json!({ "subdomain": subdomain.as_str() }),
            )
            .await?;
        let auth = normalize_auth_response(&body);

        let current = self.session().current()?;
        let user = auth.user.clone().or_else(|| {
            current.user.clone().map(|user| AuthUser {
                subdomain: Some(subdomain.as_str().to_string()),
                ..user
            })
        });
        match (&auth.token, user) {
            (Some(token), user) => self.session().login(token.clone(), user.or(current.user))?,
            (None, Some(user)) => self.session().set_user(user)?,
            (None, None) => {}
        }
        Ok(auth)
    }

    fn store_token(&self, auth: &AuthSuccess) -> FolioResult<()> {
        if let Some(token) = &auth.token {
            tracing::info!("signed in");
            self.session().login(token.clone(), auth.user.clone())?;
        }
        Ok(())
    }
}
