//! # Folio Client
//!
//! HTTP transport for the portfolio API.
//!
//! [`HttpPortfolioApi`] implements [`folio_core::PortfolioApi`] over `reqwest`, and
//! [`AuthClient`] covers the account endpoints. Both share one [`HttpClient`]: a single
//! connection pool, the configured timeout, and the bearer token taken from the
//! [`folio_core::SessionHandle`] on every request.

mod auth;
mod http;

pub use auth::{
    ensure_subdomain, normalize_auth_response, AuthClient, AuthSuccess, GoogleAuthRequest,
    LoginRequest, RegisterRequest, ResetPasswordRequest, SubdomainAvailability,
};
pub use http::{HttpClient, HttpPortfolioApi};
