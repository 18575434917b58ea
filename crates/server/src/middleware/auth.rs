//! Authentication extractors.
//!
//! Sessions are signed tokens in the `tq_session` cookie. The extractors only
//! verify the token; handlers that need the account row load it themselves.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::error::AppError;
use crate::services::auth::{AuthError, Claims, SESSION_COOKIE};
use crate::state::AppState;

/// Extractor that requires a valid session.
///
/// Rejects with 401 and a JSON error body when the cookie is missing,
/// tampered with, or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(claims): RequireAuth) -> String {
///     format!("Hola, {}!", claims.correo)
/// }
/// ```
pub struct RequireAuth(pub Claims);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(Cookie::value)
            .ok_or(AuthError::MissingSession)?;

        let claims = state.tokens().verify(token)?;
        Ok(Self(claims))
    }
}

/// Build the session cookie for a freshly issued token.
#[must_use]
pub fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = time::Duration::seconds(state.tokens().ttl().num_seconds());

    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config().is_secure())
        .max_age(max_age)
        .build()
}

/// Build a cookie that removes the session on the client.
#[must_use]
pub fn removal_cookie(state: &AppState) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config().is_secure())
        .max_age(time::Duration::ZERO)
        .build()
}
