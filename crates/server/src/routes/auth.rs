//! Account route handlers.
//!
//! Sessions live in the `tq_session` cookie. Login and registration set it,
//! logout removes it, and `/me` reads it through [`RequireAuth`].

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, removal_cookie, session_cookie};
use crate::models::{AccountView, Usuario};
use crate::routes::ApiJson;
use crate::services::auth::{AuthError, AuthService, ProfilePatch, RegisterRequest};
use crate::services::email::deliver_recovery_code;
use crate::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub correo: String,
    pub password: String,
}

/// Recovery code request.
#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub correo: String,
}

/// New password with a recovery code.
#[derive(Debug, Deserialize)]
pub struct RecoverConfirmRequest {
    pub correo: String,
    pub codigo: String,
    pub password: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Mensaje {
    pub mensaje: &'static str,
}

/// Issue a session for `usuario` and add its cookie to the jar.
fn start_session(state: &AppState, jar: CookieJar, usuario: &Usuario) -> Result<CookieJar> {
    let token = state.tokens().issue(usuario.id, &usuario.correo)?;
    set_sentry_user(&usuario.id, Some(usuario.correo.as_str()));
    Ok(jar.add(session_cookie(state, token)))
}

/// Create an account and log it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AccountView>)> {
    let usuario = AuthService::new(state.pool()).register(&request).await?;
    let jar = start_session(&state, jar, &usuario)?;

    Ok((StatusCode::CREATED, jar, Json(usuario.into())))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<AccountView>)> {
    let usuario = AuthService::new(state.pool())
        .login(&request.correo, &request.password)
        .await
        .map_err(|e| match e {
            // Malformed email reads the same as a wrong password
            AuthError::InvalidEmail(_) => AuthError::InvalidCredentials,
            other => other,
        })?;

    tracing::info!(user_id = %usuario.id, "User logged in");
    let jar = start_session(&state, jar, &usuario)?;

    Ok((jar, Json(usuario.into())))
}

/// End the session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Mensaje>) {
    clear_sentry_user();
    (
        jar.add(removal_cookie(&state)),
        Json(Mensaje {
            mensaje: "Sesión cerrada",
        }),
    )
}

/// The logged-in account.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<Json<AccountView>> {
    let usuario = AuthService::new(state.pool()).account(claims.sub).await?;
    Ok(Json(usuario.into()))
}

/// Update some profile fields of the logged-in account.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<AccountView>> {
    let usuario = AuthService::new(state.pool())
        .update_profile(claims.sub, &patch)
        .await?;

    tracing::info!(user_id = %usuario.id, "Profile updated");
    Ok(Json(usuario.into()))
}

/// Email a recovery code.
///
/// Answers the same whether or not the email has an account. The code is
/// hashed in both cases and delivery runs in the background, so the two
/// paths take about as long.
pub async fn recover(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecoverRequest>,
) -> Result<Json<Mensaje>> {
    match AuthService::new(state.pool())
        .start_recovery(&request.correo)
        .await
    {
        Ok(Some(recovery)) => {
            let state = state.clone();
            tokio::spawn(async move {
                deliver_recovery_code(
                    state.mailer(),
                    &recovery.usuario.correo,
                    &recovery.usuario.nombre,
                    &recovery.code,
                )
                .await;
            });
        }
        Ok(None) | Err(AuthError::InvalidEmail(_)) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(Mensaje {
        mensaje: "Si el correo tiene una cuenta, te enviamos un código para recuperarla",
    }))
}

/// Set a new password with a recovery code.
pub async fn confirm_recovery(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecoverConfirmRequest>,
) -> Result<Json<Mensaje>> {
    AuthService::new(state.pool())
        .confirm_recovery(&request.correo, &request.codigo, &request.password)
        .await?;

    Ok(Json(Mensaje {
        mensaje: "Tu contraseña fue actualizada",
    }))
}
