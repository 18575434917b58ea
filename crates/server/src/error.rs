//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error renders as JSON: `{"error": "<message>"}`, plus a `campos`
//! object mapping field names to messages for validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use tq_core::FormErrors;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the ordering API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order confirmation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// One or more form fields are invalid.
    #[error("Validation error: {0}")]
    Validation(#[from] FormErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with the current state of a resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Too many requests from one client.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    campos: Option<FormErrors>,
}

impl AppError {
    /// Whether this is a server-side failure worth reporting.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(RepositoryError::Database(_))
                | Self::Internal(_)
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_)
                )
                | Self::Checkout(CheckoutError::Repository(_) | CheckoutError::Summary(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::MissingSession
                | AuthError::InvalidSession(_) => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidProfile(_)
                | AuthError::InvalidRecoveryCode => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::InvalidDelivery(_)
                | CheckoutError::InvalidCart(_)
                | CheckoutError::ProductUnavailable(_)
                | CheckoutError::ExtraUnavailable { .. }
                | CheckoutError::InvalidLocation(_)
                | CheckoutError::StoreUnavailable(_)
                | CheckoutError::StoreRequired => StatusCode::BAD_REQUEST,
                CheckoutError::NoStores => StatusCode::SERVICE_UNAVAILABLE,
                CheckoutError::Summary(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    // Don't expose internal error details to clients
    fn into_body(self) -> ErrorBody {
        let plain = |error: &str| ErrorBody {
            error: error.to_owned(),
            campos: None,
        };
        let with_fields = |campos: FormErrors| ErrorBody {
            error: "Revisa los campos marcados".to_owned(),
            campos: Some(campos),
        };

        match self {
            Self::Database(RepositoryError::NotFound) => plain("No encontrado"),
            Self::Database(RepositoryError::Conflict(msg)) | Self::Conflict(msg) => ErrorBody {
                error: msg,
                campos: None,
            },
            Self::Database(_) | Self::Internal(_) => plain("Error interno del servidor"),
            Self::Validation(campos) => with_fields(campos),
            Self::Auth(err) => match err {
                AuthError::InvalidProfile(campos) => with_fields(campos),
                AuthError::InvalidCredentials => plain("Correo o contraseña incorrectos"),
                AuthError::UserAlreadyExists => plain("Ya existe una cuenta con este correo"),
                AuthError::WeakPassword(msg) => ErrorBody {
                    error: msg,
                    campos: None,
                },
                AuthError::InvalidEmail(_) => plain("Ingresa un correo válido"),
                AuthError::InvalidRecoveryCode => plain("El código es inválido o ya venció"),
                AuthError::MissingSession | AuthError::InvalidSession(_) => {
                    plain("Inicia sesión para continuar")
                }
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    plain("Error interno del servidor")
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::InvalidDelivery(campos) => with_fields(campos),
                CheckoutError::InvalidCart(e) => ErrorBody {
                    error: cart_message(&e),
                    campos: None,
                },
                CheckoutError::ProductUnavailable(nombre) => ErrorBody {
                    error: format!("{nombre} ya no está disponible"),
                    campos: None,
                },
                CheckoutError::ExtraUnavailable { producto, extra } => ErrorBody {
                    error: format!("{extra} no se ofrece con {producto}"),
                    campos: None,
                },
                CheckoutError::InvalidLocation(_) => plain("La ubicación no es válida"),
                CheckoutError::StoreUnavailable(_) => {
                    plain("El punto de venta seleccionado no está disponible")
                }
                CheckoutError::StoreRequired => {
                    plain("Selecciona un punto de venta o comparte tu ubicación")
                }
                CheckoutError::NoStores => {
                    plain("No hay puntos de venta recibiendo pedidos en este momento")
                }
                CheckoutError::Summary(_) | CheckoutError::Repository(_) => {
                    plain("Error interno del servidor")
                }
            },
            Self::NotFound(msg) | Self::BadRequest(msg) => ErrorBody {
                error: msg,
                campos: None,
            },
            Self::RateLimited => plain("Demasiados intentos, espera un momento"),
        }
    }
}

fn cart_message(err: &tq_core::CartError) -> String {
    use tq_core::CartError;

    match err {
        CartError::Empty => "Tu carrito está vacío".to_owned(),
        CartError::ZeroQuantity { name, .. } => format!("La cantidad de {name} debe ser al menos 1"),
        CartError::NegativePrice { name, .. } => format!("{name} tiene un precio inválido"),
        CartError::AmountTooLarge { .. } => "El valor del pedido es demasiado alto".to_owned(),
        CartError::NoSuchLine(_) => "El carrito cambió, recarga la página".to_owned(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("pedido 123".to_string());
        assert_eq!(err.to_string(), "Not found: pedido 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("x".into()))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::MissingSession.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::InvalidRecoveryCode.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::InvalidCart(tq_core::CartError::Empty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::StoreRequired.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::NoStores.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_oversized_cart_is_client_error() {
        let err: AppError = CheckoutError::InvalidCart(tq_core::CartError::AmountTooLarge {
            line: 0,
            name: "X".to_string(),
        })
        .into();
        assert!(!err.is_server_error());

        let body = body_json(err).await;
        assert_eq!(body["error"], "El valor del pedido es demasiado alto");
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut campos = FormErrors::default();
        campos.add("celular", "Ingresa un celular válido");

        let body = body_json(AppError::Validation(campos)).await;
        assert_eq!(body["error"], "Revisa los campos marcados");
        assert_eq!(body["campos"]["celular"], "Ingresa un celular válido");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("pool exhausted at 10.0.0.3".into())).await;
        assert_eq!(body, serde_json::json!({"error": "Error interno del servidor"}));
    }
}
