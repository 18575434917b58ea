//! HTTP route handlers for the ordering API.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                    - Liveness check
//! GET   /health/ready              - Database readiness check
//!
//! # Menu
//! GET   /api/menu?tipo=            - Available items, optionally one type
//! GET   /api/menu/item/{id}        - Item with its extras
//!
//! # Auth (rate limited)
//! POST  /api/auth/register         - Create account, start session
//! POST  /api/auth/login            - Start session
//! POST  /api/auth/logout           - End session
//! GET   /api/auth/me               - Current account (requires session)
//! PATCH /api/auth/me               - Update profile (requires session)
//! POST  /api/auth/recover          - Email a recovery code
//! POST  /api/auth/recover/confirm  - Set a new password with the code
//!
//! # Stores and landing content
//! GET   /api/puntos-venta          - Active stores
//! GET   /api/landing/hero          - Carousel slides
//! GET   /api/landing/about         - About block
//! GET   /api/landing/instagram     - Instagram grid
//!
//! # Orders
//! GET   /api/pedidos?correo=       - Order history for an email
//! POST  /api/pedidos               - Record an order built by the browser
//! POST  /api/pedidos/confirmar     - Validate, route and record an order
//! PATCH /api/pedidos/{id}          - Move an order to a new status
//! ```

pub mod auth;
pub mod landing;
pub mod menu;
pub mod pedidos;
pub mod puntos_venta;

use axum::{
    Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::BadRequest("El cuerpo de la solicitud no es válido".to_owned())
    }
}

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::index))
        .route("/item/{id}", get(menu::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).patch(auth::update_me))
        .route("/recover", post(auth::recover))
        .route("/recover/confirm", post(auth::confirm_recovery))
        .layer(auth_rate_limiter())
}

/// Create the landing content routes router.
pub fn landing_routes() -> Router<AppState> {
    Router::new()
        .route("/hero", get(landing::hero))
        .route("/about", get(landing::about))
        .route("/instagram", get(landing::instagram))
}

/// Create the order routes router.
pub fn pedido_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pedidos::index).post(pedidos::create))
        .route("/confirmar", post(pedidos::confirm))
        .route("/{id}", patch(pedidos::update_status))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/menu", menu_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/puntos-venta", get(puntos_venta::index))
        .nest("/api/landing", landing_routes())
        .nest("/api/pedidos", pedido_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::{
        body::Body,
        http::{Method, Request, header},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::services::auth::SESSION_COOKIE;

    use super::*;

    // Requests below are rejected before any query runs, so the pool never connects.
    fn test_app() -> Router {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/tq_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".parse().unwrap(),
            jwt_secret: SecretString::from("k7Qp2vX9mL4rT8wZ1nB6cJ3hF5dG0sYa"),
            public_dir: PathBuf::from("public"),
            whatsapp_country_code: "57".to_string(),
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tq_test")
            .unwrap();

        crate::app(AppState::new(config, pool).unwrap())
    }

    fn request(method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-real-ip", "127.0.0.1")
    }

    fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
        request(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(request(Method::GET, "/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let (status, body) = send(
            request(Method::GET, "/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Inicia sesión para continuar");
    }

    #[tokio::test]
    async fn test_me_rejects_forged_cookie() {
        let (status, _) = send(
            request(Method::GET, "/api/auth/me")
                .header(header::COOKIE, format!("{SESSION_COOKIE}=not.a.token"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/auth/register",
            &serde_json::json!({
                "correo": "no-es-correo",
                "password": "corta",
                "nombre": "",
                "celular": "123"
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        for campo in ["correo", "password", "nombre", "celular"] {
            assert!(body["campos"][campo].is_string(), "missing {campo}");
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = request(Method::POST, "/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"correo\":"))
            .unwrap();
        let (status, body) = send(req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "El cuerpo de la solicitud no es válido");
    }

    #[tokio::test]
    async fn test_confirm_rejects_invalid_delivery() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/pedidos/confirmar",
            &serde_json::json!({
                "carrito": [
                    {"productId": 1, "nombre": "Hamburguesa", "basePrice": 20000, "quantity": 1}
                ],
                "entrega": {
                    "nombre": "",
                    "celular": "3105551234",
                    "direccion": "Cra 15 # 93-47",
                    "metodoPago": "efectivo"
                }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["campos"]["nombre"].is_string());
    }

    #[tokio::test]
    async fn test_confirm_rejects_empty_cart() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/pedidos/confirmar",
            &serde_json::json!({
                "carrito": [],
                "entrega": {
                    "nombre": "Laura",
                    "celular": "3105551234",
                    "direccion": "Cra 15 # 93-47",
                    "metodoPago": "efectivo"
                }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Tu carrito está vacío");
    }

    #[tokio::test]
    async fn test_confirm_rejects_cart_total_that_overflows() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/pedidos/confirmar",
            &serde_json::json!({
                "carrito": [
                    {"productId": 1, "nombre": "X", "basePrice": 5e28, "quantity": 2}
                ],
                "entrega": {
                    "nombre": "Laura",
                    "celular": "3105551234",
                    "direccion": "Cra 15 # 93-47",
                    "metodoPago": "efectivo"
                }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "El valor del pedido es demasiado alto");
    }

    #[tokio::test]
    async fn test_create_rejects_total_past_column_limit() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/pedidos",
            &serde_json::json!({
                "nombre_cliente": "Laura",
                "resumen_pedido": "1x Hamburguesa",
                "direccion_cliente": "Cra 15 # 93-47",
                "celular_cliente": "3105551234",
                "metodo_pago": "efectivo",
                "total": 1e20
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["campos"]["total"].is_string());
    }

    #[tokio::test]
    async fn test_history_requires_correo() {
        let (status, _) = send(
            request(Method::GET, "/api/pedidos")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_status_is_bad_request() {
        let (status, body) = send(json_request(
            Method::PATCH,
            "/api/pedidos/1",
            &serde_json::json!({"estado": "listo"}),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Estado inválido: listo");
    }
}
