//! Security headers for the API and the static site.
//!
//! The pages are plain static files with their own scripts; they load menu
//! photos from wherever the restaurant hosts them, read the browser location
//! to find the nearest store, and link out to WhatsApp.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

const CSP: &str = "default-src 'none'; \
                   script-src 'self'; \
                   style-src 'self'; \
                   font-src 'self'; \
                   img-src 'self' https: data:; \
                   connect-src 'self'; \
                   manifest-src 'self'; \
                   frame-src 'none'; \
                   object-src 'none'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

const PERMISSIONS_POLICY: &str = "accelerometer=(), \
                                  autoplay=(), \
                                  camera=(), \
                                  display-capture=(), \
                                  geolocation=(self), \
                                  gyroscope=(), \
                                  magnetometer=(), \
                                  microphone=(), \
                                  payment=(), \
                                  usb=()";

/// Add security headers to all responses.
///
/// `/api` responses also get `Cache-Control: no-store`; static files keep
/// whatever caching `ServeDir` gives them.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api/");

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    // WhatsApp links leave the site; keep the origin, drop the path
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if is_api {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/api/menu", get(|| async { "[]" }))
            .route("/index.html", get(|| async { "<html></html>" }))
            .layer(axum::middleware::from_fn(security_headers_middleware))
    }

    #[tokio::test]
    async fn test_api_responses_are_not_cached() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/api/menu").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store, max-age=0");
        assert_eq!(response.headers()[X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_pages_may_use_geolocation() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().get(CACHE_CONTROL).is_none());
        let policy = response.headers()["permissions-policy"].to_str().unwrap();
        assert!(policy.contains("geolocation=(self)"));
    }
}
