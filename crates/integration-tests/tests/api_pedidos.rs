//! Integration tests for order confirmation, history and status changes.
//!
//! These tests require:
//! - A migrated database seeded with `crates/cli/seed/catalogo.yaml`
//! - The server running (cargo run -p tq-server)
//!
//! Run with: cargo test -p tq-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use tq_core::OrderStatus;
use tq_integration_tests::{TestContext, delivery, unique_email};

/// Confirm a two-burger order placed next to the Chapinero store.
async fn confirm_order(ctx: &TestContext, correo: &str) -> Value {
    let resp = ctx
        .post("/api/pedidos/confirmar")
        .json(&json!({
            "carrito": [{
                "productId": 1,
                "nombre": "Hamburguesa Clásica",
                "basePrice": 22000,
                "extras": [{"nombre": "Tocineta", "precio": 4000}],
                "modifications": ["Sin cebolla"],
                "cooking": "Término medio",
                "quantity": 2
            }],
            "entrega": delivery(correo),
            "ubicacion": {"lat": 4.6490, "lng": -74.0630}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn set_status(ctx: &TestContext, id: i64, estado: OrderStatus) -> reqwest::Response {
    ctx.patch(&format!("/api/pedidos/{id}"))
        .json(&json!({"estado": estado.as_str()}))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_confirm_routes_to_nearest_store() {
    let ctx = TestContext::new();
    let confirmation = confirm_order(&ctx, &unique_email()).await;

    assert_eq!(confirmation["puntoVenta"]["nombre"], "Chapinero");
    assert!(confirmation["distanciaKm"].as_f64().unwrap() < 1.0);

    let pedido = &confirmation["pedido"];
    assert_eq!(pedido["estado"], "recibido");
    assert_eq!(pedido["total"].as_f64().unwrap(), 52000.0);
    let resumen = pedido["resumen_pedido"].as_str().unwrap();
    assert!(resumen.contains("2x Hamburguesa Clásica"));
    assert!(resumen.contains("Sin cebolla"));

    let url = confirmation["whatsappUrl"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/573105550101?text="));
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_confirm_charges_menu_prices() {
    let ctx = TestContext::new();
    let resp = ctx
        .post("/api/pedidos/confirmar")
        .json(&json!({
            "carrito": [{
                "productId": 1,
                "nombre": "Hamburguesa Clásica",
                "basePrice": 1,
                "extras": [{"nombre": "Tocineta", "precio": 1}],
                "quantity": 2
            }],
            "entrega": delivery(&unique_email()),
            "ubicacion": {"lat": 4.6490, "lng": -74.0630}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let confirmation: Value = resp.json().await.unwrap();
    assert_eq!(confirmation["pedido"]["total"].as_f64().unwrap(), 52000.0);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_confirm_rejects_oversized_cart() {
    let ctx = TestContext::new();
    let resp = ctx
        .post("/api/pedidos/confirmar")
        .json(&json!({
            "carrito": [{"productId": 1, "nombre": "X", "basePrice": 5e28, "quantity": 2}],
            "entrega": delivery(&unique_email())
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "El valor del pedido es demasiado alto");
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_history_is_newest_first() {
    let ctx = TestContext::new();
    let correo = unique_email();

    let first = confirm_order(&ctx, &correo).await;
    let second = confirm_order(&ctx, &correo).await;

    let pedidos: Vec<Value> = ctx
        .get(&format!("/api/pedidos?correo={correo}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(pedidos.len(), 2);
    assert_eq!(pedidos[0]["id"], second["pedido"]["id"]);
    assert_eq!(pedidos[1]["id"], first["pedido"]["id"]);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_raw_order_is_recorded() {
    let ctx = TestContext::new();
    let correo = unique_email();

    let resp = ctx
        .post("/api/pedidos")
        .json(&json!({
            "correo_cliente": correo,
            "nombre_cliente": "Laura Gómez",
            "resumen_pedido": "1x Perro Querido ($16.000)",
            "direccion_cliente": "Cra 15 # 93-47",
            "celular_cliente": "3105551234",
            "puntoventa": "Usaquén",
            "metodo_pago": "transferencia",
            "total": 16000
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let pedido: Value = resp.json().await.unwrap();
    assert_eq!(pedido["puntoventa"], "Usaquén");
    assert_eq!(pedido["metodo_pago"], "transferencia");
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_status_lifecycle() {
    let ctx = TestContext::new();
    let confirmation = confirm_order(&ctx, &unique_email()).await;
    let id = confirmation["pedido"]["id"].as_i64().unwrap();

    let resp = set_status(&ctx, id, OrderStatus::EnPreparacion).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let pedido: Value = resp.json().await.unwrap();
    assert_eq!(pedido["estado"], "en_preparacion");
    assert!(pedido["fecha_preparacion"].is_string());
    assert!(pedido["fecha_entregado"].is_null());

    let resp = set_status(&ctx, id, OrderStatus::Entregado).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = set_status(&ctx, id, OrderStatus::Cancelado).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_status_of_missing_order_is_404() {
    let ctx = TestContext::new();

    let resp = set_status(&ctx, 999_999_999, OrderStatus::EnCamino).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
