//! Order confirmation.
//!
//! Runs the whole confirm flow in one request: validate the delivery form and
//! the cart, pick the store, re-price every line from the menu, render the
//! summary, persist the
//! order as `recibido`, and hand back the WhatsApp link that sends the summary
//! to the chosen store.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use tq_core::{
    Cart, CartError, CartExtra, CartLine, Coordinates, DeliveryForm, FormErrors, GeoError,
    Located, StoreId, distance_km, nearest,
};

use crate::db::{PedidoRepository, RepositoryError};
use crate::models::{MenuItemDetail, Pedido, PedidoInsert, PuntoVenta};
use crate::services::catalog::CatalogService;
use crate::services::message;

/// Errors that can occur while confirming an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Delivery form fields failed validation.
    #[error("invalid delivery details: {0}")]
    InvalidDelivery(#[from] FormErrors),

    /// Cart is empty or has an invalid line.
    #[error("invalid cart: {0}")]
    InvalidCart(#[from] CartError),

    /// A cart line names a product that is gone or not being sold.
    #[error("product {0} is not available")]
    ProductUnavailable(String),

    /// A cart line carries an extra the product doesn't offer.
    #[error("extra {extra} is not offered with {producto}")]
    ExtraUnavailable {
        /// Product name from the menu.
        producto: String,
        /// Extra name as sent by the browser.
        extra: String,
    },

    /// Browser location out of range.
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] GeoError),

    /// Requested store doesn't exist or isn't taking orders.
    #[error("store {0} is not available")]
    StoreUnavailable(StoreId),

    /// Several stores are open and nothing says which one to use.
    #[error("a store or a location is required to route the order")]
    StoreRequired,

    /// No store is taking orders.
    #[error("no store is taking orders")]
    NoStores,

    /// Summary template failed to render.
    #[error("summary rendering failed: {0}")]
    Summary(#[from] askama::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Confirmation request from the checkout page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// The `burgerCart` array as the browser holds it.
    pub carrito: Cart,
    pub entrega: DeliveryForm,
    /// Browser geolocation, when the customer allowed it.
    #[serde(default)]
    pub ubicacion: Option<Coordinates>,
    /// Store picked by hand on the page.
    #[serde(default)]
    pub punto_venta_id: Option<StoreId>,
}

/// Result of a confirmed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub pedido: Pedido,
    pub punto_venta: PuntoVenta,
    /// Distance from the customer to the store, when a location was given.
    pub distancia_km: Option<f64>,
    pub whatsapp_url: String,
}

/// Pick the store an order goes to.
///
/// 1. An explicitly requested store, if it is among `stores`.
/// 2. The store nearest to `origin`.
/// 3. The only store, when there is exactly one.
///
/// The distance is reported whenever `origin` is known.
///
/// # Errors
///
/// Returns `StoreUnavailable` for an unknown requested id, `NoStores` when
/// `stores` is empty, and `StoreRequired` when there are several stores and
/// no location.
pub fn choose_store(
    stores: &[PuntoVenta],
    requested: Option<StoreId>,
    origin: Option<Coordinates>,
) -> Result<(&PuntoVenta, Option<f64>), CheckoutError> {
    let distance_to = |store: &PuntoVenta| origin.map(|o| distance_km(o, store.coordinates()));

    if let Some(id) = requested {
        let store = stores
            .iter()
            .find(|s| s.id == id)
            .ok_or(CheckoutError::StoreUnavailable(id))?;
        return Ok((store, distance_to(store)));
    }

    if let Some(origin) = origin {
        return nearest(origin, stores)
            .map(|(store, km)| (store, Some(km)))
            .ok_or(CheckoutError::NoStores);
    }

    match stores {
        [] => Err(CheckoutError::NoStores),
        [only] => Ok((only, None)),
        _ => Err(CheckoutError::StoreRequired),
    }
}

/// Rebuild a cart line with the product name and prices from the menu.
///
/// Extras are matched by name against those the product offers. The
/// quantity, removals and doneness are kept as sent.
///
/// # Errors
///
/// Returns `ProductUnavailable` when the product is missing or not
/// `disponible`, and `ExtraUnavailable` for an extra it doesn't offer.
pub fn reprice_line(
    line: &CartLine,
    detail: Option<&MenuItemDetail>,
) -> Result<CartLine, CheckoutError> {
    let detail = detail
        .filter(|detail| detail.item.disponible)
        .ok_or_else(|| CheckoutError::ProductUnavailable(line.nombre.clone()))?;

    let extras = line
        .extras
        .iter()
        .map(|sent| {
            detail
                .extras
                .iter()
                .find(|offered| offered.nombre == sent.nombre)
                .map(|offered| CartExtra {
                    nombre: offered.nombre.clone(),
                    precio: offered.precio,
                })
                .ok_or_else(|| CheckoutError::ExtraUnavailable {
                    producto: detail.item.nombre.clone(),
                    extra: sent.nombre.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CartLine::new(
        detail.item.id,
        detail.item.nombre.clone(),
        detail.item.precio,
        extras,
        line.modifications.clone(),
        line.cooking.clone(),
        line.quantity,
    ))
}

/// Order confirmation service.
pub struct CheckoutService<'a> {
    pedidos: PedidoRepository<'a>,
    catalog: &'a CatalogService,
    country_code: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, catalog: &'a CatalogService, country_code: &'a str) -> Self {
        Self {
            pedidos: PedidoRepository::new(pool),
            catalog,
            country_code,
        }
    }

    /// Confirm an order.
    ///
    /// Input is checked in full before anything touches the database.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for invalid input, when no store can take the
    /// order, or when persisting fails.
    pub async fn confirm(&self, request: &ConfirmRequest) -> Result<Confirmation, CheckoutError> {
        let delivery = request.entrega.validate()?;
        request.carrito.validate()?;
        let origin = request.ubicacion.map(Coordinates::validated).transpose()?;

        let stores = self.catalog.stores().await?;
        let (store, distancia_km) = choose_store(&stores, request.punto_venta_id, origin)?;

        let cart = self.priced_cart(&request.carrito).await?;
        cart.validate()?;
        let resumen = message::render_summary(&cart, &delivery, &store.nombre)?;
        let whatsapp_url = message::whatsapp_url(self.country_code, &store.whatsapp, &resumen);

        let pedido = self
            .pedidos
            .create(&PedidoInsert::from_checkout(
                &delivery,
                &cart,
                resumen,
                &store.nombre,
            ))
            .await?;

        tracing::info!(
            pedido_id = %pedido.id,
            punto_venta = %store.nombre,
            total = %pedido.total,
            items = cart.item_count(),
            "Order confirmed"
        );

        Ok(Confirmation {
            pedido,
            punto_venta: store.clone(),
            distancia_km,
            whatsapp_url,
        })
    }

    /// The cart with every line priced from the menu.
    async fn priced_cart(&self, carrito: &Cart) -> Result<Cart, CheckoutError> {
        let mut lines = Vec::with_capacity(carrito.lines().len());
        for line in carrito.lines() {
            let detail = self.catalog.menu_item(line.product_id).await?;
            let priced = reprice_line(line, detail.as_deref())?;
            if priced.unit_price() != line.unit_price() {
                tracing::debug!(
                    menu_id = %line.product_id,
                    sent = %line.unit_price(),
                    menu = %priced.unit_price(),
                    "Cart line re-priced from menu"
                );
            }
            lines.push(priced);
        }
        Ok(Cart::from(lines))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tq_core::Price;

    fn store(id: i32, nombre: &str, lat: f64, lng: f64) -> PuntoVenta {
        PuntoVenta {
            id: StoreId::new(id),
            nombre: nombre.to_string(),
            direccion: "Calle 1".to_string(),
            whatsapp: "3000000000".to_string(),
            latitud: lat,
            longitud: lng,
            horario: None,
            activo: true,
        }
    }

    fn stores() -> Vec<PuntoVenta> {
        vec![
            store(1, "Chapinero", 4.6486, -74.0628),
            store(2, "Usaquén", 4.6951, -74.0310),
        ]
    }

    #[test]
    fn test_choose_store_prefers_explicit_id() {
        let stores = stores();
        let near_chapinero = Coordinates::new(4.6500, -74.0600).unwrap();

        let (chosen, km) = choose_store(&stores, Some(StoreId::new(2)), Some(near_chapinero)).unwrap();
        assert_eq!(chosen.nombre, "Usaquén");
        assert!(km.unwrap() > 5.0);
    }

    #[test]
    fn test_choose_store_nearest_to_location() {
        let stores = stores();
        let near_usaquen = Coordinates::new(4.7000, -74.0300).unwrap();

        let (chosen, km) = choose_store(&stores, None, Some(near_usaquen)).unwrap();
        assert_eq!(chosen.nombre, "Usaquén");
        assert!(km.unwrap() < 1.0);
    }

    #[test]
    fn test_choose_store_single_store_without_location() {
        let stores = vec![store(1, "Chapinero", 4.6486, -74.0628)];
        let (chosen, km) = choose_store(&stores, None, None).unwrap();
        assert_eq!(chosen.id, StoreId::new(1));
        assert_eq!(km, None);
    }

    #[test]
    fn test_choose_store_errors() {
        let stores = stores();
        assert!(matches!(
            choose_store(&stores, None, None),
            Err(CheckoutError::StoreRequired)
        ));
        assert!(matches!(
            choose_store(&stores, Some(StoreId::new(99)), None),
            Err(CheckoutError::StoreUnavailable(_))
        ));
        assert!(matches!(
            choose_store(&[], None, Some(Coordinates::new(4.6, -74.0).unwrap())),
            Err(CheckoutError::NoStores)
        ));
        assert!(matches!(
            choose_store(&[], None, None),
            Err(CheckoutError::NoStores)
        ));
    }

    fn hamburguesa(disponible: bool) -> MenuItemDetail {
        MenuItemDetail {
            item: crate::models::MenuItem {
                id: tq_core::MenuItemId::new(1),
                nombre: "Hamburguesa Clásica".to_string(),
                descripcion: None,
                precio: Price::from_pesos(22_000),
                tipo: "hamburguesa".to_string(),
                imagen_url: None,
                disponible,
                permite_termino: true,
                modificaciones: vec!["Sin cebolla".to_string()],
                orden: 1,
            },
            extras: vec![crate::models::MenuExtra {
                id: tq_core::ExtraId::new(1),
                menu_id: None,
                nombre: "Tocineta".to_string(),
                precio: Price::from_pesos(4_000),
            }],
        }
    }

    fn sent_line(base: i64, extra: &str, extra_price: i64) -> CartLine {
        CartLine::new(
            tq_core::MenuItemId::new(1),
            "Hamburguesa barata",
            Price::from_pesos(base),
            vec![CartExtra {
                nombre: extra.to_string(),
                precio: Price::from_pesos(extra_price),
            }],
            vec!["Sin cebolla".to_string()],
            Some("Tres cuartos".to_string()),
            2,
        )
    }

    #[test]
    fn test_reprice_line_uses_menu_prices() {
        let priced = reprice_line(&sent_line(1, "Tocineta", 1), Some(&hamburguesa(true))).unwrap();

        assert_eq!(priced.nombre, "Hamburguesa Clásica");
        assert_eq!(priced.base_price, Price::from_pesos(22_000));
        assert_eq!(priced.extras[0].precio, Price::from_pesos(4_000));
        assert_eq!(priced.total, Price::from_pesos(52_000));
        assert_eq!(priced.cooking.as_deref(), Some("Tres cuartos"));
    }

    #[test]
    fn test_reprice_line_rejects_unknown_product_and_extra() {
        let line = sent_line(22_000, "Tocineta", 4_000);
        assert!(matches!(
            reprice_line(&line, None),
            Err(CheckoutError::ProductUnavailable(_))
        ));
        assert!(matches!(
            reprice_line(&line, Some(&hamburguesa(false))),
            Err(CheckoutError::ProductUnavailable(_))
        ));
        assert!(matches!(
            reprice_line(&sent_line(22_000, "Caviar", 0), Some(&hamburguesa(true))),
            Err(CheckoutError::ExtraUnavailable { .. })
        ));
    }

    #[test]
    fn test_confirm_request_from_browser_json() {
        let json = r#"{
            "carrito": [
                {"productId": 1, "nombre": "Hamburguesa", "basePrice": 20000, "quantity": 1}
            ],
            "entrega": {
                "nombre": "Laura",
                "celular": "3105551234",
                "direccion": "Cra 15 # 93-47",
                "metodoPago": "efectivo"
            },
            "ubicacion": {"lat": 4.65, "lng": -74.06}
        }"#;

        let request: ConfirmRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.carrito.lines().len(), 1);
        assert_eq!(request.punto_venta_id, None);
        assert!(request.entrega.validate().is_ok());
        assert!(request.ubicacion.is_some());
    }
}
