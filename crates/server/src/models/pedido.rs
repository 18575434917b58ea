//! Orders (`pedidos`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tq_core::{
    Cart, DeliveryForm, Email, FormErrors, OrderId, OrderStatus, PaymentMethod, Price,
    ValidatedDelivery,
};

/// Longest order summary accepted.
pub const MAX_RESUMEN_LENGTH: usize = 4_000;

/// An order row with one timestamp per status reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Pedido {
    pub id: OrderId,
    pub correo_cliente: Option<Email>,
    pub nombre_cliente: String,
    pub resumen_pedido: String,
    pub direccion_cliente: String,
    pub celular_cliente: String,
    pub estado: OrderStatus,
    /// Name of the store the order was sent to.
    pub puntoventa: Option<String>,
    pub metodo_pago: PaymentMethod,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub fecha_preparacion: Option<DateTime<Utc>>,
    pub fecha_en_camino: Option<DateTime<Utc>>,
    pub fecha_entregado: Option<DateTime<Utc>>,
    pub fecha_cancelado: Option<DateTime<Utc>>,
}

/// Validated values for a new `pedidos` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedidoInsert {
    pub correo_cliente: Option<Email>,
    pub nombre_cliente: String,
    pub resumen_pedido: String,
    pub direccion_cliente: String,
    pub celular_cliente: String,
    pub puntoventa: Option<String>,
    pub metodo_pago: PaymentMethod,
    pub total: Price,
}

impl PedidoInsert {
    /// Row for an order confirmed on the server.
    #[must_use]
    pub fn from_checkout(
        delivery: &ValidatedDelivery,
        cart: &Cart,
        resumen_pedido: String,
        puntoventa: &str,
    ) -> Self {
        Self {
            correo_cliente: delivery.correo.clone(),
            nombre_cliente: delivery.nombre.clone(),
            resumen_pedido,
            direccion_cliente: delivery.direccion.clone(),
            celular_cliente: delivery.celular.as_str().to_owned(),
            puntoventa: Some(puntoventa.to_owned()),
            metodo_pago: delivery.metodo_pago,
            total: cart.total(),
        }
    }
}

/// Order row as posted by a browser that built the summary itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPedido {
    #[serde(default)]
    pub correo_cliente: Option<String>,
    pub nombre_cliente: String,
    pub resumen_pedido: String,
    pub direccion_cliente: String,
    pub celular_cliente: String,
    #[serde(default)]
    pub puntoventa: Option<String>,
    pub metodo_pago: String,
    #[serde(default)]
    pub total: Option<Price>,
}

impl NewPedido {
    /// Apply the confirmation form rules plus summary and total checks.
    ///
    /// # Errors
    ///
    /// Returns `FormErrors` with one message per failing field.
    pub fn validate(&self) -> Result<PedidoInsert, FormErrors> {
        let mut errors = FormErrors::default();

        let resumen = self.resumen_pedido.trim();
        if resumen.is_empty() {
            errors.add("resumen_pedido", "El pedido no tiene resumen");
        } else if resumen.chars().count() > MAX_RESUMEN_LENGTH {
            errors.add(
                "resumen_pedido",
                format!("Máximo {MAX_RESUMEN_LENGTH} caracteres"),
            );
        }

        let total = self.total.unwrap_or(Price::ZERO);
        if total.is_negative() {
            errors.add("total", "El total no puede ser negativo");
        } else if !total.fits_stored() {
            errors.add("total", "El valor del pedido es demasiado alto");
        }

        let form = DeliveryForm {
            nombre: self.nombre_cliente.clone(),
            celular: self.celular_cliente.clone(),
            direccion: self.direccion_cliente.clone(),
            correo: self.correo_cliente.clone(),
            metodo_pago: self.metodo_pago.clone(),
            notas: None,
        };

        match form.validate() {
            Ok(delivery) if errors.is_empty() => Ok(PedidoInsert {
                correo_cliente: delivery.correo,
                nombre_cliente: delivery.nombre,
                resumen_pedido: resumen.to_owned(),
                direccion_cliente: delivery.direccion,
                celular_cliente: delivery.celular.as_str().to_owned(),
                puntoventa: self
                    .puntoventa
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned),
                metodo_pago: delivery.metodo_pago,
                total,
            }),
            Ok(_) => Err(errors),
            Err(form_errors) => {
                errors.merge(form_errors.renamed(posted_field));
                Err(errors)
            }
        }
    }
}

/// Name of the posted field a delivery form field was read from.
fn posted_field(field: &'static str) -> &'static str {
    match field {
        "nombre" => "nombre_cliente",
        "celular" => "celular_cliente",
        "direccion" => "direccion_cliente",
        "correo" => "correo_cliente",
        "metodoPago" => "metodo_pago",
        other => other,
    }
}
