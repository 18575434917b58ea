//! Delivery form validation for order confirmation.
//!
//! Mirrors the checks the confirmation page runs before it lets the customer
//! send the order: name and address present, a valid Colombian mobile, a
//! well-formed email when one is given, and a known payment method. Every
//! failing field is reported, not just the first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Celular, Email, PaymentMethod};

/// Longest free-text field accepted (name, address, notes).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Field name to message, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("invalid fields: {}", .0.keys().copied().collect::<Vec<_>>().join(", "))]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    /// Record a problem with a field. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Fold another set of problems into this one.
    pub fn merge(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    /// The same messages filed under other field names.
    #[must_use]
    pub fn renamed(self, rename: impl Fn(&'static str) -> &'static str) -> Self {
        let mut renamed = Self::default();
        for (field, message) in self.0 {
            renamed.add(rename(field), message);
        }
        renamed
    }

    /// Whether no problems were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Names of the failing fields.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(value)` if nothing failed, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Delivery details as typed into the confirmation form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryForm {
    pub nombre: String,
    pub celular: String,
    pub direccion: String,
    #[serde(default)]
    pub correo: Option<String>,
    pub metodo_pago: String,
    #[serde(default)]
    pub notas: Option<String>,
}

/// Delivery details after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedDelivery {
    pub nombre: String,
    pub celular: Celular,
    pub direccion: String,
    pub correo: Option<Email>,
    pub metodo_pago: PaymentMethod,
    pub notas: Option<String>,
}

impl DeliveryForm {
    /// Validate every field.
    ///
    /// Text fields are trimmed; empty optional fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns `FormErrors` with one message per failing field.
    pub fn validate(&self) -> Result<ValidatedDelivery, FormErrors> {
        let mut errors = FormErrors::default();

        let nombre = required_text(&mut errors, "nombre", &self.nombre, "Ingresa tu nombre");
        let direccion = required_text(
            &mut errors,
            "direccion",
            &self.direccion,
            "Ingresa la dirección de entrega",
        );

        let celular = Celular::parse(&self.celular)
            .map_err(|_| {
                errors.add(
                    "celular",
                    "Ingresa un celular colombiano de 10 dígitos que empiece por 3",
                );
            })
            .ok();

        let correo = match non_blank(self.correo.as_deref()) {
            Some(raw) => Email::parse(raw)
                .map_err(|_| errors.add("correo", "Ingresa un correo válido"))
                .ok(),
            None => None,
        };

        let metodo_pago = self
            .metodo_pago
            .parse::<PaymentMethod>()
            .map_err(|_| errors.add("metodoPago", "Selecciona un método de pago"))
            .ok();

        let notas = non_blank(self.notas.as_deref()).map(str::to_owned);
        if notas.as_ref().is_some_and(|n| n.chars().count() > MAX_TEXT_LENGTH) {
            errors.add("notas", too_long_message());
        }

        match (celular, metodo_pago) {
            (Some(celular), Some(metodo_pago)) if errors.is_empty() => Ok(ValidatedDelivery {
                nombre,
                celular,
                direccion,
                correo,
                metodo_pago,
                notas,
            }),
            _ => Err(errors),
        }
    }
}

fn required_text(errors: &mut FormErrors, field: &'static str, raw: &str, message: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, message);
    } else if value.chars().count() > MAX_TEXT_LENGTH {
        errors.add(field, too_long_message());
    }
    value.to_owned()
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn too_long_message() -> String {
    format!("Máximo {MAX_TEXT_LENGTH} caracteres")
}
