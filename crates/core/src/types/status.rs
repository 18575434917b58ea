//! Status enums for orders and payments.
//!
//! Both enums are stored as plain text in the `pedidos` table and travel
//! over the wire as the same lowercase strings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error for a status or payment method string that is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// What was being parsed (e.g. "order status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Order status (`estado`).
///
/// Orders are created as `Recibido` and moved forward one PATCH at a time.
/// Each status except `Recibido` has its own timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Recibido,
    EnPreparacion,
    EnCamino,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Recibido,
        Self::EnPreparacion,
        Self::EnCamino,
        Self::Entregado,
        Self::Cancelado,
    ];

    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recibido => "recibido",
            Self::EnPreparacion => "en_preparacion",
            Self::EnCamino => "en_camino",
            Self::Entregado => "entregado",
            Self::Cancelado => "cancelado",
        }
    }

    /// Human label used in order summaries and history.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Recibido => "Recibido",
            Self::EnPreparacion => "En preparación",
            Self::EnCamino => "En camino",
            Self::Entregado => "Entregado",
            Self::Cancelado => "Cancelado",
        }
    }

    /// Whether no further status changes are accepted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Entregado | Self::Cancelado)
    }

    /// Column holding the time the order entered this status.
    ///
    /// `Recibido` uses the row's `created_at`.
    #[must_use]
    pub const fn timestamp_column(&self) -> &'static str {
        match self {
            Self::Recibido => "created_at",
            Self::EnPreparacion => "fecha_preparacion",
            Self::EnCamino => "fecha_en_camino",
            Self::Entregado => "fecha_entregado",
            Self::Cancelado => "fecha_cancelado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "order status",
                value: s.to_owned(),
            })
    }
}

/// Payment method chosen at checkout (`metodo_pago`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Efectivo,
    /// Bank transfer (Nequi, Bancolombia, ...).
    Transferencia,
    /// Card terminal brought by the courier.
    Datafono,
}

impl PaymentMethod {
    /// Wire and database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Efectivo => "efectivo",
            Self::Transferencia => "transferencia",
            Self::Datafono => "datafono",
        }
    }

    /// Human label used in order summaries.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Efectivo => "Efectivo",
            Self::Transferencia => "Transferencia",
            Self::Datafono => "Datáfono",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "efectivo" => Ok(Self::Efectivo),
            "transferencia" => Ok(Self::Transferencia),
            "datafono" | "datáfono" => Ok(Self::Datafono),
            _ => Err(UnknownVariant {
                kind: "payment method",
                value: s.to_owned(),
            }),
        }
    }
}

// SQLx support (with postgres feature): both enums live in `text` columns.
#[cfg(feature = "postgres")]
macro_rules! text_enum_sqlx {
    ($name:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<Self>()?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

#[cfg(feature = "postgres")]
text_enum_sqlx!(OrderStatus);
#[cfg(feature = "postgres")]
text_enum_sqlx!(PaymentMethod);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_strings_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_order_status_unknown() {
        let err = "listo".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.value, "listo");
        assert_eq!(err.to_string(), "unknown order status: listo");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Entregado.is_terminal());
        assert!(OrderStatus::Cancelado.is_terminal());
        assert!(!OrderStatus::Recibido.is_terminal());
        assert!(!OrderStatus::EnCamino.is_terminal());
    }

    #[test]
    fn test_payment_method_parse_is_lenient() {
        assert_eq!(
            " Datáfono ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Datafono
        );
        assert_eq!(
            "EFECTIVO".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Efectivo
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}
