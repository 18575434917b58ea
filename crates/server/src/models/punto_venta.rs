//! Store locations (`puntos de venta`).

use serde::Serialize;
use sqlx::FromRow;

use tq_core::{Coordinates, Located, StoreId};

/// A store that takes WhatsApp orders.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PuntoVenta {
    pub id: StoreId,
    pub nombre: String,
    pub direccion: String,
    /// Local mobile number orders are sent to, without country code.
    pub whatsapp: String,
    pub latitud: f64,
    pub longitud: f64,
    pub horario: Option<String>,
    pub activo: bool,
}

impl Located for PuntoVenta {
    fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitud,
            lng: self.longitud,
        }
    }
}
