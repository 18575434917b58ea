//! Store location repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::PuntoVenta;

/// Repository for store locations.
pub struct PuntoVentaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PuntoVentaRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stores currently taking orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<PuntoVenta>, RepositoryError> {
        let stores = sqlx::query_as::<_, PuntoVenta>(
            r"
            SELECT id, nombre, direccion, whatsapp, latitud, longitud, horario, activo
            FROM puntos_venta
            WHERE activo
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }
}
