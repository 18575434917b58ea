//! Order repository.

use sqlx::PgPool;

use tq_core::{Email, OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::{Pedido, PedidoInsert};

const PEDIDO_COLUMNS: &str = "id, correo_cliente, nombre_cliente, resumen_pedido, \
                              direccion_cliente, celular_cliente, estado, puntoventa, \
                              metodo_pago, total, created_at, fecha_preparacion, \
                              fecha_en_camino, fecha_entregado, fecha_cancelado";

/// Repository for order rows.
pub struct PedidoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PedidoRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order in status `recibido`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, pedido: &PedidoInsert) -> Result<Pedido, RepositoryError> {
        let sql = format!(
            "INSERT INTO pedidos (correo_cliente, nombre_cliente, resumen_pedido, \
                                  direccion_cliente, celular_cliente, estado, puntoventa, \
                                  metodo_pago, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PEDIDO_COLUMNS}"
        );

        let row = sqlx::query_as::<_, Pedido>(&sql)
            .bind(pedido.correo_cliente.as_ref())
            .bind(&pedido.nombre_cliente)
            .bind(&pedido.resumen_pedido)
            .bind(&pedido.direccion_cliente)
            .bind(&pedido.celular_cliente)
            .bind(OrderStatus::Recibido)
            .bind(pedido.puntoventa.as_deref())
            .bind(pedido.metodo_pago)
            .bind(pedido.total)
            .fetch_one(self.pool)
            .await?;

        Ok(row)
    }

    /// Order history for a customer email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_email(&self, correo: &Email) -> Result<Vec<Pedido>, RepositoryError> {
        let sql = format!(
            "SELECT {PEDIDO_COLUMNS} FROM pedidos \
             WHERE correo_cliente = $1 \
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, Pedido>(&sql)
            .bind(correo)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Move an order to `estado` and stamp that status's column.
    ///
    /// A status reached twice keeps its first timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is already delivered or cancelled.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        estado: OrderStatus,
    ) -> Result<Pedido, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<OrderStatus> =
            sqlx::query_scalar("SELECT estado FROM pedidos WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or(RepositoryError::NotFound)?;
        if current.is_terminal() {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is already {current}"
            )));
        }

        // Column name comes from a fixed match on the enum, never from input.
        let column = estado.timestamp_column();
        let sql = format!(
            "UPDATE pedidos SET estado = $2, {column} = COALESCE({column}, now()) \
             WHERE id = $1 \
             RETURNING {PEDIDO_COLUMNS}"
        );

        let row = sqlx::query_as::<_, Pedido>(&sql)
            .bind(id)
            .bind(estado)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row)
    }
}
