//! Menu repository.

use sqlx::PgPool;

use tq_core::MenuItemId;

use super::RepositoryError;
use crate::models::{MenuExtra, MenuItem, MenuItemDetail};

const MENU_COLUMNS: &str = "id, nombre, descripcion, precio, tipo, imagen_url, disponible, \
                            permite_termino, modificaciones, orden";

/// Repository for menu reads.
pub struct MenuRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuRepository<'a> {
    /// Create a new menu repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Available items, optionally restricted to one `tipo`, in menu order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self, tipo: Option<&str>) -> Result<Vec<MenuItem>, RepositoryError> {
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menu \
             WHERE disponible AND ($1::text IS NULL OR tipo = $1) \
             ORDER BY orden, id"
        );

        let items = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(tipo)
            .fetch_all(self.pool)
            .await?;

        Ok(items)
    }

    /// An item with its own extras followed by the global ones.
    ///
    /// Unavailable items are still returned so a stale cart line can be shown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: MenuItemId) -> Result<Option<MenuItemDetail>, RepositoryError> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menu WHERE id = $1");
        let Some(item) = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let extras = sqlx::query_as::<_, MenuExtra>(
            r"
            SELECT id, menu_id, nombre, precio
            FROM menu_extra
            WHERE menu_id = $1 OR menu_id IS NULL
            ORDER BY menu_id NULLS LAST, precio, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(MenuItemDetail { item, extras }))
    }
}
