//! Database operations for the ordering site `PostgreSQL`.
//!
//! ## Tables
//!
//! - `usuarios` - Customer accounts and delivery profile
//! - `password_reset` - Hashed single-use recovery codes
//! - `menu` / `menu_extra` - Products and the extras offered with them
//! - `puntos_venta` - Store locations with WhatsApp numbers
//! - `pedidos` - Orders and their per-status timestamps
//! - `landing_hero`, `landing_about`, `landing_instagram` - Home page content
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tq-cli -- migrate
//! ```

pub mod landing;
pub mod menu;
pub mod pedidos;
pub mod puntos_venta;
pub mod usuarios;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use landing::LandingRepository;
pub use menu::MenuRepository;
pub use pedidos::PedidoRepository;
pub use puntos_venta::PuntoVentaRepository;
pub use usuarios::UsuarioRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
