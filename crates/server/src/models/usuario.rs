//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tq_core::{Email, UserId};

/// A registered customer (password hash excluded).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Usuario {
    pub id: UserId,
    pub correo: Email,
    pub nombre: String,
    pub celular: String,
    pub direccionentrega: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delivery profile the confirmation page pre-fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perfil {
    pub nombre: String,
    pub celular: String,
    pub direccionentrega: Option<String>,
}

/// Session payload, the same shape the browser keeps under `burgerUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub correo: Email,
    pub perfil: Perfil,
}

impl From<Usuario> for AccountView {
    fn from(usuario: Usuario) -> Self {
        Self {
            correo: usuario.correo,
            perfil: Perfil {
                nombre: usuario.nombre,
                celular: usuario.celular,
                direccionentrega: usuario.direccionentrega,
            },
        }
    }
}
