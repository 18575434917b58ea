//! Menu products and extras.

use serde::Serialize;
use sqlx::FromRow;

use tq_core::{ExtraId, MenuItemId, Price};

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Price,
    /// Menu section, e.g. `hamburguesa`, `perro`, `bebida`.
    pub tipo: String,
    pub imagen_url: Option<String>,
    pub disponible: bool,
    /// Whether the customer picks the meat doneness.
    pub permite_termino: bool,
    /// Removals offered on the product page ("Sin cebolla", ...).
    pub modificaciones: Vec<String>,
    pub orden: i32,
}

/// An extra that can be added to a product.
///
/// `menu_id` of `None` means the extra is offered with every product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MenuExtra {
    pub id: ExtraId,
    pub menu_id: Option<MenuItemId>,
    pub nombre: String,
    pub precio: Price,
}

/// Product page payload: the item and every extra it can take.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemDetail {
    #[serde(flatten)]
    pub item: MenuItem,
    pub extras: Vec<MenuExtra>,
}
