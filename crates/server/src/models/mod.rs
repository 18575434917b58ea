//! Domain models for the ordering site.
//!
//! Row types derive `sqlx::FromRow` and serialize with their column names,
//! which is the shape the browser scripts read.

pub mod landing;
pub mod menu;
pub mod pedido;
pub mod punto_venta;
pub mod usuario;

pub use landing::{AboutSection, HeroSlide, InstagramPost};
pub use menu::{MenuExtra, MenuItem, MenuItemDetail};
pub use pedido::{NewPedido, Pedido, PedidoInsert};
pub use punto_venta::PuntoVenta;
pub use usuario::{AccountView, Perfil, Usuario};
