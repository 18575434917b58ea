//! Home page marketing content.

use serde::Serialize;
use sqlx::FromRow;

use tq_core::{HeroSlideId, InstagramPostId};

/// One slide of the home page carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct HeroSlide {
    pub id: HeroSlideId,
    pub titulo: String,
    pub subtitulo: Option<String>,
    pub imagen_url: String,
    pub enlace: Option<String>,
    pub orden: i32,
}

/// The "about us" block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct AboutSection {
    pub titulo: String,
    pub contenido: String,
    pub imagen_url: Option<String>,
}

/// A curated Instagram post shown in the home page grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct InstagramPost {
    pub id: InstagramPostId,
    pub imagen_url: String,
    pub enlace: String,
    pub descripcion: Option<String>,
    pub orden: i32,
}
