//! Landing page content repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{AboutSection, HeroSlide, InstagramPost};

/// Repository for home page content.
pub struct LandingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LandingRepository<'a> {
    /// Create a new landing repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Carousel slides in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hero(&self) -> Result<Vec<HeroSlide>, RepositoryError> {
        let slides = sqlx::query_as::<_, HeroSlide>(
            "SELECT id, titulo, subtitulo, imagen_url, enlace, orden \
             FROM landing_hero ORDER BY orden, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(slides)
    }

    /// The most recently updated "about" block, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn about(&self) -> Result<Option<AboutSection>, RepositoryError> {
        let about = sqlx::query_as::<_, AboutSection>(
            "SELECT titulo, contenido, imagen_url \
             FROM landing_about ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(about)
    }

    /// Instagram grid posts in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn instagram(&self) -> Result<Vec<InstagramPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, InstagramPost>(
            "SELECT id, imagen_url, enlace, descripcion, orden \
             FROM landing_instagram ORDER BY orden, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(posts)
    }
}
