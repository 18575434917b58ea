//! Read-mostly catalog: menu, stores and landing content.
//!
//! Everything here changes only when the restaurant edits its data, so reads
//! go through a `moka` cache (5-minute TTL) in front of `PostgreSQL`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use tq_core::MenuItemId;

use crate::db::{LandingRepository, MenuRepository, PuntoVentaRepository, RepositoryError};
use crate::models::{AboutSection, HeroSlide, InstagramPost, MenuItem, MenuItemDetail, PuntoVenta};

/// How long catalog reads are served from memory.
pub const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Menu { tipo: Option<String> },
    MenuItem(MenuItemId),
    Stores,
    Hero,
    About,
    Instagram,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Menu(Arc<Vec<MenuItem>>),
    MenuItem(Option<Arc<MenuItemDetail>>),
    Stores(Arc<Vec<PuntoVenta>>),
    Hero(Arc<Vec<HeroSlide>>),
    About(Option<Arc<AboutSection>>),
    Instagram(Arc<Vec<InstagramPost>>),
}

/// Cached catalog reads.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a catalog service over a pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { pool, cache }),
        }
    }

    /// Available menu items, optionally for one `tipo`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn menu(&self, tipo: Option<&str>) -> Result<Arc<Vec<MenuItem>>, RepositoryError> {
        let key = CacheKey::Menu {
            tipo: tipo.map(str::to_owned),
        };
        if let Some(CacheValue::Menu(items)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let items = Arc::new(
            MenuRepository::new(&self.inner.pool)
                .list_available(tipo)
                .await?,
        );
        self.inner
            .cache
            .insert(key, CacheValue::Menu(Arc::clone(&items)))
            .await;
        Ok(items)
    }

    /// A menu item with its extras.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn menu_item(
        &self,
        id: MenuItemId,
    ) -> Result<Option<Arc<MenuItemDetail>>, RepositoryError> {
        let key = CacheKey::MenuItem(id);
        if let Some(CacheValue::MenuItem(detail)) = self.inner.cache.get(&key).await {
            debug!(menu_id = %id, "Cache hit for menu item");
            return Ok(detail);
        }

        let detail = MenuRepository::new(&self.inner.pool)
            .get_detail(id)
            .await?
            .map(Arc::new);
        self.inner
            .cache
            .insert(key, CacheValue::MenuItem(detail.clone()))
            .await;
        Ok(detail)
    }

    /// Active store locations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn stores(&self) -> Result<Arc<Vec<PuntoVenta>>, RepositoryError> {
        if let Some(CacheValue::Stores(stores)) = self.inner.cache.get(&CacheKey::Stores).await {
            debug!("Cache hit for stores");
            return Ok(stores);
        }

        let stores = Arc::new(
            PuntoVentaRepository::new(&self.inner.pool)
                .list_active()
                .await?,
        );
        self.inner
            .cache
            .insert(CacheKey::Stores, CacheValue::Stores(Arc::clone(&stores)))
            .await;
        Ok(stores)
    }

    /// Home page carousel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn hero(&self) -> Result<Arc<Vec<HeroSlide>>, RepositoryError> {
        if let Some(CacheValue::Hero(slides)) = self.inner.cache.get(&CacheKey::Hero).await {
            return Ok(slides);
        }

        let slides = Arc::new(LandingRepository::new(&self.inner.pool).hero().await?);
        self.inner
            .cache
            .insert(CacheKey::Hero, CacheValue::Hero(Arc::clone(&slides)))
            .await;
        Ok(slides)
    }

    /// Home page "about" block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn about(&self) -> Result<Option<Arc<AboutSection>>, RepositoryError> {
        if let Some(CacheValue::About(about)) = self.inner.cache.get(&CacheKey::About).await {
            return Ok(about);
        }

        let about = LandingRepository::new(&self.inner.pool)
            .about()
            .await?
            .map(Arc::new);
        self.inner
            .cache
            .insert(CacheKey::About, CacheValue::About(about.clone()))
            .await;
        Ok(about)
    }

    /// Home page Instagram grid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn instagram(&self) -> Result<Arc<Vec<InstagramPost>>, RepositoryError> {
        if let Some(CacheValue::Instagram(posts)) = self.inner.cache.get(&CacheKey::Instagram).await
        {
            return Ok(posts);
        }

        let posts = Arc::new(LandingRepository::new(&self.inner.pool).instagram().await?);
        self.inner
            .cache
            .insert(CacheKey::Instagram, CacheValue::Instagram(Arc::clone(&posts)))
            .await;
        Ok(posts)
    }
}
