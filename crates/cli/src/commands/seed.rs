//! Load the restaurant catalog from a YAML file.
//!
//! The file holds the menu (with per-item extras), extras offered with every
//! item, store locations and the home page content. See
//! `crates/cli/seed/catalogo.yaml` for the layout.
//!
//! Without `--replace` the command refuses to touch a database whose menu
//! already has rows. With it, menu and landing content are replaced and
//! stores missing from the file are deactivated (orders keep their names).

use std::path::Path;

use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{error, info};

use tq_core::{Coordinates, Price};

use super::database_url;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The seed file couldn't be read.
    #[error("Could not read {0}: {1}")]
    Io(String, #[source] std::io::Error),

    /// The seed file isn't valid YAML for a catalog.
    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The catalog failed validation.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// The menu already has rows and `--replace` wasn't given.
    #[error("Menu already has {0} items; use --replace to overwrite")]
    NotEmpty(i64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Whole catalog file.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub menu: Vec<MenuSeed>,
    /// Extras offered with every item.
    #[serde(default)]
    pub extras: Vec<ExtraSeed>,
    #[serde(default)]
    pub puntos_venta: Vec<PuntoVentaSeed>,
    #[serde(default)]
    pub landing: LandingSeed,
}

#[derive(Debug, Deserialize)]
pub struct MenuSeed {
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub precio: Price,
    pub tipo: String,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default = "default_true")]
    pub disponible: bool,
    #[serde(default)]
    pub permite_termino: bool,
    #[serde(default)]
    pub modificaciones: Vec<String>,
    /// Defaults to the item's position in the file.
    #[serde(default)]
    pub orden: Option<i32>,
    #[serde(default)]
    pub extras: Vec<ExtraSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ExtraSeed {
    pub nombre: String,
    pub precio: Price,
}

#[derive(Debug, Deserialize)]
pub struct PuntoVentaSeed {
    pub nombre: String,
    pub direccion: String,
    pub whatsapp: String,
    pub latitud: f64,
    pub longitud: f64,
    #[serde(default)]
    pub horario: Option<String>,
    #[serde(default = "default_true")]
    pub activo: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LandingSeed {
    #[serde(default)]
    pub hero: Vec<HeroSeed>,
    #[serde(default)]
    pub about: Option<AboutSeed>,
    #[serde(default)]
    pub instagram: Vec<InstagramSeed>,
}

#[derive(Debug, Deserialize)]
pub struct HeroSeed {
    pub titulo: String,
    #[serde(default)]
    pub subtitulo: Option<String>,
    pub imagen_url: String,
    #[serde(default)]
    pub enlace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AboutSeed {
    pub titulo: String,
    pub contenido: String,
    #[serde(default)]
    pub imagen_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstagramSeed {
    pub imagen_url: String,
    pub enlace: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// Rows written by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub menu: usize,
    pub extras: usize,
    pub puntos_venta: usize,
    pub landing: usize,
}

/// Check a catalog before touching the database.
///
/// Returns one message per problem; an empty list means the file is good.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for item in &catalog.menu {
        let name = item.nombre.trim();
        if name.is_empty() {
            errors.push("menu: item with empty nombre".to_owned());
        }
        if item.tipo.trim().is_empty() {
            errors.push(format!("menu '{name}': empty tipo"));
        }
        if item.precio.is_negative() {
            errors.push(format!("menu '{name}': negative precio"));
        }
        for extra in &item.extras {
            check_extra(&mut errors, &format!("menu '{name}' extra"), extra);
        }
    }

    for extra in &catalog.extras {
        check_extra(&mut errors, "extras", extra);
    }

    let mut seen = std::collections::HashSet::new();
    for store in &catalog.puntos_venta {
        let name = store.nombre.trim();
        if name.is_empty() {
            errors.push("puntos_venta: store with empty nombre".to_owned());
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("puntos_venta '{name}': duplicate nombre"));
        }
        if Coordinates::new(store.latitud, store.longitud).is_err() {
            errors.push(format!("puntos_venta '{name}': coordinates out of range"));
        }
        let digits = store.whatsapp.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits) {
            errors.push(format!("puntos_venta '{name}': whatsapp needs 7 to 15 digits"));
        }
    }

    errors
}

fn check_extra(errors: &mut Vec<String>, context: &str, extra: &ExtraSeed) {
    if extra.nombre.trim().is_empty() {
        errors.push(format!("{context}: empty nombre"));
    }
    if extra.precio.is_negative() {
        errors.push(format!("{context} '{}': negative precio", extra.nombre.trim()));
    }
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file can't be read or validated, the database URL
/// is missing, or a database operation fails.
pub async fn catalog(file_path: &str, replace: bool) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Io(file_path.to_owned(), e))?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(
        menu = catalog.menu.len(),
        puntos_venta = catalog.puntos_venta.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let database_url = database_url().ok_or(SeedError::MissingEnvVar("TQ_DATABASE_URL"))?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    info!("Connected to database");

    let summary = seed(&pool, &catalog, replace).await?;

    info!("Seeding complete!");
    info!("  Menu items: {}", summary.menu);
    info!("  Extras: {}", summary.extras);
    info!("  Stores: {}", summary.puntos_venta);
    info!("  Landing rows: {}", summary.landing);

    Ok(summary)
}

/// Write a validated catalog in one transaction.
async fn seed(
    pool: &PgPool,
    catalog: &CatalogFile,
    replace: bool,
) -> Result<SeedSummary, SeedError> {
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 && !replace {
        return Err(SeedError::NotEmpty(existing));
    }

    if replace {
        for table in [
            "menu_extra",
            "menu",
            "landing_hero",
            "landing_about",
            "landing_instagram",
        ] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        info!("Cleared existing menu and landing content");
    }

    let mut summary = SeedSummary::default();
    seed_menu(&mut tx, catalog, &mut summary).await?;
    seed_stores(&mut tx, catalog, replace, &mut summary).await?;
    seed_landing(&mut tx, &catalog.landing, &mut summary).await?;

    tx.commit().await?;
    Ok(summary)
}

async fn insert_extra(
    tx: &mut Transaction<'_, Postgres>,
    menu_id: Option<i32>,
    extra: &ExtraSeed,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO menu_extra (menu_id, nombre, precio) VALUES ($1, $2, $3)")
        .bind(menu_id)
        .bind(extra.nombre.trim())
        .bind(extra.precio)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn seed_menu(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &CatalogFile,
    summary: &mut SeedSummary,
) -> Result<(), sqlx::Error> {
    for (position, item) in (0_i32..).zip(&catalog.menu) {
        let menu_id: i32 = sqlx::query_scalar(
            "INSERT INTO menu (nombre, descripcion, precio, tipo, imagen_url, disponible, \
                               permite_termino, modificaciones, orden) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(item.nombre.trim())
        .bind(item.descripcion.as_deref())
        .bind(item.precio)
        .bind(item.tipo.trim())
        .bind(item.imagen_url.as_deref())
        .bind(item.disponible)
        .bind(item.permite_termino)
        .bind(&item.modificaciones)
        .bind(item.orden.unwrap_or(position))
        .fetch_one(&mut **tx)
        .await?;
        summary.menu += 1;

        for extra in &item.extras {
            insert_extra(tx, Some(menu_id), extra).await?;
            summary.extras += 1;
        }
    }

    for extra in &catalog.extras {
        insert_extra(tx, None, extra).await?;
        summary.extras += 1;
    }

    Ok(())
}

async fn seed_stores(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &CatalogFile,
    replace: bool,
    summary: &mut SeedSummary,
) -> Result<(), sqlx::Error> {
    for store in &catalog.puntos_venta {
        sqlx::query(
            "INSERT INTO puntos_venta (nombre, direccion, whatsapp, latitud, longitud, horario, activo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (nombre) DO UPDATE SET \
                 direccion = EXCLUDED.direccion, \
                 whatsapp = EXCLUDED.whatsapp, \
                 latitud = EXCLUDED.latitud, \
                 longitud = EXCLUDED.longitud, \
                 horario = EXCLUDED.horario, \
                 activo = EXCLUDED.activo",
        )
        .bind(store.nombre.trim())
        .bind(store.direccion.trim())
        .bind(store.whatsapp.trim())
        .bind(store.latitud)
        .bind(store.longitud)
        .bind(store.horario.as_deref())
        .bind(store.activo)
        .execute(&mut **tx)
        .await?;
        summary.puntos_venta += 1;
    }

    if replace {
        let names: Vec<&str> = catalog
            .puntos_venta
            .iter()
            .map(|s| s.nombre.trim())
            .collect();
        let deactivated =
            sqlx::query("UPDATE puntos_venta SET activo = FALSE WHERE NOT (nombre = ANY($1))")
                .bind(&names)
                .execute(&mut **tx)
                .await?
                .rows_affected();
        if deactivated > 0 {
            info!(deactivated, "Deactivated stores missing from the file");
        }
    }

    Ok(())
}

async fn seed_landing(
    tx: &mut Transaction<'_, Postgres>,
    landing: &LandingSeed,
    summary: &mut SeedSummary,
) -> Result<(), sqlx::Error> {
    for (orden, slide) in (0_i32..).zip(&landing.hero) {
        sqlx::query(
            "INSERT INTO landing_hero (titulo, subtitulo, imagen_url, enlace, orden) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&slide.titulo)
        .bind(slide.subtitulo.as_deref())
        .bind(&slide.imagen_url)
        .bind(slide.enlace.as_deref())
        .bind(orden)
        .execute(&mut **tx)
        .await?;
        summary.landing += 1;
    }

    if let Some(about) = &landing.about {
        sqlx::query("INSERT INTO landing_about (titulo, contenido, imagen_url) VALUES ($1, $2, $3)")
            .bind(&about.titulo)
            .bind(&about.contenido)
            .bind(about.imagen_url.as_deref())
            .execute(&mut **tx)
            .await?;
        summary.landing += 1;
    }

    for (orden, post) in (0_i32..).zip(&landing.instagram) {
        sqlx::query(
            "INSERT INTO landing_instagram (imagen_url, enlace, descripcion, orden) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&post.imagen_url)
        .bind(&post.enlace)
        .bind(post.descripcion.as_deref())
        .bind(orden)
        .execute(&mut **tx)
        .await?;
        summary.landing += 1;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_is_valid() {
        let content = include_str!("../../seed/catalogo.yaml");
        let catalog: CatalogFile = serde_yaml::from_str(content).unwrap();

        assert!(!catalog.menu.is_empty());
        assert!(!catalog.puntos_venta.is_empty());
        assert_eq!(validate_catalog(&catalog), Vec::<String>::new());
    }

    #[test]
    fn test_defaults_apply() {
        let catalog: CatalogFile = serde_yaml::from_str(
            "menu:\n  - nombre: Limonada\n    precio: 6000\n    tipo: bebida\n",
        )
        .unwrap();

        let item = &catalog.menu[0];
        assert!(item.disponible);
        assert!(!item.permite_termino);
        assert!(item.modificaciones.is_empty());
        assert_eq!(item.orden, None);
        assert!(catalog.puntos_venta.is_empty());
    }

    #[test]
    fn test_validation_collects_problems() {
        let catalog: CatalogFile = serde_yaml::from_str(
            r"
menu:
  - nombre: ''
    precio: -1000
    tipo: hamburguesa
puntos_venta:
  - nombre: Centro
    direccion: Calle 10
    whatsapp: '123'
    latitud: 95.0
    longitud: -74.0
  - nombre: centro
    direccion: Calle 11
    whatsapp: '3001234567'
    latitud: 4.6
    longitud: -74.0
",
        )
        .unwrap();

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("duplicate")));
        assert!(errors.iter().any(|e| e.contains("coordinates")));
    }
}
