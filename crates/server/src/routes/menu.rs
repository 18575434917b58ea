//! Menu route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use tq_core::MenuItemId;

use crate::error::{AppError, Result};
use crate::models::{MenuItem, MenuItemDetail};
use crate::state::AppState;

/// Query parameters for the menu listing.
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub tipo: Option<String>,
}

impl MenuQuery {
    /// The type filter, ignoring blanks.
    fn tipo(&self) -> Option<&str> {
        self.tipo.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// List available menu items.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<Vec<MenuItem>>> {
    let items = state.catalog().menu(query.tipo()).await?;
    Ok(Json(items.to_vec()))
}

/// Show one menu item with the extras it can take.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
) -> Result<Json<MenuItemDetail>> {
    let detail = state
        .catalog()
        .menu_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_owned()))?;

    Ok(Json(MenuItemDetail::clone(&detail)))
}
