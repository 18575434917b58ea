//! Store location handlers.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::PuntoVenta;
use crate::state::AppState;

/// List stores currently taking orders.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<PuntoVenta>>> {
    let stores = state.catalog().stores().await?;
    Ok(Json(stores.to_vec()))
}
