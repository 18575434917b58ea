//! Order route handlers.
//!
//! There are two ways in. `confirmar` does everything on the server: check the
//! cart and delivery form, route to a store, write the summary and return the
//! WhatsApp link. `create` records a row the browser has already assembled.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use tq_core::{Email, OrderId, OrderStatus};

use crate::db::PedidoRepository;
use crate::error::{AppError, Result};
use crate::models::{NewPedido, Pedido};
use crate::routes::ApiJson;
use crate::services::checkout::{CheckoutService, ConfirmRequest, Confirmation};
use crate::state::AppState;

/// Query parameters for order history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub correo: Option<String>,
}

impl HistoryQuery {
    fn correo(&self) -> Result<Email> {
        let raw = self
            .correo
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::BadRequest("Indica el correo del cliente".to_owned()))?;

        Email::parse(raw).map_err(|_| AppError::BadRequest("Ingresa un correo válido".to_owned()))
    }
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub estado: String,
}

/// Orders placed with an email, newest first.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Pedido>>> {
    let correo = query.correo()?;
    let pedidos = PedidoRepository::new(state.pool())
        .list_by_email(&correo)
        .await?;

    Ok(Json(pedidos))
}

/// Record an order whose summary the browser built.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPedido>,
) -> Result<(StatusCode, Json<Pedido>)> {
    let insert = body.validate()?;
    let pedido = PedidoRepository::new(state.pool()).create(&insert).await?;

    tracing::info!(pedido_id = %pedido.id, total = %pedido.total, "Order recorded");
    Ok((StatusCode::CREATED, Json(pedido)))
}

/// Confirm a cart on the server and route it to a store.
pub async fn confirm(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConfirmRequest>,
) -> Result<(StatusCode, Json<Confirmation>)> {
    let confirmation = CheckoutService::new(
        state.pool(),
        state.catalog(),
        &state.config().whatsapp_country_code,
    )
    .confirm(&request)
    .await?;

    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// Move an order to a new status.
#[instrument(skip(state, body), fields(estado = %body.estado))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Pedido>> {
    let estado: OrderStatus = body
        .estado
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Estado inválido: {}", body.estado)))?;

    let pedido = PedidoRepository::new(state.pool())
        .update_status(id, estado)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("Pedido {id} no encontrado"))
            }
            crate::db::RepositoryError::Conflict(_) => {
                AppError::Conflict(format!("El pedido {id} ya fue cerrado"))
            }
            other => other.into(),
        })?;

    tracing::info!(pedido_id = %id, estado = %estado, "Order status updated");
    Ok(Json(pedido))
}
