//! Desk REST handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::models::{Client, ClientFields};
use crate::registry::ClientRegistry;

/// Shared application state
pub struct AppState {
    pub registry: ClientRegistry,
}

/// Envelope for read responses: `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

// Ids arrive as raw path text; anything that is not a valid id cannot name a
// stored client.
fn parse_client_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found("Client not found"))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Register a client and make it the active one.
pub async fn insert(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<ClientFields>,
) -> Result<&'static str, ApiError> {
    state.registry.insert(&fields).await?;
    Ok("Client inserted successfully")
}

/// Overwrite a client's details. No client is active afterwards.
pub async fn modify(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Json(fields): Json<ClientFields>,
) -> Result<&'static str, ApiError> {
    let id = parse_client_id(&client_id)?;
    state.registry.modify(id, &fields).await?;
    Ok("Client modified successfully")
}

pub async fn active_client(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<Client>>>, ApiError> {
    let data = state.registry.get_active().await?;
    Ok(Json(DataResponse { data }))
}

pub async fn list_unsigned(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<Client>>>, ApiError> {
    let data = state.registry.list_unsigned().await?;
    Ok(Json(DataResponse { data }))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<DataResponse<Client>>, ApiError> {
    let id = parse_client_id(&client_id)?;
    let data = state.registry.get(id).await?;
    Ok(Json(DataResponse { data }))
}
