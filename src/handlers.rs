use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use futures_util::TryStreamExt;

use crate::{
    error::{AppError, AppResult},
    models::Customer,
    state::AppState,
};

pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let customers: Vec<Customer> = state.customers.values().await?.try_collect().await?;
    Ok(Json(customers))
}

/// Stores the posted customer, replacing any record with the same id.
pub async fn create_customer(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let customer = Customer::from_json(&body)?;

    state.customers.put(customer.id, customer.clone()).await?;
    tracing::debug!(id = customer.id, "customer stored");

    Ok((StatusCode::ACCEPTED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Customer>> {
    let id = parse_id(&id)?;

    state
        .customers
        .get(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;

    match state.customers.remove(&id).await? {
        Some(_) => Ok(StatusCode::OK),
        None => Err(AppError::NotFound),
    }
}

fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse().map_err(|_| AppError::InvalidId(raw.to_string()))
}
