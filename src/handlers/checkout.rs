use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::handlers::session::{CartSession, MaybeCustomerId};
use crate::services::checkout::CheckoutRequest;
use crate::{errors::ApiError, AppState};
use axum::extract::{Json, State};

/// Checkout totals for the current cart, no side effects
pub async fn preview_checkout(
    State(state): State<AppState>,
    session: CartSession,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let preview = state
        .services
        .checkout
        .preview(&session.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(preview))
}

/// Submit the checkout: creates the order and clears the cart
pub async fn submit_checkout(
    State(state): State<AppState>,
    session: CartSession,
    customer: MaybeCustomerId,
    Json(mut payload): Json<CheckoutRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // The upstream auth header wins only when the payload carries no
    // explicit customer.
    if payload.customer_id.is_none() {
        payload.customer_id = customer.0;
    }

    let confirmation = state
        .services
        .checkout
        .submit(&session.id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(confirmation))
}
