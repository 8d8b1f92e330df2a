use crate::entities::{OrderStatus, PaymentStatus};
use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::handlers::session::MaybeCustomerId;
use crate::{errors::ApiError, AppState};
use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct OrderHistoryQuery {
    pub email: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[schema(value_type = String, example = "paid")]
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    #[schema(value_type = String, example = "paid")]
    pub payment_status: PaymentStatus,
    /// Mobile-money code, charge id, or whatever the operator has
    pub payment_reference: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantDownloadRequest {
    pub product_id: i64,
    /// Overrides the configured default quota when set
    pub max_downloads: Option<i32>,
}

/// Order detail with line items and shipping address
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .orders
        .get_order(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Order history for a customer or an email, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(
        ("email" = Option<String>, Query, description = "Buyer email, used when no customer header is present"),
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("per_page" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Order history page"),
        (status = 400, description = "Neither customer identity nor email given", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    customer: MaybeCustomerId,
    Query(query): Query<OrderHistoryQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = query.page.unwrap_or(1);
    let per_page = query
        .per_page
        .unwrap_or(state.config.api_default_page_size)
        .clamp(1, state.config.api_max_page_size);

    let history = match (customer.0, query.email.as_deref()) {
        (Some(customer_id), _) => state
            .services
            .orders
            .list_orders_for_customer(customer_id, page, per_page)
            .await
            .map_err(map_service_error)?,
        (None, Some(email)) if !email.trim().is_empty() => state
            .services
            .orders
            .list_orders_for_email(email.trim(), page, per_page)
            .await
            .map_err(map_service_error)?,
        _ => {
            return Err(ApiError::ValidationError(
                "Provide an email or a customer identity".to_string(),
            ))
        }
    };

    Ok(success_response(history))
}

/// Move an order to a new lifecycle status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Record a payment outcome; marking paid grants downloads
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_payment_status(id, payload.payment_status, payload.payment_reference)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Recompute subtotal and total from the current line items
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/recalculate",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Totals recomputed"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn recalculate_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .recalculate_totals(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Manually grant download access for an order line
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/downloads",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = GrantDownloadRequest,
    responses(
        (status = 201, description = "Download granted"),
        (status = 404, description = "Order or product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already granted for this order and product", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn grant_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GrantDownloadRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let grant = state
        .services
        .fulfillment
        .grant_download(id, payload.product_id, payload.max_downloads)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(grant))
}
