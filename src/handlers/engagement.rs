use crate::handlers::common::{client_ip, created_response, map_service_error};
use crate::services::engagement::{ContactInput, DemoRequestInput};
use crate::{errors::ApiError, AppState};
use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;

/// Request a live demo for a digital product
#[utoipa::path(
    post,
    path = "/api/v1/products/{slug}/demo",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 201, description = "Demo request recorded"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "No active digital product with this slug", body = crate::errors::ErrorResponse)
    ),
    tag = "Engagement"
)]
pub async fn request_demo(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<DemoRequestInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let inquiry = state
        .services
        .engagement
        .request_demo(&slug, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(inquiry))
}

/// Submit a general contact message
#[utoipa::path(
    post,
    path = "/api/v1/contact",
    responses(
        (status = 201, description = "Message recorded"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "Engagement"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ContactInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let ip = client_ip(&headers);
    let message = state
        .services
        .engagement
        .submit_contact(payload, ip)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(message))
}
