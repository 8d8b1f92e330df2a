use crate::handlers::session::CartSession;
use crate::{errors::ServiceError, ApiResponse, AppState};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

// Cart endpoints speak the storefront's AJAX dialect: a flat
// `{success, cart_count, message}` envelope on success and
// `{success: false, error}` on failure, not the standard API wrapper.

#[derive(Debug, Serialize)]
struct CartEnvelope {
    success: bool,
    cart_count: u32,
    message: String,
}

#[derive(Debug, Serialize)]
struct QuantityEnvelope {
    success: bool,
    cart_count: u32,
    quantity: u32,
    line_total: Decimal,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: u32,
}

#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    #[serde(default = "default_add_quantity")]
    pub quantity: u32,
}

fn default_add_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: u32,
}

/// Failure half of the AJAX envelope.
#[derive(Debug)]
pub struct CartAjaxError(pub ServiceError);

impl From<ServiceError> for CartAjaxError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CartAjaxError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let error = self.0.response_message();
        (status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}

fn cart_response<T: Serialize>(session: &CartSession, payload: T) -> Response {
    let mut response = (StatusCode::OK, Json(payload)).into_response();
    session.apply_to(&mut response);
    response
}

/// Current cart contents with totals
pub async fn view_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> Result<Response, CartAjaxError> {
    let view = state.services.cart.view_cart(&session.id).await?;
    Ok(cart_response(&session, ApiResponse::success(view)))
}

/// Add a product to the cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<i64>,
    body: Option<Json<AddItemBody>>,
) -> Result<Response, CartAjaxError> {
    let quantity = body.map(|Json(body)| body.quantity).unwrap_or(1);

    let mutation = state
        .services
        .cart
        .add_item(&session.id, product_id, quantity)
        .await?;

    Ok(cart_response(
        &session,
        CartEnvelope {
            success: true,
            cart_count: mutation.cart_count,
            message: mutation.message,
        },
    ))
}

/// Set the quantity of a cart line
pub async fn update_quantity(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<i64>,
    Json(body): Json<UpdateQuantityBody>,
) -> Result<Response, CartAjaxError> {
    let update = state
        .services
        .cart
        .update_quantity(&session.id, product_id, body.quantity)
        .await?;

    Ok(cart_response(
        &session,
        QuantityEnvelope {
            success: true,
            cart_count: update.cart_count,
            quantity: update.quantity,
            line_total: update.line_total,
        },
    ))
}

/// Remove a product from the cart
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<i64>,
) -> Result<Response, CartAjaxError> {
    let mutation = state
        .services
        .cart
        .remove_item(&session.id, product_id)
        .await?;

    Ok(cart_response(
        &session,
        CartEnvelope {
            success: true,
            cart_count: mutation.cart_count,
            message: mutation.message,
        },
    ))
}

/// Badge count for the cart icon
pub async fn cart_count(
    State(state): State<AppState>,
    session: CartSession,
) -> Result<Response, CartAjaxError> {
    let count = state.services.cart.cart_count(&session.id).await?;
    Ok(cart_response(&session, CountResponse { count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn ajax_error_uses_flat_envelope() {
        let response =
            CartAjaxError(ServiceError::NotFound("Item not in cart.".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["success"], json!(false));
        assert_eq!(payload["error"], json!("Item not in cart."));
    }

    #[tokio::test]
    async fn ajax_error_hides_internal_failures() {
        let response =
            CartAjaxError(ServiceError::CacheError("redis gone".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["error"], json!("Internal server error"));
    }

    #[test]
    fn add_body_defaults_to_one() {
        let body: AddItemBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.quantity, 1);

        let body: AddItemBody = serde_json::from_str(r#"{"quantity": 3}"#).unwrap();
        assert_eq!(body.quantity, 3);
    }
}
