mod common;

use axum::http::{Method, StatusCode};
use common::{money, read_json, TestApp};
use marketplace_api::entities::{product, ProductType};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;
use uuid::Uuid;

const SESSION: (&str, &str) = ("x-session-id", "cart-session-1");

#[tokio::test]
async fn add_to_cart_returns_ajax_envelope() {
    let app = TestApp::new().await;
    let tee = app
        .seed_product("Logo Tee", ProductType::Merch, dec!(20.00), true, None)
        .await;

    let response = app
        .request_with_headers(
            Method::POST,
            &format!("/api/v1/cart/items/{}", tee.id),
            None,
            &[SESSION],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = response
        .headers()
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    assert_eq!(echoed.as_deref(), Some("cart-session-1"));

    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["cart_count"], json!(1));
    assert_eq!(body["message"], json!("Logo Tee added to cart!"));
}

#[tokio::test]
async fn add_to_cart_accumulates_quantity() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Sticker Pack", ProductType::Merch, dec!(3.00), true, None)
        .await;
    let uri = format!("/api/v1/cart/items/{}", product.id);

    let response = app
        .request_with_headers(Method::POST, &uri, Some(json!({"quantity": 2})), &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["cart_count"], json!(2));

    // A bodyless add defaults to one and stacks on the existing line.
    let response = app
        .request_with_headers(Method::POST, &uri, None, &[SESSION])
        .await;
    let body = read_json(response).await;
    assert_eq!(body["cart_count"], json!(3));
}

#[tokio::test]
async fn add_to_cart_rejects_unknown_and_inactive_products() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(Method::POST, "/api/v1/cart/items/999", None, &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Product 999 not found"));

    let retired = app
        .seed_product("Retired Plugin", ProductType::Digital, dec!(15.00), false, None)
        .await;
    let mut active: product::ActiveModel = retired.clone().into();
    active.is_active = Set(false);
    active
        .update(&*app.state.db)
        .await
        .expect("deactivate product");

    let response = app
        .request_with_headers(
            Method::POST,
            &format!("/api/v1/cart/items/{}", retired.id),
            None,
            &[SESSION],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(
        body["error"],
        json!(format!("Product {} not found", retired.id))
    );
}

#[tokio::test]
async fn cart_session_minted_when_header_absent() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Desk Mat", ProductType::Merch, dec!(12.00), true, None)
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/cart/items/{}", product.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let minted = response
        .headers()
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .expect("minted session id echoed to the caller");
    assert!(Uuid::parse_str(&minted).is_ok());

    // The minted id addresses the same cart on the next call.
    let response = app
        .request_with_headers(
            Method::GET,
            "/api/v1/cart/count",
            None,
            &[("x-session-id", minted.as_str())],
        )
        .await;
    let body = read_json(response).await;
    assert_eq!(body["count"], json!(1));
}

#[tokio::test]
async fn update_quantity_reports_line_total() {
    let app = TestApp::new().await;
    let poster = app
        .seed_product("Poster Series", ProductType::Artwork, dec!(34.00), true, None)
        .await;
    let uri = format!("/api/v1/cart/items/{}", poster.id);

    app.request_with_headers(Method::POST, &uri, None, &[SESSION])
        .await;

    let response = app
        .request_with_headers(Method::PUT, &uri, Some(json!({"quantity": 3})), &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["cart_count"], json!(3));
    assert_eq!(body["quantity"], json!(3));
    assert_eq!(money(&body["line_total"]), dec!(102.00));
}

#[tokio::test]
async fn update_quantity_rejects_zero_and_missing_lines() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Notebook", ProductType::Merch, dec!(8.00), true, None)
        .await;
    let uri = format!("/api/v1/cart/items/{}", product.id);

    app.request_with_headers(Method::POST, &uri, None, &[SESSION])
        .await;

    let response = app
        .request_with_headers(Method::PUT, &uri, Some(json!({"quantity": 0})), &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Invalid quantity."));

    // The rejected update leaves the cart untouched.
    let response = app
        .request_with_headers(Method::GET, "/api/v1/cart/count", None, &[SESSION])
        .await;
    let body = read_json(response).await;
    assert_eq!(body["count"], json!(1));

    let response = app
        .request_with_headers(
            Method::PUT,
            "/api/v1/cart/items/424242",
            Some(json!({"quantity": 2})),
            &[SESSION],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], json!("Item not in cart."));
}

#[tokio::test]
async fn remove_from_cart_reports_remaining_count() {
    let app = TestApp::new().await;
    let tee = app
        .seed_product("Logo Tee", ProductType::Merch, dec!(20.00), true, None)
        .await;
    let print = app
        .seed_product("City Print", ProductType::Artwork, dec!(45.00), true, None)
        .await;

    app.request_with_headers(
        Method::POST,
        &format!("/api/v1/cart/items/{}", tee.id),
        Some(json!({"quantity": 2})),
        &[SESSION],
    )
    .await;
    app.request_with_headers(
        Method::POST,
        &format!("/api/v1/cart/items/{}", print.id),
        None,
        &[SESSION],
    )
    .await;

    let response = app
        .request_with_headers(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", tee.id),
            None,
            &[SESSION],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Logo Tee removed from cart."));
    assert_eq!(body["cart_count"], json!(1));

    // Removing a line that is already gone still succeeds.
    let response = app
        .request_with_headers(
            Method::DELETE,
            &format!("/api/v1/cart/items/{}", tee.id),
            None,
            &[SESSION],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Product removed from cart."));
    assert_eq!(body["cart_count"], json!(1));
}

#[tokio::test]
async fn view_cart_returns_items_and_totals() {
    let app = TestApp::new().await;
    let ebook = app
        .seed_product(
            "Field Notes PDF",
            ProductType::Digital,
            dec!(50.00),
            false,
            Some("files/field-notes.pdf"),
        )
        .await;
    let tee = app
        .seed_product("Logo Tee", ProductType::Merch, dec!(20.00), true, None)
        .await;

    for id in [ebook.id, tee.id] {
        app.request_with_headers(
            Method::POST,
            &format!("/api/v1/cart/items/{id}"),
            None,
            &[SESSION],
        )
        .await;
    }

    let response = app
        .request_with_headers(Method::GET, "/api/v1/cart", None, &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["cart_count"], json!(2));
    assert_eq!(data["has_physical_items"], json!(true));
    assert_eq!(money(&data["total"]), dec!(70.00));

    let items = data["items"].as_array().expect("cart items array");
    assert_eq!(items.len(), 2);
    let tee_line = items
        .iter()
        .find(|item| item["id"] == json!(tee.id))
        .expect("tee line present");
    assert_eq!(tee_line["name"], json!("Logo Tee"));
    assert_eq!(tee_line["quantity"], json!(1));
    assert_eq!(tee_line["needs_shipping"], json!(true));
    let ebook_line = items
        .iter()
        .find(|item| item["id"] == json!(ebook.id))
        .expect("ebook line present");
    assert_eq!(ebook_line["needs_shipping"], json!(false));
    assert_eq!(ebook_line["is_downloadable"], json!(true));
}

#[tokio::test]
async fn cart_count_defaults_to_zero() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(Method::GET, "/api/v1/cart/count", None, &[SESSION])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["count"], json!(0));
}
