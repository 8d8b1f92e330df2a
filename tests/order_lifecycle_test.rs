mod common;

use axum::http::{Method, StatusCode};
use common::{money, read_json, TestApp};
use marketplace_api::entities::{order_item, purchased_download, OrderItem, ProductType, PurchasedDownload};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Runs a product through cart and checkout, returning the order id.
async fn place_digital_order(
    app: &TestApp,
    session: &str,
    email: &str,
    product_id: i64,
    customer: Option<&str>,
) -> Uuid {
    let mut headers = vec![("x-session-id", session)];
    if let Some(customer_id) = customer {
        headers.push(("x-customer-id", customer_id));
    }

    let response = app
        .request_with_headers(
            Method::POST,
            &format!("/api/v1/cart/items/{product_id}"),
            None,
            &headers,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/checkout",
            Some(json!({"email": email})),
            &headers,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    body["data"]["order"]["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .expect("order id in confirmation")
}

#[tokio::test]
async fn order_detail_includes_items_without_address_for_digital() {
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
    let order_id = place_digital_order(&app, "order-1", "buyer@example.com", ebook.id, None).await;

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let data = &body["data"];
    assert_eq!(data["order"]["id"], json!(order_id.to_string()));
    assert_eq!(data["items"].as_array().map(Vec::len), Some(1));
    assert!(data["shipping_address"].is_null());
}

#[tokio::test]
async fn order_detail_missing_order_is_not_found() {
    let app = TestApp::new().await;
    let ghost = Uuid::new_v4();

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{ghost}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["error"], json!("Not Found"));
    assert_eq!(body["message"], json!(format!("Order {} not found", ghost)));
}

#[tokio::test]
async fn order_history_filters_by_email_newest_first() {
    let app = TestApp::new().await;
    let ebook = app
        .seed_product("Field Notes PDF", ProductType::Digital, dec!(50.00), false, None)
        .await;

    let first = place_digital_order(&app, "hist-1", "repeat@example.com", ebook.id, None).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = place_digital_order(&app, "hist-2", "repeat@example.com", ebook.id, None).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    place_digital_order(&app, "hist-3", "other@example.com", ebook.id, None).await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/orders?email=repeat@example.com",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let data = &body["data"];
    assert_eq!(data["total"], json!(2));
    assert_eq!(data["page"], json!(1));
    assert_eq!(data["per_page"], json!(20));

    let orders = data["orders"].as_array().expect("orders array");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], json!(second.to_string()));
    assert_eq!(orders[1]["id"], json!(first.to_string()));
}

#[tokio::test]
async fn order_history_requires_identity() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(
        body["message"],
        json!("Provide an email or a customer identity")
    );
}

#[tokio::test]
async fn order_history_scoped_to_customer_header() {
    let app = TestApp::new().await;
    let ebook = app
        .seed_product("Field Notes PDF", ProductType::Digital, dec!(50.00), false, None)
        .await;
    let customer = Uuid::new_v4().to_string();

    let order_id = place_digital_order(
        &app,
        "cust-1",
        "account@example.com",
        ebook.id,
        Some(customer.as_str()),
    )
    .await;
    place_digital_order(&app, "cust-2", "guest@example.com", ebook.id, None).await;

    let response = app
        .request_with_headers(
            Method::GET,
            "/api/v1/orders",
            None,
            &[("x-customer-id", customer.as_str())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let orders = body["data"]["orders"].as_array().expect("orders array");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], json!(order_id.to_string()));
}

#[tokio::test]
async fn status_and_payment_updates_round_trip() {
    let app = TestApp::new().await;
    let ebook = app
        .seed_product("Field Notes PDF", ProductType::Digital, dec!(50.00), false, None)
        .await;
    let order_id = place_digital_order(&app, "pay-1", "buyer@example.com", ebook.id, None).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({"status": "paid"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], json!("paid"));

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/payment"),
            Some(json!({"payment_status": "paid", "payment_reference": "MPESA123XYZ"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["payment_status"], json!("paid"));
    assert_eq!(body["data"]["payment_reference"], json!("MPESA123XYZ"));
}

#[tokio::test]
async fn unknown_status_value_is_rejected() {
    let app = TestApp::new().await;
    let order_id = Uuid::new_v4();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({"status": "shipped"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn marking_paid_grants_downloads_once() {
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
    let order_id = place_digital_order(&app, "grant-1", "buyer@example.com", ebook.id, None).await;

    let grants = PurchasedDownload::find()
        .filter(purchased_download::Column::OrderId.eq(order_id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(grants, 0);

    for _ in 0..2 {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/orders/{order_id}/payment"),
                Some(json!({"payment_status": "paid"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Re-running the paid transition must not duplicate grants.
    let grants = PurchasedDownload::find()
        .filter(purchased_download::Column::OrderId.eq(order_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].product_id, ebook.id);
    assert_eq!(grants[0].download_count, 0);
    assert_eq!(grants[0].max_downloads, 5);
}

#[tokio::test]
async fn recalculate_totals_reflects_tampered_items() {
    let app = TestApp::new().await;
    let ebook = app
        .seed_product("Field Notes PDF", ProductType::Digital, dec!(30.00), false, None)
        .await;
    let order_id = place_digital_order(&app, "recalc-1", "buyer@example.com", ebook.id, None).await;

    let item = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("order item row");
    let mut active: order_item::ActiveModel = item.into();
    active.quantity = Set(3);
    active.update(&*app.state.db).await.expect("tamper quantity");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/recalculate"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(money(&body["data"]["subtotal"]), dec!(90.00));
    assert_eq!(money(&body["data"]["total"]), dec!(90.00));
}
