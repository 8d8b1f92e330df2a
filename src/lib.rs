//! Marketplace API Library
//!
//! This crate provides the core functionality for the DravTech marketplace API
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: Arc<config::AppConfig>,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
    pub redis: Option<Arc<redis::Client>>,
}

// Common response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// Route table for /api/v1. Routes assemble here rather than in nested
// per-module routers so sibling paths like /products/:slug/demo stay legal.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status
        .route("/status", get(api_status))
        // Catalogue
        .route("/products", get(handlers::products::list_products))
        .route("/products/:slug", get(handlers::products::get_product))
        .route(
            "/products/:slug/demo",
            post(handlers::engagement::request_demo),
        )
        .route("/categories", get(handlers::products::list_categories))
        // Cart (storefront AJAX dialect)
        .route("/cart", get(handlers::carts::view_cart))
        .route("/cart/count", get(handlers::carts::cart_count))
        .route(
            "/cart/items/:product_id",
            post(handlers::carts::add_to_cart)
                .put(handlers::carts::update_quantity)
                .delete(handlers::carts::remove_from_cart),
        )
        // Checkout
        .route(
            "/checkout",
            get(handlers::checkout::preview_checkout).post(handlers::checkout::submit_checkout),
        )
        // Orders
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/payment",
            put(handlers::orders::update_payment_status),
        )
        .route(
            "/orders/:id/recalculate",
            post(handlers::orders::recalculate_order),
        )
        .route(
            "/orders/:id/downloads",
            post(handlers::orders::grant_download),
        )
        // Downloads
        .route(
            "/downloads/:product_id",
            get(handlers::downloads::download_file),
        )
        // Engagement
        .route("/contact", post(handlers::engagement::submit_contact))
}

async fn api_status() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "build_time": build_time,
        "service": "marketplace-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

pub mod prelude {
    pub use crate::cart::*;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::notifications::*;
    pub use crate::openapi::*;
    pub use crate::services::*;
}
