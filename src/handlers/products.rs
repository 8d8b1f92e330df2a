use crate::handlers::common::{map_service_error, success_response};
use crate::services::catalogue::ProductListQuery;
use crate::{errors::ApiError, AppState};
use axum::extract::{Path, Query, State};

/// List active products with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(
        ("product_type" = Option<String>, Query, description = "Filter by product line: digital, merch, or artwork"),
        ("category" = Option<String>, Query, description = "Filter by category slug"),
        ("featured" = Option<bool>, Query, description = "Only featured products"),
        ("page" = Option<u64>, Query, description = "Page number, 1-based"),
        ("per_page" = Option<u64>, Query, description = "Page size, capped at 100")
    ),
    responses(
        (status = 200, description = "Product listing with pagination"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalogue"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let listing = state
        .services
        .catalogue
        .list_products(query)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(listing))
}

/// Product detail by slug, with active pricing plans for digital products
#[utoipa::path(
    get,
    path = "/api/v1/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product detail"),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalogue"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .catalogue
        .get_product_by_slug(&slug)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// List active categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Active categories in display order"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalogue"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .catalogue
        .list_categories()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}
