use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DravTech Marketplace API",
        version = "0.2.0",
        description = r#"
# DravTech Marketplace Commerce API

Backend for the DravTech digital marketplace: product catalogue, session carts,
checkout, order management, and gated download fulfillment.

## Features

- **Catalogue**: Browse active products and categories with filtering and search
- **Carts**: Anonymous session carts addressed by an `X-Session-Id` header
- **Checkout**: Snapshot-based order creation with flat-fee physical shipping
- **Orders**: Order history, status transitions, and payment recording
- **Downloads**: Quota-limited delivery of purchased digital files
- **Engagement**: Product demo requests and contact messages

## Sessions and identity

Cart and checkout endpoints identify the caller by the `X-Session-Id` header.
The server mints a session id when none is supplied and echoes it back on every
cart response. Authenticated storefront traffic forwards the buyer as an
`X-Customer-Id` header (a UUID), which gates order history and downloads.

## Error Handling

Most endpoints use a consistent error envelope:

```json
{
  "error": "Not Found",
  "message": "Order not found",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Cart endpoints speak the storefront's AJAX dialect instead and report failures
as `{"success": false, "error": "..."}`.
        "#,
        contact(
            name = "DravTech",
            email = "dev@dravtech.com",
            url = "https://dravtech.com"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.dravtech.com", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Catalogue", description = "Product and category browsing"),
        (name = "Orders", description = "Order history and administration"),
        (name = "Downloads", description = "Purchased file delivery"),
        (name = "Engagement", description = "Demo requests and contact messages")
    ),
    paths(
        // Catalogue
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::list_categories,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::update_payment_status,
        crate::handlers::orders::recalculate_order,
        crate::handlers::orders::grant_download,

        // Downloads
        crate::handlers::downloads::download_file,

        // Engagement
        crate::handlers::engagement::request_demo,
        crate::handlers::engagement::submit_contact,

        // Cart, checkout & health intentionally omitted from OpenAPI paths for now
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            // Order types
            crate::handlers::orders::UpdateOrderStatusRequest,
            crate::handlers::orders::UpdatePaymentStatusRequest,
            crate::handlers::orders::GrantDownloadRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
