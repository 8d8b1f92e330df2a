use crate::handlers::common::map_service_error;
use crate::handlers::session::CustomerId;
use crate::{errors::ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

// Quotes, backslashes, and control characters corrupt the quoted-string
// form of Content-Disposition.
static DISPOSITION_UNSAFE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1f\x7f"\\]"#).unwrap());

fn content_disposition(filename: &str) -> String {
    let safe = DISPOSITION_UNSAFE_RE.replace_all(filename, "_");
    format!("attachment; filename=\"{}\"", safe)
}

/// Serve a purchased digital file, spending one download per hit
#[utoipa::path(
    get,
    path = "/api/v1/downloads/{product_id}",
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "File bytes with attachment disposition", content_type = "application/octet-stream"),
        (status = 401, description = "No customer identity", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not purchased or quota exhausted", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product, grant, or file missing", body = crate::errors::ErrorResponse)
    ),
    tag = "Downloads"
)]
pub async fn download_file(
    State(state): State<AppState>,
    customer: CustomerId,
    Path(product_id): Path<i64>,
) -> Result<Response, ApiError> {
    let payload = state
        .services
        .fulfillment
        .prepare_download(customer.0, product_id)
        .await
        .map_err(map_service_error)?;

    // The file existed when the quota was spent but can vanish before the read.
    let bytes = tokio::fs::read(&payload.path).await.map_err(|e| {
        error!(error = %e, path = %payload.path.display(), "granted file unreadable");
        map_service_error(crate::errors::ServiceError::NotFound(
            "File not found on server.".to_string(),
        ))
    })?;

    let disposition = content_disposition(&payload.filename);
    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, payload.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response();

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_quotes_the_filename() {
        assert_eq!(
            content_disposition("deploy-guide.pdf"),
            "attachment; filename=\"deploy-guide.pdf\""
        );
    }

    #[test]
    fn disposition_neutralizes_header_breaking_characters() {
        assert_eq!(
            content_disposition("we\"ird\r\nname.pdf"),
            "attachment; filename=\"we_ird__name.pdf\""
        );
    }
}
