use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use crate::fetch::{fetch_external_image, FetchError};
use crate::storage::{object_key, upload_image};
use crate::transform::optimize_image;
use crate::AppState;
use repvendas_atoms::products;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestRequest {
    product_id: String,
    external_url: String,
}

/// Render a compact source-chain excerpt for the error body. Never a raw
/// backtrace, always bounded.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        out.push_str(" -> ");
        out.push_str(&e.to_string());
        current = e.source();
    }
    if out.len() > 400 {
        let mut cut = 400;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push('…');
    }
    out
}

fn failure_response(
    status: StatusCode,
    message: &str,
    cause: &str,
    details: &str,
) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({
                "success": false,
                "error": message,
                "cause": cause,
                "details": details,
            })
            .to_string()
            .into(),
        )
        .map_err(Box::new)?)
}

/// POST /images/ingest - fetch an external image, optimize it, store it,
/// and point the product at the stored copy. The product row is only
/// touched after the upload succeeded, so a failed run leaves no partial
/// state.
pub async fn ingest_external_image(
    state: &AppState,
    user_id: &str,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let body_str = match body {
        Body::Text(text) => text.as_str(),
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    };

    let request: IngestRequest = match serde_json::from_str(body_str) {
        Ok(req) => req,
        Err(e) => {
            return failure_response(
                StatusCode::BAD_REQUEST,
                "Invalid request body: expected { productId, externalUrl }",
                "validation",
                &e.to_string(),
            )
        }
    };

    tracing::info!(
        "Image ingest requested: user={}, product={}, url={}",
        user_id,
        request.product_id,
        request.external_url
    );

    // 1. Resolve the owning product; pipelines never create rows
    let product = match products::get_product(
        &state.dynamo_client,
        &state.config.table_name,
        user_id,
        &request.product_id,
    )
    .await
    {
        Ok(p) => p,
        Err(e) if e == "Product not found" => {
            return failure_response(StatusCode::NOT_FOUND, &e, "not_found", &e)
        }
        Err(e) => {
            return failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load product",
                "database",
                &e,
            )
        }
    };

    // 2-5. Fetch with retry/classification and the size cap
    let fetched = match fetch_external_image(
        &state.fetch_clients,
        &state.config.fetch,
        &state.config.trust,
        &request.external_url,
    )
    .await
    {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(
                "Image fetch failed: product={}, url={}, cause={}, error={}",
                request.product_id,
                request.external_url,
                e.cause_code(),
                e
            );
            let status = match e {
                FetchError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
                FetchError::TooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return failure_response(
                status,
                "Failed to download external image",
                e.cause_code(),
                &error_chain(&e),
            );
        }
    };

    // 6. Resize / re-encode
    let optimized = match optimize_image(
        &fetched.bytes,
        fetched.content_type.as_deref(),
        &state.config.transform,
    ) {
        Ok(o) => o,
        Err(e) => {
            tracing::error!(
                "Image transform failed: product={}, url={}, error={}",
                request.product_id,
                request.external_url,
                e
            );
            return failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process image",
                "transform",
                &e,
            );
        }
    };

    // 7. Store the optimized copy
    let key = object_key(
        user_id,
        product.brand.as_deref(),
        chrono::Utc::now(),
        &uuid::Uuid::new_v4().to_string(),
    );
    let uploaded = match upload_image(
        &state.s3_client,
        &state.config.bucket_name,
        &state.config.public_base_url,
        &key,
        optimized.bytes,
        optimized.content_type,
    )
    .await
    {
        Ok(u) => u,
        Err(e) => {
            tracing::error!(
                "Image upload failed: product={}, key={}, error={}",
                request.product_id,
                key,
                e
            );
            return failure_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store image",
                "storage",
                &e,
            );
        }
    };

    // 8. Point the product at the stored copy - only after the upload
    if let Err(e) = products::update_product_image(
        &state.dynamo_client,
        &state.config.table_name,
        user_id,
        &request.product_id,
        &uploaded.public_url,
        &uploaded.path,
    )
    .await
    {
        tracing::error!(
            "Product image update failed after upload: product={}, key={}, error={}",
            request.product_id,
            uploaded.path,
            e
        );
        return failure_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Image stored but product update failed",
            "database",
            &e,
        );
    }

    tracing::info!(
        "Image ingest complete: product={}, key={}, {}x{}",
        request.product_id,
        uploaded.path,
        optimized.width,
        optimized.height
    );

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({
                "success": true,
                "url": uploaded.public_url,
            })
            .to_string()
            .into(),
        )
        .map_err(Box::new)?)
}
