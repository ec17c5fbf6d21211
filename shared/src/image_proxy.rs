use aws_sdk_s3::Client as S3Client;
use lambda_http::{http::StatusCode, Body, Error, Response};

/// GET /proxy-image/{key} - public passthrough for stored catalog images.
pub async fn proxy_image(
    s3_client: &S3Client,
    bucket_name: &str,
    key: &str,
) -> Result<Response<Body>, Error> {
    if key.is_empty() || key.split('/').any(|seg| seg == "..") {
        return Ok(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": "Invalid image path"}).to_string().into())
            .map_err(Box::new)?);
    }

    let object = match s3_client
        .get_object()
        .bucket(bucket_name)
        .key(key)
        .send()
        .await
    {
        Ok(o) => o,
        Err(e) => {
            let message = e.to_string();
            // Missing keys come back as service errors; anything else is a 500
            let status = if message.contains("NoSuchKey") {
                StatusCode::NOT_FOUND
            } else {
                tracing::error!("S3 get_object failed: key={}, error={}", key, message);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            return Ok(Response::builder()
                .status(status)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": "Image not available"}).to_string().into())
                .map_err(Box::new)?);
        }
    };

    let content_type = object
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let bytes = object
        .body
        .collect()
        .await
        .map_err(|e| format!("Failed to read S3 object body: {}", e))?
        .into_bytes();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Cache-Control", "public, max-age=31536000, immutable")
        .body(Body::Binary(bytes.to_vec()))
        .map_err(Box::new)?)
}
