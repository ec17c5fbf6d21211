use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use crate::engine::{apply_sync, preview_sync};
use crate::log::load_sync_logs;
use crate::types::SyncRequest;

fn json_response(status: StatusCode, body: String) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(body.into())
        .map_err(Box::new)?)
}

fn parse_request(body: &[u8]) -> Result<SyncRequest, Response<Body>> {
    match serde_json::from_slice::<SyncRequest>(body) {
        Ok(r) if r.match_column.trim().is_empty() || r.value_column.trim().is_empty() => {
            Err(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": "match_column and value_column are required"})
                        .to_string()
                        .into(),
                )
                .unwrap_or_default())
        }
        Ok(r) => Ok(r),
        Err(e) => Err(Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .header("Content-Type", "application/json")
            .body(
                serde_json::json!({"error": format!("Invalid sync payload: {}", e)})
                    .to_string()
                    .into(),
            )
            .unwrap_or_default()),
    }
}

/// HTTP Handler: POST /sync/preview - classification only, nothing written
pub async fn preview_sync_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let request = match parse_request(body) {
        Ok(r) => r,
        Err(resp) => return Ok(resp),
    };

    match preview_sync(client, table_name, user_id, &request).await {
        Ok((report, results)) => json_response(
            StatusCode::OK,
            serde_json::json!({"report": report, "rows": results}).to_string(),
        ),
        Err(e) => {
            tracing::error!("preview_sync_handler failed: user={}, error={}", user_id, e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": e}).to_string(),
            )
        }
    }
}

/// HTTP Handler: POST /sync/apply
pub async fn apply_sync_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let request = match parse_request(body) {
        Ok(r) => r,
        Err(resp) => return Ok(resp),
    };

    match apply_sync(client, table_name, user_id, &request).await {
        Ok(report) => json_response(StatusCode::OK, serde_json::to_string(&report)?),
        Err(e) => {
            tracing::error!(
                "apply_sync_handler failed: user={}, file={}, error={}",
                user_id,
                request.filename,
                e
            );
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": e}).to_string(),
            )
        }
    }
}

/// HTTP Handler: GET /sync/logs
pub async fn list_sync_logs_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match load_sync_logs(client, table_name, user_id).await {
        Ok(entries) => json_response(StatusCode::OK, serde_json::to_string(&entries)?),
        Err(e) => {
            tracing::error!(
                "list_sync_logs_handler failed: user={}, error={}",
                user_id,
                e
            );
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": e}).to_string(),
            )
        }
    }
}
