use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::http::{HeaderMap, StatusCode};
use lambda_http::{Body, Response};

pub const USER_ID_HEADER: &str = "X-User-Id";

pub struct AuthContext {
    pub user_id: String,
    pub user_role: String,
}

fn unauthorized(message: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": message}).to_string().into())
        .unwrap_or_else(|_| Response::new(Body::Empty))
}

/// Resolve the caller's identity against the users table. Returns a ready
/// 401 response when the header is missing or the user is unknown, so
/// call sites can bail with the same match shape everywhere.
pub async fn authenticate_request(
    client: &DynamoClient,
    table_name: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, Response<Body>> {
    let user_id = match headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Err(unauthorized("Missing credentials")),
    };

    let pk = format!("USER#{}", user_id);
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await;

    match result {
        Ok(output) => match output.item() {
            Some(item) => {
                let user_role = item
                    .get("user_role")
                    .and_then(|v| v.as_s().ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "rep".to_string());
                Ok(AuthContext { user_id, user_role })
            }
            None => Err(unauthorized("Unknown user")),
        },
        Err(e) => {
            tracing::error!("Auth lookup failed: user={}, error={}", user_id, e);
            Err(unauthorized("Authentication unavailable"))
        }
    }
}

/// Admin gate for the user-management routes
pub fn require_admin(ctx: &AuthContext) -> Result<(), Response<Body>> {
    if ctx.user_role == "admin" {
        Ok(())
    } else {
        Err(Response::builder()
            .status(StatusCode::FORBIDDEN)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": "Admin role required"}).to_string().into())
            .unwrap_or_else(|_| Response::new(Body::Empty)))
    }
}
