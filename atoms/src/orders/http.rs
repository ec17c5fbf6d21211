use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use super::model::UpdateOrderPayload;
use super::service::{get_order, load_orders_for_user, update_order};

/// HTTP Handler: GET /orders
pub async fn list_orders_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match load_orders_for_user(client, table_name, user_id).await {
        Ok(orders) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&orders)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("list_orders_handler failed: user={}, error={}", user_id, e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: GET /orders/{id}
pub async fn get_order_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    order_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_order(client, table_name, user_id, order_id).await {
        Ok(order) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&order)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Order not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}

/// HTTP Handler: PATCH /orders/{id}
pub async fn update_order_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    order_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: UpdateOrderPayload = serde_json::from_slice(body)?;

    match update_order(client, table_name, user_id, order_id, payload).await {
        Ok(order) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&order)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Order not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) if e.starts_with("Invalid status transition") => Ok(Response::builder()
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "update_order_handler failed: user={}, order={}, error={}",
                user_id,
                order_id,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}
