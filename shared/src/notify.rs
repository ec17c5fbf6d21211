use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_sesv2::Client as SesClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use crate::email::send_order_notification;
use repvendas_atoms::orders::{self, CreateOrderPayload};
use repvendas_atoms::settings;

#[derive(Debug, Deserialize)]
struct NotifyOrderRequest {
    order_id: String,
}

/// POST /orders - create the order, then dispatch the notification mail
/// best-effort. A failed send never fails the order.
pub async fn create_order_handler(
    dynamo_client: &DynamoClient,
    ses_client: &SesClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: CreateOrderPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": format!("Invalid order payload: {}", e)})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
    };

    let order = match orders::create_order(dynamo_client, table_name, user_id, payload).await {
        Ok(order) => order,
        Err(e) if e == "Product not found" => {
            return Ok(Response::builder()
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": "Order references an unknown product"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!("create_order failed: user={}, error={}", user_id, e);
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?);
        }
    };

    match settings::load_settings(dynamo_client, table_name, user_id).await {
        Ok(store) => {
            if let Some(to) = &store.notification_email {
                if let Err(e) =
                    send_order_notification(ses_client, to, &store.store_name, &order).await
                {
                    tracing::error!(
                        "Order notification failed: order={}, to={}, error={}",
                        order.order_id,
                        to,
                        e
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                "Settings lookup failed during order notification: user={}, error={}",
                user_id,
                e
            );
        }
    }

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&order)?.into())
        .map_err(Box::new)?)
}

/// POST /notify/order - re-send the notification mail for an existing
/// order (used by the panel's "resend" action).
pub async fn handle_notify_order(
    dynamo_client: &DynamoClient,
    ses_client: &SesClient,
    table_name: &str,
    user_id: &str,
    body: &Body,
) -> Result<Response<Body>, Error> {
    let body_str = match body {
        Body::Text(text) => text.as_str(),
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    };

    let request: NotifyOrderRequest = match serde_json::from_str(body_str) {
        Ok(req) => req,
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({
                        "error": "InvalidRequest",
                        "message": format!("Invalid request body: {}", e),
                    })
                    .to_string()
                    .into(),
                )
                .map_err(Box::new)?)
        }
    };

    let store = match settings::load_settings(dynamo_client, table_name, user_id).await {
        Ok(s) => s,
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    };

    let to = match &store.notification_email {
        Some(to) => to.clone(),
        None => {
            return Ok(Response::builder()
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({
                        "error": "NoNotificationEmail",
                        "message": "Configure a notification e-mail in settings first",
                    })
                    .to_string()
                    .into(),
                )
                .map_err(Box::new)?)
        }
    };

    let order = match orders::get_order(dynamo_client, table_name, user_id, &request.order_id).await
    {
        Ok(order) => order,
        Err(e) if e == "Order not found" => {
            return Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    };

    match send_order_notification(ses_client, &to, &store.store_name, &order).await {
        Ok(_) => {
            tracing::info!("Order notification sent: order={}, to={}", order.order_id, to);
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"message": "Notification sent"}).to_string().into())
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!(
                "Order notification failed: order={}, to={}, error={}",
                order.order_id,
                to,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({
                        "error": "EmailFailed",
                        "message": "Failed to send notification. Please try again later.",
                    })
                    .to_string()
                    .into(),
                )
                .map_err(Box::new)?)
        }
    }
}
